//! Pairing of reference and target images and their result records.
//!
//! A scan lists the reference, target and output directories once and
//! classifies every reference image carrying the reference tag:
//!
//! - **done**: the target exists and so does its result record
//! - **pending**: the target exists but has no result record yet
//! - **unknown**: no target with the derived name exists
//!
//! The scan is a point-in-time snapshot. Pending pairs keep the order in
//! which the reference directory was listed, and the first one is the next
//! pair to annotate.

mod lister;
mod naming;

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

pub use lister::{FileLister, FsLister, MemoryLister};
pub use naming::{DerivedNames, NamingTags};

/// Errors raised while scanning directories.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Failed to read directory {dir:?}: {source}")]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Naming tag '{0}' must not be empty")]
    EmptyTag(&'static str),
}

/// Classification of a reference image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairStatus {
    Done,
    Pending,
    Unknown,
}

impl PairStatus {
    pub fn name(&self) -> &'static str {
        match self {
            PairStatus::Done => "done",
            PairStatus::Pending => "pending",
            PairStatus::Unknown => "unknown",
        }
    }
}

/// A reference image with its derived target and record paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairRecord {
    pub reference: PathBuf,
    pub target: PathBuf,
    pub output: PathBuf,
    pub status: PairStatus,
}

/// The three directories a scan looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairDirs {
    pub reference: PathBuf,
    pub target: PathBuf,
    pub output: PathBuf,
}

impl PairDirs {
    pub fn new(
        reference: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            reference: reference.into(),
            target: target.into(),
            output: output.into(),
        }
    }
}

/// Result of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pairs: Vec<PairRecord>,
}

impl ScanReport {
    /// Every classified reference image, in listing order.
    pub fn pairs(&self) -> &[PairRecord] {
        &self.pairs
    }

    pub fn count(&self, status: PairStatus) -> usize {
        self.pairs.iter().filter(|p| p.status == status).count()
    }

    pub fn done(&self) -> usize {
        self.count(PairStatus::Done)
    }

    pub fn pending(&self) -> usize {
        self.count(PairStatus::Pending)
    }

    pub fn unknown(&self) -> usize {
        self.count(PairStatus::Unknown)
    }

    /// Total number of reference images carrying the reference tag.
    pub fn total(&self) -> usize {
        self.pairs.len()
    }

    /// Pending pairs in listing order.
    pub fn pending_pairs(&self) -> impl Iterator<Item = &PairRecord> {
        self.pairs
            .iter()
            .filter(|p| p.status == PairStatus::Pending)
    }

    /// The next pair to annotate.
    pub fn next_pending(&self) -> Option<&PairRecord> {
        self.pending_pairs().next()
    }

    pub fn is_finished(&self) -> bool {
        self.next_pending().is_none()
    }

    /// One-line progress summary.
    pub fn summary(&self) -> String {
        format!(
            "TO DO: {}; done: {}; unknown: {}",
            self.pending(),
            self.done(),
            self.unknown()
        )
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Matches reference/target/record files by naming convention.
#[derive(Debug, Clone)]
pub struct PairScheduler<L = FsLister> {
    lister: L,
    dirs: PairDirs,
    tags: NamingTags,
}

impl PairScheduler<FsLister> {
    /// Scheduler over the local filesystem.
    pub fn on_disk(dirs: PairDirs, tags: NamingTags) -> Self {
        Self::new(FsLister, dirs, tags)
    }
}

impl<L: FileLister> PairScheduler<L> {
    pub fn new(lister: L, dirs: PairDirs, tags: NamingTags) -> Self {
        Self { lister, dirs, tags }
    }

    pub fn dirs(&self) -> &PairDirs {
        &self.dirs
    }

    pub fn tags(&self) -> &NamingTags {
        &self.tags
    }

    pub fn lister(&self) -> &L {
        &self.lister
    }

    /// List the three directories and classify every reference image.
    pub fn scan(&self) -> Result<ScanReport, ScanError> {
        if let Some(tag) = self.tags.empty_tag() {
            return Err(ScanError::EmptyTag(tag));
        }

        let references = self.lister.list_files(&self.dirs.reference)?;
        let targets: HashSet<String> = self
            .lister
            .list_files(&self.dirs.target)?
            .into_iter()
            .filter(|name| self.tags.is_target(name))
            .collect();
        let outputs: HashSet<String> = self
            .lister
            .list_files(&self.dirs.output)?
            .into_iter()
            .collect();

        let pairs: Vec<PairRecord> = references
            .iter()
            .filter(|name| self.tags.is_reference(name))
            .filter_map(|name| {
                let derived = self.tags.derive(name)?;
                let status = classify(&derived, &targets, &outputs);
                Some(PairRecord {
                    reference: self.dirs.reference.join(name),
                    target: self.dirs.target.join(&derived.target),
                    output: self.dirs.output.join(&derived.output),
                    status,
                })
            })
            .collect();

        let report = ScanReport { pairs };
        log::info!(
            "Scanned {:?}: {}",
            self.dirs.reference,
            report.summary()
        );
        Ok(report)
    }

    /// Scan and return the first pending pair, if any.
    pub fn next_pending(&self) -> Result<Option<PairRecord>, ScanError> {
        Ok(self.scan()?.next_pending().cloned())
    }

    /// Record path for a target image chosen outside the naming convention.
    pub fn record_path_for_target(&self, target: &Path) -> Option<PathBuf> {
        let name = target.file_name()?.to_str()?;
        Some(self.dirs.output.join(self.tags.record_name_for_target(name)))
    }
}

fn classify(
    derived: &DerivedNames,
    targets: &HashSet<String>,
    outputs: &HashSet<String>,
) -> PairStatus {
    if !targets.contains(&derived.target) {
        PairStatus::Unknown
    } else if outputs.contains(&derived.output) {
        PairStatus::Done
    } else {
        PairStatus::Pending
    }
}
