//! Directory listing behind a trait so scans can run on in-memory fixtures.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::ScanError;

/// Lists the file names (not paths) contained in a directory.
pub trait FileLister {
    fn list_files(&self, dir: &Path) -> Result<Vec<String>, ScanError>;
}

/// Lists regular files on the local filesystem, non-recursively.
///
/// Names are sorted so repeated scans enumerate pairs in the same order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl FileLister for FsLister {
    fn list_files(&self, dir: &Path) -> Result<Vec<String>, ScanError> {
        let entries = std::fs::read_dir(dir).map_err(|source| ScanError::ReadDir {
            dir: dir.to_path_buf(),
            source,
        })?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| match entry.file_name().into_string() {
                Ok(name) => Some(name),
                Err(raw) => {
                    log::warn!("Skipping non-UTF-8 file name {:?} in {:?}", raw, dir);
                    None
                }
            })
            .collect();

        names.sort();
        Ok(names)
    }
}

/// In-memory directory listings, returned in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryLister {
    dirs: HashMap<PathBuf, Vec<String>>,
}

impl MemoryLister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory with the given file names.
    pub fn with_dir<I, S>(mut self, dir: impl Into<PathBuf>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dirs
            .insert(dir.into(), names.into_iter().map(Into::into).collect());
        self
    }

    /// Add a file to a directory, creating the directory if needed.
    pub fn add_file(&mut self, dir: impl Into<PathBuf>, name: impl Into<String>) {
        self.dirs.entry(dir.into()).or_default().push(name.into());
    }
}

impl FileLister for MemoryLister {
    fn list_files(&self, dir: &Path) -> Result<Vec<String>, ScanError> {
        self.dirs
            .get(dir)
            .cloned()
            .ok_or_else(|| ScanError::ReadDir {
                dir: dir.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_lister_sorts_and_skips_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), b"").unwrap();
        std::fs::write(dir.path().join("a.png"), b"").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let names = FsLister.list_files(dir.path()).unwrap();
        assert_eq!(names, vec!["a.png", "b.png"]);
    }

    #[test]
    fn test_fs_lister_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsLister.list_files(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, ScanError::ReadDir { .. }));
    }

    #[test]
    fn test_memory_lister_keeps_order() {
        let mut lister = MemoryLister::new().with_dir("A", ["z.png", "a.png"]);
        lister.add_file("A", "m.png");
        assert_eq!(
            lister.list_files(Path::new("A")).unwrap(),
            vec!["z.png", "a.png", "m.png"]
        );
    }
}
