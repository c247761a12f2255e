//! File naming convention for image pairs and result records.
//!
//! A reference file such as `site1_2018_A.png` is paired with the target
//! `site1_2020_A.png` and the record `site1_2018-2020_A.ctag`: the
//! reference tag is swapped for the target tag or the output tag, and the
//! record always gets the record extension.

use std::path::Path;

use crate::constants::{DEFAULT_A_TAG, DEFAULT_B_TAG, DEFAULT_OUT_TAG, RECORD_EXTENSION};

/// Tags used to match reference, target and record file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingTags {
    /// Marks reference (earlier) images
    pub a_tag: String,
    /// Marks target (later) images
    pub b_tag: String,
    /// Marks result records
    pub out_tag: String,
    /// Extension of result records, without the dot
    pub record_extension: String,
}

impl Default for NamingTags {
    fn default() -> Self {
        Self {
            a_tag: DEFAULT_A_TAG.to_string(),
            b_tag: DEFAULT_B_TAG.to_string(),
            out_tag: DEFAULT_OUT_TAG.to_string(),
            record_extension: RECORD_EXTENSION.to_string(),
        }
    }
}

impl NamingTags {
    pub fn new(a_tag: &str, b_tag: &str, out_tag: &str) -> Self {
        Self {
            a_tag: a_tag.to_string(),
            b_tag: b_tag.to_string(),
            out_tag: out_tag.to_string(),
            record_extension: RECORD_EXTENSION.to_string(),
        }
    }

    /// Name of the first tag that is empty, if any.
    pub fn empty_tag(&self) -> Option<&'static str> {
        if self.a_tag.is_empty() {
            Some("a_tag")
        } else if self.b_tag.is_empty() {
            Some("b_tag")
        } else if self.out_tag.is_empty() {
            Some("out_tag")
        } else {
            None
        }
    }

    pub fn is_reference(&self, name: &str) -> bool {
        name.contains(&self.a_tag)
    }

    pub fn is_target(&self, name: &str) -> bool {
        name.contains(&self.b_tag)
    }

    /// Derive the target and record names for a reference file name.
    ///
    /// Returns `None` when the name does not contain the reference tag.
    pub fn derive(&self, reference: &str) -> Option<DerivedNames> {
        let segments: Vec<&str> = reference.split(self.a_tag.as_str()).collect();

        let (target, output) = match segments.as_slice() {
            [_] => return None,
            [prefix, suffix] => (
                format!("{}{}{}", prefix, self.b_tag, suffix),
                format!("{}{}{}", prefix, self.out_tag, suffix),
            ),
            [prefix, rest @ ..] => {
                // Tag occurs more than once: swap only the first occurrence and
                // rebuild the remainder, then cut the record name around the
                // first target tag.
                let rejoined = rest.join(self.a_tag.as_str());
                let target = format!("{}{}{}", prefix, self.b_tag, rejoined);
                let mut parts = target.split(self.b_tag.as_str());
                let head = parts.next().unwrap_or_default();
                let tail = parts.next().unwrap_or_default();
                let output = format!("{}{}{}", head, self.out_tag, tail);
                (target, output)
            }
            [] => return None,
        };

        Some(DerivedNames {
            output: self.with_record_extension(&output),
            target,
        })
    }

    /// Default record name for a manually chosen target file.
    ///
    /// Everything after the first `.` of the target name is dropped, the
    /// target tag is replaced by the output tag and the record extension is
    /// appended.
    pub fn record_name_for_target(&self, target: &str) -> String {
        let stem = target.split('.').next().unwrap_or_default();
        format!(
            "{}.{}",
            stem.replace(&self.b_tag, &self.out_tag),
            self.record_extension
        )
    }

    /// Replace the last extension of `name` with the record extension.
    fn with_record_extension(&self, name: &str) -> String {
        Path::new(name)
            .with_extension(&self.record_extension)
            .to_string_lossy()
            .into_owned()
    }
}

/// Target and record file names derived from a reference name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedNames {
    pub target: String,
    pub output: String,
}
