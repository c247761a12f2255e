//! Result record data structures.
//!
//! A record holds the outcome of annotating one image pair: either the pair
//! was skipped, or an ordered list of polygons in image pixel coordinates,
//! each with its change class tag.
//!
//! # Versioning
//!
//! Records are wrapped in an envelope carrying a semantic version
//! (MAJOR.MINOR.PATCH):
//!
//! - **Version 0.x.x**: Unstable. Only files with the same minor version are
//!   considered compatible; other 0.x files are read with a warning.
//! - **Version 1.x.x** (future): breaking changes only in major bumps.
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "result": {
//!     "kind": "annotated",
//!     "polygons": [
//!       { "points": [[20.0, 15.0], [100.0, 15.0]], "class": "added building" }
//!     ]
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::model::{ImagePoint, ImagePolygon};

/// A polygon on the target image and its change class.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry {
    pub polygon: ImagePolygon,
    pub tag: String,
}

impl ResultEntry {
    pub fn new(polygon: ImagePolygon, tag: impl Into<String>) -> Self {
        Self {
            polygon,
            tag: tag.into(),
        }
    }
}

/// The outcome of annotating one image pair.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationResult {
    /// The annotator explicitly skipped the pair.
    Skipped,
    /// Polygons in commit order.
    Annotated(Vec<ResultEntry>),
}

impl AnnotationResult {
    pub fn is_skipped(&self) -> bool {
        matches!(self, AnnotationResult::Skipped)
    }

    /// Number of polygons (zero when skipped).
    pub fn polygon_count(&self) -> usize {
        match self {
            AnnotationResult::Skipped => 0,
            AnnotationResult::Annotated(entries) => entries.len(),
        }
    }

    /// Build from `(polygon, tag)` pairs as produced by the editor export.
    pub fn from_tagged(polygons: Vec<(ImagePolygon, String)>) -> Self {
        AnnotationResult::Annotated(
            polygons
                .into_iter()
                .map(|(polygon, tag)| ResultEntry { polygon, tag })
                .collect(),
        )
    }
}

/// Versioned on-disk envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordData {
    /// Format version for compatibility checking.
    pub version: String,

    /// The persisted outcome.
    pub result: ResultData,
}

/// Serialized form of [`AnnotationResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResultData {
    Skipped,
    Annotated { polygons: Vec<PolygonEntry> },
}

/// Serialized polygon with its class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonEntry {
    /// Vertices as `[x, y]` pairs in image pixels.
    pub points: Vec<[f64; 2]>,

    /// Change class tag.
    #[serde(rename = "class")]
    pub tag: String,
}

impl RecordData {
    /// Current version of the record format.
    pub const CURRENT_VERSION: &'static str = "0.1.0";

    /// Major version number for compatibility checking.
    pub const VERSION_MAJOR: u32 = 0;

    /// Minor version number.
    pub const VERSION_MINOR: u32 = 1;

    /// Wrap a result in an envelope at the current version.
    pub fn new(result: &AnnotationResult) -> Self {
        Self {
            version: Self::CURRENT_VERSION.to_string(),
            result: ResultData::from_result(result),
        }
    }

    /// Parse a version string into (major, minor, patch) components.
    pub fn parse_version(version: &str) -> Option<(u32, u32, u32)> {
        let parts: Vec<&str> = version.split('.').collect();
        if parts.len() != 3 {
            return None;
        }
        let major = parts[0].parse().ok()?;
        let minor = parts[1].parse().ok()?;
        let patch = parts[2].parse().ok()?;
        Some((major, minor, patch))
    }

    /// Check if a version is compatible with the current version.
    ///
    /// For version 0.x.x only exact minor matches are compatible.
    pub fn is_version_compatible(file_version: &str) -> bool {
        let Some((file_major, file_minor, _)) = Self::parse_version(file_version) else {
            return false;
        };

        if Self::VERSION_MAJOR == 0 {
            file_major == 0 && file_minor == Self::VERSION_MINOR
        } else {
            file_major == Self::VERSION_MAJOR
        }
    }

    /// Check if a file can be read at all (possibly with warnings).
    pub fn is_version_readable(file_version: &str) -> bool {
        let Some((file_major, _, _)) = Self::parse_version(file_version) else {
            return false;
        };
        file_major == Self::VERSION_MAJOR
    }
}

impl ResultData {
    pub fn from_result(result: &AnnotationResult) -> Self {
        match result {
            AnnotationResult::Skipped => ResultData::Skipped,
            AnnotationResult::Annotated(entries) => ResultData::Annotated {
                polygons: entries
                    .iter()
                    .map(|e| PolygonEntry {
                        points: e.polygon.vertices().iter().map(|p| p.to_array()).collect(),
                        tag: e.tag.clone(),
                    })
                    .collect(),
            },
        }
    }

    pub fn to_result(&self) -> AnnotationResult {
        match self {
            ResultData::Skipped => AnnotationResult::Skipped,
            ResultData::Annotated { polygons } => AnnotationResult::Annotated(
                polygons
                    .iter()
                    .map(|entry| ResultEntry {
                        polygon: entry.points.iter().copied().map(ImagePoint::from).collect(),
                        tag: entry.tag.clone(),
                    })
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parsing() {
        assert_eq!(RecordData::parse_version("0.1.0"), Some((0, 1, 0)));
        assert_eq!(RecordData::parse_version("10.20.30"), Some((10, 20, 30)));
        assert_eq!(RecordData::parse_version("invalid"), None);
        assert_eq!(RecordData::parse_version("1.2"), None);
    }

    #[test]
    fn test_version_compatibility() {
        assert!(RecordData::is_version_compatible(RecordData::CURRENT_VERSION));
        assert!(RecordData::is_version_compatible("0.1.7"));
        assert!(!RecordData::is_version_compatible("0.2.0"));
        assert!(!RecordData::is_version_compatible("1.0.0"));
    }

    #[test]
    fn test_version_readable() {
        assert!(RecordData::is_version_readable("0.9.0"));
        assert!(!RecordData::is_version_readable("1.0.0"));
        assert!(!RecordData::is_version_readable("garbage"));
    }

    #[test]
    fn test_skipped_serializes_with_kind_tag() {
        let json = serde_json::to_string(&RecordData::new(&AnnotationResult::Skipped)).unwrap();
        assert!(json.contains("\"kind\":\"skipped\""));
        assert!(json.contains("\"version\":\"0.1.0\""));
    }

    #[test]
    fn test_polygon_count() {
        let result = AnnotationResult::from_tagged(vec![(
            ImagePolygon::new(vec![ImagePoint::new(1.0, 2.0)]),
            "uncertain".to_string(),
        )]);
        assert_eq!(result.polygon_count(), 1);
        assert_eq!(AnnotationResult::Skipped.polygon_count(), 0);
    }
}
