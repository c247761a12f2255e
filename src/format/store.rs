//! Persistence of annotation results.
//!
//! One record file per image pair. Saving overwrites any existing record;
//! loading reconstructs exactly what was saved.

use std::path::Path;

use crate::constants::{LEGACY_SKIP_SENTINEL, RECORD_EXTENSION};
use crate::format::error::RecordError;
use crate::format::record::{AnnotationResult, RecordData};

/// Either a versioned envelope or the bare skip marker written by older tools.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum StoredRecord {
    Versioned(RecordData),
    Legacy(String),
}

/// Reads and writes result records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultStore;

impl ResultStore {
    /// File extension used for every record.
    pub fn extension(&self) -> &'static str {
        RECORD_EXTENSION
    }

    /// Persist `result` to `path`, replacing any existing file.
    pub fn save(&self, result: &AnnotationResult, path: &Path) -> Result<(), RecordError> {
        log::info!("Saving result record to {:?}", path);

        let bytes = self.encode(result)?;
        std::fs::write(path, &bytes)?;

        log::info!(
            "Saved {} ({} polygons)",
            if result.is_skipped() { "skipped pair" } else { "annotations" },
            result.polygon_count()
        );
        Ok(())
    }

    /// Load the record at `path`.
    pub fn load(&self, path: &Path) -> Result<AnnotationResult, RecordError> {
        log::debug!("Loading result record from {:?}", path);

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RecordError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        self.decode(&bytes)
    }

    /// Serialize a result to record bytes.
    pub fn encode(&self, result: &AnnotationResult) -> Result<Vec<u8>, RecordError> {
        let data = RecordData::new(result);
        Ok(serde_json::to_vec(&data)?)
    }

    /// Deserialize record bytes.
    pub fn decode(&self, bytes: &[u8]) -> Result<AnnotationResult, RecordError> {
        let stored: StoredRecord = serde_json::from_slice(bytes)?;

        let data = match stored {
            StoredRecord::Legacy(marker) if marker == LEGACY_SKIP_SENTINEL => {
                return Ok(AnnotationResult::Skipped);
            }
            StoredRecord::Legacy(other) => {
                return Err(RecordError::invalid_format(format!(
                    "unexpected bare string {:?}",
                    other
                )));
            }
            StoredRecord::Versioned(data) => data,
        };

        if !RecordData::is_version_readable(&data.version) {
            return Err(RecordError::VersionMismatch {
                expected: RecordData::CURRENT_VERSION.to_string(),
                found: data.version,
            });
        }

        if !RecordData::is_version_compatible(&data.version) {
            log::warn!(
                "Record version {} may not be fully compatible with current version {}",
                data.version,
                RecordData::CURRENT_VERSION
            );
        }

        Ok(data.result.to_result())
    }
}
