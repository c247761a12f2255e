//! Result record persistence.
//!
//! Each image pair gets one record file holding either the skip marker or
//! the annotated polygons in image pixel space. Records carry a format
//! version so that schema changes are detected on load instead of being
//! misread.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cdtag::format::{AnnotationResult, ResultStore};
//!
//! let store = ResultStore;
//! store.save(&AnnotationResult::Skipped, path)?;
//! assert!(store.load(path)?.is_skipped());
//! ```

mod error;
mod record;
mod store;

#[cfg(test)]
mod tests;

pub use error::RecordError;
pub use record::{AnnotationResult, PolygonEntry, RecordData, ResultData, ResultEntry};
pub use store::ResultStore;
