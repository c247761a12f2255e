//! cdtag - change-detection polygon tagging
//!
//! Annotators draw polygons over a later (target) image of a co-registered
//! image pair and tag each polygon with a change class. This crate holds
//! everything below the presentation layer:
//!
//! - [`editor`]: candidate points, commits and undo for one pair
//! - [`mapping`]: panel-to-image coordinate transform
//! - [`scheduler`]: pairing of reference, target and record files
//! - [`format`]: versioned result records
//! - [`preview`]: colored difference maps of saved results
//! - [`session`]: the save/skip/auto-advance workflow tying them together

pub mod color_utils;
pub mod config;
pub mod constants;
pub mod data;
pub mod editor;
pub mod format;
pub mod mapping;
pub mod message;
pub mod model;
pub mod preview;
pub mod scheduler;
pub mod session;

pub use editor::{PointerButton, PolygonEditor, UndoAction};
pub use format::{AnnotationResult, ResultStore};
pub use scheduler::{PairScheduler, ScanReport};
pub use session::{AnnotationSession, LoadOutcome, SaveOutcome, SessionError};
