//! Global constants for cdtag

/// Default tag identifying reference (earlier) images.
pub const DEFAULT_A_TAG: &str = "_2018_";

/// Default tag identifying target (later) images.
pub const DEFAULT_B_TAG: &str = "_2020_";

/// Default tag identifying result records.
pub const DEFAULT_OUT_TAG: &str = "_2018-2020_";

/// File extension of persisted result records, regardless of image extension.
pub const RECORD_EXTENSION: &str = "ctag";

/// Marker persisted by older tools when an annotator skipped a pair.
pub const LEGACY_SKIP_SENTINEL: &str = "skipped by annotator";

/// Multiplier applied to class colors (0.0-1.0) in the difference preview.
pub const PREVIEW_INTENSITY: f32 = 125.0;

/// Default change classes as (tag, color) pairs.
pub const DEFAULT_CLASSES: &[(&str, &str)] = &[
    ("added building", "green"),
    ("removed building", "red"),
    ("uncertain", "orange"),
];

/// Side length of the square annotation panel when none is configured.
pub const DEFAULT_PANEL_SIZE: u32 = 600;
