//! Raster ingestion for the image pairs being annotated.
//!
//! This module provides:
//! - `BandStack`: decoded source bands
//! - `DisplayRaster`: 3-channel RGB form used for display and dimensions
//! - `LoaderRegistry`: extensible format detection and loading
//!
//! ## Adding New Formats
//!
//! 1. Create a new loader in `loaders/` implementing `RasterLoader`
//! 2. Register it in `LoaderRegistry::new()`

mod loader;
pub mod loaders;
mod raster;

pub use loader::{LoaderError, LoaderRegistry, RasterLoader};
pub use raster::{BandStack, ChannelOrder, DisplayRaster};
