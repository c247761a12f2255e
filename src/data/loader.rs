//! Trait-based raster loading.
//!
//! New formats are added by implementing [`RasterLoader`] and registering
//! the loader with a [`LoaderRegistry`].
//!
//! ## Supported Formats
//!
//! - **Standard Images**: PNG, JPEG, BMP, TIFF, WebP
//! - **NumPy Arrays**: `.npy` files, 2D `(H, W)` or 3D band stacks
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cdtag::data::LoaderRegistry;
//!
//! let registry = LoaderRegistry::new();
//! let raster = registry.load_file(path)?.to_display();
//! ```

use std::path::{Path, PathBuf};

use crate::data::BandStack;

/// Errors raised while decoding rasters.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[{loader}] {message}")]
    Decode {
        loader: &'static str,
        message: String,
    },

    #[error("Unsupported array shape {shape:?}")]
    UnsupportedShape { shape: Vec<usize> },

    #[error("Raster has no pixels")]
    EmptyRaster,

    #[error("No loader could handle the data{}", file_suffix(.file))]
    NoLoader { file: Option<String> },
}

impl LoaderError {
    /// Decoding failure attributed to a loader.
    pub fn decode(loader: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            loader,
            message: message.into(),
        }
    }
}

fn file_suffix(file: &Option<String>) -> String {
    file.as_ref()
        .map(|f| format!(" (file: {})", f))
        .unwrap_or_default()
}

/// A raster file format.
pub trait RasterLoader: Send + Sync {
    /// Unique identifier for this loader (e.g., "image", "npy").
    fn id(&self) -> &'static str;

    /// File extensions this loader handles (lowercase, without dots).
    fn extensions(&self) -> &'static [&'static str];

    /// Whether the data looks like this format, judged by magic bytes.
    fn can_load(&self, data: &[u8]) -> bool;

    fn load(&self, data: &[u8]) -> Result<BandStack, LoaderError>;

    /// Priority for format detection (higher = checked first).
    fn priority(&self) -> i32 {
        0
    }
}

/// Registry of available raster loaders.
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn RasterLoader>>,
}

impl LoaderRegistry {
    /// Create a registry with all built-in loaders.
    pub fn new() -> Self {
        let mut registry = Self {
            loaders: Vec::new(),
        };
        registry.register(Box::new(super::loaders::ImageLoader));
        registry.register(Box::new(super::loaders::NpyLoader));
        registry
    }

    pub fn register(&mut self, loader: Box<dyn RasterLoader>) {
        self.loaders.push(loader);
        self.loaders.sort_by_key(|l| std::cmp::Reverse(l.priority()));
    }

    fn loaders_for_extension(&self, ext: &str) -> impl Iterator<Item = &dyn RasterLoader> {
        let ext_lower = ext.to_lowercase();
        self.loaders
            .iter()
            .filter(move |l| l.extensions().iter().any(|e| *e == ext_lower))
            .map(|l| l.as_ref())
    }

    fn detect_loader(&self, data: &[u8]) -> Option<&dyn RasterLoader> {
        self.loaders
            .iter()
            .find(|l| l.can_load(data))
            .map(|l| l.as_ref())
    }

    /// Load data, auto-detecting the format.
    ///
    /// Tries loaders by file extension first, then by magic bytes, then
    /// every loader as a last resort.
    pub fn load(&self, data: &[u8], filename: Option<&str>) -> Result<BandStack, LoaderError> {
        let extension = filename
            .and_then(|f| Path::new(f).extension())
            .and_then(|e| e.to_str());

        if let Some(ext) = extension {
            for loader in self.loaders_for_extension(ext) {
                match loader.load(data) {
                    Ok(result) => {
                        log::debug!("Loaded with {} loader (by extension)", loader.id());
                        return Ok(result);
                    }
                    Err(e) => log::trace!("Loader {} failed: {}", loader.id(), e),
                }
            }
        }

        if let Some(loader) = self.detect_loader(data) {
            match loader.load(data) {
                Ok(result) => {
                    log::debug!("Loaded with {} loader (by detection)", loader.id());
                    return Ok(result);
                }
                Err(e) => log::trace!("Detected loader {} failed: {}", loader.id(), e),
            }
        }

        for loader in &self.loaders {
            if let Ok(result) = loader.load(data) {
                log::debug!("Loaded with {} loader (fallback)", loader.id());
                return Ok(result);
            }
        }

        Err(LoaderError::NoLoader {
            file: filename.map(str::to_string),
        })
    }

    /// Read and decode a raster file.
    pub fn load_file(&self, path: &Path) -> Result<BandStack, LoaderError> {
        let data = std::fs::read(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path.file_name().and_then(|n| n.to_str());
        self.load(&data, name)
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ChannelOrder;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30]));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_registry_order() {
        let registry = LoaderRegistry::new();
        let ids: Vec<&str> = registry.loaders.iter().map(|l| l.id()).collect();
        assert_eq!(ids, vec!["npy", "image"]);
    }

    #[test]
    fn test_load_by_extension() {
        let stack = LoaderRegistry::new()
            .load(&png_bytes(5, 4), Some("a.png"))
            .unwrap();
        assert_eq!((stack.width(), stack.height()), (5, 4));
        assert_eq!(stack.order(), ChannelOrder::Rgb);
    }

    #[test]
    fn test_load_by_detection_with_wrong_extension() {
        let stack = LoaderRegistry::new()
            .load(&png_bytes(2, 3), Some("misnamed.npy"))
            .unwrap();
        assert_eq!((stack.width(), stack.height()), (2, 3));
    }

    #[test]
    fn test_load_garbage_fails() {
        let err = LoaderRegistry::new()
            .load(b"not a raster at all", Some("x.png"))
            .unwrap_err();
        assert!(matches!(err, LoaderError::NoLoader { file: Some(_) }));
        assert!(err.to_string().contains("x.png"));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t_2020_.png");
        std::fs::write(&path, png_bytes(7, 3)).unwrap();

        let registry = LoaderRegistry::new();
        assert_eq!(registry.load_file(&path).unwrap().width(), 7);
        assert!(matches!(
            registry.load_file(&dir.path().join("missing.png")),
            Err(LoaderError::Io { .. })
        ));
    }
}
