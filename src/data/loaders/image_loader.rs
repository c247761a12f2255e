//! Loader for standard image formats (PNG, JPEG, BMP, TIFF, WebP).

use ndarray::Array3;

use crate::data::loader::{LoaderError, RasterLoader};
use crate::data::{BandStack, ChannelOrder};

/// Decodes standard images into three RGB bands normalized to 0.0-1.0.
pub struct ImageLoader;

impl RasterLoader for ImageLoader {
    fn id(&self) -> &'static str {
        "image"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "webp"]
    }

    fn can_load(&self, data: &[u8]) -> bool {
        if data.len() < 8 {
            return false;
        }

        // PNG
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return true;
        }

        // JPEG
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return true;
        }

        // BMP
        if data.starts_with(b"BM") {
            return true;
        }

        // TIFF, little and big endian
        if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return true;
        }

        // WebP: RIFF....WEBP
        data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP"
    }

    fn load(&self, data: &[u8]) -> Result<BandStack, LoaderError> {
        let img = image::load_from_memory(data)
            .map_err(|e| LoaderError::decode(self.id(), format!("Failed to decode image: {}", e)))?
            .to_rgb8();

        let (width, height) = img.dimensions();
        let bands = Array3::from_shape_fn(
            (3, height as usize, width as usize),
            |(band, row, col)| f32::from(img.get_pixel(col as u32, row as u32)[band]) / 255.0,
        );

        log::trace!("ImageLoader: loaded {}x{} image as 3 bands", width, height);
        BandStack::new(bands, ChannelOrder::Rgb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_metadata() {
        let loader = ImageLoader;
        assert_eq!(loader.id(), "image");
        assert!(loader.extensions().contains(&"png"));
        assert!(loader.extensions().contains(&"jpg"));
    }

    #[test]
    fn test_magic_detection() {
        let loader = ImageLoader;
        assert!(loader.can_load(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]));
        assert!(loader.can_load(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46]));
        assert!(!loader.can_load(&[0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]));
    }

    #[test]
    fn test_decode_pixel_values() {
        let mut img = image::RgbImage::new(2, 1);
        img.put_pixel(1, 0, image::Rgb([255, 0, 51]));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let stack = ImageLoader.load(&bytes).unwrap();
        let red = stack.band(0).unwrap();
        let blue = stack.band(2).unwrap();
        assert_eq!(red[[0, 1]], 1.0);
        assert_eq!(red[[0, 0]], 0.0);
        assert!((blue[[0, 1]] - 0.2).abs() < 1e-6);
    }
}
