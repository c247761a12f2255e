//! Loader for NumPy `.npy` files.

use std::io::Cursor;

use ndarray::{Array3, ArrayD, Axis, Ix2, Ix3};
use ndarray_npy::ReadNpyExt;

use crate::data::loader::{LoaderError, RasterLoader};
use crate::data::{BandStack, ChannelOrder};

/// Largest axis length treated as a band axis when guessing layouts.
const MAX_BANDS: usize = 100;

/// Loader for NumPy `.npy` band stacks.
///
/// **Expected array shapes**:
/// - 2D `(H, W)`: single band
/// - 3D `(B, H, W)`: bands first
/// - 3D `(H, W, B)`: channels last
///
/// Bands are taken in stored order, which is blue first for the stacks
/// this tool works with. Supported data types: `f32`, `f64`, `u8`, `u16`,
/// `i16`, `i32`, normalized to 0.0-1.0 by data type.
pub struct NpyLoader;

impl NpyLoader {
    /// NumPy magic bytes: \x93NUMPY
    const MAGIC: &'static [u8] = &[0x93, b'N', b'U', b'M', b'P', b'Y'];

    fn array_to_stack<T>(array: ArrayD<T>) -> Result<BandStack, LoaderError>
    where
        T: NumericConvert + Copy,
    {
        let shape = array.shape().to_vec();
        log::debug!("NpyLoader: array shape = {:?}", shape);
        let array = array.mapv(|v| v.to_normalized_f32());

        let bands: Array3<f32> = match shape.as_slice() {
            [_, _] => array
                .into_dimensionality::<Ix2>()
                .map_err(|_| LoaderError::UnsupportedShape {
                    shape: shape.clone(),
                })?
                .insert_axis(Axis(0)),
            [first, _, last] => {
                let cube = array.into_dimensionality::<Ix3>().map_err(|_| {
                    LoaderError::UnsupportedShape {
                        shape: shape.clone(),
                    }
                })?;
                if Self::is_channels_last(*first, *last) {
                    cube.permuted_axes([2, 0, 1]).as_standard_layout().into_owned()
                } else {
                    cube
                }
            }
            _ => return Err(LoaderError::UnsupportedShape { shape }),
        };

        log::info!(
            "NpyLoader: loaded {}x{} with {} bands",
            bands.len_of(Axis(2)),
            bands.len_of(Axis(1)),
            bands.len_of(Axis(0))
        );
        BandStack::new(bands, ChannelOrder::Bgr)
    }

    /// Guess whether a 3D shape `(first, _, last)` stores bands last.
    ///
    /// Ambiguous shapes default to bands first.
    fn is_channels_last(first: usize, last: usize) -> bool {
        if first <= MAX_BANDS && last > first {
            false
        } else if last <= MAX_BANDS && first > last {
            true
        } else {
            log::warn!(
                "NpyLoader: ambiguous 3D shape ({}, _, {}), assuming bands first",
                first,
                last
            );
            false
        }
    }
}

impl RasterLoader for NpyLoader {
    fn id(&self) -> &'static str {
        "npy"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["npy"]
    }

    fn can_load(&self, data: &[u8]) -> bool {
        data.starts_with(Self::MAGIC)
    }

    fn load(&self, data: &[u8]) -> Result<BandStack, LoaderError> {
        if let Ok(array) = ArrayD::<f32>::read_npy(Cursor::new(data)) {
            return Self::array_to_stack(array);
        }
        if let Ok(array) = ArrayD::<f64>::read_npy(Cursor::new(data)) {
            return Self::array_to_stack(array);
        }
        if let Ok(array) = ArrayD::<u8>::read_npy(Cursor::new(data)) {
            return Self::array_to_stack(array);
        }
        if let Ok(array) = ArrayD::<u16>::read_npy(Cursor::new(data)) {
            return Self::array_to_stack(array);
        }
        if let Ok(array) = ArrayD::<i16>::read_npy(Cursor::new(data)) {
            return Self::array_to_stack(array);
        }
        if let Ok(array) = ArrayD::<i32>::read_npy(Cursor::new(data)) {
            return Self::array_to_stack(array);
        }

        Err(LoaderError::decode(
            self.id(),
            "Failed to read NumPy array: unsupported dtype or invalid format",
        ))
    }

    fn priority(&self) -> i32 {
        10
    }
}

/// Conversion of stored values to normalized f32.
trait NumericConvert {
    fn to_normalized_f32(self) -> f32;
}

impl NumericConvert for f32 {
    fn to_normalized_f32(self) -> f32 {
        self
    }
}

impl NumericConvert for f64 {
    fn to_normalized_f32(self) -> f32 {
        self as f32
    }
}

impl NumericConvert for u8 {
    fn to_normalized_f32(self) -> f32 {
        f32::from(self) / 255.0
    }
}

impl NumericConvert for u16 {
    fn to_normalized_f32(self) -> f32 {
        f32::from(self) / 65535.0
    }
}

impl NumericConvert for i16 {
    fn to_normalized_f32(self) -> f32 {
        (f32::from(self) + 32768.0) / 65535.0
    }
}

impl NumericConvert for i32 {
    fn to_normalized_f32(self) -> f32 {
        ((f64::from(self) + 2_147_483_648.0) / 4_294_967_295.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};
    use ndarray_npy::WriteNpyExt;

    fn npy_bytes<A: WriteNpyExt>(array: &A) -> Vec<u8> {
        let mut bytes = Vec::new();
        array.write_npy(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_loader_metadata() {
        let loader = NpyLoader;
        assert_eq!(loader.id(), "npy");
        assert!(loader.extensions().contains(&"npy"));
        assert_eq!(loader.priority(), 10);
    }

    #[test]
    fn test_magic_detection() {
        let loader = NpyLoader;
        assert!(loader.can_load(&[0x93, b'N', b'U', b'M', b'P', b'Y', 0x01, 0x00]));
        assert!(!loader.can_load(&[0x89, 0x50, 0x4E, 0x47]));
    }

    #[test]
    fn test_numeric_convert() {
        assert_eq!(0u8.to_normalized_f32(), 0.0);
        assert_eq!(255u8.to_normalized_f32(), 1.0);
        assert_eq!(65535u16.to_normalized_f32(), 1.0);
    }

    #[test]
    fn test_load_grayscale() {
        let array = Array2::<u8>::from_elem((4, 6), 255);
        let stack = NpyLoader.load(&npy_bytes(&array)).unwrap();
        assert_eq!(stack.band_count(), 1);
        assert_eq!((stack.width(), stack.height()), (6, 4));
        assert_eq!(stack.band(0).unwrap()[[3, 5]], 1.0);
    }

    #[test]
    fn test_load_bands_first() {
        let array = Array3::<f32>::from_shape_fn((4, 10, 12), |(b, _, _)| b as f32);
        let stack = NpyLoader.load(&npy_bytes(&array)).unwrap();
        assert_eq!(stack.band_count(), 4);
        assert_eq!((stack.width(), stack.height()), (12, 10));
        assert_eq!(stack.band(2).unwrap()[[9, 11]], 2.0);
        assert_eq!(stack.order(), ChannelOrder::Bgr);
    }

    #[test]
    fn test_load_channels_last() {
        let array = Array3::<f64>::from_shape_fn((10, 12, 3), |(r, c, b)| {
            (b * 1000 + r * 100 + c) as f64
        });
        let stack = NpyLoader.load(&npy_bytes(&array)).unwrap();
        assert_eq!(stack.band_count(), 3);
        assert_eq!((stack.width(), stack.height()), (12, 10));
        assert_eq!(stack.band(1).unwrap()[[4, 7]], 1407.0);
    }

    #[test]
    fn test_display_reorders_blue_first_stack() {
        let array = Array3::<f32>::from_shape_fn((3, 5, 5), |(b, _, _)| b as f32 / 2.0);
        let display = NpyLoader.load(&npy_bytes(&array)).unwrap().to_display();
        assert_eq!(display.pixels()[[0, 0, 0]], 1.0);
        assert_eq!(display.pixels()[[0, 0, 2]], 0.0);
    }

    #[test]
    fn test_rejects_one_dimensional() {
        let array = ndarray::Array1::<f32>::zeros(8);
        let err = NpyLoader.load(&npy_bytes(&array)).unwrap_err();
        assert!(matches!(err, LoaderError::UnsupportedShape { .. }));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            NpyLoader.load(b"\x93NUMPYgarbage"),
            Err(LoaderError::Decode { loader: "npy", .. })
        ));
    }
}
