//! Decoded raster bands and their display form.

use ndarray::{Array3, ArrayView2, Axis};

use crate::data::LoaderError;
use crate::model::Extent;

/// Order of the first three bands of a source raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    /// Decoded image formats hand out red first
    Rgb,
    /// Band stacks from remote-sensing sources store blue first
    Bgr,
}

/// CPU-side band stack with shape `(bands, height, width)`.
///
/// Values are normalized to roughly `0.0..=1.0`.
#[derive(Debug, Clone)]
pub struct BandStack {
    data: Array3<f32>,
    order: ChannelOrder,
}

impl BandStack {
    pub fn new(data: Array3<f32>, order: ChannelOrder) -> Result<Self, LoaderError> {
        if data.is_empty() {
            return Err(LoaderError::EmptyRaster);
        }
        Ok(Self { data, order })
    }

    pub fn band_count(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn height(&self) -> u32 {
        self.data.len_of(Axis(1)) as u32
    }

    pub fn width(&self) -> u32 {
        self.data.len_of(Axis(2)) as u32
    }

    pub fn extent(&self) -> Extent {
        Extent::from((self.width(), self.height()))
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn band(&self, index: usize) -> Option<ArrayView2<'_, f32>> {
        (index < self.band_count()).then(|| self.data.index_axis(Axis(0), index))
    }

    /// Build the 3-channel display raster.
    ///
    /// With three or more bands the first three are used and reordered to
    /// RGB. With fewer, the first band is replicated as grayscale.
    pub fn to_display(&self) -> DisplayRaster {
        let sources = if self.band_count() >= 3 {
            match self.order {
                ChannelOrder::Rgb => [0, 1, 2],
                ChannelOrder::Bgr => [2, 1, 0],
            }
        } else {
            [0, 0, 0]
        };

        let (height, width) = (self.height() as usize, self.width() as usize);
        let mut pixels = Array3::<f32>::zeros((height, width, 3));
        for (channel, &band) in sources.iter().enumerate() {
            pixels
                .index_axis_mut(Axis(2), channel)
                .assign(&self.data.index_axis(Axis(0), band));
        }

        DisplayRaster { pixels }
    }
}

/// Displayable raster, shape `(height, width, 3)` in RGB order.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRaster {
    pixels: Array3<f32>,
}

impl DisplayRaster {
    pub fn width(&self) -> u32 {
        self.pixels.len_of(Axis(1)) as u32
    }

    pub fn height(&self) -> u32 {
        self.pixels.len_of(Axis(0)) as u32
    }

    pub fn extent(&self) -> Extent {
        Extent::from((self.width(), self.height()))
    }

    pub fn pixels(&self) -> &Array3<f32> {
        &self.pixels
    }

    /// 8-bit RGB copy, clamping values outside `0.0..=1.0`.
    pub fn to_rgb_image(&self) -> image::RgbImage {
        image::RgbImage::from_fn(self.width(), self.height(), |x, y| {
            let (row, col) = (y as usize, x as usize);
            image::Rgb(std::array::from_fn(|c| {
                (self.pixels[[row, col, c]].clamp(0.0, 1.0) * 255.0).round() as u8
            }))
        })
    }
}
