//! Rasterized difference maps for saved results.
//!
//! Every polygon of a result is filled with its class color on a black
//! canvas the size of the target image. The canvas is built in BGR channel
//! order, scaled by [`PREVIEW_INTENSITY`] and returned in RGB order.

use std::collections::HashMap;
use std::path::Path;

use image::{Rgb, Rgb32FImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use ndarray::{Array3, Axis};

use crate::color_utils::rgb_to_unit;
use crate::constants::PREVIEW_INTENSITY;
use crate::format::{AnnotationResult, ResultEntry};
use crate::model::ClassPalette;

/// Errors raised while rendering previews.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("No color defined for class '{tag}'")]
    UnknownClass { tag: String },

    #[error("Polygon of class '{tag}' has a non-finite vertex")]
    NonFiniteVertex { tag: String },

    #[error("Failed to write preview: {0}")]
    Image(#[from] image::ImageError),

    #[error("Preview canvas has an invalid shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Resolves a class tag to an RGB color.
pub trait ColorLookup {
    fn color_for(&self, tag: &str) -> Option<[u8; 3]>;
}

impl ColorLookup for ClassPalette {
    fn color_for(&self, tag: &str) -> Option<[u8; 3]> {
        self.color_of(tag)
    }
}

impl ColorLookup for HashMap<String, [u8; 3]> {
    fn color_for(&self, tag: &str) -> Option<[u8; 3]> {
        self.get(tag).copied()
    }
}

/// Rendered preview, shape `(height, width, 3)` in RGB order.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRaster {
    pixels: Array3<f32>,
}

impl PreviewRaster {
    pub fn width(&self) -> u32 {
        self.pixels.len_of(Axis(1)) as u32
    }

    pub fn height(&self) -> u32 {
        self.pixels.len_of(Axis(0)) as u32
    }

    pub fn pixels(&self) -> &Array3<f32> {
        &self.pixels
    }

    /// RGB value at column `x`, row `y`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 3]> {
        let (row, col) = (y as usize, x as usize);
        (x < self.width() && y < self.height())
            .then(|| std::array::from_fn(|c| self.pixels[[row, col, c]]))
    }

    /// 8-bit RGB copy, saturating at 0 and 255.
    pub fn to_rgb_image(&self) -> image::RgbImage {
        image::RgbImage::from_fn(self.width(), self.height(), |x, y| {
            let (row, col) = (y as usize, x as usize);
            image::Rgb(std::array::from_fn(|c| {
                self.pixels[[row, col, c]].clamp(0.0, 255.0) as u8
            }))
        })
    }

    pub fn save_png(&self, path: &Path) -> Result<(), PreviewError> {
        self.to_rgb_image()
            .save_with_format(path, image::ImageFormat::Png)?;
        log::info!("Saved preview to {:?}", path);
        Ok(())
    }
}

/// Renders saved results as colored masks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewRenderer;

impl PreviewRenderer {
    /// Render `result` onto a `width × height` canvas.
    ///
    /// Returns `None` for a skipped pair. Later polygons paint over earlier
    /// ones.
    pub fn render(
        &self,
        result: &AnnotationResult,
        width: u32,
        height: u32,
        lookup: &impl ColorLookup,
    ) -> Result<Option<PreviewRaster>, PreviewError> {
        let entries = match result {
            AnnotationResult::Skipped => return Ok(None),
            AnnotationResult::Annotated(entries) => entries,
        };

        // Painted in BGR order, matching the source bands
        let mut canvas = Rgb32FImage::new(width, height);
        for entry in entries {
            let rgb = lookup
                .color_for(&entry.tag)
                .ok_or_else(|| PreviewError::UnknownClass {
                    tag: entry.tag.clone(),
                })?;
            let [r, g, b] = rgb_to_unit(rgb);
            fill_polygon(&mut canvas, pixel_vertices(entry)?, Rgb([b, g, r]));
        }

        let mut pixels =
            Array3::from_shape_vec((height as usize, width as usize, 3), canvas.into_raw())?;
        pixels.mapv_inplace(|v| v * PREVIEW_INTENSITY);
        pixels.invert_axis(Axis(2));
        let pixels = pixels.as_standard_layout().into_owned();

        log::debug!(
            "Rendered preview of {} polygons at {}x{}",
            entries.len(),
            width,
            height
        );
        Ok(Some(PreviewRaster { pixels }))
    }
}

/// Vertices are clamped to this distance from the origin so the integer
/// edge arithmetic of the rasterizer stays in range.
const VERTEX_LIMIT: f64 = 1_048_576.0;

/// Vertices truncated to integer pixel coordinates.
fn pixel_vertices(entry: &ResultEntry) -> Result<Vec<Point<i32>>, PreviewError> {
    entry
        .polygon
        .vertices()
        .iter()
        .map(|p| {
            if !(p.x.is_finite() && p.y.is_finite()) {
                return Err(PreviewError::NonFiniteVertex {
                    tag: entry.tag.clone(),
                });
            }
            let clamp = |v: f64| v.trunc().clamp(-VERTEX_LIMIT, VERTEX_LIMIT) as i32;
            Ok(Point::new(clamp(p.x), clamp(p.y)))
        })
        .collect()
}

/// Fill the interior and the outline of a closed polygon.
fn fill_polygon(canvas: &mut Rgb32FImage, mut vertices: Vec<Point<i32>>, color: Rgb<f32>) {
    // The polygon closes implicitly; a repeated first vertex is dropped
    while vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }

    match vertices.as_slice() {
        [] => {}
        [p] => {
            if let (Ok(x), Ok(y)) = (u32::try_from(p.x), u32::try_from(p.y))
                && x < canvas.width()
                && y < canvas.height()
            {
                canvas.put_pixel(x, y, color);
            }
        }
        poly => draw_polygon_mut(canvas, poly, color),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImagePoint, ImagePolygon, default_classes};

    fn entry(points: &[(f64, f64)], tag: &str) -> ResultEntry {
        let polygon: ImagePolygon = points.iter().map(|&(x, y)| ImagePoint::new(x, y)).collect();
        ResultEntry::new(polygon, tag)
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64, tag: &str) -> ResultEntry {
        entry(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1)], tag)
    }

    #[test]
    fn test_skipped_yields_nothing() {
        let raster = PreviewRenderer
            .render(&AnnotationResult::Skipped, 10, 10, &default_classes())
            .unwrap();
        assert!(raster.is_none());
    }

    #[test]
    fn test_empty_result_is_black() {
        let raster = PreviewRenderer
            .render(&AnnotationResult::Annotated(vec![]), 4, 3, &default_classes())
            .unwrap()
            .unwrap();
        assert_eq!((raster.width(), raster.height()), (4, 3));
        assert!(raster.pixels().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_fill_uses_class_color_in_rgb() {
        let result = AnnotationResult::Annotated(vec![square(2.0, 2.0, 6.0, 6.0, "removed building")]);
        let raster = PreviewRenderer
            .render(&result, 10, 10, &default_classes())
            .unwrap()
            .unwrap();

        // red, scaled by the preview intensity
        assert_eq!(raster.pixel(4, 4), Some([125.0, 0.0, 0.0]));
        assert_eq!(raster.pixel(2, 2), Some([125.0, 0.0, 0.0]));
        assert_eq!(raster.pixel(6, 6), Some([125.0, 0.0, 0.0]));
        assert_eq!(raster.pixel(7, 4), Some([0.0, 0.0, 0.0]));
        assert_eq!(raster.pixel(1, 1), Some([0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_green_class() {
        let result = AnnotationResult::Annotated(vec![square(0.0, 0.0, 3.0, 3.0, "added building")]);
        let raster = PreviewRenderer
            .render(&result, 5, 5, &default_classes())
            .unwrap()
            .unwrap();
        let [r, g, b] = raster.pixel(1, 1).unwrap();
        assert_eq!(r, 0.0);
        assert!((g - 128.0 / 255.0 * 125.0).abs() < 1e-3);
        assert_eq!(b, 0.0);
    }

    #[test]
    fn test_later_polygon_overwrites() {
        let result = AnnotationResult::Annotated(vec![
            square(0.0, 0.0, 8.0, 8.0, "removed building"),
            square(4.0, 4.0, 8.0, 8.0, "blue"),
        ]);
        let mut lookup: HashMap<String, [u8; 3]> = HashMap::new();
        lookup.insert("removed building".to_string(), [255, 0, 0]);
        lookup.insert("blue".to_string(), [0, 0, 255]);

        let raster = PreviewRenderer.render(&result, 10, 10, &lookup).unwrap().unwrap();
        assert_eq!(raster.pixel(2, 2), Some([125.0, 0.0, 0.0]));
        assert_eq!(raster.pixel(6, 6), Some([0.0, 0.0, 125.0]));
    }

    #[test]
    fn test_vertices_truncated() {
        let result = AnnotationResult::Annotated(vec![entry(&[(3.9, 1.7)], "removed building")]);
        let raster = PreviewRenderer
            .render(&result, 6, 6, &default_classes())
            .unwrap()
            .unwrap();
        assert_eq!(raster.pixel(3, 1), Some([125.0, 0.0, 0.0]));
        assert_eq!(raster.pixel(4, 2), Some([0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_triangle_interior() {
        let result = AnnotationResult::Annotated(vec![entry(
            &[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)],
            "removed building",
        )]);
        let raster = PreviewRenderer
            .render(&result, 12, 12, &default_classes())
            .unwrap()
            .unwrap();
        assert_eq!(raster.pixel(2, 2), Some([125.0, 0.0, 0.0]));
        assert_eq!(raster.pixel(0, 9), Some([125.0, 0.0, 0.0]));
        assert_eq!(raster.pixel(8, 8), Some([0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_out_of_bounds_is_clipped() {
        let result = AnnotationResult::Annotated(vec![square(-5.0, -5.0, 50.0, 50.0, "uncertain")]);
        let raster = PreviewRenderer
            .render(&result, 4, 4, &default_classes())
            .unwrap()
            .unwrap();
        assert!(raster.pixels().index_axis(Axis(2), 0).iter().all(|&v| v == 125.0));
    }

    #[test]
    fn test_unknown_class() {
        let result = AnnotationResult::Annotated(vec![square(0.0, 0.0, 1.0, 1.0, "pond")]);
        let err = PreviewRenderer
            .render(&result, 4, 4, &default_classes())
            .unwrap_err();
        assert!(matches!(err, PreviewError::UnknownClass { tag } if tag == "pond"));
    }

    #[test]
    fn test_to_rgb_image_and_save() {
        let result = AnnotationResult::Annotated(vec![square(0.0, 0.0, 1.0, 1.0, "removed building")]);
        let raster = PreviewRenderer
            .render(&result, 3, 2, &default_classes())
            .unwrap()
            .unwrap();

        let img = raster.to_rgb_image();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(0, 0).0, [125, 0, 0]);
        assert_eq!(img.get_pixel(2, 1).0, [0, 0, 0]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.png");
        raster.save_png(&path).unwrap();
        assert_eq!(image::open(&path).unwrap().to_rgb8(), img);
    }

    #[test]
    fn test_far_vertices_are_clamped() {
        let result = AnnotationResult::Annotated(vec![entry(
            &[(-1e300, 0.0), (1e300, 0.0), (0.0, 5.0)],
            "uncertain",
        )]);
        let raster = PreviewRenderer
            .render(&result, 10, 10, &default_classes())
            .unwrap()
            .unwrap();

        let [r, g, b] = raster.pixel(5, 2).unwrap();
        assert_eq!(r, 125.0);
        assert!((g - 165.0 / 255.0 * 125.0).abs() < 1e-3);
        assert_eq!(b, 0.0);
        assert_eq!(raster.pixel(5, 8), Some([0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_non_finite_vertex() {
        let result = AnnotationResult::Annotated(vec![entry(
            &[(0.0, 0.0), (f64::NAN, 1.0), (2.0, 2.0)],
            "uncertain",
        )]);
        let err = PreviewRenderer
            .render(&result, 4, 4, &default_classes())
            .unwrap_err();
        assert!(matches!(err, PreviewError::NonFiniteVertex { tag } if tag == "uncertain"));
    }

    #[test]
    fn test_explicitly_closed_polygons() {
        let result = AnnotationResult::Annotated(vec![
            entry(&[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0), (1.0, 1.0)], "removed building"),
            entry(&[(6.0, 6.0), (6.0, 6.0)], "removed building"),
        ]);
        let raster = PreviewRenderer
            .render(&result, 8, 8, &default_classes())
            .unwrap()
            .unwrap();
        assert_eq!(raster.pixel(2, 2), Some([125.0, 0.0, 0.0]));
        assert_eq!(raster.pixel(6, 6), Some([125.0, 0.0, 0.0]));
        assert_eq!(raster.pixel(5, 5), Some([0.0, 0.0, 0.0]));
    }
}
