//! Panel-to-image coordinate mapping.
//!
//! Annotation points arrive in display panel coordinates and are persisted
//! on the target image's native pixel grid. The display keeps the aspect
//! ratio by fitting the image into a square working region, so both panel
//! axes are normalized against `min(panel_width, panel_height)` before being
//! mapped onto the (possibly non-square) image extent.

use crate::model::{Extent, ImagePoint, ImagePolygon, PanelPoint, PanelPolygon};

/// Errors from coordinate mapping.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MappingError {
    /// Source range has zero width (e.g. a zero-size panel)
    #[error("Degenerate source range [{min}, {max}]")]
    DegeneratePanel { min: f64, max: f64 },

    /// The mapping produced NaN or infinity
    #[error("Non-finite mapped coordinate for input {value}")]
    NonFinite { value: f64 },
}

/// Linearly map `value` from `[old_min, old_max]` onto `[new_min, new_max]`.
///
/// `new_min + (new_max - new_min) * (value - old_min) / (old_max - old_min)`
pub fn map_axis(
    value: f64,
    old_min: f64,
    old_max: f64,
    new_min: f64,
    new_max: f64,
) -> Result<f64, MappingError> {
    let old_span = old_max - old_min;
    if old_span == 0.0 || !old_span.is_finite() {
        return Err(MappingError::DegeneratePanel {
            min: old_min,
            max: old_max,
        });
    }

    let mapped = new_min + (new_max - new_min) * ((value - old_min) / old_span);
    if mapped.is_finite() {
        Ok(mapped)
    } else {
        Err(MappingError::NonFinite { value })
    }
}

/// Maps panel points onto the target image grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelToImage {
    /// Shared side of the square working region in the panel
    side: f64,
    image: Extent,
}

impl PanelToImage {
    /// Create a mapper for a panel and an image extent.
    ///
    /// Fails when the panel has no area to map from.
    pub fn new(panel: Extent, image: Extent) -> Result<Self, MappingError> {
        let side = panel.square_side();
        if side <= 0.0 || !side.is_finite() {
            return Err(MappingError::DegeneratePanel { min: 0.0, max: side });
        }
        Ok(Self { side, image })
    }

    pub fn map_point(&self, p: PanelPoint) -> Result<ImagePoint, MappingError> {
        let x = map_axis(p.x, 0.0, self.side, 0.0, self.image.width)?;
        let y = map_axis(p.y, 0.0, self.side, 0.0, self.image.height)?;
        Ok(ImagePoint::new(x, y))
    }

    pub fn map_polygon(&self, polygon: &PanelPolygon) -> Result<ImagePolygon, MappingError> {
        polygon
            .vertices()
            .iter()
            .map(|p| self.map_point(*p))
            .collect::<Result<Vec<_>, _>>()
            .map(ImagePolygon::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_endpoints_map_to_endpoints() {
        assert_eq!(map_axis(3.0, 3.0, 7.0, -10.0, 10.0), Ok(-10.0));
        assert_eq!(map_axis(7.0, 3.0, 7.0, -10.0, 10.0), Ok(10.0));
    }

    #[test]
    fn test_monotonic() {
        let mut last = f64::NEG_INFINITY;
        for i in 0..=100 {
            let v = f64::from(i) * 0.37;
            let mapped = map_axis(v, 0.0, 37.0, 5.0, 950.0).unwrap();
            assert!(mapped > last);
            last = mapped;
        }
    }

    #[test]
    fn test_midpoint() {
        assert!(approx_eq(map_axis(200.0, 0.0, 400.0, 0.0, 800.0).unwrap(), 400.0));
    }

    #[test]
    fn test_degenerate_range() {
        assert!(matches!(
            map_axis(1.0, 5.0, 5.0, 0.0, 100.0),
            Err(MappingError::DegeneratePanel { .. })
        ));
    }

    #[test]
    fn test_overflow_is_non_finite() {
        assert_eq!(
            map_axis(1e308, 0.0, 1.0, 0.0, 10.0),
            Err(MappingError::NonFinite { value: 1e308 })
        );

        let mapper =
            PanelToImage::new(Extent::new(400.0, 400.0), Extent::new(800.0, 600.0)).unwrap();
        assert!(matches!(
            mapper.map_point(PanelPoint::new(f64::MAX, 1.0)),
            Err(MappingError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_square_working_region_square_panel() {
        let mapper =
            PanelToImage::new(Extent::new(400.0, 400.0), Extent::new(800.0, 600.0)).unwrap();
        let p = mapper.map_point(PanelPoint::new(10.0, 10.0)).unwrap();
        assert!(approx_eq(p.x, 20.0));
        assert!(approx_eq(p.y, 15.0));
    }

    #[test]
    fn test_square_working_region_wide_panel() {
        // Both axes use the 300 px side, not the 600 px width
        let mapper =
            PanelToImage::new(Extent::new(600.0, 300.0), Extent::new(900.0, 900.0)).unwrap();
        let p = mapper.map_point(PanelPoint::new(150.0, 150.0)).unwrap();
        assert!(approx_eq(p.x, 450.0));
        assert!(approx_eq(p.y, 450.0));
    }

    #[test]
    fn test_zero_size_panel() {
        let err = PanelToImage::new(Extent::new(0.0, 300.0), Extent::new(100.0, 100.0));
        assert!(matches!(err, Err(MappingError::DegeneratePanel { .. })));
    }

    #[test]
    fn test_map_polygon_preserves_order() {
        let mapper =
            PanelToImage::new(Extent::new(100.0, 100.0), Extent::new(200.0, 100.0)).unwrap();
        let poly = PanelPolygon::new(vec![
            PanelPoint::new(0.0, 0.0),
            PanelPoint::new(50.0, 0.0),
            PanelPoint::new(50.0, 50.0),
        ]);
        let mapped = mapper.map_polygon(&poly).unwrap();
        let coords: Vec<[f64; 2]> = mapped.vertices().iter().map(|p| p.to_array()).collect();
        assert_eq!(coords, vec![[0.0, 0.0], [100.0, 0.0], [100.0, 50.0]]);
    }
}
