//! Points, extents and polygons.
//!
//! Two coordinate spaces exist: panel space (pointer positions against the
//! current display size) and image space (native pixel grid of the target
//! image). They are separate types parameterized by a marker so a panel
//! point can never be persisted by accident.

use std::fmt;
use std::marker::PhantomData;

/// Marker for display panel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {}

/// Marker for image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Image {}

/// A 2D point in the coordinate space `S`.
pub struct Point<S> {
    pub x: f64,
    pub y: f64,
    space: PhantomData<S>,
}

/// A point reported by pointer events against the display panel.
pub type PanelPoint = Point<Panel>;

/// A point on the native pixel grid of the target image.
pub type ImagePoint = Point<Image>;

impl<S> Point<S> {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            space: PhantomData,
        }
    }

    /// Coordinates as an `[x, y]` pair.
    pub fn to_array(self) -> [f64; 2] {
        [self.x, self.y]
    }
}

// Manual impls so the marker type does not need to implement anything.
impl<S> Clone for Point<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Point<S> {}

impl<S> PartialEq for Point<S> {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl<S> fmt::Debug for Point<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl<S> From<[f64; 2]> for Point<S> {
    fn from(p: [f64; 2]) -> Self {
        Self::new(p[0], p[1])
    }
}

/// Width and height of a panel or an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The largest square fitting in this extent, as a side length.
    pub fn square_side(&self) -> f64 {
        self.width.min(self.height)
    }
}

impl From<(u32, u32)> for Extent {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(f64::from(width), f64::from(height))
    }
}

/// An ordered sequence of vertices in the coordinate space `S`.
///
/// No minimum vertex count is enforced; a committed polygon is immutable.
pub struct Polygon<S> {
    vertices: Vec<Point<S>>,
}

/// A polygon drawn on the display panel.
pub type PanelPolygon = Polygon<Panel>;

/// A polygon on the image pixel grid.
pub type ImagePolygon = Polygon<Image>;

impl<S> Polygon<S> {
    pub fn new(vertices: Vec<Point<S>>) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point<S>] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn into_vertices(self) -> Vec<Point<S>> {
        self.vertices
    }
}

impl<S> Clone for Polygon<S> {
    fn clone(&self) -> Self {
        Self {
            vertices: self.vertices.clone(),
        }
    }
}

impl<S> PartialEq for Polygon<S> {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices
    }
}

impl<S> fmt::Debug for Polygon<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.vertices.iter()).finish()
    }
}

impl<S> FromIterator<Point<S>> for Polygon<S> {
    fn from_iter<I: IntoIterator<Item = Point<S>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
