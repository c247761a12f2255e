//! Data models for cdtag.

mod category;
mod geometry;

pub use category::{ClassDefinition, ClassPalette, PaletteError, default_classes};
pub use geometry::{
    Extent, Image, ImagePoint, ImagePolygon, Panel, PanelPoint, PanelPolygon, Point, Polygon,
};
