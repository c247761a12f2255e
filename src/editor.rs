//! Polygon annotation state machine for one image pair.
//!
//! Points are collected in panel space as *candidate* points. A commit
//! turns the candidates into a polygon tagged with the active class; undo
//! first drops the candidates and otherwise retracts the last polygon.
//! Committed polygons are never edited.

use serde::{Deserialize, Serialize};

use crate::mapping::{MappingError, PanelToImage};
use crate::model::{Extent, ImagePolygon, PanelPoint, PanelPolygon};

/// A committed polygon and the class tag active when it was committed.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedPolygon {
    pub polygon: PanelPolygon,
    pub tag: String,
}

/// Pointer buttons reported by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    /// Adds a candidate point
    Left,
    /// Commits the candidate points
    Right,
    Other,
}

/// What an undo step removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoAction {
    /// The in-progress candidate points were dropped
    ClearedCandidates,
    /// The most recently committed polygon was removed
    RemovedPolygon,
    /// Nothing to undo
    Nothing,
}

/// Read-only snapshot of the committed annotations.
///
/// `polygons` and `tags` always have the same length; entry `i` of `tags`
/// is the class of polygon `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonExport {
    pub polygons: Vec<PanelPolygon>,
    pub panel: Extent,
    pub tags: Vec<String>,
}

impl PolygonExport {
    /// Map every polygon onto the target image grid, keeping order and tags.
    pub fn to_image_space(
        &self,
        image: Extent,
    ) -> Result<Vec<(ImagePolygon, String)>, MappingError> {
        let mapper = PanelToImage::new(self.panel, image)?;
        self.polygons
            .iter()
            .zip(&self.tags)
            .map(|(poly, tag)| Ok((mapper.map_polygon(poly)?, tag.clone())))
            .collect()
    }
}

/// Owns the candidate points and committed polygons of one session.
#[derive(Debug, Clone)]
pub struct PolygonEditor {
    /// Extent of the displayed image; `None` until an image is loaded
    backing: Option<Extent>,
    /// Current display panel extent
    panel: Extent,
    candidate: Vec<PanelPoint>,
    committed: Vec<TaggedPolygon>,
    active_class: String,
}

impl PolygonEditor {
    /// Create an empty editor with the given active class.
    pub fn new(active_class: impl Into<String>, panel: Extent) -> Self {
        Self {
            backing: None,
            panel,
            candidate: Vec::new(),
            committed: Vec::new(),
            active_class: active_class.into(),
        }
    }

    /// Mark an image as displayed; annotation input is accepted afterwards.
    pub fn load_image(&mut self, extent: Extent) {
        self.backing = Some(extent);
    }

    pub fn has_image(&self) -> bool {
        self.backing.is_some()
    }

    pub fn image_extent(&self) -> Option<Extent> {
        self.backing
    }

    /// Record the current panel size (e.g. after a window resize).
    pub fn resize_panel(&mut self, panel: Extent) {
        self.panel = panel;
    }

    pub fn panel(&self) -> Extent {
        self.panel
    }

    /// Append a candidate point. Ignored while no image is loaded.
    pub fn add_point(&mut self, p: PanelPoint) {
        if !self.has_image() {
            return;
        }
        self.candidate.push(p);
    }

    /// Promote the candidate points to a polygon tagged with the active class.
    ///
    /// Returns `false` and changes nothing when no image is loaded or there
    /// are no candidate points.
    pub fn commit_polygon(&mut self) -> bool {
        if !self.has_image() {
            return false;
        }
        if self.candidate.is_empty() {
            log::debug!("Ignoring commit with no candidate points");
            return false;
        }

        let vertices = std::mem::take(&mut self.candidate);
        log::debug!(
            "Committed polygon with {} vertices as '{}'",
            vertices.len(),
            self.active_class
        );
        self.committed.push(TaggedPolygon {
            polygon: PanelPolygon::new(vertices),
            tag: self.active_class.clone(),
        });
        true
    }

    /// Route a pointer press: left adds a point, right commits.
    pub fn handle_pointer(&mut self, position: PanelPoint, button: PointerButton) {
        match button {
            PointerButton::Left => self.add_point(position),
            PointerButton::Right => {
                self.commit_polygon();
            }
            PointerButton::Other => {}
        }
    }

    /// Drop the candidate points, or else the last committed polygon.
    pub fn undo(&mut self) -> UndoAction {
        if !self.candidate.is_empty() {
            self.candidate.clear();
            UndoAction::ClearedCandidates
        } else if self.committed.pop().is_some() {
            UndoAction::RemovedPolygon
        } else {
            UndoAction::Nothing
        }
    }

    /// Clear everything and unload the image, ready for a new pair.
    pub fn reset(&mut self) {
        self.candidate.clear();
        self.committed.clear();
        self.backing = None;
    }

    /// Change the class used by future commits. Existing polygons keep theirs.
    pub fn set_active_class(&mut self, tag: impl Into<String>) {
        self.active_class = tag.into();
    }

    pub fn active_class(&self) -> &str {
        &self.active_class
    }

    pub fn candidate_points(&self) -> &[PanelPoint] {
        &self.candidate
    }

    pub fn committed(&self) -> &[TaggedPolygon] {
        &self.committed
    }

    /// Committed polygons in commit order.
    pub fn polygons(&self) -> impl Iterator<Item = &PanelPolygon> {
        self.committed.iter().map(|t| &t.polygon)
    }

    /// Class tags of the committed polygons, index-aligned with `polygons()`.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.committed.iter().map(|t| t.tag.as_str())
    }

    pub fn polygon_count(&self) -> usize {
        self.committed.len()
    }

    pub fn export_polygons(&self) -> PolygonExport {
        let (polygons, tags) = self
            .committed
            .iter()
            .map(|t| (t.polygon.clone(), t.tag.clone()))
            .unzip();
        PolygonExport {
            polygons,
            panel: self.panel,
            tags,
        }
    }
}
