//! Save/skip/advance workflow over one batch of image pairs.
//!
//! An [`AnnotationSession`] owns the polygon editor for the pair on screen
//! and knows where its result record goes. Saving maps the committed
//! polygons onto the target image grid, writes the record, renders a
//! preview and, in auto-advance mode, loads the next pending pair.

use std::path::{Path, PathBuf};

use crate::config::{AppConfig, ConfigError};
use crate::data::{DisplayRaster, LoaderError, LoaderRegistry};
use crate::editor::PolygonEditor;
use crate::format::{AnnotationResult, RecordError, ResultStore};
use crate::mapping::MappingError;
use crate::model::{ClassPalette, Extent};
use crate::preview::{PreviewError, PreviewRaster, PreviewRenderer};
use crate::scheduler::{FileLister, FsLister, PairRecord, PairScheduler, PairStatus, ScanError};

/// Errors raised by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No target selected")]
    NoTarget,

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Preview(#[from] PreviewError),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result of looking for the next pair to annotate.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Pair now loaded; `None` when no pending pair could be loaded
    pub pair: Option<PairRecord>,
    /// Pending pairs passed over because an image failed to load
    pub failures: Vec<(PairRecord, SessionError)>,
}

/// A result record that was written.
#[derive(Debug)]
pub struct SavedPair {
    pub path: PathBuf,
    pub result: AnnotationResult,
    /// `None` when the pair was skipped or rendering failed
    pub preview: Option<PreviewRaster>,
    /// Outcome of loading the next pair in auto-advance mode
    pub advance: Option<LoadOutcome>,
    /// Steps after the write that failed; the record stays on disk
    pub errors: Vec<SessionError>,
}

impl SavedPair {
    /// Pair loaded afterwards, if any.
    pub fn next(&self) -> Option<&PairRecord> {
        self.advance.as_ref()?.pair.as_ref()
    }
}

/// Outcome of a save or skip request.
#[derive(Debug)]
pub enum SaveOutcome {
    Saved(SavedPair),
    /// No output path was chosen; nothing was written
    NoOutputPath,
}

/// Previews of every finished pair in a batch.
#[derive(Debug, Default)]
pub struct BatchPreview {
    /// Rendered pairs; `None` for skipped pairs
    pub rendered: Vec<(PairRecord, Option<PreviewRaster>)>,
    /// Pairs whose record or target could not be read
    pub failures: Vec<(PairRecord, SessionError)>,
}

/// One image shown in the session.
#[derive(Debug, Clone)]
struct LoadedImage {
    path: PathBuf,
    raster: DisplayRaster,
}

/// Annotation workflow state for a batch.
pub struct AnnotationSession<L = FsLister> {
    scheduler: PairScheduler<L>,
    palette: ClassPalette,
    editor: PolygonEditor,
    registry: LoaderRegistry,
    store: ResultStore,
    renderer: PreviewRenderer,
    auto_advance: bool,
    reference: Option<LoadedImage>,
    target: Option<LoadedImage>,
    output: Option<PathBuf>,
}

impl AnnotationSession<FsLister> {
    /// Session over the directories and classes of a configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, SessionError> {
        let scheduler = PairScheduler::on_disk(config.pair_dirs(), config.naming_tags());
        let panel_side = f64::from(config.preferences.panel_size);
        let mut session = Self::new(
            scheduler,
            config.palette()?,
            Extent::new(panel_side, panel_side),
        );
        session.set_auto_advance(config.preferences.auto_advance);
        Ok(session)
    }
}

impl<L: FileLister> AnnotationSession<L> {
    pub fn new(scheduler: PairScheduler<L>, palette: ClassPalette, panel: Extent) -> Self {
        let editor = PolygonEditor::new(palette.first_tag(), panel);
        Self {
            scheduler,
            palette,
            editor,
            registry: LoaderRegistry::new(),
            store: ResultStore,
            renderer: PreviewRenderer,
            auto_advance: true,
            reference: None,
            target: None,
            output: None,
        }
    }

    pub fn set_auto_advance(&mut self, auto_advance: bool) {
        self.auto_advance = auto_advance;
    }

    pub fn auto_advance(&self) -> bool {
        self.auto_advance
    }

    pub fn scheduler(&self) -> &PairScheduler<L> {
        &self.scheduler
    }

    pub fn palette(&self) -> &ClassPalette {
        &self.palette
    }

    pub fn editor(&self) -> &PolygonEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut PolygonEditor {
        &mut self.editor
    }

    pub fn reference_path(&self) -> Option<&Path> {
        self.reference.as_ref().map(|img| img.path.as_path())
    }

    pub fn target_path(&self) -> Option<&Path> {
        self.target.as_ref().map(|img| img.path.as_path())
    }

    pub fn reference_raster(&self) -> Option<&DisplayRaster> {
        self.reference.as_ref().map(|img| &img.raster)
    }

    pub fn target_raster(&self) -> Option<&DisplayRaster> {
        self.target.as_ref().map(|img| &img.raster)
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    /// Choose where the next save writes, or clear the choice.
    pub fn set_output_path(&mut self, path: Option<PathBuf>) {
        self.output = path;
    }

    /// Record path suggested for the selected target.
    pub fn default_output_path(&self) -> Option<PathBuf> {
        self.scheduler.record_path_for_target(self.target_path()?)
    }

    /// Select the reference image manually.
    pub fn select_reference(&mut self, path: &Path) -> Result<(), SessionError> {
        self.reference = Some(self.load_image(path)?);
        Ok(())
    }

    /// Select the target image manually; annotation input is accepted
    /// afterwards.
    pub fn select_target(&mut self, path: &Path) -> Result<(), SessionError> {
        let target = self.load_image(path)?;
        self.editor.load_image(target.raster.extent());
        self.target = Some(target);
        Ok(())
    }

    /// Clear the editor and forget the loaded pair.
    pub fn reset(&mut self) {
        self.editor.reset();
        self.reference = None;
        self.target = None;
        self.output = None;
    }

    /// Reset and load the first pending pair whose images can be read.
    ///
    /// Pairs that fail to load are logged, collected in the outcome and
    /// passed over.
    pub fn load_next(&mut self) -> Result<LoadOutcome, SessionError> {
        self.reset();

        let report = self.scheduler.scan()?;
        let mut outcome = LoadOutcome::default();
        for pair in report.pending_pairs() {
            match self.load_pair(pair) {
                Ok(()) => {
                    log::info!("Loaded pair {:?} ({})", pair.reference, report.summary());
                    outcome.pair = Some(pair.clone());
                    return Ok(outcome);
                }
                Err(e) => {
                    log::warn!("Passing over pair {:?}: {}", pair.reference, e);
                    self.reset();
                    outcome.failures.push((pair.clone(), e));
                }
            }
        }

        log::info!("No pending pairs left to load ({})", report.summary());
        Ok(outcome)
    }

    fn load_pair(&mut self, pair: &PairRecord) -> Result<(), SessionError> {
        self.select_reference(&pair.reference)?;
        self.select_target(&pair.target)?;
        self.output = Some(pair.output.clone());
        Ok(())
    }

    /// Save the committed polygons of the current pair.
    pub fn save(&mut self) -> Result<SaveOutcome, SessionError> {
        self.finish(false)
    }

    /// Record the current pair as skipped.
    pub fn skip(&mut self) -> Result<SaveOutcome, SessionError> {
        self.finish(true)
    }

    fn finish(&mut self, skipped: bool) -> Result<SaveOutcome, SessionError> {
        let Some(target) = &self.target else {
            log::warn!("Save requested without a target image");
            return Err(SessionError::NoTarget);
        };
        let Some(path) = self.output.clone() else {
            log::debug!("Save requested without an output path");
            return Ok(SaveOutcome::NoOutputPath);
        };

        let target_extent = target.raster.extent();
        let result = if skipped {
            AnnotationResult::Skipped
        } else {
            let polygons = self.editor.export_polygons().to_image_space(target_extent)?;
            AnnotationResult::from_tagged(polygons)
        };

        self.store.save(&result, &path)?;

        // The record is written; later failures are reported alongside it
        let mut errors = Vec::new();
        let preview = match self.renderer.render(
            &result,
            target.raster.width(),
            target.raster.height(),
            &self.palette,
        ) {
            Ok(preview) => preview,
            Err(e) => {
                log::warn!("Saved {:?} but could not render its preview: {}", path, e);
                errors.push(SessionError::from(e));
                None
            }
        };

        let advance = if self.auto_advance {
            match self.load_next() {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    log::warn!("Saved {:?} but could not load the next pair: {}", path, e);
                    errors.push(e);
                    None
                }
            }
        } else {
            None
        };

        Ok(SaveOutcome::Saved(SavedPair {
            path,
            result,
            preview,
            advance,
            errors,
        }))
    }

    /// Render the saved result of one pair.
    pub fn preview_pair(
        &self,
        record: &Path,
        target: &Path,
    ) -> Result<Option<PreviewRaster>, SessionError> {
        let result = self.store.load(record)?;
        if result.is_skipped() {
            return Ok(None);
        }
        let raster = self.registry.load_file(target)?;
        Ok(self
            .renderer
            .render(&result, raster.width(), raster.height(), &self.palette)?)
    }

    /// Render every finished pair, collecting per-pair failures.
    pub fn preview_all(&self) -> Result<BatchPreview, SessionError> {
        let report = self.scheduler.scan()?;
        let mut batch = BatchPreview::default();

        for pair in report
            .pairs()
            .iter()
            .filter(|p| p.status == PairStatus::Done)
        {
            match self.preview_pair(&pair.output, &pair.target) {
                Ok(preview) => batch.rendered.push((pair.clone(), preview)),
                Err(e) => {
                    log::warn!("Failed to preview {:?}: {}", pair.output, e);
                    batch.failures.push((pair.clone(), e));
                }
            }
        }

        log::info!(
            "Previewed {} pairs, {} failed",
            batch.rendered.len(),
            batch.failures.len()
        );
        Ok(batch)
    }

    fn load_image(&self, path: &Path) -> Result<LoadedImage, SessionError> {
        let raster = self.registry.load_file(path)?.to_display();
        log::debug!(
            "Loaded {:?} ({}x{})",
            path,
            raster.width(),
            raster.height()
        );
        Ok(LoadedImage {
            path: path.to_path_buf(),
            raster,
        })
    }
}
