//! The editable image: source pixels, edit state, published outputs and history.
//!
//! # Outputs
//!
//! Rendered outputs are stamped with the render generation that produced
//! them. A publish from an older generation never replaces a newer one, so
//! a slow pass finishing late cannot clobber a fresher result.

use std::sync::Arc;
use std::time::Duration;

use luxedit_core::mask::MaskBitmap;
use luxedit_core::{CropBox, CropController, Layer, LayerManager, LayerRecord, Raster, Settings};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::history::{EditSnapshot, History};

// ============================================================================
// Render Output
// ============================================================================

/// A published render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub generation: u64,
    pub raster: Arc<Raster>,
}

fn publish(slot: &mut Option<RenderOutput>, generation: u64, raster: Arc<Raster>) -> bool {
    if slot.as_ref().is_some_and(|current| current.generation > generation) {
        tracing::trace!(generation, "dropping stale publish");
        return false;
    }
    *slot = Some(RenderOutput { generation, raster });
    true
}

/// Owned copy of everything a render pass reads, taken at pass start.
#[derive(Debug, Clone)]
pub struct RenderInput {
    pub original: Arc<Raster>,
    pub preview: Arc<Raster>,
    pub settings: Settings,
    pub crop: CropBox,
    pub crop_editing: bool,
    pub layers: Vec<Layer>,
    pub background_mask: Option<MaskBitmap>,
}

impl RenderInput {
    /// Factors mapping original pixel coordinates onto the preview.
    pub fn preview_scale(&self) -> (f64, f64) {
        (
            self.preview.width as f64 / self.original.width.max(1) as f64,
            self.preview.height as f64 / self.original.height.max(1) as f64,
        )
    }
}

// ============================================================================
// Editable Image
// ============================================================================

#[derive(Debug)]
pub struct EditableImage {
    original: Arc<Raster>,
    preview: Arc<Raster>,
    edited_preview: Option<RenderOutput>,
    edited: Option<RenderOutput>,
    settings: Settings,
    crop: CropController,
    crop_editing: bool,
    layers: LayerManager,
    background_mask: Option<MaskBitmap>,
    history: History,
}

impl EditableImage {
    /// Wrap a source raster with neutral settings and a full-canvas crop.
    ///
    /// The preview is the original downscaled so its long edge is at most
    /// `config.preview_max_edge`. History starts with the initial state.
    pub fn new(original: Raster, config: &SessionConfig) -> Result<Self, SessionError> {
        if original.is_empty() {
            return Err(SessionError::EmptyRaster);
        }

        let original = Arc::new(original);
        let preview = if original.width.max(original.height) > config.preview_max_edge {
            Arc::new(original.resize_to_fit(config.preview_max_edge, config.preview_filter))
        } else {
            Arc::clone(&original)
        };
        tracing::debug!(
            width = original.width,
            height = original.height,
            preview_width = preview.width,
            preview_height = preview.height,
            "opened image"
        );

        let mut image = Self {
            crop: CropController::new(original.width as f64, original.height as f64),
            original,
            preview,
            edited_preview: None,
            edited: None,
            settings: Settings::default_image(),
            crop_editing: false,
            layers: LayerManager::new(),
            background_mask: None,
            history: History::new(
                config.history_limit,
                Duration::from_millis(config.history_debounce_ms),
            ),
        };
        image.save_state(false);
        Ok(image)
    }

    pub fn original(&self) -> &Arc<Raster> {
        &self.original
    }

    pub fn preview(&self) -> &Arc<Raster> {
        &self.preview
    }

    pub fn edited_preview(&self) -> Option<&RenderOutput> {
        self.edited_preview.as_ref()
    }

    pub fn edited(&self) -> Option<&RenderOutput> {
        self.edited.as_ref()
    }

    /// Store a preview render unless a newer one is already published.
    pub fn publish_preview(&mut self, generation: u64, raster: Arc<Raster>) -> bool {
        publish(&mut self.edited_preview, generation, raster)
    }

    /// Store a full-resolution render unless a newer one is already published.
    pub fn publish_full(&mut self, generation: u64, raster: Arc<Raster>) -> bool {
        publish(&mut self.edited, generation, raster)
    }

    // ------------------------------------------------------------------------
    // Edit state
    // ------------------------------------------------------------------------

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn crop(&self) -> &CropController {
        &self.crop
    }

    pub fn crop_mut(&mut self) -> &mut CropController {
        &mut self.crop
    }

    pub fn crop_box(&self) -> CropBox {
        self.crop.crop_box()
    }

    /// While crop-editing, renders show the uncropped image.
    pub fn set_crop_editing(&mut self, editing: bool) {
        self.crop_editing = editing;
    }

    pub fn is_crop_editing(&self) -> bool {
        self.crop_editing
    }

    pub fn layers(&self) -> &LayerManager {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut LayerManager {
        &mut self.layers
    }

    pub fn background_mask(&self) -> Option<&MaskBitmap> {
        self.background_mask.as_ref()
    }

    /// Subject mask for background blur; white keeps the subject sharp.
    pub fn set_background_mask(&mut self, mask: Option<MaskBitmap>) {
        self.background_mask = mask;
    }

    /// Replace settings from their persisted JSON form.
    pub fn load_settings_json(&mut self, json: &str) -> Result<(), SessionError> {
        self.settings = Settings::from_json(json)?;
        Ok(())
    }

    pub fn settings_json(&self) -> Result<String, SessionError> {
        Ok(self.settings.to_json()?)
    }

    /// Replace the layer stack from persisted records.
    pub fn load_layer_records(&mut self, records: &[LayerRecord]) -> Result<(), SessionError> {
        self.layers = LayerManager::from_records(records)?;
        Ok(())
    }

    pub fn layer_records(&self) -> Result<Vec<LayerRecord>, SessionError> {
        Ok(self.layers.to_records()?)
    }

    pub fn render_input(&self) -> RenderInput {
        RenderInput {
            original: Arc::clone(&self.original),
            preview: Arc::clone(&self.preview),
            settings: self.settings.clone(),
            crop: self.crop.crop_box(),
            crop_editing: self.crop_editing,
            layers: self.layers.layers().to_vec(),
            background_mask: self.background_mask.clone(),
        }
    }

    // ------------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------------

    pub fn snapshot(&self) -> EditSnapshot {
        EditSnapshot {
            settings: self.settings.clone(),
            layers: self.layers.clone(),
            crop: self.crop.crop_box(),
            crop_ratio: self.crop.locked_ratio(),
        }
    }

    pub fn restore(&mut self, snapshot: &EditSnapshot) {
        self.settings = snapshot.settings.clone();
        self.layers = snapshot.layers.clone();
        self.crop.restore(snapshot.crop, snapshot.crop_ratio);
    }

    /// Record the current state. `debounced` saves right after an undo/redo
    /// are dropped so slider echoes do not erase the redo branch.
    pub fn save_state(&mut self, debounced: bool) -> bool {
        let snapshot = self.snapshot();
        self.history.save(snapshot, debounced)
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo().cloned() {
            Some(snapshot) => {
                self.restore(&snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo().cloned() {
            Some(snapshot) => {
                self.restore(&snapshot);
                true
            }
            None => false,
        }
    }

    /// Forget all history and start over from the current state.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.save_state(false);
    }

    pub fn history(&self) -> &History {
        &self.history
    }
}
