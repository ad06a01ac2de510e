//! LuxEdit Core - non-destructive raster editing engine
//!
//! This crate holds the pure, synchronous half of the editor: tone curves
//! reduced to lookup tables, the oriented crop box and its extraction, the
//! color adjustment pipeline compiled from a settings map, and masked
//! adjustment layers built from brush and gradient tools.
//!
//! # Render order
//!
//! 1. Crop extraction ([`transform::extract_crop`])
//! 2. Global color pipeline ([`ColorPipeline`])
//! 3. Each visible layer, bottom to top ([`mask::composite_layers`])
//!
//! Scheduling and undo live in the `luxedit-session` crate.

pub mod adjustments;
pub mod curve;
pub mod error;
pub mod layer;
pub mod mask;
pub mod raster;
pub mod settings;
pub mod transform;

pub use adjustments::ColorPipeline;
pub use curve::{apply_tone_curve, ParametricCurve, PointCurve, ToneCurve, ToneCurveLut};
pub use error::EditError;
pub use layer::{BooleanMode, Layer, LayerId, LayerManager, LayerRecord, OperationId};
pub use mask::{MaskBitmap, MaskTool, MaskToolKind, PointerButton, PointerEvent};
pub use raster::{Raster, ResizeFilter};
pub use settings::{SettingValue, Settings};
pub use transform::{extract_crop, CropBox, CropController};

/// Tone curve control point
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CurvePoint {
    /// Input value (0.0 to 1.0)
    pub x: f32,
    /// Output value (0.0 to 1.0)
    pub y: f32,
}

impl CurvePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}
