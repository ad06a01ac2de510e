//! The mask tool capability set.
//!
//! Every tool can be resized to a display surface, edited with pointer
//! events, hit-tested, cloned, loaded from a bitmap and asked to render its
//! mask at any size. Tools are a closed set, so they are one enum.

use serde::{Deserialize, Serialize};

use super::{BrushTool, LinearGradientTool, MaskBitmap, RadialGradientTool};
use crate::error::EditError;

/// Display surfaces larger than this are edited through a reduced working mask.
pub const WORKING_MASK_EDGE: u32 = 1000;

/// Working mask dimensions for a display surface.
///
/// The display is divided by `max(max(w, h) / 1000, 1)` (integer division).
pub fn working_size(width: u32, height: u32) -> (u32, u32) {
    let div = (width.max(height) / WORKING_MASK_EDGE).max(1);
    ((width / div).max(1), (height / div).max(1))
}

// ============================================================================
// Pointer Input
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// A pointer sample in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub x: f32,
    pub y: f32,
    pub button: PointerButton,
    /// Erase modifier held (brush strokes subtract).
    pub erase: bool,
}

impl PointerEvent {
    pub fn primary(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            button: PointerButton::Primary,
            erase: false,
        }
    }

    pub fn secondary(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            button: PointerButton::Secondary,
            erase: false,
        }
    }

    pub fn with_erase(mut self) -> Self {
        self.erase = true;
        self
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    #[inline]
    pub(crate) fn pos(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

#[inline]
pub(crate) fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

// ============================================================================
// Tool
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaskToolKind {
    Brush,
    LinearGradient,
    RadialGradient,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaskTool {
    Brush(BrushTool),
    LinearGradient(LinearGradientTool),
    RadialGradient(RadialGradientTool),
}

impl MaskTool {
    /// A fresh tool with no geometry and no display surface.
    pub fn new(kind: MaskToolKind) -> Self {
        match kind {
            MaskToolKind::Brush => MaskTool::Brush(BrushTool::default()),
            MaskToolKind::LinearGradient => MaskTool::LinearGradient(LinearGradientTool::default()),
            MaskToolKind::RadialGradient => MaskTool::RadialGradient(RadialGradientTool::default()),
        }
    }

    /// Rebuild a tool of `kind` from a persisted mask blob.
    pub fn from_blob(kind: MaskToolKind, blob: &str) -> Result<Self, EditError> {
        let mut tool = Self::new(kind);
        tool.load_bitmap(MaskBitmap::from_blob(blob)?);
        Ok(tool)
    }

    pub fn kind(&self) -> MaskToolKind {
        match self {
            MaskTool::Brush(_) => MaskToolKind::Brush,
            MaskTool::LinearGradient(_) => MaskToolKind::LinearGradient,
            MaskTool::RadialGradient(_) => MaskToolKind::RadialGradient,
        }
    }

    pub fn display_size(&self) -> (u32, u32) {
        match self {
            MaskTool::Brush(t) => t.display_size(),
            MaskTool::LinearGradient(t) => t.display_size(),
            MaskTool::RadialGradient(t) => t.display_size(),
        }
    }

    /// Attach the tool to a display surface of the given size.
    pub fn resize(&mut self, width: u32, height: u32) {
        match self {
            MaskTool::Brush(t) => t.resize(width, height),
            MaskTool::LinearGradient(t) => t.resize(width, height),
            MaskTool::RadialGradient(t) => t.resize(width, height),
        }
    }

    /// Returns true when the rendered mask may have changed.
    pub fn pointer_down(&mut self, event: PointerEvent) -> bool {
        match self {
            MaskTool::Brush(t) => t.pointer_down(event),
            MaskTool::LinearGradient(t) => t.pointer_down(event),
            MaskTool::RadialGradient(t) => t.pointer_down(event),
        }
    }

    /// Returns true when the rendered mask may have changed.
    pub fn pointer_move(&mut self, event: PointerEvent) -> bool {
        match self {
            MaskTool::Brush(t) => t.pointer_move(event),
            MaskTool::LinearGradient(t) => t.pointer_move(event),
            MaskTool::RadialGradient(t) => t.pointer_move(event),
        }
    }

    /// Ends the current interaction. Returns true if one was active.
    pub fn pointer_up(&mut self, event: PointerEvent) -> bool {
        match self {
            MaskTool::Brush(t) => t.pointer_up(event),
            MaskTool::LinearGradient(t) => t.pointer_up(event),
            MaskTool::RadialGradient(t) => t.pointer_up(event),
        }
    }

    /// True when a press at `(x, y)` would grab existing geometry.
    pub fn hit_test(&self, x: f32, y: f32) -> bool {
        match self {
            MaskTool::Brush(t) => t.hit_test(x, y),
            MaskTool::LinearGradient(t) => t.hit_test(x, y),
            MaskTool::RadialGradient(t) => t.hit_test(x, y),
        }
    }

    /// Render the mask at `width` x `height`, or `None` if the tool has nothing to draw from.
    pub fn render_mask(&self, width: u32, height: u32) -> Option<MaskBitmap> {
        if width == 0 || height == 0 {
            return None;
        }
        match self {
            MaskTool::Brush(t) => t.render_mask(width, height),
            MaskTool::LinearGradient(t) => t.render_mask(width, height),
            MaskTool::RadialGradient(t) => t.render_mask(width, height),
        }
    }

    /// Replace the tool's content with a bitmap; the display adopts its size.
    pub fn load_bitmap(&mut self, bitmap: MaskBitmap) {
        match self {
            MaskTool::Brush(t) => t.load_bitmap(bitmap),
            MaskTool::LinearGradient(t) => t.load_bitmap(bitmap),
            MaskTool::RadialGradient(t) => t.load_bitmap(bitmap),
        }
    }

    /// Render at display size and encode as a blob. `None` when nothing renders.
    pub fn to_blob(&self) -> Result<Option<String>, EditError> {
        let (width, height) = self.display_size();
        self.render_mask(width, height)
            .map(|mask| mask.to_blob())
            .transpose()
    }
}
