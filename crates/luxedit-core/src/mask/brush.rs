//! Freehand brush masks.
//!
//! Strokes are painted as soft round stamps into a working bitmap that is
//! at most about 1000 pixels on its long edge; rendering resamples it to
//! the requested size.

use std::collections::VecDeque;

use super::tool::{distance, working_size, PointerButton, PointerEvent};
use super::{blend_over, erase, MaskBitmap};

pub const DEFAULT_BRUSH_SIZE: f32 = 10.0;

/// Stamp spacing as a fraction of the brush size.
const STAMP_SPACING: f32 = 0.25;

/// Number of recent samples averaged to smooth a stroke.
const SMOOTHING_WINDOW: usize = 4;

/// Stamp opacity at half the radius.
const HALF_RADIUS_ALPHA: f32 = 100.0 / 255.0;

/// Soft stamp profile: 1 at the center, 100/255 at half radius, 0 at the edge.
///
/// # Arguments
/// * `d` - Distance from the center divided by the radius
#[inline]
fn stamp_alpha(d: f32) -> f32 {
    if d <= 0.5 {
        1.0 + (HALF_RADIUS_ALPHA - 1.0) * (d / 0.5)
    } else if d < 1.0 {
        HALF_RADIUS_ALPHA * (1.0 - (d - 0.5) / 0.5)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Stroke {
    /// Last stamped point, in display coordinates.
    last: (f32, f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrushTool {
    /// Brush radius in display units.
    pub size: f32,
    display: (u32, u32),
    mask: Option<MaskBitmap>,
    stroke: Option<Stroke>,
    recent: VecDeque<(f32, f32)>,
    /// X where a secondary-button size drag started.
    resize_anchor: Option<f32>,
}

impl Default for BrushTool {
    fn default() -> Self {
        Self {
            size: DEFAULT_BRUSH_SIZE,
            display: (0, 0),
            mask: None,
            stroke: None,
            recent: VecDeque::with_capacity(SMOOTHING_WINDOW),
            resize_anchor: None,
        }
    }
}

impl BrushTool {
    pub fn display_size(&self) -> (u32, u32) {
        self.display
    }

    /// The working bitmap, if the tool has been attached to a display.
    pub fn working_mask(&self) -> Option<&MaskBitmap> {
        self.mask.as_ref()
    }

    /// Attach to a display; existing paint is resampled into the new working size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.display = (width, height);
        let (sw, sh) = working_size(width, height);
        self.mask = Some(match self.mask.take() {
            Some(old) => old.resize(sw, sh),
            None => MaskBitmap::new(sw, sh),
        });
    }

    /// Brush strokes have no grabbable geometry.
    pub fn hit_test(&self, _x: f32, _y: f32) -> bool {
        false
    }

    pub fn pointer_down(&mut self, event: PointerEvent) -> bool {
        if !event.is_finite() {
            return false;
        }
        match event.button {
            PointerButton::Primary => {
                self.recent.clear();
                let p = event.pos();
                self.stamp(p, event.erase);
                self.stroke = Some(Stroke { last: p });
                true
            }
            PointerButton::Secondary => {
                self.resize_anchor = Some(event.x);
                false
            }
        }
    }

    pub fn pointer_move(&mut self, event: PointerEvent) -> bool {
        if !event.is_finite() {
            return false;
        }
        if let Some(anchor) = self.resize_anchor {
            self.size = (event.x - anchor).max(1.0);
            return false;
        }
        let Some(stroke) = self.stroke else {
            return false;
        };

        let from = stroke.last;
        let to = event.pos();
        let step = (self.size * STAMP_SPACING).max(0.25);
        let count = (distance(from, to) / step) as usize;

        for i in 1..=count {
            let t = i as f32 / count as f32;
            let p = (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t);
            let smoothed = self.smooth(p);
            self.stamp(smoothed, event.erase);
        }
        let last = self.smooth(to);
        self.stamp(last, event.erase);
        self.stroke = Some(Stroke { last });
        true
    }

    pub fn pointer_up(&mut self, _event: PointerEvent) -> bool {
        self.resize_anchor = None;
        self.stroke.take().is_some()
    }

    /// Average of the last few samples, including `p`.
    fn smooth(&mut self, p: (f32, f32)) -> (f32, f32) {
        self.recent.push_back(p);
        while self.recent.len() > SMOOTHING_WINDOW {
            self.recent.pop_front();
        }
        let n = self.recent.len() as f32;
        let (sx, sy) = self
            .recent
            .iter()
            .fold((0.0, 0.0), |acc, q| (acc.0 + q.0, acc.1 + q.1));
        (sx / n, sy / n)
    }

    /// Paint one soft stamp centered at display point `p`.
    fn stamp(&mut self, p: (f32, f32), subtract: bool) {
        let (dw, dh) = self.display;
        let Some(mask) = self.mask.as_mut() else {
            return;
        };
        if dw == 0 || dh == 0 {
            return;
        }
        let sx = mask.width as f32 / dw as f32;
        let sy = mask.height as f32 / dh as f32;
        let cx = p.0 * sx;
        let cy = p.1 * sy;
        let r = (self.size * sx).max(0.5);

        let x0 = (cx - r).floor().max(0.0) as u32;
        let y0 = (cy - r).floor().max(0.0) as u32;
        let x1 = ((cx + r).ceil().max(0.0) as u32).min(mask.width);
        let y1 = ((cy + r).ceil().max(0.0) as u32).min(mask.height);

        for y in y0..y1 {
            for x in x0..x1 {
                let d = distance((x as f32 + 0.5, y as f32 + 0.5), (cx, cy)) / r;
                let alpha = super::to_byte(stamp_alpha(d));
                if alpha == 0 {
                    continue;
                }
                let current = mask.get(x, y);
                let next = if subtract {
                    erase(current, alpha)
                } else {
                    blend_over(current, alpha)
                };
                mask.set(x, y, next);
            }
        }
    }

    /// Render the working mask at the requested size, or `None` before any display.
    pub fn render_mask(&self, width: u32, height: u32) -> Option<MaskBitmap> {
        if self.display.0 == 0 || self.display.1 == 0 {
            return None;
        }
        self.mask.as_ref().map(|mask| mask.resize(width, height))
    }

    pub fn load_bitmap(&mut self, bitmap: MaskBitmap) {
        self.display = (bitmap.width, bitmap.height);
        let (sw, sh) = working_size(bitmap.width, bitmap.height);
        self.mask = Some(bitmap.resize(sw, sh));
        self.stroke = None;
        self.recent.clear();
    }
}
