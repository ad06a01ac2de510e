//! Linear gradient masks.
//!
//! The gradient runs from point A (full effect) to point B (no effect). Both
//! guide lines are perpendicular to AB; everything before A is fully masked
//! and everything past B is untouched.

use serde::{Deserialize, Serialize};

use super::tool::{distance, PointerButton, PointerEvent};
use super::{smootherstep, MaskBitmap};

/// Degenerate gradients are stretched to this length along +x.
const MIN_LENGTH: f32 = 1e-3;

/// Grab radius of the A and B handles, in display units.
pub const HANDLE_RADIUS: f32 = 6.0;

/// Half-width of the strip around AB that counts as "on the gradient".
pub const STRIP_HALF_WIDTH: f32 = 15.0;

// ============================================================================
// Mask Evaluation
// ============================================================================

/// Linear gradient between two points in any consistent coordinate space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearGradientMask {
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
    /// Feather amount (0.0 = hard edge at the midpoint, 1.0 = full gradient)
    pub feather: f32,
}

impl LinearGradientMask {
    /// Create a new linear gradient mask.
    ///
    /// # Arguments
    /// * `start_x`, `start_y` - Start point (full effect side)
    /// * `end_x`, `end_y` - End point (no effect side)
    /// * `feather` - Transition zone width (0.0-1.0)
    pub fn new(start_x: f32, start_y: f32, end_x: f32, end_y: f32, feather: f32) -> Self {
        Self {
            start_x,
            start_y,
            end_x,
            end_y,
            feather: feather.clamp(0.0, 1.0),
        }
    }

    /// Direction from start to end and its squared length.
    ///
    /// A zero-length gradient gets a minimal +x direction so it still
    /// splits the plane at the start point.
    #[inline]
    fn direction_and_len_sq(&self) -> (f32, f32, f32) {
        let dx = self.end_x - self.start_x;
        let dy = self.end_y - self.start_y;
        let len_sq = dx * dx + dy * dy;
        if len_sq < MIN_LENGTH * MIN_LENGTH {
            (MIN_LENGTH, 0.0, MIN_LENGTH * MIN_LENGTH)
        } else {
            (dx, dy, len_sq)
        }
    }

    /// Evaluate the mask strength at a point.
    ///
    /// Returns a value from 0.0 (no effect) to 1.0 (full effect).
    ///
    /// # Algorithm
    /// 1. Project the point onto the start-to-end line
    /// 2. Normalize to get position along the gradient (0 = start, 1 = end)
    /// 3. Apply feathering centered at the midpoint
    /// 4. Use smootherstep for natural transition
    pub fn evaluate(&self, x: f32, y: f32) -> f32 {
        let (dx, dy, len_sq) = self.direction_and_len_sq();

        let t = ((x - self.start_x) * dx + (y - self.start_y) * dy) / len_sq;

        let feather_zone = 0.5 * self.feather.clamp(0.0, 1.0);
        let center = 0.5;

        if t <= center - feather_zone {
            1.0
        } else if t >= center + feather_zone {
            0.0
        } else {
            let local_t = (t - (center - feather_zone)) / (2.0 * feather_zone).max(0.001);
            1.0 - smootherstep(local_t)
        }
    }

    pub fn length(&self) -> f32 {
        let dx = self.end_x - self.start_x;
        let dy = self.end_y - self.start_y;
        (dx * dx + dy * dy).sqrt()
    }
}

// ============================================================================
// Tool
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DragMode {
    #[default]
    None,
    Create,
    Move,
    AxisA,
    AxisB,
}

/// Endpoints of the gradient in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientLine {
    pub a: (f32, f32),
    pub b: (f32, f32),
}

impl GradientLine {
    /// True when `p` lies between the guide lines and within the strip.
    ///
    /// Lines shorter than one display unit have no strip.
    pub fn strip_contains(&self, p: (f32, f32)) -> bool {
        let v = (self.b.0 - self.a.0, self.b.1 - self.a.1);
        let len = (v.0 * v.0 + v.1 * v.1).sqrt();
        if len < 1.0 {
            return false;
        }
        let unit = (v.0 / len, v.1 / len);
        let rel = (p.0 - self.a.0, p.1 - self.a.1);

        let along = rel.0 * unit.0 + rel.1 * unit.1;
        if along < 0.0 || along > len {
            return false;
        }
        let across = (rel.0 * -unit.1 + rel.1 * unit.0).abs();
        across <= STRIP_HALF_WIDTH
    }
}

/// One linear gradient per tool; creating a new one replaces the old.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearGradientTool {
    display: (u32, u32),
    line: Option<GradientLine>,
    mode: DragMode,
    last: (f32, f32),
    /// Mask loaded from a blob; live geometry is drawn over it.
    baked: Option<MaskBitmap>,
}

impl LinearGradientTool {
    pub fn display_size(&self) -> (u32, u32) {
        self.display
    }

    pub fn line(&self) -> Option<GradientLine> {
        self.line
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.display = (width, height);
    }

    fn grab(&self, line: &GradientLine, p: (f32, f32)) -> DragMode {
        if distance(p, line.a) <= HANDLE_RADIUS {
            DragMode::AxisA
        } else if distance(p, line.b) <= HANDLE_RADIUS {
            DragMode::AxisB
        } else if line.strip_contains(p) {
            DragMode::Move
        } else {
            DragMode::None
        }
    }

    pub fn hit_test(&self, x: f32, y: f32) -> bool {
        self.line
            .is_some_and(|line| self.grab(&line, (x, y)) != DragMode::None)
    }

    pub fn pointer_down(&mut self, event: PointerEvent) -> bool {
        let p = event.pos();
        match event.button {
            PointerButton::Secondary => match self.line {
                Some(line) if line.strip_contains(p) => {
                    self.line = None;
                    self.mode = DragMode::None;
                    true
                }
                _ => false,
            },
            PointerButton::Primary => {
                let grabbed = self.line.map_or(DragMode::None, |line| self.grab(&line, p));
                self.mode = if grabbed != DragMode::None {
                    grabbed
                } else {
                    self.line = Some(GradientLine { a: p, b: p });
                    DragMode::Create
                };
                self.last = p;
                true
            }
        }
    }

    pub fn pointer_move(&mut self, event: PointerEvent) -> bool {
        let p = event.pos();
        let Some(line) = self.line.as_mut() else {
            return false;
        };
        match self.mode {
            DragMode::None => return false,
            DragMode::Create | DragMode::AxisB => line.b = p,
            DragMode::AxisA => line.a = p,
            DragMode::Move => {
                let d = (p.0 - self.last.0, p.1 - self.last.1);
                line.a = (line.a.0 + d.0, line.a.1 + d.1);
                line.b = (line.b.0 + d.0, line.b.1 + d.1);
            }
        }
        self.last = p;
        true
    }

    pub fn pointer_up(&mut self, _event: PointerEvent) -> bool {
        let was_dragging = self.mode != DragMode::None;
        self.mode = DragMode::None;
        was_dragging
    }

    pub fn render_mask(&self, width: u32, height: u32) -> Option<MaskBitmap> {
        let (dw, dh) = self.display;
        if dw == 0 || dh == 0 {
            return None;
        }
        let mut mask = match &self.baked {
            Some(baked) => baked.resize(width, height),
            None => MaskBitmap::new(width, height),
        };

        if let Some(line) = self.line {
            let sx = width as f32 / dw as f32;
            let sy = height as f32 / dh as f32;
            let gradient =
                LinearGradientMask::new(line.a.0 * sx, line.a.1 * sy, line.b.0 * sx, line.b.1 * sy, 1.0);
            let (w_f, h_f) = (width as f32, height as f32);
            let drawn = MaskBitmap::from_fn(width, height, |x, y| gradient.evaluate(x * w_f, y * h_f));
            mask.blend_over(&drawn);
        }
        Some(mask)
    }

    pub fn load_bitmap(&mut self, bitmap: MaskBitmap) {
        self.display = (bitmap.width, bitmap.height);
        self.line = None;
        self.mode = DragMode::None;
        self.baked = Some(bitmap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(tool: &mut LinearGradientTool, from: (f32, f32), to: (f32, f32)) {
        tool.pointer_down(PointerEvent::primary(from.0, from.1));
        tool.pointer_move(PointerEvent::primary(to.0, to.1));
        tool.pointer_up(PointerEvent::primary(to.0, to.1));
    }

    #[test]
    fn test_horizontal_gradient_endpoints() {
        let mask = LinearGradientMask::new(0.0, 0.5, 1.0, 0.5, 1.0);

        let val_start = mask.evaluate(0.0, 0.5);
        assert!(val_start > 0.99, "Start should have full effect, got {}", val_start);

        let val_end = mask.evaluate(1.0, 0.5);
        assert!(val_end < 0.01, "End should have no effect, got {}", val_end);

        let val_center = mask.evaluate(0.5, 0.5);
        assert!((val_center - 0.5).abs() < 0.01, "Center should be 0.5, got {}", val_center);
    }

    #[test]
    fn test_hard_edge_feather_zero() {
        let mask = LinearGradientMask::new(0.0, 0.5, 1.0, 0.5, 0.0);
        assert!(mask.evaluate(0.49, 0.5) > 0.99);
        assert!(mask.evaluate(0.51, 0.5) < 0.01);
    }

    #[test]
    fn test_perpendicular_to_line() {
        let mask = LinearGradientMask::new(0.0, 0.5, 1.0, 0.5, 1.0);
        let mid = mask.evaluate(0.5, 0.5);
        assert!((mask.evaluate(0.5, 0.0) - mid).abs() < 0.01);
        assert!((mask.evaluate(0.5, 1.0) - mid).abs() < 0.01);
    }

    #[test]
    fn test_degenerate_gradient_splits_at_start() {
        let mask = LinearGradientMask::new(0.5, 0.5, 0.5, 0.5, 1.0);
        assert_eq!(mask.evaluate(0.4, 0.9), 1.0, "Left of a zero-length gradient is masked");
        assert_eq!(mask.evaluate(0.6, 0.1), 0.0, "Right of a zero-length gradient is clear");
    }

    #[test]
    fn test_monotonic_falloff() {
        let mask = LinearGradientMask::new(0.0, 0.0, 1.0, 0.0, 1.0);
        let mut prev = 1.0;
        for i in 0..=20 {
            let v = mask.evaluate(i as f32 / 20.0, 0.0);
            assert!(v <= prev + f32::EPSILON, "Mask should not increase along the gradient");
            prev = v;
        }
    }

    #[test]
    fn test_strip_hit_test() {
        let line = GradientLine { a: (10.0, 50.0), b: (90.0, 50.0) };
        assert!(line.strip_contains((50.0, 50.0)));
        assert!(line.strip_contains((50.0, 64.0)));
        assert!(!line.strip_contains((50.0, 66.0)), "Beyond 15 units is outside the strip");
        assert!(!line.strip_contains((5.0, 50.0)), "Before A is outside the strip");
        assert!(!line.strip_contains((95.0, 50.0)), "Past B is outside the strip");

        let short = GradientLine { a: (10.0, 10.0), b: (10.5, 10.0) };
        assert!(!short.strip_contains((10.2, 10.0)), "Sub-unit lines have no strip");
    }

    #[test]
    fn test_create_then_render() {
        let mut tool = LinearGradientTool::default();
        tool.resize(100, 20);
        drag(&mut tool, (0.0, 10.0), (100.0, 10.0));

        let mask = tool.render_mask(100, 20).unwrap();
        assert!(mask.get(0, 10) > 250, "Point A side should be fully masked");
        assert!(mask.get(99, 10) < 5, "Point B side should be clear");
        assert!(mask.get(25, 0) > mask.get(75, 0), "Mask should fall off from A to B");
    }

    #[test]
    fn test_render_scales_display_geometry() {
        let mut tool = LinearGradientTool::default();
        tool.resize(100, 100);
        drag(&mut tool, (0.0, 50.0), (50.0, 50.0));

        let small = tool.render_mask(100, 100).unwrap();
        let large = tool.render_mask(200, 200).unwrap();
        let diff = (small.get(25, 50) as i32 - large.get(50, 100) as i32).abs();
        assert!(diff <= 4, "Same display point should render alike, diff {}", diff);
        assert_eq!(large.get(150, 100), 0, "Right half is past B at any scale");
    }

    #[test]
    fn test_drag_handles_and_move() {
        let mut tool = LinearGradientTool::default();
        tool.resize(200, 200);
        drag(&mut tool, (50.0, 100.0), (150.0, 100.0));

        drag(&mut tool, (150.0, 100.0), (170.0, 100.0));
        assert_eq!(tool.line().unwrap().b, (170.0, 100.0), "Handle B should follow the drag");

        drag(&mut tool, (100.0, 105.0), (100.0, 125.0));
        let line = tool.line().unwrap();
        assert_eq!(line.a, (50.0, 120.0), "Move should translate both points");
        assert_eq!(line.b, (170.0, 120.0));
    }

    #[test]
    fn test_handle_grabbed_outside_strip() {
        let mut tool = LinearGradientTool::default();
        tool.resize(200, 200);
        drag(&mut tool, (50.0, 100.0), (150.0, 100.0));
        assert!(!tool.line().unwrap().strip_contains((46.0, 100.0)));

        drag(&mut tool, (46.0, 100.0), (30.0, 80.0));
        let line = tool.line().unwrap();
        assert_eq!(line.a, (30.0, 80.0), "Press near A grabs the handle even before the strip");
        assert_eq!(line.b, (150.0, 100.0), "B stays put");
    }

    #[test]
    fn test_primary_outside_strip_replaces_gradient() {
        let mut tool = LinearGradientTool::default();
        tool.resize(200, 200);
        drag(&mut tool, (50.0, 100.0), (150.0, 100.0));
        drag(&mut tool, (10.0, 10.0), (10.0, 60.0));
        let line = tool.line().unwrap();
        assert_eq!((line.a, line.b), ((10.0, 10.0), (10.0, 60.0)));
    }

    #[test]
    fn test_secondary_in_strip_deletes() {
        let mut tool = LinearGradientTool::default();
        tool.resize(200, 200);
        drag(&mut tool, (50.0, 100.0), (150.0, 100.0));

        assert!(!tool.pointer_down(PointerEvent::secondary(10.0, 10.0)));
        assert!(tool.line().is_some());

        assert!(tool.pointer_down(PointerEvent::secondary(100.0, 100.0)));
        assert!(tool.line().is_none());
        assert!(!tool.hit_test(100.0, 100.0));
    }

    #[test]
    fn test_render_without_display_is_none() {
        assert!(LinearGradientTool::default().render_mask(10, 10).is_none());
    }
}
