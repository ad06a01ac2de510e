//! Radial gradient masks.
//!
//! Each circle is fully masked inside its radius and fades out to
//! `radius * (1 + feather)`. A tool holds any number of circles, combined
//! as a union.

use serde::{Deserialize, Serialize};

use super::tool::{distance, PointerButton, PointerEvent};
use super::{smootherstep, MaskBitmap};

/// Grab radius of the inner and outer handles, in display units.
pub const HANDLE_RADIUS: f32 = 6.0;

pub const DEFAULT_FEATHER: f32 = 0.3;
pub const MAX_FEATHER: f32 = 2.0;

/// Smallest radius a handle drag can produce.
const MIN_RADIUS: f32 = 1.0;

// ============================================================================
// Mask Evaluation
// ============================================================================

/// Elliptical gradient mask in any consistent coordinate space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadialGradientMask {
    pub center_x: f32,
    pub center_y: f32,
    /// Horizontal radius of the outer edge.
    pub radius_x: f32,
    /// Vertical radius of the outer edge.
    pub radius_y: f32,
    /// Rotation angle in radians (positive = clockwise)
    pub rotation: f32,
    /// Share of the radius used for falloff (0.0 = hard edge, 1.0 = from the center)
    pub feather: f32,
    /// Apply the effect outside the ellipse instead of inside.
    pub invert: bool,
}

impl RadialGradientMask {
    pub fn new(
        center_x: f32,
        center_y: f32,
        radius_x: f32,
        radius_y: f32,
        rotation: f32,
        feather: f32,
        invert: bool,
    ) -> Self {
        Self {
            center_x,
            center_y,
            radius_x: radius_x.max(0.001),
            radius_y: radius_y.max(0.001),
            rotation,
            feather: feather.clamp(0.0, 1.0),
            invert,
        }
    }

    /// Squared distance from center in ellipse space; 1.0 lies on the edge.
    #[inline]
    fn normalized_distance_sq(&self, x: f32, y: f32) -> f32 {
        let dx = x - self.center_x;
        let dy = y - self.center_y;

        let (cos_r, sin_r) = (self.rotation.cos(), self.rotation.sin());
        let local_x = dx * cos_r + dy * sin_r;
        let local_y = -dx * sin_r + dy * cos_r;

        let rx = self.radius_x.max(0.001);
        let ry = self.radius_y.max(0.001);

        (local_x / rx).powi(2) + (local_y / ry).powi(2)
    }

    /// Evaluate the mask strength at a point.
    ///
    /// # Algorithm
    /// 1. Rotate the offset from center into ellipse axes
    /// 2. Compute normalized distance (1.0 = on ellipse edge)
    /// 3. Full effect inside `1 - feather`, smootherstep falloff to the edge
    /// 4. Optionally invert the result
    pub fn evaluate(&self, x: f32, y: f32) -> f32 {
        let norm_dist = self.normalized_distance_sq(x, y).sqrt();
        let inner = 1.0 - self.feather.clamp(0.0, 1.0);

        let mask = if norm_dist <= inner {
            1.0
        } else if norm_dist >= 1.0 {
            0.0
        } else {
            let t = (norm_dist - inner) / (1.0 - inner).max(0.001);
            1.0 - smootherstep(t)
        };

        if self.invert {
            1.0 - mask
        } else {
            mask
        }
    }

    /// Check if a point is inside the ellipse boundary (ignoring feather).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.normalized_distance_sq(x, y) <= 1.0
    }
}

// ============================================================================
// Tool
// ============================================================================

/// One circle in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadialCircle {
    pub center: (f32, f32),
    /// Radius of the fully masked core.
    pub radius: f32,
    /// Falloff width as a multiple of the radius, in [0, 2].
    pub feather: f32,
}

impl RadialCircle {
    pub fn outer_radius(&self) -> f32 {
        self.radius * (1.0 + self.feather)
    }

    pub fn inner_handle(&self) -> (f32, f32) {
        (self.center.0 + self.radius, self.center.1)
    }

    pub fn outer_handle(&self) -> (f32, f32) {
        (self.center.0 + self.outer_radius(), self.center.1)
    }

    /// Mask for this circle after scaling display coordinates by `(sx, sy)`.
    ///
    /// The outer edge becomes the ellipse boundary and the core radius
    /// becomes the unfeathered share of it.
    fn to_mask(self, sx: f32, sy: f32) -> RadialGradientMask {
        let outer = self.outer_radius();
        let feather = if outer > 0.0 { 1.0 - self.radius / outer } else { 0.0 };
        RadialGradientMask::new(
            self.center.0 * sx,
            self.center.1 * sy,
            outer * sx,
            outer * sy,
            0.0,
            feather,
            false,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DragMode {
    #[default]
    None,
    Create,
    Move,
    Inner,
    Outer,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RadialGradientTool {
    display: (u32, u32),
    circles: Vec<RadialCircle>,
    selected: Option<usize>,
    mode: DragMode,
    last: (f32, f32),
    baked: Option<MaskBitmap>,
}

impl RadialGradientTool {
    pub fn display_size(&self) -> (u32, u32) {
        self.display
    }

    pub fn circles(&self) -> &[RadialCircle] {
        &self.circles
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.display = (width, height);
    }

    /// Topmost circle and handle under `p`. Handles win over the body.
    fn grab(&self, p: (f32, f32)) -> Option<(usize, DragMode)> {
        self.circles.iter().enumerate().rev().find_map(|(i, c)| {
            if distance(p, c.inner_handle()) <= HANDLE_RADIUS {
                Some((i, DragMode::Inner))
            } else if distance(p, c.outer_handle()) <= HANDLE_RADIUS {
                Some((i, DragMode::Outer))
            } else if distance(p, c.center) <= c.radius {
                Some((i, DragMode::Move))
            } else {
                None
            }
        })
    }

    fn circle_at(&self, p: (f32, f32)) -> Option<usize> {
        self.circles
            .iter()
            .rposition(|c| distance(p, c.center) <= c.radius)
    }

    pub fn hit_test(&self, x: f32, y: f32) -> bool {
        self.grab((x, y)).is_some()
    }

    pub fn pointer_down(&mut self, event: PointerEvent) -> bool {
        let p = event.pos();
        match event.button {
            PointerButton::Secondary => match self.circle_at(p) {
                Some(index) => {
                    self.circles.remove(index);
                    self.selected = None;
                    self.mode = DragMode::None;
                    true
                }
                None => false,
            },
            PointerButton::Primary => {
                match self.grab(p) {
                    Some((index, mode)) => {
                        self.selected = Some(index);
                        self.mode = mode;
                    }
                    None => {
                        self.circles.push(RadialCircle {
                            center: p,
                            radius: 0.0,
                            feather: DEFAULT_FEATHER,
                        });
                        self.selected = Some(self.circles.len() - 1);
                        self.mode = DragMode::Create;
                    }
                }
                self.last = p;
                true
            }
        }
    }

    pub fn pointer_move(&mut self, event: PointerEvent) -> bool {
        let p = event.pos();
        let Some(circle) = self.selected.and_then(|i| self.circles.get_mut(i)) else {
            return false;
        };
        match self.mode {
            DragMode::None => return false,
            DragMode::Create | DragMode::Inner => {
                circle.radius = distance(p, circle.center).max(MIN_RADIUS);
            }
            DragMode::Move => {
                circle.center.0 += p.0 - self.last.0;
                circle.center.1 += p.1 - self.last.1;
            }
            DragMode::Outer => {
                let outer = distance(p, circle.center).max(MIN_RADIUS);
                circle.feather = (outer / circle.radius.max(MIN_RADIUS) - 1.0).clamp(0.0, MAX_FEATHER);
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

        let sx = width as f32 / dw as f32;
        let sy = height as f32 / dh as f32;
        let (w_f, h_f) = (width as f32, height as f32);
        for circle in self.circles.iter().filter(|c| c.radius > 0.0) {
            let gradient = circle.to_mask(sx, sy);
            let drawn = MaskBitmap::from_fn(width, height, |x, y| gradient.evaluate(x * w_f, y * h_f));
            mask.blend_over(&drawn);
        }
        Some(mask)
    }

    pub fn load_bitmap(&mut self, bitmap: MaskBitmap) {
        self.display = (bitmap.width, bitmap.height);
        self.circles.clear();
        self.selected = None;
        self.mode = DragMode::None;
        self.baked = Some(bitmap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_with_circle(center: (f32, f32), edge: (f32, f32)) -> RadialGradientTool {
        let mut tool = RadialGradientTool::default();
        tool.resize(200, 200);
        tool.pointer_down(PointerEvent::primary(center.0, center.1));
        tool.pointer_move(PointerEvent::primary(edge.0, edge.1));
        tool.pointer_up(PointerEvent::primary(edge.0, edge.1));
        tool
    }

    #[test]
    fn test_circular_mask_center_and_edge() {
        let mask = RadialGradientMask::new(0.5, 0.5, 0.3, 0.3, 0.0, 0.5, false);
        assert!(mask.evaluate(0.5, 0.5) > 0.99, "Center should have full effect");
        assert!(mask.evaluate(0.9, 0.5) < 0.01, "Outside should have no effect");
        assert!(mask.contains(0.7, 0.5));
        assert!(!mask.contains(0.85, 0.5));
    }

    #[test]
    fn test_inverted_mask() {
        let mask = RadialGradientMask::new(0.5, 0.5, 0.3, 0.3, 0.0, 0.5, true);
        assert!(mask.evaluate(0.5, 0.5) < 0.01);
        assert!(mask.evaluate(0.0, 0.0) > 0.99);
    }

    #[test]
    fn test_rotated_ellipse() {
        let mask = RadialGradientMask::new(
            0.5,
            0.5,
            0.4,
            0.1,
            std::f32::consts::FRAC_PI_2,
            0.0,
            false,
        );
        assert!(mask.evaluate(0.5, 0.8) > 0.99, "Long axis should be vertical after rotation");
        assert!(mask.evaluate(0.8, 0.5) < 0.01);
    }

    #[test]
    fn test_create_sets_radius_and_default_feather() {
        let tool = tool_with_circle((100.0, 100.0), (130.0, 100.0));
        let circle = tool.circles()[0];
        assert_eq!(circle.radius, 30.0);
        assert_eq!(circle.feather, DEFAULT_FEATHER);
        assert_eq!(tool.selected(), Some(0));
    }

    #[test]
    fn test_render_core_full_and_falloff() {
        let tool = tool_with_circle((100.0, 100.0), (130.0, 100.0));
        let mask = tool.render_mask(200, 200).unwrap();
        assert_eq!(mask.get(100, 100), 255, "Core should be fully masked");
        assert_eq!(mask.get(120, 100), 255, "Inside the radius should be fully masked");
        let fade = mask.get(134, 100);
        assert!(fade > 0 && fade < 255, "Feather band should be partial, got {}", fade);
        assert_eq!(mask.get(150, 100), 0, "Beyond the outer radius is clear");
    }

    #[test]
    fn test_outer_handle_sets_feather() {
        let mut tool = tool_with_circle((100.0, 100.0), (130.0, 100.0));
        // Outer handle at 100 + 30 * 1.3 = 139
        tool.pointer_down(PointerEvent::primary(139.0, 100.0));
        tool.pointer_move(PointerEvent::primary(160.0, 100.0));
        tool.pointer_up(PointerEvent::primary(160.0, 100.0));
        assert!((tool.circles()[0].feather - 1.0).abs() < 1e-6);

        tool.pointer_down(PointerEvent::primary(160.0, 100.0));
        tool.pointer_move(PointerEvent::primary(220.0, 100.0));
        assert_eq!(tool.circles()[0].feather, MAX_FEATHER, "Feather is clamped to 2");
    }

    #[test]
    fn test_inner_handle_sets_radius() {
        let mut tool = tool_with_circle((100.0, 100.0), (120.0, 100.0));
        tool.pointer_down(PointerEvent::primary(120.0, 100.0));
        tool.pointer_move(PointerEvent::primary(100.5, 100.0));
        assert_eq!(tool.circles()[0].radius, MIN_RADIUS, "Radius never drops below one unit");
    }

    #[test]
    fn test_move_inside_circle() {
        let mut tool = tool_with_circle((100.0, 100.0), (130.0, 100.0));
        tool.pointer_down(PointerEvent::primary(95.0, 95.0));
        tool.pointer_move(PointerEvent::primary(105.0, 115.0));
        tool.pointer_up(PointerEvent::primary(105.0, 115.0));
        assert_eq!(tool.circles()[0].center, (110.0, 120.0));
        assert_eq!(tool.circles().len(), 1, "Dragging inside must not create a circle");
    }

    #[test]
    fn test_multiple_circles_and_delete() {
        let mut tool = tool_with_circle((50.0, 50.0), (70.0, 50.0));
        tool.pointer_down(PointerEvent::primary(150.0, 150.0));
        tool.pointer_move(PointerEvent::primary(170.0, 150.0));
        tool.pointer_up(PointerEvent::primary(170.0, 150.0));
        assert_eq!(tool.circles().len(), 2);

        let mask = tool.render_mask(200, 200).unwrap();
        assert_eq!(mask.get(50, 50), 255);
        assert_eq!(mask.get(150, 150), 255);

        assert!(tool.pointer_down(PointerEvent::secondary(50.0, 50.0)));
        assert_eq!(tool.circles().len(), 1);
        assert_eq!(tool.circles()[0].center, (150.0, 150.0));
        assert!(!tool.pointer_down(PointerEvent::secondary(5.0, 5.0)));
    }

    #[test]
    fn test_load_bitmap_is_rendered() {
        let mut tool = RadialGradientTool::default();
        tool.load_bitmap(MaskBitmap::filled(20, 10, 90));
        assert_eq!(tool.display_size(), (20, 10));
        let mask = tool.render_mask(40, 20).unwrap();
        assert!(mask.data.iter().all(|&v| v == 90));
    }
}
