//! Oriented crop rectangle and its interactive controller.
//!
//! The crop box is stored in source-pixel units: `x`, `y` is the top-left of
//! the unrotated box, and `angle` (degrees, clockwise on screen) rotates it
//! about its center.
//!
//! # Invariant
//!
//! After every mutation the rotated box's axis-aligned bounds lie inside
//! `[0, canvas_w] x [0, canvas_h]` and both sides are at least
//! [`MIN_CROP_SIZE`], unless the canvas itself is smaller than that.

use serde::{Deserialize, Serialize};

/// Corner handle tolerance, in canvas units.
pub const HANDLE_SIZE: f64 = 12.0;

/// Smallest crop width or height.
pub const MIN_CROP_SIZE: f64 = 32.0;

/// Distance band outside the box that grabs rotation.
const ROTATE_RING: (f64, f64) = (4.0, 18.0);

// ============================================================================
// Crop Box
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CropBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees, normalized to [0, 360).
    pub angle: f64,
}

impl CropBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64, angle: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            angle,
        }
    }

    /// Box covering a whole canvas, unrotated.
    pub fn full(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height, 0.0)
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Rotated corners in canvas coordinates: NW, NE, SE, SW.
    pub fn corners(&self) -> [(f64, f64); 4] {
        let (cx, cy) = self.center();
        let (sin, cos) = self.angle.to_radians().sin_cos();
        let hw = self.width * 0.5;
        let hh = self.height * 0.5;
        [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)]
            .map(|(lx, ly)| (lx * cos - ly * sin + cx, lx * sin + ly * cos + cy))
    }

    /// Axis-aligned bounds of the rotated box: `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.corners().iter().fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(min_x, min_y, max_x, max_y), &(x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        )
    }

    /// A canvas point expressed in the box's unrotated frame, relative to its center.
    pub fn to_local(&self, px: f64, py: f64) -> (f64, f64) {
        let (cx, cy) = self.center();
        let (dx, dy) = (px - cx, py - cy);
        let (sin, cos) = (-self.angle).to_radians().sin_cos();
        (dx * cos - dy * sin, dx * sin + dy * cos)
    }

    /// The same crop in a canvas scaled by `(sx, sy)`, e.g. a downsized preview.
    pub fn scaled(&self, sx: f64, sy: f64) -> CropBox {
        CropBox {
            x: self.x * sx,
            y: self.y * sy,
            width: self.width * sx,
            height: self.height * sy,
            angle: self.angle,
        }
    }

    /// True when the box covers the whole canvas without rotation.
    pub fn is_full(&self, canvas_w: f64, canvas_h: f64) -> bool {
        self.x.abs() < 1e-6
            && self.y.abs() < 1e-6
            && (self.width - canvas_w).abs() < 1e-6
            && (self.height - canvas_h).abs() < 1e-6
            && self.angle.abs() < 1e-6
    }
}

/// Wrap an angle in degrees into [0, 360).
#[inline]
pub fn normalize_angle(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

// ============================================================================
// Controller
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CropInteraction {
    #[default]
    None,
    Move,
    Rotate,
    ResizeNW,
    ResizeNE,
    ResizeSW,
    ResizeSE,
}

impl CropInteraction {
    /// `(left_edge, top_edge)` for the corner being dragged.
    fn corner(self) -> Option<(bool, bool)> {
        match self {
            CropInteraction::ResizeNW => Some((true, true)),
            CropInteraction::ResizeNE => Some((false, true)),
            CropInteraction::ResizeSW => Some((true, false)),
            CropInteraction::ResizeSE => Some((false, false)),
            _ => None,
        }
    }
}

/// Crop state machine: idle until a press grabs a corner, the rotate ring or
/// the body; back to idle on release.
#[derive(Debug, Clone, PartialEq)]
pub struct CropController {
    canvas: (f64, f64),
    crop: CropBox,
    locked_ratio: Option<f64>,
    active: CropInteraction,
    hover: CropInteraction,
    press: (f64, f64),
    start_box: CropBox,
    start_angle: f64,
}

impl CropController {
    pub fn new(canvas_w: f64, canvas_h: f64) -> Self {
        let mut controller = Self {
            canvas: (0.0, 0.0),
            crop: CropBox::default(),
            locked_ratio: None,
            active: CropInteraction::None,
            hover: CropInteraction::None,
            press: (0.0, 0.0),
            start_box: CropBox::default(),
            start_angle: 0.0,
        };
        controller.resize_canvas(canvas_w, canvas_h);
        controller
    }

    pub fn crop_box(&self) -> CropBox {
        self.crop
    }

    pub fn canvas_size(&self) -> (f64, f64) {
        self.canvas
    }

    pub fn locked_ratio(&self) -> Option<f64> {
        self.locked_ratio
    }

    pub fn active_interaction(&self) -> CropInteraction {
        self.active
    }

    pub fn hover_interaction(&self) -> CropInteraction {
        self.hover
    }

    /// Change the canvas size. The box keeps its relative placement.
    pub fn resize_canvas(&mut self, width: f64, height: f64) {
        let (old_w, old_h) = self.canvas;
        self.canvas = (width.max(0.0), height.max(0.0));

        if self.crop.width < 1.0 || self.crop.height < 1.0 || old_w <= 0.0 || old_h <= 0.0 {
            self.reset();
            return;
        }
        self.crop = self.crop.scaled(self.canvas.0 / old_w, self.canvas.1 / old_h);
        self.clamp();
    }

    /// Cover the whole canvas and drop any ratio lock.
    pub fn reset(&mut self) {
        self.crop = CropBox::full(self.canvas.0, self.canvas.1);
        self.locked_ratio = None;
    }

    /// Restore a saved box; its proportions become the locked ratio.
    pub fn load(&mut self, saved: CropBox) {
        self.crop = saved;
        self.crop.angle = normalize_angle(saved.angle);
        self.locked_ratio = (saved.width > 0.0 && saved.height > 0.0).then(|| saved.width / saved.height);
        self.clamp();
    }

    /// Put back a box and ratio lock exactly as captured, e.g. from history.
    pub fn restore(&mut self, saved: CropBox, locked_ratio: Option<f64>) {
        self.crop = saved;
        self.crop.angle = normalize_angle(saved.angle);
        self.locked_ratio = locked_ratio;
        self.active = CropInteraction::None;
        self.clamp();
    }

    /// Lock to `ratio` (width / height) and reshape around the center, or unlock.
    pub fn set_aspect_ratio(&mut self, ratio: Option<f64>) {
        match ratio.filter(|r| r.is_finite() && *r > 0.0) {
            Some(ratio) => self.apply_preset_ratio(ratio),
            None => self.locked_ratio = None,
        }
    }

    /// Lock or unlock the box's current proportions.
    pub fn set_lock_aspect(&mut self, locked: bool) {
        self.locked_ratio = (locked && self.crop.height > 0.0).then(|| self.crop.width / self.crop.height);
    }

    pub fn apply_preset_ratio(&mut self, ratio: f64) {
        if !(ratio.is_finite() && ratio > 0.0) {
            return;
        }
        self.locked_ratio = Some(ratio);
        self.set_size(self.crop.width, self.crop.width / ratio);
    }

    pub fn set_angle(&mut self, degrees: f64) {
        self.crop.angle = normalize_angle(degrees);
        self.clamp();
    }

    /// Resize around the current center. A locked ratio overrides `height`.
    pub fn set_size(&mut self, width: f64, height: f64) {
        let height = match self.locked_ratio {
            Some(ratio) => width / ratio,
            None => height,
        };
        let (cx, cy) = self.crop.center();
        self.crop.width = width;
        self.crop.height = height;
        self.crop.x = cx - width * 0.5;
        self.crop.y = cy - height * 0.5;
        self.clamp();
    }

    // ------------------------------------------------------------------------
    // Pointer interaction
    // ------------------------------------------------------------------------

    /// Which part of the box is under a canvas point.
    pub fn hit_test(&self, x: f64, y: f64) -> CropInteraction {
        let (rx, ry) = self.crop.to_local(x, y);
        let hw = self.crop.width * 0.5;
        let hh = self.crop.height * 0.5;

        let near = |tx: f64, ty: f64| (rx - tx).abs() <= HANDLE_SIZE && (ry - ty).abs() <= HANDLE_SIZE;
        if near(-hw, -hh) {
            return CropInteraction::ResizeNW;
        }
        if near(hw, -hh) {
            return CropInteraction::ResizeNE;
        }
        if near(-hw, hh) {
            return CropInteraction::ResizeSW;
        }
        if near(hw, hh) {
            return CropInteraction::ResizeSE;
        }

        let outside = (rx.abs() - hw).min(ry.abs() - hh);
        if outside > ROTATE_RING.0 && outside < ROTATE_RING.1 {
            return CropInteraction::Rotate;
        }
        if rx.abs() < hw && ry.abs() < hh {
            return CropInteraction::Move;
        }
        CropInteraction::None
    }

    pub fn update_hover(&mut self, x: f64, y: f64) {
        self.hover = self.hit_test(x, y);
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) -> CropInteraction {
        self.hover = self.hit_test(x, y);
        self.active = self.hover;
        self.press = (x, y);
        self.start_box = self.crop;

        if self.active == CropInteraction::Rotate {
            let (cx, cy) = self.crop.center();
            self.start_angle = (y - cy).atan2(x - cx).to_degrees() - self.crop.angle;
        }
        self.active
    }

    /// Returns true when the box changed.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        let dx = x - self.press.0;
        let dy = y - self.press.1;

        match self.active {
            CropInteraction::None => {
                self.hover = self.hit_test(x, y);
                return false;
            }
            CropInteraction::Move => {
                self.crop.x = self.start_box.x + dx;
                self.crop.y = self.start_box.y + dy;
            }
            CropInteraction::Rotate => {
                let (cx, cy) = self.crop.center();
                let now = (y - cy).atan2(x - cx).to_degrees();
                self.crop.angle = normalize_angle(now - self.start_angle);
            }
            corner => {
                if let Some((left, top)) = corner.corner() {
                    self.resize_from_corner(dx, dy, left, top);
                }
            }
        }
        self.clamp();
        true
    }

    pub fn pointer_up(&mut self) {
        self.active = CropInteraction::None;
    }

    /// Resize with the opposite corner pinned, in the box's rotated frame.
    fn resize_from_corner(&mut self, dx: f64, dy: f64, left_edge: bool, top_edge: bool) {
        let start = self.start_box;
        let (sin, cos) = start.angle.to_radians().sin_cos();
        let dir_x = (cos, sin);
        let dir_y = (-sin, cos);

        let mut dw = dx * dir_x.0 + dy * dir_x.1;
        let mut dh = dx * dir_y.0 + dy * dir_y.1;
        if left_edge {
            dw = -dw;
        }
        if top_edge {
            dh = -dh;
        }

        let mut new_w = (start.width + dw).max(MIN_CROP_SIZE);
        let mut new_h = (start.height + dh).max(MIN_CROP_SIZE);

        if let Some(ratio) = self.locked_ratio {
            if dw.abs() >= dh.abs() {
                new_h = new_w / ratio;
            } else {
                new_w = new_h * ratio;
            }
        }

        let delta_w = new_w - start.width;
        let delta_h = new_h - start.height;
        let sign_x = if left_edge { -1.0 } else { 1.0 };
        let sign_y = if top_edge { -1.0 } else { 1.0 };

        let (cx, cy) = start.center();
        let cx = cx + dir_x.0 * delta_w * sign_x * 0.5 + dir_y.0 * delta_h * sign_y * 0.5;
        let cy = cy + dir_x.1 * delta_w * sign_x * 0.5 + dir_y.1 * delta_h * sign_y * 0.5;

        self.crop.width = new_w;
        self.crop.height = new_h;
        self.crop.x = cx - new_w * 0.5;
        self.crop.y = cy - new_h * 0.5;
    }

    /// Shrink the box uniformly until its rotated bounds fit, then shift it inside.
    fn clamp(&mut self) {
        let (canvas_w, canvas_h) = self.canvas;
        if canvas_w < MIN_CROP_SIZE || canvas_h < MIN_CROP_SIZE {
            return;
        }

        let (sin, cos) = self.crop.angle.to_radians().sin_cos();
        let (sin, cos) = (sin.abs(), cos.abs());
        let extent = |w: f64, h: f64| (w * cos + h * sin, w * sin + h * cos);

        let mut width = self.crop.width.max(MIN_CROP_SIZE);
        let mut height = self.crop.height.max(MIN_CROP_SIZE);
        let (extent_w, extent_h) = extent(width, height);
        let scale = (canvas_w / extent_w).min(canvas_h / extent_h);
        if scale < 1.0 {
            width = (width * scale).max(MIN_CROP_SIZE);
            height = (height * scale).max(MIN_CROP_SIZE);

            // A side pinned at the minimum stops uniform scaling from fitting;
            // shrink the free side alone.
            let (extent_w, extent_h) = extent(width, height);
            if extent_w > canvas_w || extent_h > canvas_h {
                let room = |space: f64, coef: f64| if coef < 1e-12 { f64::INFINITY } else { space / coef };
                if height <= MIN_CROP_SIZE && width > MIN_CROP_SIZE {
                    let fit = room(canvas_w - height * sin, cos).min(room(canvas_h - height * cos, sin));
                    width = fit.max(MIN_CROP_SIZE);
                } else if width <= MIN_CROP_SIZE && height > MIN_CROP_SIZE {
                    let fit = room(canvas_w - width * cos, sin).min(room(canvas_h - width * sin, cos));
                    height = fit.max(MIN_CROP_SIZE);
                }
            }
        }

        let (cx, cy) = self.crop.center();
        self.crop.width = width;
        self.crop.height = height;
        self.crop.x = cx - width * 0.5;
        self.crop.y = cy - height * 0.5;

        let (min_x, min_y, max_x, max_y) = self.crop.bounds();
        if min_x < 0.0 {
            self.crop.x -= min_x;
        } else if max_x > canvas_w {
            self.crop.x += canvas_w - max_x;
        }
        if min_y < 0.0 {
            self.crop.y -= min_y;
        } else if max_y > canvas_h {
            self.crop.y += canvas_h - max_y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_contained(controller: &CropController) {
        let (w, h) = controller.canvas_size();
        let (min_x, min_y, max_x, max_y) = controller.crop_box().bounds();
        assert!(min_x >= -EPS && min_y >= -EPS, "Box escapes top-left: {:?}", controller.crop_box());
        assert!(max_x <= w + EPS && max_y <= h + EPS, "Box escapes bottom-right: {:?}", controller.crop_box());
        assert!(controller.crop_box().width >= MIN_CROP_SIZE - EPS);
        assert!(controller.crop_box().height >= MIN_CROP_SIZE - EPS);
    }

    #[test]
    fn test_new_covers_canvas() {
        let controller = CropController::new(800.0, 600.0);
        assert_eq!(controller.crop_box(), CropBox::full(800.0, 600.0));
        assert!(controller.crop_box().is_full(800.0, 600.0));
    }

    #[test]
    fn test_load_clamps_overhanging_box() {
        let mut controller = CropController::new(1000.0, 1000.0);
        controller.load(CropBox::new(900.0, 0.0, 200.0, 200.0, 0.0));
        let crop = controller.crop_box();
        assert!(crop.x + crop.width <= 1000.0, "Box should be pulled inside, got {:?}", crop);
        assert_eq!(crop.width, 200.0, "Fitting box keeps its size");
        assert_eq!(controller.locked_ratio(), Some(1.0));
    }

    #[test]
    fn test_rotation_shrinks_full_box() {
        let mut controller = CropController::new(1000.0, 1000.0);
        controller.set_angle(45.0);
        let crop = controller.crop_box();
        assert!(crop.width < 1000.0, "Rotated full box must shrink to fit");
        assert_contained(&controller);
    }

    #[test]
    fn test_set_angle_normalizes() {
        let mut controller = CropController::new(500.0, 500.0);
        controller.set_angle(-90.0);
        assert!((controller.crop_box().angle - 270.0).abs() < EPS);
        controller.set_angle(720.0);
        assert!(controller.crop_box().angle.abs() < EPS);
    }

    #[test]
    fn test_set_size_keeps_center() {
        let mut controller = CropController::new(1000.0, 1000.0);
        controller.set_size(400.0, 200.0);
        let crop = controller.crop_box();
        assert_eq!(crop.center(), (500.0, 500.0));
        assert_eq!((crop.width, crop.height), (400.0, 200.0));
    }

    #[test]
    fn test_preset_ratio_locks_height() {
        let mut controller = CropController::new(1000.0, 1000.0);
        controller.set_aspect_ratio(Some(2.0));
        assert_eq!(controller.crop_box().height, 500.0);
        controller.set_size(600.0, 999.0);
        assert_eq!(controller.crop_box().height, 300.0, "Locked ratio overrides height");
        controller.set_aspect_ratio(None);
        assert_eq!(controller.locked_ratio(), None);
    }

    #[test]
    fn test_hit_test_regions() {
        let mut controller = CropController::new(1000.0, 1000.0);
        controller.load(CropBox::new(200.0, 200.0, 400.0, 400.0, 0.0));
        controller.set_aspect_ratio(None);

        assert_eq!(controller.hit_test(205.0, 195.0), CropInteraction::ResizeNW);
        assert_eq!(controller.hit_test(600.0, 200.0), CropInteraction::ResizeNE);
        assert_eq!(controller.hit_test(200.0, 610.0), CropInteraction::ResizeSW);
        assert_eq!(controller.hit_test(590.0, 590.0), CropInteraction::ResizeSE);
        assert_eq!(controller.hit_test(400.0, 400.0), CropInteraction::Move);
        assert_eq!(controller.hit_test(190.0, 190.0), CropInteraction::ResizeNW);
        assert_eq!(controller.hit_test(185.0, 185.0), CropInteraction::Rotate);
        assert_eq!(controller.hit_test(50.0, 50.0), CropInteraction::None);
    }

    #[test]
    fn test_move_drag() {
        let mut controller = CropController::new(1000.0, 1000.0);
        controller.load(CropBox::new(200.0, 200.0, 400.0, 400.0, 0.0));
        assert_eq!(controller.pointer_down(400.0, 400.0), CropInteraction::Move);
        assert!(controller.pointer_move(450.0, 380.0));
        controller.pointer_up();
        let crop = controller.crop_box();
        assert_eq!((crop.x, crop.y), (250.0, 180.0));
        assert_eq!(controller.active_interaction(), CropInteraction::None);
    }

    #[test]
    fn test_move_is_clamped_to_canvas() {
        let mut controller = CropController::new(1000.0, 1000.0);
        controller.load(CropBox::new(200.0, 200.0, 400.0, 400.0, 0.0));
        controller.pointer_down(400.0, 400.0);
        controller.pointer_move(2000.0, -900.0);
        let crop = controller.crop_box();
        assert_eq!((crop.x, crop.y), (600.0, 0.0));
    }

    #[test]
    fn test_resize_se_pins_nw_corner() {
        let mut controller = CropController::new(1000.0, 1000.0);
        controller.load(CropBox::new(200.0, 200.0, 400.0, 400.0, 0.0));
        controller.set_aspect_ratio(None);
        controller.pointer_down(600.0, 600.0);
        controller.pointer_move(700.0, 650.0);
        let crop = controller.crop_box();
        assert!((crop.x - 200.0).abs() < EPS && (crop.y - 200.0).abs() < EPS);
        assert!((crop.width - 500.0).abs() < EPS && (crop.height - 450.0).abs() < EPS);
    }

    #[test]
    fn test_resize_nw_pins_se_corner_and_min_size() {
        let mut controller = CropController::new(1000.0, 1000.0);
        controller.load(CropBox::new(200.0, 200.0, 400.0, 400.0, 0.0));
        controller.set_aspect_ratio(None);
        controller.pointer_down(200.0, 200.0);
        controller.pointer_move(900.0, 900.0);
        let crop = controller.crop_box();
        assert_eq!((crop.width, crop.height), (MIN_CROP_SIZE, MIN_CROP_SIZE));
        assert!((crop.x + crop.width - 600.0).abs() < EPS, "SE corner stays put");
        assert!((crop.y + crop.height - 600.0).abs() < EPS);
    }

    #[test]
    fn test_locked_ratio_follows_dominant_delta() {
        let mut controller = CropController::new(1000.0, 1000.0);
        controller.load(CropBox::new(100.0, 100.0, 400.0, 200.0, 0.0));
        assert_eq!(controller.locked_ratio(), Some(2.0));
        controller.pointer_down(500.0, 300.0);
        controller.pointer_move(600.0, 310.0);
        let crop = controller.crop_box();
        assert!((crop.width - 500.0).abs() < EPS);
        assert!((crop.height - 250.0).abs() < EPS);
    }

    #[test]
    fn test_rotate_drag() {
        let mut controller = CropController::new(1000.0, 1000.0);
        controller.load(CropBox::new(300.0, 300.0, 400.0, 400.0, 0.0));
        // Just outside the NE corner, diagonally.
        assert_eq!(controller.pointer_down(715.0, 285.0), CropInteraction::Rotate);
        // Swing a quarter turn around the center (500, 500).
        controller.pointer_move(715.0, 715.0);
        assert!((controller.crop_box().angle - 90.0).abs() < 1e-6);
        assert_contained(&controller);
    }

    #[test]
    fn test_resize_canvas_rescales_box() {
        let mut controller = CropController::new(1000.0, 500.0);
        controller.load(CropBox::new(100.0, 100.0, 200.0, 100.0, 0.0));
        controller.resize_canvas(500.0, 250.0);
        assert_eq!(controller.crop_box(), CropBox::new(50.0, 50.0, 100.0, 50.0, 0.0));
    }

    #[test]
    fn test_restore_keeps_ratio_lock_as_given() {
        let mut controller = CropController::new(1000.0, 1000.0);
        controller.restore(CropBox::new(100.0, 100.0, 300.0, 200.0, 370.0), None);
        assert_eq!(controller.locked_ratio(), None, "restore must not derive a ratio");
        assert!((controller.crop_box().angle - 10.0).abs() < EPS);

        controller.restore(CropBox::new(100.0, 100.0, 300.0, 200.0, 0.0), Some(4.0));
        assert_eq!(controller.locked_ratio(), Some(4.0));
        assert_eq!(controller.crop_box().height, 200.0, "restore does not reshape");
    }

    #[test]
    fn test_scaled_box() {
        let crop = CropBox::new(100.0, 50.0, 400.0, 200.0, 15.0);
        let half = crop.scaled(0.5, 0.5);
        assert_eq!(half, CropBox::new(50.0, 25.0, 200.0, 100.0, 15.0));
    }

    #[test]
    fn test_tiny_canvas_skips_clamp() {
        let mut controller = CropController::new(20.0, 20.0);
        controller.set_size(10.0, 10.0);
        assert_eq!(controller.crop_box().width, 10.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Step {
        Drag { from: (f64, f64), to: (f64, f64) },
        Angle(f64),
        Size(f64, f64),
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            ((0.0..1200.0, 0.0..1200.0), (-500.0..1700.0, -500.0..1700.0))
                .prop_map(|(from, to)| Step::Drag { from, to }),
            (-720.0..720.0).prop_map(Step::Angle),
            (1.0..3000.0, 1.0..3000.0).prop_map(|(w, h)| Step::Size(w, h)),
        ]
    }

    proptest! {
        #[test]
        fn box_stays_inside_canvas(
            canvas_w in 200.0f64..2000.0,
            canvas_h in 200.0f64..2000.0,
            steps in prop::collection::vec(step(), 1..20),
        ) {
            let mut controller = CropController::new(canvas_w, canvas_h);
            for s in steps {
                match s {
                    Step::Drag { from, to } => {
                        controller.pointer_down(from.0, from.1);
                        controller.pointer_move(to.0, to.1);
                        controller.pointer_up();
                    }
                    Step::Angle(a) => controller.set_angle(a),
                    Step::Size(w, h) => controller.set_size(w, h),
                }
                let crop = controller.crop_box();
                let (min_x, min_y, max_x, max_y) = crop.bounds();
                prop_assert!(min_x >= -1e-6 && min_y >= -1e-6, "{:?}", crop);
                prop_assert!(max_x <= canvas_w + 1e-6 && max_y <= canvas_h + 1e-6, "{:?}", crop);
                prop_assert!(crop.width >= MIN_CROP_SIZE - 1e-9 && crop.height >= MIN_CROP_SIZE - 1e-9);
            }
        }
    }
}
