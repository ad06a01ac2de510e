//! Parametric tone curves: four region sliders over three movable thresholds.
//!
//! The curve passes through five anchors at x = (0, t1, t2, t3, 1). The three
//! interior y values are offset from the diagonal by weighted combinations of
//! the region sliders, then joined with a cubic Hermite spline whose tangents
//! are limited Fritsch-Carlson style so the curve cannot overshoot.

use serde::{Deserialize, Serialize};

use super::ToneCurveLut;

/// Minimum distance kept between neighboring thresholds.
pub const THRESHOLD_GAP: f32 = 0.10;

/// Minimum distance kept between the outer thresholds and 0 or 1.
pub const THRESHOLD_EDGE: f32 = 0.10;

/// Slider weight for the Darks, Lights and Highlights regions (per slider unit).
const REGION_SCALE: f32 = 0.25 / 100.0;

/// Slider weight for the Shadows region (per slider unit).
const SHADOW_SCALE: f32 = 0.18 / 100.0;

/// Maximum tangent-to-secant ratio before tangents are scaled back.
const TANGENT_LIMIT: f32 = 3.0;

/// Slider range for every region.
pub const SLIDER_RANGE: f32 = 100.0;

// ============================================================================
// Regions and Thresholds
// ============================================================================

/// The four tonal regions of a parametric curve, darkest last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurveRegion {
    Highlights,
    Lights,
    Darks,
    Shadows,
}

/// Three ordered region boundaries in (0, 1).
///
/// Always satisfies `EDGE <= t1`, `t1 + GAP <= t2`, `t2 + GAP <= t3` and
/// `t3 <= 1 - EDGE`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    t1: f32,
    t2: f32,
    t3: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            t1: 0.25,
            t2: 0.5,
            t3: 0.75,
        }
    }
}

impl Thresholds {
    /// Build thresholds, forcing them into order with the required spacing.
    pub fn new(t1: f32, t2: f32, t3: f32) -> Self {
        if !(t1.is_finite() && t2.is_finite() && t3.is_finite()) {
            return Self::default();
        }
        let t1 = t1
            .max(THRESHOLD_EDGE)
            .min(1.0 - THRESHOLD_EDGE - 2.0 * THRESHOLD_GAP);
        let t2 = t2
            .max(t1 + THRESHOLD_GAP)
            .min(1.0 - THRESHOLD_EDGE - THRESHOLD_GAP);
        let t3 = t3.max(t2 + THRESHOLD_GAP).min(1.0 - THRESHOLD_EDGE);
        Self { t1, t2, t3 }
    }

    /// Build from a persisted list. Anything but three values gives the defaults.
    pub fn from_slice(values: &[f32]) -> Self {
        match values {
            [t1, t2, t3] => Self::new(*t1, *t2, *t3),
            _ => Self::default(),
        }
    }

    pub fn t1(&self) -> f32 {
        self.t1
    }

    pub fn t2(&self) -> f32 {
        self.t2
    }

    pub fn t3(&self) -> f32 {
        self.t3
    }

    /// Values in persisted order.
    pub fn to_vec(&self) -> Vec<f32> {
        vec![self.t1, self.t2, self.t3]
    }

    /// Drag the first threshold, pushing the others right when crowded.
    pub fn move_t1(&mut self, x: f32) {
        if !x.is_finite() {
            return;
        }
        self.t1 = x.max(THRESHOLD_EDGE);
        if self.t1 > self.t2 - THRESHOLD_GAP {
            self.t2 = self.t1 + THRESHOLD_GAP;
            if self.t2 > self.t3 - THRESHOLD_GAP {
                self.t3 = self.t2 + THRESHOLD_GAP;
                if self.t3 > 1.0 - THRESHOLD_EDGE {
                    self.t3 = 1.0 - THRESHOLD_EDGE;
                    self.t2 = self.t3 - THRESHOLD_GAP;
                    self.t1 = self.t2 - THRESHOLD_GAP;
                }
            }
        }
    }

    /// Drag the middle threshold, pushing its neighbors outward when crowded.
    pub fn move_t2(&mut self, x: f32) {
        if !x.is_finite() {
            return;
        }
        let mut t2 = x;
        if t2 < self.t1 + THRESHOLD_GAP {
            self.t1 = (t2 - THRESHOLD_GAP).max(THRESHOLD_EDGE);
        }
        if t2 > self.t3 - THRESHOLD_GAP {
            self.t3 = (t2 + THRESHOLD_GAP).min(1.0 - THRESHOLD_EDGE);
        }
        t2 = t2
            .max(self.t1 + THRESHOLD_GAP)
            .min(self.t3 - THRESHOLD_GAP);
        self.t2 = t2;
    }

    /// Drag the last threshold, pushing the others left when crowded.
    pub fn move_t3(&mut self, x: f32) {
        if !x.is_finite() {
            return;
        }
        self.t3 = x.min(1.0 - THRESHOLD_EDGE);
        if self.t3 < self.t2 + THRESHOLD_GAP {
            self.t2 = self.t3 - THRESHOLD_GAP;
            if self.t2 < self.t1 + THRESHOLD_GAP {
                self.t1 = self.t2 - THRESHOLD_GAP;
                if self.t1 < THRESHOLD_EDGE {
                    self.t1 = THRESHOLD_EDGE;
                    self.t2 = self.t1 + THRESHOLD_GAP;
                    self.t3 = self.t2 + THRESHOLD_GAP;
                }
            }
        }
    }

    /// Index (0..=2) of the threshold closest to `x`.
    pub fn nearest(&self, x: f32) -> usize {
        let d = [
            (x - self.t1).abs(),
            (x - self.t2).abs(),
            (x - self.t3).abs(),
        ];
        if d[0] <= d[1] && d[0] <= d[2] {
            0
        } else if d[1] <= d[2] {
            1
        } else {
            2
        }
    }

    /// Drag threshold `index` (as returned by [`nearest`](Self::nearest)).
    pub fn drag(&mut self, index: usize, x: f32) {
        match index {
            0 => self.move_t1(x),
            1 => self.move_t2(x),
            _ => self.move_t3(x),
        }
    }

    /// The region an input level falls into.
    pub fn region_at(&self, x: f32) -> CurveRegion {
        if x < self.t1 {
            CurveRegion::Shadows
        } else if x < self.t2 {
            CurveRegion::Darks
        } else if x < self.t3 {
            CurveRegion::Lights
        } else {
            CurveRegion::Highlights
        }
    }
}

// ============================================================================
// Parametric Curve
// ============================================================================

/// A tone curve driven by four region sliders in [-100, 100].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParametricCurve {
    pub shadows: f32,
    pub darks: f32,
    pub lights: f32,
    pub highlights: f32,
    pub thresholds: Thresholds,
}

impl ParametricCurve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slider value of a region.
    pub fn slider(&self, region: CurveRegion) -> f32 {
        match region {
            CurveRegion::Highlights => self.highlights,
            CurveRegion::Lights => self.lights,
            CurveRegion::Darks => self.darks,
            CurveRegion::Shadows => self.shadows,
        }
    }

    /// Set a region slider, clamped to [-100, 100]. Non-finite input resets it to 0.
    pub fn set_slider(&mut self, region: CurveRegion, value: f32) {
        let value = if value.is_finite() {
            value.clamp(-SLIDER_RANGE, SLIDER_RANGE)
        } else {
            0.0
        };
        match region {
            CurveRegion::Highlights => self.highlights = value,
            CurveRegion::Lights => self.lights = value,
            CurveRegion::Darks => self.darks = value,
            CurveRegion::Shadows => self.shadows = value,
        }
    }

    /// Check if all sliders are zero (the curve is the diagonal).
    pub fn is_neutral(&self) -> bool {
        self.shadows == 0.0 && self.darks == 0.0 && self.lights == 0.0 && self.highlights == 0.0
    }

    /// Evaluate the curve at `x`.
    pub fn evaluate(&self, x: f32) -> f32 {
        HermiteSpline::build(self).evaluate(x)
    }

    /// Generate the canonical LUT.
    pub fn to_lut(&self) -> ToneCurveLut {
        if self.is_neutral() {
            return ToneCurveLut::identity();
        }
        let spline = HermiteSpline::build(self);
        ToneCurveLut::from_fn(|x| spline.evaluate(x))
    }

    /// Curves with `region` pinned to -100 and +100.
    ///
    /// Used for drawing the reachable band while a region is hovered.
    pub fn envelope(&self, region: CurveRegion) -> (ToneCurveLut, ToneCurveLut) {
        let mut low = self.clone();
        low.set_slider(region, -SLIDER_RANGE);
        let mut high = self.clone();
        high.set_slider(region, SLIDER_RANGE);
        (low.to_lut(), high.to_lut())
    }
}

// ============================================================================
// Cubic Hermite Spline
// ============================================================================

/// Five anchors with limited tangents.
struct HermiteSpline {
    xs: [f32; 5],
    ys: [f32; 5],
    ms: [f32; 5],
}

impl HermiteSpline {
    fn build(curve: &ParametricCurve) -> Self {
        let s = curve.shadows * SHADOW_SCALE;
        let dk = curve.darks * REGION_SCALE;
        let lt = curve.lights * REGION_SCALE;
        let hi = curve.highlights * REGION_SCALE;
        let th = &curve.thresholds;

        let xs = [0.0, th.t1, th.t2, th.t3, 1.0];
        let ys = [
            0.0,
            (th.t1 + s + 0.5 * dk).clamp(0.0, 1.0),
            (th.t2 + dk + 0.5 * (s + lt)).clamp(0.0, 1.0),
            (th.t3 + lt + 0.5 * dk + 0.8 * hi).clamp(0.0, 1.0),
            1.0,
        ];

        // Secant slopes
        let mut d = [0.0f32; 4];
        for i in 0..4 {
            let h = xs[i + 1] - xs[i];
            d[i] = if h.abs() < f32::EPSILON {
                0.0
            } else {
                (ys[i + 1] - ys[i]) / h
            };
        }

        // Averaged interior tangents; the right end follows the highlights slider
        let mut ms = [0.0f32; 5];
        ms[0] = d[0];
        for i in 1..4 {
            ms[i] = 0.5 * (d[i - 1] + d[i]);
        }
        ms[4] = 1.0 + 0.8 * hi;

        // Limit tangents to prevent overshoot
        for i in 0..4 {
            if d[i].abs() < 1e-9 {
                ms[i] = 0.0;
                ms[i + 1] = 0.0;
                continue;
            }
            let a = ms[i] / d[i];
            let b = ms[i + 1] / d[i];
            let len = a.hypot(b);
            if len > TANGENT_LIMIT {
                let tau = TANGENT_LIMIT / len;
                ms[i] = tau * a * d[i];
                ms[i + 1] = tau * b * d[i];
            }
        }

        Self { xs, ys, ms }
    }

    fn evaluate(&self, x: f32) -> f32 {
        let x = x.clamp(0.0, 1.0);
        let seg = if x < self.xs[1] {
            0
        } else if x < self.xs[2] {
            1
        } else if x < self.xs[3] {
            2
        } else {
            3
        };

        let h = self.xs[seg + 1] - self.xs[seg];
        if h.abs() < f32::EPSILON {
            return self.ys[seg];
        }

        let t = (x - self.xs[seg]) / h;
        let t2 = t * t;
        let t3 = t2 * t;

        // Hermite basis functions
        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        let y = h00 * self.ys[seg]
            + h10 * h * self.ms[seg]
            + h01 * self.ys[seg + 1]
            + h11 * h * self.ms[seg + 1];

        y.clamp(0.0, 1.0)
    }
}
