//! Freeform point curves joined by a Catmull-Rom spline.

use serde::{Deserialize, Serialize};

use super::ToneCurveLut;
use crate::CurvePoint;

/// Maximum number of control points on a point curve.
pub const MAX_POINTS: usize = 16;

/// Minimum horizontal distance kept between neighboring control points.
pub const MIN_POINT_GAP: f32 = 0.01;

/// Tolerance used when comparing x positions against the minimum gap.
const GAP_TOLERANCE: f32 = 1e-6;

/// A tone curve defined by 2 to 16 control points with strictly increasing x.
///
/// Values outside the span of the end points are held flat at the end
/// point values, so `LUT[0]` and `LUT[255]` always reproduce the y of the
/// first and last control points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCurve {
    points: Vec<CurvePoint>,
}

impl Default for PointCurve {
    fn default() -> Self {
        Self {
            points: vec![CurvePoint::new(0.0, 0.0), CurvePoint::new(1.0, 1.0)],
        }
    }
}

impl PointCurve {
    /// Create the default linear curve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a curve from arbitrary points.
    ///
    /// Coordinates are clamped to [0, 1], points are sorted by x, points
    /// closer than [`MIN_POINT_GAP`] to their predecessor are dropped and
    /// the list is capped at [`MAX_POINTS`]. Fewer than two usable points
    /// degrade to the linear curve.
    pub fn from_points(points: Vec<CurvePoint>) -> Self {
        let mut sorted: Vec<CurvePoint> = points
            .into_iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .map(|p| CurvePoint::new(p.x.clamp(0.0, 1.0), p.y.clamp(0.0, 1.0)))
            .collect();
        sorted.sort_by(|a, b| a.x.total_cmp(&b.x));

        let Some(&last) = sorted.last() else {
            return Self::default();
        };

        let mut kept: Vec<CurvePoint> = Vec::with_capacity(sorted.len().min(MAX_POINTS));
        for p in sorted {
            match kept.last() {
                Some(prev) if p.x < prev.x + MIN_POINT_GAP - GAP_TOLERANCE => continue,
                _ => kept.push(p),
            }
        }

        // The right end point always survives, replacing a crowded neighbor.
        if kept.last() != Some(&last) && kept.len() > 1 {
            kept.pop();
            kept.push(last);
        }

        if kept.len() > MAX_POINTS {
            kept.truncate(MAX_POINTS - 1);
            kept.push(last);
        }

        if kept.len() < 2 {
            return Self::default();
        }
        Self { points: kept }
    }

    /// Control points, sorted by x.
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Check if the curve is the untouched diagonal.
    pub fn is_linear(&self) -> bool {
        *self == Self::default()
    }

    /// Restore the linear curve.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Insert a control point, keeping x order.
    ///
    /// Returns the index of the new point, or `None` if the curve is full or
    /// the point would sit closer than [`MIN_POINT_GAP`] to a neighbor.
    pub fn add_point(&mut self, x: f32, y: f32) -> Option<usize> {
        if self.points.len() >= MAX_POINTS || !x.is_finite() || !y.is_finite() {
            return None;
        }
        let p = CurvePoint::new(x.clamp(0.0, 1.0), y.clamp(0.0, 1.0));
        let index = self.points.partition_point(|q| q.x < p.x);

        let too_close = |q: &CurvePoint| (q.x - p.x).abs() < MIN_POINT_GAP - GAP_TOLERANCE;
        if index > 0 && too_close(&self.points[index - 1]) {
            return None;
        }
        if index < self.points.len() && too_close(&self.points[index]) {
            return None;
        }

        self.points.insert(index, p);
        Some(index)
    }

    /// Drag a control point. y is clamped to [0, 1]. End points keep their
    /// x; interior x stays at least [`MIN_POINT_GAP`] from both neighbors.
    pub fn move_point(&mut self, index: usize, x: f32, y: f32) -> bool {
        if index >= self.points.len() || !x.is_finite() || !y.is_finite() {
            return false;
        }
        let nx = if index == 0 || index + 1 == self.points.len() {
            self.points[index].x
        } else {
            x.clamp(0.0, 1.0)
                .max(self.points[index - 1].x + MIN_POINT_GAP)
                .min(self.points[index + 1].x - MIN_POINT_GAP)
        };
        self.points[index] = CurvePoint::new(nx, y.clamp(0.0, 1.0));
        true
    }

    /// Remove an interior control point. End points cannot be removed.
    pub fn remove_point(&mut self, index: usize) -> bool {
        if index == 0 || index + 1 >= self.points.len() {
            return false;
        }
        self.points.remove(index);
        true
    }

    /// Index of the control point within `radius` of (x, y), if any.
    pub fn hit_index(&self, x: f32, y: f32, radius: f32) -> Option<usize> {
        self.points
            .iter()
            .position(|p| ((p.x - x).powi(2) + (p.y - y).powi(2)).sqrt() <= radius)
    }

    /// Evaluate the curve at `x`.
    ///
    /// Two points interpolate linearly. Otherwise the segment containing `x`
    /// is evaluated as a uniform Catmull-Rom spline over the neighboring y
    /// values; missing outer neighbors are mirrored through the end point.
    pub fn evaluate(&self, x: f32) -> f32 {
        let pts = &self.points;
        let n = pts.len();
        let first = pts[0];
        let last = pts[n - 1];
        let x = x.max(first.x).min(last.x);

        let i = find_interval(pts, x);
        let p1 = pts[i];
        let p2 = pts[i + 1];

        let span = p2.x - p1.x;
        if span < f32::EPSILON {
            return p1.y;
        }
        let t = (x - p1.x) / span;
        if t <= 0.0 {
            return p1.y;
        }
        if t >= 1.0 {
            return p2.y;
        }

        if n == 2 {
            return p1.y + (p2.y - p1.y) * t;
        }

        let y0 = if i > 0 { pts[i - 1].y } else { 2.0 * p1.y - p2.y };
        let y3 = if i + 2 < n {
            pts[i + 2].y
        } else {
            2.0 * p2.y - p1.y
        };

        catmull_rom(y0, p1.y, p2.y, y3, t)
    }

    /// Generate the canonical LUT.
    pub fn to_lut(&self) -> ToneCurveLut {
        if self.is_linear() {
            return ToneCurveLut::identity();
        }
        ToneCurveLut::from_fn(|x| self.evaluate(x))
    }
}

/// Uniform Catmull-Rom interpolation between `p1` and `p2`.
#[inline]
fn catmull_rom(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p1
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

/// Binary search for the last segment start with `points[i].x <= x`.
fn find_interval(points: &[CurvePoint], x: f32) -> usize {
    let n = points.len();
    if n <= 2 {
        return 0;
    }

    let mut low = 0;
    let mut high = n - 2;

    while low < high {
        let mid = (low + high).div_ceil(2);
        if points[mid].x <= x {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    low
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_points() -> impl Strategy<Value = Vec<CurvePoint>> {
        prop::collection::vec((0.0f32..=1.0, 0.0f32..=1.0), 2..20)
            .prop_map(|v| v.into_iter().map(|(x, y)| CurvePoint::new(x, y)).collect())
    }

    proptest! {
        #[test]
        fn prop_lut_deterministic(points in arb_points()) {
            let a = PointCurve::from_points(points.clone()).to_lut();
            let b = PointCurve::from_points(points).to_lut();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_endpoints_reproduced(points in arb_points()) {
            let c = PointCurve::from_points(points);
            let lut = c.to_lut();
            let first = c.points()[0];
            let last = c.points()[c.points().len() - 1];
            prop_assert_eq!(lut.lut[0], (first.y * 255.0).round() as u8);
            prop_assert_eq!(lut.lut[255], (last.y * 255.0).round() as u8);
        }

        #[test]
        fn prop_points_strictly_increasing(points in arb_points(), moves in prop::collection::vec((0usize..16, -0.5f32..1.5, -0.5f32..1.5), 0..20)) {
            let mut c = PointCurve::from_points(points);
            for (i, x, y) in moves {
                c.move_point(i % c.points().len(), x, y);
            }
            prop_assert!(c.points().len() >= 2 && c.points().len() <= MAX_POINTS);
            for w in c.points().windows(2) {
                prop_assert!(w[1].x > w[0].x, "x not increasing: {} then {}", w[0].x, w[1].x);
            }
        }
    }
}
