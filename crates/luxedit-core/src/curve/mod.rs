//! Tone curve evaluation and LUT generation.
//!
//! Two curve models reduce to the same canonical 256-entry lookup table:
//!
//! - **Point curves** ([`PointCurve`]): 2 to 16 free control points joined by
//!   a Catmull-Rom spline.
//! - **Parametric curves** ([`ParametricCurve`]): four region sliders and
//!   three movable region thresholds, joined by a piecewise cubic Hermite
//!   spline with overshoot-limited tangents.
//!
//! LUT generation is deterministic: `lut[i] = round(clamp(curve(i / 255), 0, 1) * 255)`.

mod parametric;
mod point;

pub use parametric::{CurveRegion, ParametricCurve, Thresholds};
pub use point::{PointCurve, MAX_POINTS, MIN_POINT_GAP};

// ============================================================================
// LUT Type
// ============================================================================

/// Pre-computed 256-entry lookup table for efficient curve application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneCurveLut {
    /// LUT values: lut[input] = output
    pub lut: [u8; 256],
}

impl ToneCurveLut {
    /// Sample a curve defined on [0, 1] into a LUT.
    pub fn from_fn(curve: impl Fn(f32) -> f32) -> Self {
        let mut lut = [0u8; 256];
        for (i, lut_value) in lut.iter_mut().enumerate() {
            let y = curve(i as f32 / 255.0);
            *lut_value = quantize(y);
        }
        Self { lut }
    }

    /// Build a LUT from persisted bytes. Returns `None` unless exactly 256 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let lut: [u8; 256] = bytes.try_into().ok()?;
        Some(Self { lut })
    }

    /// Create identity LUT (no change).
    pub fn identity() -> Self {
        let mut lut = [0u8; 256];
        for (i, lut_value) in lut.iter_mut().enumerate() {
            *lut_value = i as u8;
        }
        Self { lut }
    }

    /// Check if this LUT is identity.
    pub fn is_identity(&self) -> bool {
        self.lut.iter().enumerate().all(|(i, &v)| v == i as u8)
    }

    /// Look up a single value.
    #[inline]
    pub fn apply(&self, value: u8) -> u8 {
        self.lut[value as usize]
    }

    /// Compose two tables: the result applies `self` first, then `next`.
    pub fn then(&self, next: &ToneCurveLut) -> ToneCurveLut {
        let mut lut = [0u8; 256];
        for (i, lut_value) in lut.iter_mut().enumerate() {
            *lut_value = next.lut[self.lut[i] as usize];
        }
        Self { lut }
    }

    /// Raw table bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.lut
    }
}

impl Default for ToneCurveLut {
    fn default() -> Self {
        Self::identity()
    }
}

/// Map a curve output in [0, 1] to a byte with round-half-up.
#[inline]
pub(crate) fn quantize(y: f32) -> u8 {
    if y.is_nan() {
        return 0;
    }
    (y.clamp(0.0, 1.0) * 255.0).round() as u8
}

// ============================================================================
// Curve Model
// ============================================================================

/// A tone curve in either of its two editing modes.
#[derive(Debug, Clone, PartialEq)]
pub enum ToneCurve {
    /// Freeform control points.
    Point(PointCurve),
    /// Region sliders with thresholds.
    Parametric(ParametricCurve),
}

impl ToneCurve {
    /// Reduce the curve to its canonical LUT.
    pub fn to_lut(&self) -> ToneCurveLut {
        match self {
            ToneCurve::Point(curve) => curve.to_lut(),
            ToneCurve::Parametric(curve) => curve.to_lut(),
        }
    }
}

impl Default for ToneCurve {
    fn default() -> Self {
        ToneCurve::Point(PointCurve::default())
    }
}

// ============================================================================
// Curve Application
// ============================================================================

/// Apply a tone curve LUT to the color channels of RGBA pixels in place.
///
/// # Arguments
/// * `pixels` - RGBA pixel data (4 bytes per pixel); alpha is untouched
/// * `lut` - Pre-computed lookup table
pub fn apply_tone_curve(pixels: &mut [u8], lut: &ToneCurveLut) {
    // Early exit for identity
    if lut.is_identity() {
        return;
    }

    for chunk in pixels.chunks_exact_mut(4) {
        chunk[0] = lut.lut[chunk[0] as usize];
        chunk[1] = lut.lut[chunk[1] as usize];
        chunk[2] = lut.lut[chunk[2] as usize];
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CurvePoint;

    #[test]
    fn test_identity_lut() {
        let lut = ToneCurveLut::identity();
        assert!(lut.is_identity());
        for i in 0..256 {
            assert_eq!(lut.lut[i], i as u8);
        }
    }

    #[test]
    fn test_from_fn_linear_is_identity() {
        let lut = ToneCurveLut::from_fn(|x| x);
        assert!(lut.is_identity(), "Linear function should give identity LUT");
    }

    #[test]
    fn test_from_fn_clamps_and_handles_nan() {
        let lut = ToneCurveLut::from_fn(|x| x * 3.0 - 1.0);
        assert_eq!(lut.lut[0], 0);
        assert_eq!(lut.lut[255], 255);

        let nan = ToneCurveLut::from_fn(|_| f32::NAN);
        assert!(nan.lut.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_from_bytes_requires_256() {
        assert!(ToneCurveLut::from_bytes(&[0u8; 255]).is_none());
        let bytes: Vec<u8> = (0..=255u8).collect();
        let lut = ToneCurveLut::from_bytes(&bytes).unwrap();
        assert!(lut.is_identity());
        assert_eq!(lut.as_bytes(), bytes.as_slice());
    }

    #[test]
    fn test_then_composes_in_order() {
        let invert = ToneCurveLut::from_fn(|x| 1.0 - x);
        let half = ToneCurveLut::from_fn(|x| x * 0.5);

        let composed = invert.then(&half);
        // 0 -> 255 -> 128
        assert_eq!(composed.apply(0), half.apply(255));
        // Composing with identity changes nothing
        assert_eq!(invert.then(&ToneCurveLut::identity()), invert);
    }

    #[test]
    fn test_apply_tone_curve_preserves_alpha() {
        let mut pixels = vec![0, 64, 128, 77, 255, 192, 10, 200];
        let invert = ToneCurveLut::from_fn(|x| 1.0 - x);

        apply_tone_curve(&mut pixels, &invert);

        assert_eq!(pixels, vec![255, 191, 127, 77, 0, 63, 245, 200]);
    }

    #[test]
    fn test_apply_tone_curve_identity() {
        let original = vec![0, 64, 128, 192, 255, 100, 1, 2];
        let mut pixels = original.clone();
        apply_tone_curve(&mut pixels, &ToneCurveLut::identity());
        assert_eq!(pixels, original);
    }

    #[test]
    fn test_tone_curve_modes_reduce_to_lut() {
        assert!(ToneCurve::default().to_lut().is_identity());
        assert!(ToneCurve::Parametric(ParametricCurve::default())
            .to_lut()
            .is_identity());

        let inverted = ToneCurve::Point(PointCurve::from_points(vec![
            CurvePoint::new(0.0, 1.0),
            CurvePoint::new(1.0, 0.0),
        ]));
        let lut = inverted.to_lut();
        assert_eq!(lut.lut[0], 255);
        assert_eq!(lut.lut[255], 0);
    }
}
