//! Per-channel tonal tables and the vibrance shader.
//!
//! Shadows/highlights, blacks/whites and dehaze are all single-channel
//! remaps, so each is expressed as a [`ToneCurveLut`] that the pipeline
//! composes into one table.

use crate::curve::ToneCurveLut;

/// Below this level, the shadows slider applies.
const SHADOW_KNEE: f32 = 0.25;

/// Above this level, the highlights slider applies.
const HIGHLIGHT_KNEE: f32 = 0.75;

/// Dehaze strength is capped below 1 so the remap never divides by zero.
const MAX_HAZE: f32 = 0.99;

/// Shadows/highlights remap, or `None` when both sliders are zero.
///
/// Levels below 0.25 move toward (positive) or away from (negative) 0.25 in
/// proportion to their distance; levels above 0.75 do the same around 0.75.
///
/// # Arguments
/// * `shadows` - Shadows slider (-100 to 100)
/// * `highlights` - Highlights slider (-100 to 100)
pub fn shadows_highlights_table(shadows: f32, highlights: f32) -> Option<ToneCurveLut> {
    let shadows = (shadows / 100.0).clamp(-1.0, 1.0);
    let highlights = (highlights / 100.0).clamp(-1.0, 1.0);
    if shadows.abs() < 1e-6 && highlights.abs() < 1e-6 {
        return None;
    }

    Some(ToneCurveLut::from_fn(|v| {
        if v < SHADOW_KNEE {
            v + (SHADOW_KNEE - v) * shadows
        } else if v > HIGHLIGHT_KNEE {
            v + (v - HIGHLIGHT_KNEE) * highlights
        } else {
            v
        }
    }))
}

/// Blacks/whites remap pivoting at mid-gray, or `None` when both are zero.
///
/// # Arguments
/// * `blacks` - Blacks slider (-100 to 100)
/// * `whites` - Whites slider (-100 to 100)
pub fn blacks_whites_table(blacks: f32, whites: f32) -> Option<ToneCurveLut> {
    let blacks = (blacks / 100.0).clamp(-1.0, 1.0);
    let whites = (whites / 100.0).clamp(-1.0, 1.0);
    if blacks.abs() < 1e-6 && whites.abs() < 1e-6 {
        return None;
    }

    Some(ToneCurveLut::from_fn(|v| {
        if v < 0.5 {
            v + (0.5 - v) * blacks
        } else {
            v + (v - 0.5) * whites
        }
    }))
}

/// Dehaze remap, or `None` when the slider is zero.
///
/// With `h = dehaze / 200`, levels are stretched by `(v - h) / (1 - h)` and
/// then gamma-compressed by `1 / (1 + h / 4)` to hold the midtones.
pub fn dehaze_table(dehaze: f32) -> Option<ToneCurveLut> {
    let h = (dehaze / 200.0).clamp(-1.0, MAX_HAZE);
    if h.abs() < 1e-6 {
        return None;
    }
    let gamma = 1.0 / (1.0 + 0.25 * h);

    Some(ToneCurveLut::from_fn(|v| {
        let stretched = ((v - h) / (1.0 - h)).clamp(0.0, 1.0);
        stretched.powf(gamma)
    }))
}

/// Boost (or cut) saturation, weighted toward muted colors.
///
/// Already saturated pixels receive less of the change: the mix factor is
/// `vibrance * (1 - saturation)` around the channel average.
///
/// # Arguments
/// * `vibrance` - Normalized amount (-1 to 1)
#[inline]
pub fn apply_vibrance(r: f32, g: f32, b: f32, vibrance: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let sat = (max - min) / (max + 1e-5);
    let f = 1.0 + vibrance * (1.0 - sat);
    let gray = (r + g + b) / 3.0;
    (
        gray + (r - gray) * f,
        gray + (g - gray) * f,
        gray + (b - gray) * f,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sliders_have_no_table() {
        assert!(shadows_highlights_table(0.0, 0.0).is_none());
        assert!(blacks_whites_table(0.0, 0.0).is_none());
        assert!(dehaze_table(0.0).is_none());
    }

    #[test]
    fn test_shadows_lift_only_dark_levels() {
        let lut = shadows_highlights_table(100.0, 0.0).unwrap();
        // Full lift pins everything below the knee to 0.25
        assert_eq!(lut.apply(0), 64);
        assert_eq!(lut.apply(128), 128, "Midtones untouched");
        assert_eq!(lut.apply(255), 255);
    }

    #[test]
    fn test_highlights_pull_down() {
        let lut = shadows_highlights_table(0.0, -100.0).unwrap();
        assert_eq!(lut.apply(255), 191);
        assert_eq!(lut.apply(100), 100);
    }

    #[test]
    fn test_blacks_whites_pivot_at_mid_gray() {
        let lut = blacks_whites_table(-50.0, 50.0).unwrap();
        assert!(lut.apply(0) == 0, "Negative blacks keep black");
        assert!(lut.apply(64) < 64);
        assert!(lut.apply(200) > 200);
        assert_eq!(lut.apply(128), 128);
    }

    #[test]
    fn test_dehaze_deepens_low_levels() {
        let lut = dehaze_table(60.0).unwrap();
        assert_eq!(lut.apply(0), 0);
        assert_eq!(lut.apply(255), 255);
        assert!(lut.apply(100) < 100);
    }

    #[test]
    fn test_dehaze_extreme_is_finite() {
        let lut = dehaze_table(1000.0).unwrap();
        assert_eq!(lut.apply(255), 255);
    }

    #[test]
    fn test_vibrance_ignores_gray() {
        let (r, g, b) = apply_vibrance(0.4, 0.4, 0.4, 1.0);
        assert!((r - 0.4).abs() < 1e-6 && (g - 0.4).abs() < 1e-6 && (b - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_vibrance_favors_muted_colors() {
        let muted = apply_vibrance(0.5, 0.4, 0.4, 0.5);
        let vivid = apply_vibrance(1.0, 0.1, 0.1, 0.5);
        let muted_gain = (muted.0 - muted.1) / 0.1;
        let vivid_gain = (vivid.0 - vivid.1) / 0.9;
        assert!(muted_gain > vivid_gain);
    }
}
