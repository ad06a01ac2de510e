//! Base color matrix: exposure, contrast, saturation and white balance folded
//! into a single affine transform.

use crate::settings::{keys, Settings, NEUTRAL_TEMPERATURE};

/// BT.709 luma coefficients.
pub const LUMA_R: f32 = 0.2126;
pub const LUMA_G: f32 = 0.7152;
pub const LUMA_B: f32 = 0.0722;

const MIN_TEMPERATURE: f32 = 2000.0;
const MAX_TEMPERATURE: f32 = 50000.0;

/// Per-channel white balance gains stay within this range.
const GAIN_RANGE: (f32, f32) = (0.5, 2.5);

/// A 3x4 affine color transform on normalized RGB.
///
/// Row `i` computes `out[i] = m[i][0]*r + m[i][1]*g + m[i][2]*b + m[i][3]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix {
    pub rows: [[f32; 4]; 3],
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl ColorMatrix {
    pub fn identity() -> Self {
        Self {
            rows: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
            ],
        }
    }

    /// Build the base matrix from settings, or `None` when every input is neutral.
    ///
    /// # Algorithm
    /// 1. Negative contrast is folded into exposure (`exposure += 5 * contrast`)
    /// 2. Exposure gain is `2^(exposure / 4)`
    /// 3. White balance: red and blue gains from `log2(temperature / 6500)`,
    ///    green gain from tint
    /// 4. Saturation scales chroma around BT.709 luma
    /// 5. Contrast scales around mid-gray
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let mut exposure = settings.float(keys::EXPOSURE);
        let contrast = settings.float(keys::CONTRAST);
        let saturation = settings.float(keys::SATURATION);
        let temperature = settings.float(keys::TEMPERATURE);
        let tint = settings.float(keys::TINT);

        if exposure.abs() < 1e-6
            && contrast.abs() < 1e-6
            && saturation.abs() < 1e-6
            && (temperature - NEUTRAL_TEMPERATURE).abs() < 1e-3
            && tint.abs() < 1e-6
        {
            return None;
        }

        if contrast < 0.0 {
            exposure += contrast * 5.0;
        }
        let gain = 2.0_f32.powf(exposure / 4.0);

        let (r_shift, g_shift, b_shift) = white_balance_gains(temperature, tint);

        // Saturation
        let sat = 1.0 + saturation / 100.0;
        let r_sat = LUMA_R * (1.0 - sat);
        let g_sat = LUMA_G * (1.0 - sat);
        let b_sat = LUMA_B * (1.0 - sat);

        // Contrast around mid-gray
        let cf = 1.0 + contrast / 500.0;
        let translate = 0.5 * (1.0 - cf);

        let k = gain * cf;
        Some(Self {
            rows: [
                [
                    (r_sat + sat) * k * r_shift,
                    g_sat * k * r_shift,
                    b_sat * k * r_shift,
                    translate,
                ],
                [
                    r_sat * k * g_shift,
                    (g_sat + sat) * k * g_shift,
                    b_sat * k * g_shift,
                    translate,
                ],
                [
                    r_sat * k * b_shift,
                    g_sat * k * b_shift,
                    (b_sat + sat) * k * b_shift,
                    translate,
                ],
            ],
        })
    }

    /// Check if this matrix leaves colors unchanged.
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Transform one normalized RGB triple. The result is not clamped.
    #[inline]
    pub fn apply(&self, r: f32, g: f32, b: f32) -> (f32, f32, f32) {
        let m = &self.rows;
        (
            m[0][0] * r + m[0][1] * g + m[0][2] * b + m[0][3],
            m[1][0] * r + m[1][1] * g + m[1][2] * b + m[1][3],
            m[2][0] * r + m[2][1] * g + m[2][2] * b + m[2][3],
        )
    }
}

/// Red, green and blue gains for a white balance setting.
///
/// Temperature is clamped to [2000, 50000] K; each doubling away from 6500 K
/// moves red and blue by 20% in opposite directions. Tint moves green by
/// `tint / 100`.
pub fn white_balance_gains(temperature: f32, tint: f32) -> (f32, f32, f32) {
    let temperature = temperature.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE);
    let ratio = (temperature / NEUTRAL_TEMPERATURE).log2();

    let red = (1.0 + 0.2 * ratio).clamp(GAIN_RANGE.0, GAIN_RANGE.1);
    let green = (1.0 - tint / 100.0).clamp(GAIN_RANGE.0, GAIN_RANGE.1);
    let blue = (1.0 - 0.2 * ratio).clamp(GAIN_RANGE.0, GAIN_RANGE.1);
    (red, green, blue)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(pairs: &[(&str, f32)]) -> Settings {
        let mut settings = Settings::default_image();
        for (key, value) in pairs {
            settings.set_float(key, *value);
        }
        settings
    }

    #[test]
    fn test_neutral_settings_have_no_matrix() {
        assert!(ColorMatrix::from_settings(&Settings::default_image()).is_none());
        assert!(ColorMatrix::from_settings(&Settings::new()).is_none());
    }

    #[test]
    fn test_exposure_gain() {
        let m = ColorMatrix::from_settings(&settings_with(&[(keys::EXPOSURE, 4.0)])).unwrap();
        let (r, g, b) = m.apply(0.25, 0.25, 0.25);
        assert!((r - 0.5).abs() < 1e-5);
        assert!((g - 0.5).abs() < 1e-5);
        assert!((b - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_negative_contrast_darkens_through_exposure() {
        let m = ColorMatrix::from_settings(&settings_with(&[(keys::CONTRAST, -1.0)])).unwrap();
        let (r, _, _) = m.apply(0.5, 0.5, 0.5);
        assert!(r < 0.3, "Expected darkening, got {}", r);
    }

    #[test]
    fn test_full_desaturation_is_luma() {
        let m = ColorMatrix::from_settings(&settings_with(&[(keys::SATURATION, -100.0)])).unwrap();
        let (r, g, b) = m.apply(1.0, 0.0, 0.0);
        assert!((r - LUMA_R).abs() < 1e-5);
        assert!((g - LUMA_R).abs() < 1e-5);
        assert!((b - LUMA_R).abs() < 1e-5);
    }

    #[test]
    fn test_saturation_preserves_gray() {
        let m = ColorMatrix::from_settings(&settings_with(&[(keys::SATURATION, 60.0)])).unwrap();
        let (r, g, b) = m.apply(0.4, 0.4, 0.4);
        assert!((r - 0.4).abs() < 1e-5 && (g - 0.4).abs() < 1e-5 && (b - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_white_balance_gains() {
        let (r, g, b) = white_balance_gains(13000.0, 0.0);
        assert!((r - 1.2).abs() < 1e-5);
        assert!((g - 1.0).abs() < 1e-5);
        assert!((b - 0.8).abs() < 1e-5);

        let (_, g, _) = white_balance_gains(6500.0, 50.0);
        assert!((g - 0.5).abs() < 1e-5);

        // Out of range temperatures are clamped before the log
        assert_eq!(white_balance_gains(100.0, 0.0), white_balance_gains(2000.0, 0.0));
    }

    #[test]
    fn test_warm_temperature_boosts_red() {
        let m = ColorMatrix::from_settings(&settings_with(&[(keys::TEMPERATURE, 10000.0)])).unwrap();
        let (r, _, b) = m.apply(0.5, 0.5, 0.5);
        assert!(r > 0.5 && b < 0.5);
    }

    #[test]
    fn test_identity_apply() {
        let m = ColorMatrix::identity();
        assert!(m.is_identity());
        assert_eq!(m.apply(0.1, 0.2, 0.3), (0.1, 0.2, 0.3));
    }
}
