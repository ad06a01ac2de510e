//! Color adjustment compiler.
//!
//! Compiles a [`Settings`] map into a [`ColorPipeline`]: an ordered list of
//! optional stages, each skipped when its parameters are neutral.
//!
//! # Stage Order
//!
//! 1. Background blur (spatial, optional)
//! 2. Base color matrix: exposure, contrast, saturation, white balance
//! 3. Tonal table: shadows/highlights, blacks/whites, dehaze
//! 4. Vibrance
//! 5. Tone curves: parametric, point, then per-channel red/green/blue
//! 6. Texture (spatial)
//!
//! Stages 2 through 5 are per-pixel and run in a single pass. Missing
//! settings read as neutral, so compiling never fails.

mod matrix;
mod tables;
mod texture;

pub use matrix::{white_balance_gains, ColorMatrix, LUMA_B, LUMA_G, LUMA_R};
pub use tables::{apply_vibrance, blacks_whites_table, dehaze_table, shadows_highlights_table};
pub use texture::{gaussian_blur, sharpen, BackgroundBlur, Texture};

use crate::curve::{quantize, ToneCurveLut};
use crate::mask::MaskBitmap;
use crate::raster::Raster;
use crate::settings::{keys, Settings};

// ============================================================================
// Channel Tables
// ============================================================================

/// Composed per-channel tone tables.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelLuts {
    pub red: ToneCurveLut,
    pub green: ToneCurveLut,
    pub blue: ToneCurveLut,
}

impl ChannelLuts {
    /// Compose the stored curve tables, or `None` when all are identity.
    ///
    /// The shared tables (parametric, then point) apply to every channel
    /// before that channel's own table.
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let table = |key: &str| settings.lut(key).cloned().unwrap_or_default();

        let base = table(keys::TONE_CURVE_PARAMETRIC).then(&table(keys::TONE_CURVE_POINT));
        let luts = Self {
            red: base.then(&table(keys::TONE_CURVE_RED)),
            green: base.then(&table(keys::TONE_CURVE_GREEN)),
            blue: base.then(&table(keys::TONE_CURVE_BLUE)),
        };

        if luts.is_identity() {
            None
        } else {
            Some(luts)
        }
    }

    pub fn is_identity(&self) -> bool {
        self.red.is_identity() && self.green.is_identity() && self.blue.is_identity()
    }

    #[inline]
    fn apply(&self, px: &mut [u8]) {
        px[0] = self.red.apply(px[0]);
        px[1] = self.green.apply(px[1]);
        px[2] = self.blue.apply(px[2]);
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// A compiled, reusable color transform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorPipeline {
    pub background: Option<BackgroundBlur>,
    pub matrix: Option<ColorMatrix>,
    /// Shadows/highlights, blacks/whites and dehaze composed in that order.
    pub tonal: Option<ToneCurveLut>,
    /// Normalized vibrance in [-1, 1].
    pub vibrance: Option<f32>,
    pub tone: Option<ChannelLuts>,
    pub texture: Option<Texture>,
}

impl ColorPipeline {
    /// Compile settings without a background mask.
    pub fn compile(settings: &Settings) -> Self {
        Self::compile_with_background(settings, None)
    }

    /// Compile settings, enabling background blur when `Blur_State` is set
    /// and a foreground mask is available.
    pub fn compile_with_background(settings: &Settings, mask: Option<&MaskBitmap>) -> Self {
        let background = match mask {
            Some(mask) if settings.float(keys::BLUR_STATE) != 0.0 => Some(BackgroundBlur {
                mask: mask.clone(),
                sigma: settings.float(keys::BLUR_SIGMA),
            }),
            _ => None,
        };

        let tonal = [
            shadows_highlights_table(
                settings.float(keys::SHADOWS),
                settings.float(keys::HIGHLIGHTS),
            ),
            blacks_whites_table(settings.float(keys::BLACKS), settings.float(keys::WHITES)),
            dehaze_table(settings.float(keys::DEHAZE)),
        ]
        .into_iter()
        .flatten()
        .reduce(|acc, next| acc.then(&next));

        let vibrance = (settings.float(keys::VIBRANCE) / 100.0).clamp(-1.0, 1.0);

        let pipeline = Self {
            background,
            matrix: ColorMatrix::from_settings(settings),
            tonal,
            vibrance: (vibrance.abs() >= 1e-6).then_some(vibrance),
            tone: ChannelLuts::from_settings(settings),
            texture: Texture::from_slider(settings.float(keys::TEXTURE)),
        };

        tracing::trace!(
            background = pipeline.background.is_some(),
            matrix = pipeline.matrix.is_some(),
            tonal = pipeline.tonal.is_some(),
            vibrance = pipeline.vibrance.is_some(),
            tone = pipeline.tone.is_some(),
            texture = pipeline.texture.is_some(),
            "compiled color pipeline"
        );
        pipeline
    }

    /// True when every stage is skipped.
    pub fn is_identity(&self) -> bool {
        self.background.is_none()
            && self.matrix.is_none()
            && self.tonal.is_none()
            && self.vibrance.is_none()
            && self.tone.is_none()
            && self.texture.is_none()
    }

    /// Run the pipeline, returning a new raster.
    pub fn apply(&self, raster: &Raster) -> Raster {
        let mut out = match &self.background {
            Some(background) => background.apply(raster),
            None => raster.clone(),
        };
        self.apply_pixels(&mut out.pixels);
        match &self.texture {
            Some(texture) => texture.apply(&out),
            None => out,
        }
    }

    /// Run the pipeline in place.
    pub fn apply_in_place(&self, raster: &mut Raster) {
        if self.background.is_some() || self.texture.is_some() {
            *raster = self.apply(raster);
        } else {
            self.apply_pixels(&mut raster.pixels);
        }
    }

    /// Per-pixel stages over RGBA data; alpha is untouched.
    fn apply_pixels(&self, pixels: &mut [u8]) {
        if self.matrix.is_none()
            && self.tonal.is_none()
            && self.vibrance.is_none()
            && self.tone.is_none()
        {
            return;
        }

        for px in pixels.chunks_exact_mut(4) {
            if let Some(matrix) = &self.matrix {
                let (r, g, b) = matrix.apply(
                    px[0] as f32 / 255.0,
                    px[1] as f32 / 255.0,
                    px[2] as f32 / 255.0,
                );
                px[0] = quantize(r);
                px[1] = quantize(g);
                px[2] = quantize(b);
            }

            if let Some(tonal) = &self.tonal {
                px[0] = tonal.apply(px[0]);
                px[1] = tonal.apply(px[1]);
                px[2] = tonal.apply(px[2]);
            }

            if let Some(vibrance) = self.vibrance {
                let (r, g, b) = apply_vibrance(
                    px[0] as f32 / 255.0,
                    px[1] as f32 / 255.0,
                    px[2] as f32 / 255.0,
                    vibrance,
                );
                px[0] = quantize(r);
                px[1] = quantize(g);
                px[2] = quantize(b);
            }

            if let Some(tone) = &self.tone {
                tone.apply(px);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_raster() -> Raster {
        let mut pixels = Vec::with_capacity(16 * 16 * 4);
        for i in 0..256u32 {
            let v = i as u8;
            pixels.extend_from_slice(&[v, v.wrapping_mul(3), 255 - v, 200]);
        }
        Raster::new(16, 16, pixels).unwrap()
    }

    #[test]
    fn test_neutral_settings_compile_to_identity() {
        let pipeline = ColorPipeline::compile(&Settings::default_image());
        assert!(pipeline.is_identity(), "Neutral settings should skip every stage");

        let src = gradient_raster();
        assert_eq!(pipeline.apply(&src), src, "Identity pipeline must not touch pixels");
    }

    #[test]
    fn test_missing_keys_compile_to_identity() {
        assert!(ColorPipeline::compile(&Settings::new()).is_identity());
    }

    #[test]
    fn test_positive_exposure_brightens() {
        let mut settings = Settings::default_image();
        settings.set_float(keys::EXPOSURE, 2.0);
        let pipeline = ColorPipeline::compile(&settings);
        assert!(pipeline.matrix.is_some());

        let src = Raster::filled(2, 2, [100, 100, 100, 255]);
        let out = pipeline.apply(&src);
        // 2^(2/4) = 1.414 -> 141
        assert_eq!(out.pixels[0], 141, "Exposure gain should follow 2^(e/4)");
        assert_eq!(out.pixels[3], 255, "Alpha must be preserved");
    }

    #[test]
    fn test_tonal_tables_compose_in_order() {
        let mut settings = Settings::default_image();
        settings.set_float(keys::SHADOWS, 100.0);
        settings.set_float(keys::DEHAZE, 60.0);
        let pipeline = ColorPipeline::compile(&settings);

        let expected = shadows_highlights_table(100.0, 0.0)
            .unwrap()
            .then(&dehaze_table(60.0).unwrap());
        assert_eq!(pipeline.tonal, Some(expected));
    }

    #[test]
    fn test_channel_luts_compose_shared_then_channel() {
        let mut settings = Settings::default_image();
        let invert = ToneCurveLut::from_fn(|x| 1.0 - x);
        settings.set_lut(keys::TONE_CURVE_POINT, invert.clone());
        settings.set_lut(keys::TONE_CURVE_RED, invert);

        let luts = ChannelLuts::from_settings(&settings).unwrap();
        assert!(luts.red.is_identity(), "Double inversion on red cancels out");
        assert_eq!(luts.green.apply(0), 255);
        assert_eq!(luts.blue.apply(255), 0);
    }

    #[test]
    fn test_identity_curve_tables_are_skipped() {
        let mut settings = Settings::default_image();
        settings.set_lut(keys::TONE_CURVE_PARAMETRIC, ToneCurveLut::identity());
        settings.set_lut(keys::TONE_CURVE_GREEN, ToneCurveLut::identity());
        assert!(ChannelLuts::from_settings(&settings).is_none());
    }

    #[test]
    fn test_vibrance_normalized_and_clamped() {
        let mut settings = Settings::default_image();
        settings.set_float(keys::VIBRANCE, 400.0);
        assert_eq!(ColorPipeline::compile(&settings).vibrance, Some(1.0));

        settings.set_float(keys::VIBRANCE, -50.0);
        assert_eq!(ColorPipeline::compile(&settings).vibrance, Some(-0.5));
    }

    #[test]
    fn test_background_requires_state_and_mask() {
        let mask = MaskBitmap::new(4, 4);
        let mut settings = Settings::default_image();

        let off = ColorPipeline::compile_with_background(&settings, Some(&mask));
        assert!(off.background.is_none(), "Blur_State 0 disables background blur");

        settings.set_float(keys::BLUR_STATE, 1.0);
        settings.set_float(keys::BLUR_SIGMA, 8.0);
        let on = ColorPipeline::compile_with_background(&settings, Some(&mask));
        assert_eq!(on.background.as_ref().map(|b| b.sigma), Some(8.0));

        let no_mask = ColorPipeline::compile_with_background(&settings, None);
        assert!(no_mask.background.is_none(), "No mask means no background blur");
    }

    #[test]
    fn test_apply_in_place_matches_apply() {
        let mut settings = Settings::default_image();
        settings.set_float(keys::CONTRAST, 40.0);
        settings.set_float(keys::TEMPERATURE, 4000.0);
        settings.set_float(keys::TEXTURE, 30.0);
        let pipeline = ColorPipeline::compile(&settings);

        let src = gradient_raster();
        let mut in_place = src.clone();
        pipeline.apply_in_place(&mut in_place);
        assert_eq!(in_place, pipeline.apply(&src));
    }

    #[test]
    fn test_pipeline_preserves_alpha() {
        let mut settings = Settings::default_image();
        settings.set_float(keys::SATURATION, -100.0);
        settings.set_float(keys::WHITES, 50.0);
        settings.set_float(keys::VIBRANCE, 30.0);
        let out = ColorPipeline::compile(&settings).apply(&gradient_raster());
        assert!(out.pixels.chunks_exact(4).all(|px| px[3] == 200));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn compile_is_deterministic(
            exposure in -5.0f32..5.0,
            contrast in -100.0f32..100.0,
            shadows in -100.0f32..100.0,
            dehaze in -100.0f32..100.0,
        ) {
            let mut settings = Settings::default_image();
            settings.set_float(keys::EXPOSURE, exposure);
            settings.set_float(keys::CONTRAST, contrast);
            settings.set_float(keys::SHADOWS, shadows);
            settings.set_float(keys::DEHAZE, dehaze);

            let src = Raster::filled(3, 3, [37, 128, 211, 255]);
            let a = ColorPipeline::compile(&settings).apply(&src);
            let b = ColorPipeline::compile(&settings).apply(&src);
            prop_assert_eq!(a, b);
        }
    }
}
