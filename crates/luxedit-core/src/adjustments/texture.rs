//! Spatial filters: texture (sharpen or soften) and background blur.

use crate::mask::MaskBitmap;
use crate::raster::Raster;

/// Blur radius at full negative texture.
const MAX_TEXTURE_SIGMA: f32 = 3.0;

/// Mask values above this count as foreground for background blur.
const FOREGROUND_THRESHOLD: u8 = 128;

/// Texture filter derived from the Texture slider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Texture {
    /// 3x3 sharpen with center `1 + 4a` and edge neighbors `-a`.
    Sharpen(f32),
    /// Gaussian blur with the given sigma.
    Blur(f32),
}

impl Texture {
    /// Map a slider value (-100 to 100) to a filter.
    ///
    /// Values within 1e-6 of zero give no filter; any positive value
    /// sharpens and any negative value blurs.
    pub fn from_slider(texture: f32) -> Option<Self> {
        let t = (texture / 100.0).clamp(-1.0, 1.0);
        if t.is_nan() || t.abs() < 1e-6 {
            None
        } else if t > 0.0 {
            Some(Texture::Sharpen(t))
        } else {
            Some(Texture::Blur(t.abs() * MAX_TEXTURE_SIGMA))
        }
    }

    pub fn apply(&self, raster: &Raster) -> Raster {
        match *self {
            Texture::Sharpen(amount) => sharpen(raster, amount),
            Texture::Blur(sigma) => gaussian_blur(raster, sigma),
        }
    }
}

/// 3x3 cross-shaped sharpen. Edges are clamped and alpha is left untouched.
pub fn sharpen(raster: &Raster, amount: f32) -> Raster {
    if raster.is_empty() {
        return raster.clone();
    }
    let center = 1.0 + 4.0 * amount;
    let mut out = raster.clone();
    let width = raster.width as usize;

    for y in 0..raster.height as i64 {
        for x in 0..raster.width as i64 {
            let c = raster.pixel_clamped(x, y);
            let n = raster.pixel_clamped(x, y - 1);
            let s = raster.pixel_clamped(x, y + 1);
            let w = raster.pixel_clamped(x - 1, y);
            let e = raster.pixel_clamped(x + 1, y);

            let idx = (y as usize * width + x as usize) * 4;
            for ch in 0..3 {
                let neighbors = n[ch] as f32 + s[ch] as f32 + w[ch] as f32 + e[ch] as f32;
                let v = center * c[ch] as f32 - amount * neighbors;
                out.pixels[idx + ch] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}

/// Gaussian blur of the color channels; alpha is restored afterwards.
pub fn gaussian_blur(raster: &Raster, sigma: f32) -> Raster {
    if raster.is_empty() || sigma <= 0.0 {
        return raster.clone();
    }
    let Some(img) = raster.to_rgba_image() else {
        return raster.clone();
    };
    let mut blurred = Raster::from_rgba_image(image::imageops::blur(&img, sigma));
    for (dst, src) in blurred
        .pixels
        .chunks_exact_mut(4)
        .zip(raster.pixels.chunks_exact(4))
    {
        dst[3] = src[3];
    }
    blurred
}

/// Blur everything outside a foreground mask.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundBlur {
    /// Foreground mask; values above 128 keep the sharp source.
    pub mask: MaskBitmap,
    /// Blur sigma for the background.
    pub sigma: f32,
}

impl BackgroundBlur {
    pub fn apply(&self, raster: &Raster) -> Raster {
        if raster.is_empty() {
            return raster.clone();
        }
        let blurred = gaussian_blur(raster, self.sigma);
        let mask = self.mask.resize(raster.width, raster.height);

        let mut out = blurred;
        for (i, (dst, src)) in out
            .pixels
            .chunks_exact_mut(4)
            .zip(raster.pixels.chunks_exact(4))
            .enumerate()
        {
            if mask.data[i] > FOREGROUND_THRESHOLD {
                dst.copy_from_slice(src);
            }
        }
        out
    }
}
