//! Mask bitmaps and the tools that draw them.
//!
//! A mask is a single-channel 8-bit bitmap: 255 means the layer applies
//! fully, 0 means not at all. Tools keep their geometry in display
//! coordinates and render a bitmap at whatever size the compositor asks for.
//!
//! ## Mask Tools
//!
//! - **Brush**: soft round stamps painted into a working bitmap
//! - **Linear Gradient**: full effect at point A fading to none at point B
//! - **Radial Gradient**: any number of feathered circles
//!
//! ## Persistence
//!
//! Bitmaps travel as an opaque blob: PNG bytes encoded as standard base64.

pub mod apply;
pub mod brush;
pub mod linear;
pub mod radial;
pub mod tool;

pub use apply::{build_layer_mask, composite_layer, composite_layers, draw_masked};
pub use brush::BrushTool;
pub use linear::{LinearGradientMask, LinearGradientTool};
pub use radial::{RadialGradientMask, RadialGradientTool};
pub use tool::{MaskTool, MaskToolKind, PointerButton, PointerEvent};

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, GrayImage, ImageFormat};

use crate::error::EditError;

// ============================================================================
// Mask Bitmap
// ============================================================================

/// Single-channel mask in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskBitmap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl MaskBitmap {
    /// Create an empty (fully transparent) mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width as usize * height as usize],
        }
    }

    /// Rasterize a function of normalized, pixel-centered coordinates.
    ///
    /// # Arguments
    /// * `f` - Returns mask strength in [0, 1] for `(x, y)` in [0, 1]
    pub fn from_fn(width: u32, height: u32, f: impl Fn(f32, f32) -> f32) -> Self {
        let mut mask = Self::new(width, height);
        let w_f = width as f32;
        let h_f = height as f32;
        for (idx, value) in mask.data.iter_mut().enumerate() {
            let px = (idx as u32) % width;
            let py = (idx as u32) / width;
            let x = (px as f32 + 0.5) / w_f;
            let y = (py as f32 + 0.5) / h_f;
            *value = to_byte(f(x, y));
        }
        mask
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: u8) {
        let idx = (y * self.width + x) as usize;
        self.data[idx] = value;
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when no pixel has any coverage.
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }

    pub fn to_gray_image(&self) -> Option<GrayImage> {
        GrayImage::from_raw(self.width, self.height, self.data.clone())
    }

    pub fn from_gray_image(img: GrayImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            data: img.into_raw(),
        }
    }

    /// Bilinear resample to exact dimensions (at least one pixel each way).
    pub fn resize(&self, width: u32, height: u32) -> MaskBitmap {
        let (width, height) = (width.max(1), height.max(1));
        if self.width == width && self.height == height {
            return self.clone();
        }
        match self.to_gray_image() {
            Some(img) if !self.is_empty() => MaskBitmap::from_gray_image(image::imageops::resize(
                &img,
                width,
                height,
                image::imageops::FilterType::Triangle,
            )),
            _ => MaskBitmap::new(width, height),
        }
    }

    // ------------------------------------------------------------------------
    // Compositing
    // ------------------------------------------------------------------------

    /// Source-over: union of coverage. `other` must match in size.
    pub fn blend_over(&mut self, other: &MaskBitmap) {
        for (dst, &src) in self.data.iter_mut().zip(&other.data) {
            *dst = blend_over(*dst, src);
        }
    }

    /// Destination-out: remove `other`'s coverage. `other` must match in size.
    pub fn erase(&mut self, other: &MaskBitmap) {
        for (dst, &src) in self.data.iter_mut().zip(&other.data) {
            *dst = erase(*dst, src);
        }
    }

    // ------------------------------------------------------------------------
    // Blob
    // ------------------------------------------------------------------------

    /// Encode as base64 PNG.
    pub fn to_blob(&self) -> Result<String, EditError> {
        let img = self.to_gray_image().ok_or_else(|| {
            EditError::InvalidBlob(format!(
                "mask buffer does not match {}x{}",
                self.width, self.height
            ))
        })?;
        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(img).write_to(&mut png, ImageFormat::Png)?;
        Ok(STANDARD.encode(png.into_inner()))
    }

    /// Decode a base64 PNG blob.
    ///
    /// Images with an alpha channel contribute their alpha; opaque images
    /// contribute their luma.
    pub fn from_blob(blob: &str) -> Result<MaskBitmap, EditError> {
        let bytes = STANDARD.decode(blob.trim())?;
        if bytes.is_empty() {
            return Err(EditError::InvalidBlob("empty mask blob".to_string()));
        }
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png)?;

        let mask = if decoded.color().has_alpha() {
            let rgba = decoded.to_rgba8();
            let (width, height) = rgba.dimensions();
            MaskBitmap {
                width,
                height,
                data: rgba.pixels().map(|p| p.0[3]).collect(),
            }
        } else {
            MaskBitmap::from_gray_image(decoded.to_luma8())
        };
        Ok(mask)
    }
}

/// Map a strength in [0, 1] to a byte.
#[inline]
pub(crate) fn to_byte(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Source-over for a single coverage value: `a + s - a*s`.
#[inline]
pub fn blend_over(dst: u8, src: u8) -> u8 {
    let (a, s) = (dst as u32, src as u32);
    (a + s - (a * s + 127) / 255) as u8
}

/// Destination-out for a single coverage value: `a * (1 - s)`.
#[inline]
pub fn erase(dst: u8, src: u8) -> u8 {
    let (a, s) = (dst as u32, src as u32);
    ((a * (255 - s) + 127) / 255) as u8
}

/// Smootherstep interpolation function.
///
/// Returns values from 0.0 to 1.0 with zero velocity and acceleration at boundaries,
/// producing smooth transitions without visible banding.
///
/// Formula: `6t^5 - 15t^4 + 10t^3`
#[inline]
pub fn smootherstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn blend_over_never_reduces_coverage(a in 0u8..=255, s in 0u8..=255) {
            let out = blend_over(a, s);
            prop_assert!(out >= a.max(s));
        }

        #[test]
        fn erase_never_adds_coverage(a in 0u8..=255, s in 0u8..=255) {
            prop_assert!(erase(a, s) <= a);
        }
    }
}
