//! RGBA raster type shared by every stage of the edit pipeline.
//!
//! Pixels are stored as straight (non-premultiplied) RGBA, 4 bytes per
//! pixel, row-major. Conversions to and from the `image` crate are provided
//! so resampling can reuse `image::imageops`.

use serde::{Deserialize, Serialize};

use crate::error::EditError;

/// Filter type for raster resizing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResizeFilter {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    #[default]
    Bilinear,
    /// Lanczos3 interpolation (slower, highest quality).
    Lanczos3,
}

impl ResizeFilter {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            ResizeFilter::Nearest => image::imageops::FilterType::Nearest,
            ResizeFilter::Bilinear => image::imageops::FilterType::Triangle,
            ResizeFilter::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// An RGBA image held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data in row-major order (4 bytes per pixel).
    pub pixels: Vec<u8>,
}

impl Raster {
    /// Create a raster from an RGBA buffer, validating its length.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, EditError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(EditError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create a raster filled with a single RGBA color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * 4);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create an opaque raster from packed RGB data.
    pub fn from_rgb(width: u32, height: u32, rgb: &[u8]) -> Result<Self, EditError> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(EditError::BufferSize {
                expected,
                actual: rgb.len(),
            });
        }
        let mut pixels = Vec::with_capacity(expected / 3 * 4);
        for chunk in rgb.chunks_exact(3) {
            pixels.extend_from_slice(&[chunk[0], chunk[1], chunk[2], 255]);
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create a Raster from an image::RgbaImage.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    /// Convert to an image::RgbaImage for further processing.
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Check if this is an empty raster.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    /// Read one pixel. Coordinates outside the raster are clamped to the edge.
    #[inline]
    pub fn pixel_clamped(&self, x: i64, y: i64) -> [u8; 4] {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        let idx = (y * self.width as usize + x) * 4;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Resize to exact dimensions. Zero dimensions are raised to one pixel.
    pub fn resize(&self, width: u32, height: u32, filter: ResizeFilter) -> Raster {
        let (width, height) = (width.max(1), height.max(1));
        if self.width == width && self.height == height {
            return self.clone();
        }
        match self.to_rgba_image() {
            Some(img) => Raster::from_rgba_image(image::imageops::resize(
                &img,
                width,
                height,
                filter.to_image_filter(),
            )),
            None => Raster::filled(width, height, [0, 0, 0, 0]),
        }
    }

    /// Downscale so the longest edge is at most `max_edge`, keeping aspect ratio.
    ///
    /// Rasters that already fit are returned unchanged.
    pub fn resize_to_fit(&self, max_edge: u32, filter: ResizeFilter) -> Raster {
        let max_edge = max_edge.max(1);
        if self.width <= max_edge && self.height <= max_edge {
            return self.clone();
        }
        let (w, h) = fit_dimensions(self.width, self.height, max_edge);
        self.resize(w, h, filter)
    }
}

/// Compute dimensions whose longest edge equals `max_edge`.
pub fn fit_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width >= height {
        let h = (height as f64 * max_edge as f64 / width.max(1) as f64).round() as u32;
        (max_edge, h.max(1))
    } else {
        let w = (width as f64 * max_edge as f64 / height.max(1) as f64).round() as u32;
        (w.max(1), max_edge)
    }
}
