//! Crop extraction with bilinear and Lanczos3 interpolation.
//!
//! # Algorithm
//!
//! Extraction uses inverse mapping: for each output pixel `(u, v)` of a
//! `round(W) x round(H)` raster we find the source point it came from and
//! interpolate there. With `c` the crop center and `θ` the crop angle:
//!
//! ```text
//! src = c + R(θ) · (u + 0.5 - W/2, v + 0.5 - H/2)
//! R(θ) = [[cos θ, -sin θ], [sin θ, cos θ]]
//! ```
//!
//! Points that land outside the source are transparent.

use super::crop::CropBox;
use crate::raster::{Raster, ResizeFilter};

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Cut the (possibly rotated) crop box out of a raster, de-rotated.
///
/// # Arguments
///
/// * `raster` - Source pixels
/// * `crop` - Crop box in the raster's pixel units
/// * `filter` - Sampling filter; `Lanczos3` for full renders, `Bilinear` for previews
///
/// A crop that rounds to an empty raster returns the source unchanged.
pub fn extract_crop(raster: &Raster, crop: &CropBox, filter: ResizeFilter) -> Raster {
    let out_w = crop.width.round();
    let out_h = crop.height.round();
    if raster.is_empty() || !(out_w >= 1.0 && out_h >= 1.0) {
        return raster.clone();
    }
    let (out_w, out_h) = (out_w as u32, out_h as u32);

    // Fast path: axis-aligned crop on whole pixels is a plain copy
    if crop.angle.abs() < 1e-9 && crop.x.fract() == 0.0 && crop.y.fract() == 0.0 {
        return copy_region(raster, crop.x as i64, crop.y as i64, out_w, out_h);
    }

    let (sin, cos) = crop.angle.to_radians().sin_cos();
    let (cx, cy) = crop.center();
    let half_w = crop.width * 0.5;
    let half_h = crop.height * 0.5;

    let mut pixels = vec![0u8; out_w as usize * out_h as usize * 4];
    for (v, row) in pixels.chunks_exact_mut(out_w as usize * 4).enumerate() {
        let dy = v as f64 + 0.5 - half_h;
        for (u, pixel) in row.chunks_exact_mut(4).enumerate() {
            let dx = u as f64 + 0.5 - half_w;
            let src_x = cx + dx * cos - dy * sin;
            let src_y = cy + dx * sin + dy * cos;

            let sample = match filter {
                ResizeFilter::Nearest => sample_nearest(raster, src_x, src_y),
                ResizeFilter::Bilinear => sample_bilinear(raster, src_x, src_y),
                ResizeFilter::Lanczos3 => sample_lanczos3(raster, src_x, src_y),
            };
            pixel.copy_from_slice(&sample);
        }
    }

    Raster {
        width: out_w,
        height: out_h,
        pixels,
    }
}

fn copy_region(raster: &Raster, x0: i64, y0: i64, width: u32, height: u32) -> Raster {
    let (src_w, src_h) = (raster.width as i64, raster.height as i64);
    let mut pixels = vec![0u8; width as usize * height as usize * 4];

    for (v, row) in pixels.chunks_exact_mut(width as usize * 4).enumerate() {
        let sy = y0 + v as i64;
        if sy < 0 || sy >= src_h {
            continue;
        }
        for (u, pixel) in row.chunks_exact_mut(4).enumerate() {
            let sx = x0 + u as i64;
            if sx >= 0 && sx < src_w {
                pixel.copy_from_slice(&raster.pixel_clamped(sx, sy));
            }
        }
    }

    Raster {
        width,
        height,
        pixels,
    }
}

/// True when a continuous source point lies on the raster.
#[inline]
fn inside(raster: &Raster, x: f64, y: f64) -> bool {
    x >= 0.0 && y >= 0.0 && x <= raster.width as f64 && y <= raster.height as f64
}

#[inline]
fn get_pixel_f64(raster: &Raster, px: i64, py: i64) -> [f64; 4] {
    raster.pixel_clamped(px, py).map(f64::from)
}

fn sample_nearest(raster: &Raster, x: f64, y: f64) -> [u8; 4] {
    if !inside(raster, x, y) {
        return TRANSPARENT;
    }
    raster.pixel_clamped(x.floor() as i64, y.floor() as i64)
}

/// Bilinear over the 4 nearest pixel centers, edge pixels clamped.
fn sample_bilinear(raster: &Raster, x: f64, y: f64) -> [u8; 4] {
    if !inside(raster, x, y) {
        return TRANSPARENT;
    }

    // Pixel centers sit at half-integers
    let x = x - 0.5;
    let y = y - 0.5;
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let p00 = get_pixel_f64(raster, x0, y0);
    let p10 = get_pixel_f64(raster, x0 + 1, y0);
    let p01 = get_pixel_f64(raster, x0, y0 + 1);
    let p11 = get_pixel_f64(raster, x0 + 1, y0 + 1);

    let mut result = [0u8; 4];
    for i in 0..4 {
        let v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
        result[i] = v.clamp(0.0, 255.0).round() as u8;
    }
    result
}

/// Lanczos3 over a 6x6 neighborhood; bilinear within 3 pixels of an edge.
fn sample_lanczos3(raster: &Raster, x: f64, y: f64) -> [u8; 4] {
    let (w, h) = (raster.width as f64, raster.height as f64);
    if x < 3.0 || x >= w - 3.0 || y < 3.0 || y >= h - 3.0 {
        return sample_bilinear(raster, x, y);
    }

    let x = x - 0.5;
    let y = y - 0.5;
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    let mut sum = [0.0f64; 4];
    let mut weight_sum = 0.0;
    for ky in -2..=3 {
        for kx in -2..=3 {
            let px = x0 + kx;
            let py = y0 + ky;
            let weight = lanczos_weight(x - px as f64, 3.0) * lanczos_weight(y - py as f64, 3.0);

            let pixel = get_pixel_f64(raster, px, py);
            for i in 0..4 {
                sum[i] += pixel[i] * weight;
            }
            weight_sum += weight;
        }
    }

    let mut result = [0u8; 4];
    if weight_sum > 0.0 {
        for i in 0..4 {
            result[i] = (sum[i] / weight_sum).clamp(0.0, 255.0).round() as u8;
        }
    }
    result
}

/// Lanczos kernel: `sinc(x) * sinc(x / a)` for `|x| < a`, zero beyond.
fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }

    let pi_x = std::f64::consts::PI * x;
    let pi_x_a = pi_x / a;
    (a * pi_x.sin() * pi_x_a.sin()) / (pi_x * pi_x)
}
