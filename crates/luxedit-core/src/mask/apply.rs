//! Layer compositing through masks.
//!
//! Each visible layer builds its mask from its operations, runs its own
//! settings over the image accumulated so far, and blends the result back
//! through the mask at the layer's strength.

use super::MaskBitmap;
use crate::adjustments::ColorPipeline;
use crate::layer::{BooleanMode, Layer, MAX_STRENGTH};
use crate::raster::Raster;

/// Combine a layer's operation masks at `width` x `height`.
///
/// Returns `None` for a layer with no operations. Operations whose tool
/// produces no bitmap are skipped.
pub fn build_layer_mask(layer: &Layer, width: u32, height: u32) -> Option<MaskBitmap> {
    if layer.operations.is_empty() {
        return None;
    }

    let mut mask = MaskBitmap::new(width, height);
    for op in &layer.operations {
        let Some(bitmap) = op.tool.render_mask(width, height) else {
            tracing::debug!(
                layer = layer.id,
                operation = op.id,
                kind = ?op.kind(),
                "mask tool produced no bitmap, skipping"
            );
            continue;
        };
        let bitmap = bitmap.resize(width, height);
        match op.mode {
            BooleanMode::Add => mask.blend_over(&bitmap),
            BooleanMode::Subtract => mask.erase(&bitmap),
        }
    }
    Some(mask)
}

/// Blend `content` over `dst` through `mask`.
///
/// # Arguments
/// * `strength` - Percent in [0, 200]. Up to 100 this is one blend at
///   `strength / 100`; above 100 a full-opacity blend is followed by a
///   second blend at `(strength - 100) / 100`.
/// * `invert` - Use the complement of the mask
pub fn draw_masked(dst: &mut Raster, content: &Raster, mask: &MaskBitmap, strength: f32, invert: bool) {
    if dst.is_empty() || content.width != dst.width || content.height != dst.height {
        return;
    }
    let k = (strength / 100.0).clamp(0.0, MAX_STRENGTH / 100.0);
    if k.is_nan() {
        return;
    }
    let mask = mask.resize(dst.width, dst.height);

    if k <= 1.0 {
        blend_pass(dst, content, &mask, k, invert);
    } else {
        blend_pass(dst, content, &mask, 1.0, invert);
        blend_pass(dst, content, &mask, k - 1.0, invert);
    }
}

/// One source-over pass of `content` with per-pixel opacity `mask * alpha`.
fn blend_pass(dst: &mut Raster, content: &Raster, mask: &MaskBitmap, alpha: f32, invert: bool) {
    if alpha <= 0.0 {
        return;
    }

    for ((d, s), &m) in dst
        .pixels
        .chunks_exact_mut(4)
        .zip(content.pixels.chunks_exact(4))
        .zip(&mask.data)
    {
        let m = if invert { 255 - m } else { m };
        if m == 0 {
            continue;
        }

        let sa = (m as f32 / 255.0) * alpha * (s[3] as f32 / 255.0);
        let da = d[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            continue;
        }

        for ch in 0..3 {
            let v = (s[ch] as f32 * sa + d[ch] as f32 * da * (1.0 - sa)) / out_a;
            d[ch] = v.round().clamp(0.0, 255.0) as u8;
        }
        d[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

/// Composite one layer onto `dst`. Returns true if any pixels were drawn.
///
/// Hidden layers, layers without operations and layers whose settings are
/// neutral leave `dst` untouched.
pub fn composite_layer(dst: &mut Raster, layer: &Layer) -> bool {
    if !layer.visible || dst.is_empty() {
        return false;
    }
    let Some(mask) = build_layer_mask(layer, dst.width, dst.height) else {
        return false;
    };
    if !layer.has_active_filters() {
        return false;
    }

    let content = ColorPipeline::compile(&layer.settings).apply(dst);
    draw_masked(dst, &content, &mask, layer.strength, layer.invert);
    true
}

/// Composite every layer in stored order.
pub fn composite_layers(dst: &mut Raster, layers: &[Layer]) {
    for layer in layers {
        composite_layer(dst, layer);
    }
}
