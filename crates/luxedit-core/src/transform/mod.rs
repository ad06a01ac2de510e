//! Crop geometry: the oriented crop box, its interactive controller, and
//! extraction of the de-rotated crop from a raster.
//!
//! # Coordinate System
//!
//! - Crop boxes are in source pixel units, origin at the top-left corner
//! - Angles are in degrees, positive = clockwise on screen (y points down)
//! - The crop is applied before any color adjustment or layer

mod crop;
mod resample;

pub use crop::{normalize_angle, CropBox, CropController, CropInteraction, HANDLE_SIZE, MIN_CROP_SIZE};
pub use resample::extract_crop;
