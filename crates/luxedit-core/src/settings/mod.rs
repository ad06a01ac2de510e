//! Per-image and per-layer edit settings.
//!
//! Settings are a string-keyed map whose values are scalars, 256-entry
//! curve tables, threshold lists or curve control points. Every reader has a
//! neutral fallback, so a missing or mistyped key never stops a render: it
//! simply contributes nothing.

mod codec;

use std::collections::BTreeMap;

use crate::curve::{ParametricCurve, PointCurve, Thresholds, ToneCurveLut};
use crate::CurvePoint;

/// Well-known setting keys.
pub mod keys {
    pub const EXPOSURE: &str = "Exposure";
    pub const CONTRAST: &str = "Contrast";
    pub const SATURATION: &str = "Saturation";
    pub const VIBRANCE: &str = "Vibrance";
    pub const TEMPERATURE: &str = "Temperature";
    pub const TINT: &str = "Tint";
    pub const SHADOWS: &str = "Shadows";
    pub const HIGHLIGHTS: &str = "Highlights";
    pub const BLACKS: &str = "Blacks";
    pub const WHITES: &str = "Whites";
    pub const DEHAZE: &str = "Dehaze";
    pub const TEXTURE: &str = "Texture";

    /// Prefix shared by every tone curve key.
    pub const TONE_CURVE_PREFIX: &str = "ToneCurve_";
    pub const TONE_CURVE_PARAMETRIC: &str = "ToneCurve_Parametric";
    pub const TONE_CURVE_POINT: &str = "ToneCurve_Point";
    pub const TONE_CURVE_RED: &str = "ToneCurve_Red";
    pub const TONE_CURVE_GREEN: &str = "ToneCurve_Green";
    pub const TONE_CURVE_BLUE: &str = "ToneCurve_Blue";

    pub const PARAMETRIC_SHADOW_VALUE: &str = "ToneCurve_Parametric_Shadow_Value";
    pub const PARAMETRIC_DARK_VALUE: &str = "ToneCurve_Parametric_Dark_Value";
    pub const PARAMETRIC_LIGHT_VALUE: &str = "ToneCurve_Parametric_Light_Value";
    pub const PARAMETRIC_HIGH_VALUE: &str = "ToneCurve_Parametric_High_Value";
    pub const PARAMETRIC_THRESHOLDS: &str = "ToneCurve_Parametric_Thresholds";

    /// Suffix appended to a point-curve LUT key to store its control points.
    pub const POINTS_SUFFIX: &str = "_Points";

    pub const BLUR_STATE: &str = "Blur_State";
    pub const BLUR_SIGMA: &str = "Blur_Sigma";

    /// Slider keys seeded on every new image or layer.
    pub const SLIDERS: [&str; 12] = [
        TEMPERATURE,
        TINT,
        EXPOSURE,
        CONTRAST,
        HIGHLIGHTS,
        SHADOWS,
        WHITES,
        BLACKS,
        TEXTURE,
        DEHAZE,
        VIBRANCE,
        SATURATION,
    ];
}

/// White balance reference temperature in Kelvin.
pub const NEUTRAL_TEMPERATURE: f32 = 6500.0;

/// Background blur radius used when none is stored.
pub const DEFAULT_BLUR_SIGMA: f32 = 5.0;

/// Floats within this distance of their neutral value count as untouched.
const NEUTRAL_TOLERANCE: f32 = 1e-2;

/// A single setting value.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Float(f32),
    Lut(ToneCurveLut),
    Thresholds(Vec<f32>),
    Points(Vec<CurvePoint>),
}

/// String-keyed edit settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    values: BTreeMap<String, SettingValue>,
}

impl Settings {
    /// Create an empty settings map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings for a freshly loaded image or new layer: every slider at its
    /// neutral value.
    pub fn default_image() -> Self {
        let mut settings = Self::new();
        for key in keys::SLIDERS {
            settings.set_float(key, neutral_value(key));
        }
        settings
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: SettingValue) {
        self.values.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<SettingValue> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    // ------------------------------------------------------------------------
    // Typed accessors
    // ------------------------------------------------------------------------

    /// Read a float, falling back to the key's neutral value.
    pub fn float(&self, key: &str) -> f32 {
        match self.values.get(key) {
            Some(SettingValue::Float(v)) if v.is_finite() => *v,
            _ => neutral_value(key),
        }
    }

    /// Store a float. Non-finite values are replaced by the neutral value.
    pub fn set_float(&mut self, key: &str, value: f32) {
        let value = if value.is_finite() {
            value
        } else {
            neutral_value(key)
        };
        self.insert(key, SettingValue::Float(value));
    }

    /// Read a curve table, if one is stored under `key`.
    pub fn lut(&self, key: &str) -> Option<&ToneCurveLut> {
        match self.values.get(key) {
            Some(SettingValue::Lut(lut)) => Some(lut),
            _ => None,
        }
    }

    pub fn set_lut(&mut self, key: &str, lut: ToneCurveLut) {
        self.insert(key, SettingValue::Lut(lut));
    }

    /// Read a float list, if one is stored under `key`.
    pub fn thresholds(&self, key: &str) -> Option<&[f32]> {
        match self.values.get(key) {
            Some(SettingValue::Thresholds(values)) => Some(values),
            _ => None,
        }
    }

    pub fn set_thresholds(&mut self, key: &str, values: Vec<f32>) {
        self.insert(key, SettingValue::Thresholds(values));
    }

    /// Read control points, if stored under `key`.
    pub fn points(&self, key: &str) -> Option<&[CurvePoint]> {
        match self.values.get(key) {
            Some(SettingValue::Points(points)) => Some(points),
            _ => None,
        }
    }

    pub fn set_points(&mut self, key: &str, points: Vec<CurvePoint>) {
        self.insert(key, SettingValue::Points(points));
    }

    // ------------------------------------------------------------------------
    // Curves
    // ------------------------------------------------------------------------

    /// Rebuild the parametric curve from its slider and threshold keys.
    pub fn parametric_curve(&self) -> ParametricCurve {
        let thresholds = self
            .thresholds(keys::PARAMETRIC_THRESHOLDS)
            .map(Thresholds::from_slice)
            .unwrap_or_default();
        let mut curve = ParametricCurve {
            thresholds,
            ..ParametricCurve::default()
        };
        curve.set_slider(
            crate::curve::CurveRegion::Shadows,
            self.float(keys::PARAMETRIC_SHADOW_VALUE),
        );
        curve.set_slider(
            crate::curve::CurveRegion::Darks,
            self.float(keys::PARAMETRIC_DARK_VALUE),
        );
        curve.set_slider(
            crate::curve::CurveRegion::Lights,
            self.float(keys::PARAMETRIC_LIGHT_VALUE),
        );
        curve.set_slider(
            crate::curve::CurveRegion::Highlights,
            self.float(keys::PARAMETRIC_HIGH_VALUE),
        );
        curve
    }

    /// Store a parametric curve: its sliders, thresholds and generated LUT.
    pub fn store_parametric(&mut self, curve: &ParametricCurve) {
        self.set_float(keys::PARAMETRIC_SHADOW_VALUE, curve.shadows);
        self.set_float(keys::PARAMETRIC_DARK_VALUE, curve.darks);
        self.set_float(keys::PARAMETRIC_LIGHT_VALUE, curve.lights);
        self.set_float(keys::PARAMETRIC_HIGH_VALUE, curve.highlights);
        self.set_thresholds(keys::PARAMETRIC_THRESHOLDS, curve.thresholds.to_vec());
        self.set_lut(keys::TONE_CURVE_PARAMETRIC, curve.to_lut());
    }

    /// Rebuild a point curve stored under `lut_key`.
    pub fn point_curve(&self, lut_key: &str) -> PointCurve {
        self.points(&points_key(lut_key))
            .map(|points| PointCurve::from_points(points.to_vec()))
            .unwrap_or_default()
    }

    /// Store a point curve: its control points and generated LUT.
    pub fn store_point_curve(&mut self, lut_key: &str, curve: &PointCurve) {
        self.set_points(&points_key(lut_key), curve.points().to_vec());
        self.set_lut(lut_key, curve.to_lut());
    }

    /// True when nothing stored would change an image.
    ///
    /// Floats are compared against their neutral values with a small
    /// tolerance and tables against identity. Thresholds and control points
    /// only describe curves whose tables are stored separately.
    pub fn is_neutral(&self) -> bool {
        self.values.iter().all(|(key, value)| match value {
            SettingValue::Float(v) => (v - neutral_value(key)).abs() <= NEUTRAL_TOLERANCE,
            SettingValue::Lut(lut) => lut.is_identity(),
            SettingValue::Thresholds(_) | SettingValue::Points(_) => true,
        })
    }
}

/// The value a float key takes when absent.
pub fn neutral_value(key: &str) -> f32 {
    match key {
        keys::TEMPERATURE => NEUTRAL_TEMPERATURE,
        keys::BLUR_SIGMA => DEFAULT_BLUR_SIGMA,
        _ => 0.0,
    }
}

fn points_key(lut_key: &str) -> String {
    format!("{lut_key}{}", keys::POINTS_SUFFIX)
}
