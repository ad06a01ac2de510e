//! JSON persistence codec for [`Settings`].
//!
//! # Format
//!
//! A single JSON object keyed by setting name:
//!
//! - floats are JSON numbers
//! - curve tables (keys starting with `ToneCurve_`) are base64 strings of
//!   the 256 table bytes; a plain array of 256 integers is also accepted
//! - other numeric arrays are threshold lists
//! - arrays of `{"x": .., "y": ..}` objects are curve control points
//!
//! Booleans are accepted as 0/1 floats so toggles such as `Blur_State`
//! survive a round trip through hand-written presets.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Number, Value};

use super::{keys, SettingValue, Settings};
use crate::curve::ToneCurveLut;
use crate::error::EditError;
use crate::CurvePoint;

impl Settings {
    /// Serialize to the persisted JSON form.
    pub fn to_json(&self) -> Result<String, EditError> {
        let mut map = Map::new();
        for (key, value) in self.iter() {
            map.insert(key.to_string(), encode_value(key, value)?);
        }
        Ok(serde_json::to_string(&Value::Object(map))?)
    }

    /// Parse the persisted JSON form.
    ///
    /// Values with an unexpected shape are rejected rather than guessed at.
    pub fn from_json(json: &str) -> Result<Settings, EditError> {
        let root: Value = serde_json::from_str(json)?;
        let Value::Object(map) = root else {
            return Err(EditError::setting("<root>", "expected a JSON object"));
        };

        let mut settings = Settings::new();
        for (key, value) in &map {
            match decode_value(key, value) {
                Ok(decoded) => settings.insert(key.clone(), decoded),
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "rejecting persisted setting");
                    return Err(err);
                }
            }
        }
        Ok(settings)
    }
}

fn encode_value(key: &str, value: &SettingValue) -> Result<Value, EditError> {
    let value = match value {
        SettingValue::Float(v) => Value::Number(number(key, *v)?),
        SettingValue::Lut(lut) => Value::String(STANDARD.encode(lut.as_bytes())),
        SettingValue::Thresholds(values) => Value::Array(
            values
                .iter()
                .map(|v| number(key, *v).map(Value::Number))
                .collect::<Result<_, _>>()?,
        ),
        SettingValue::Points(points) => serde_json::to_value(points)?,
    };
    Ok(value)
}

fn number(key: &str, v: f32) -> Result<Number, EditError> {
    Number::from_f64(v as f64).ok_or_else(|| EditError::setting(key, "non-finite number"))
}

fn decode_value(key: &str, value: &Value) -> Result<SettingValue, EditError> {
    let is_curve = key.starts_with(keys::TONE_CURVE_PREFIX);
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(|v| SettingValue::Float(v as f32))
            .ok_or_else(|| EditError::setting(key, "number out of range")),
        Value::Bool(b) => Ok(SettingValue::Float(if *b { 1.0 } else { 0.0 })),
        Value::String(s) if is_curve => {
            let bytes = STANDARD.decode(s)?;
            ToneCurveLut::from_bytes(&bytes)
                .map(SettingValue::Lut)
                .ok_or_else(|| {
                    EditError::setting(key, format!("expected 256 table bytes, got {}", bytes.len()))
                })
        }
        Value::Array(items) if items.iter().all(Value::is_number) => {
            let values: Vec<f64> = items.iter().filter_map(Value::as_f64).collect();
            if is_curve && values.len() == 256 {
                decode_table(key, &values)
            } else {
                Ok(SettingValue::Thresholds(
                    values.into_iter().map(|v| v as f32).collect(),
                ))
            }
        }
        Value::Array(items) if items.iter().all(Value::is_object) => {
            let points: Vec<CurvePoint> = serde_json::from_value(value.clone())?;
            Ok(SettingValue::Points(points))
        }
        _ => Err(EditError::setting(key, "unsupported value shape")),
    }
}

fn decode_table(key: &str, values: &[f64]) -> Result<SettingValue, EditError> {
    let mut lut = ToneCurveLut::identity();
    for (slot, &v) in lut.lut.iter_mut().zip(values) {
        if !(0.0..=255.0).contains(&v) || v.fract() != 0.0 {
            return Err(EditError::setting(key, format!("table entry {v} is not a byte")));
        }
        *slot = v as u8;
    }
    Ok(SettingValue::Lut(lut))
}
