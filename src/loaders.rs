//! Data-file loaders.
//!
//! Animation parameters can be described in JSON, with the same shape the
//! DSL accepts: control keys (`target`, `easing`, `duration`, `delay`,
//! `release`, `elasticity`, `speed`) plus one entry per animated property,
//! scalar or `[from, to]`.

use crate::error::AnimError;
use crate::params::{AnimateParams, PropertySpec, Target};
use crate::Result;

/// Parse `animate()` parameters from a JSON object.
///
/// ```
/// use tweenline::loaders::animate_params_from_json;
///
/// let params = animate_params_from_json(
///     r#"{"target": "#box", "duration": 32, "left": ["0px", "16px"], "opacity": 1}"#,
/// )
/// .unwrap();
/// assert_eq!(params.duration, Some(32));
/// assert_eq!(params.props.len(), 2);
/// ```
pub fn animate_params_from_json(json: &str) -> Result<AnimateParams> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let object = value
        .as_object()
        .ok_or_else(|| AnimError::params("animate params must be a JSON object"))?;

    let mut params = AnimateParams::new();
    for (key, entry) in object {
        match key.as_str() {
            "target" => {
                let selector = entry
                    .as_str()
                    .ok_or_else(|| AnimError::params("target must be a selector string"))?;
                params.target = Some(Target::Selector(selector.to_string()));
            }
            "easing" => params.easing = Some(serde_json::from_value(entry.clone())?),
            "duration" => params.duration = Some(expect_ms(key, entry)?),
            "delay" => params.delay = Some(expect_ms(key, entry)?),
            "release" => params.release = Some(expect_ms(key, entry)?),
            "elasticity" => params.elasticity = Some(expect_f64(key, entry)?),
            "speed" => params.speed = Some(expect_f64(key, entry)?),
            _ => {
                let spec: PropertySpec = serde_json::from_value(entry.clone())?;
                params.props.push((key.clone(), spec));
            }
        }
    }
    Ok(params)
}

fn expect_ms(key: &str, value: &serde_json::Value) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| AnimError::params(format!("'{}' must be an integer millisecond value", key)))
}

fn expect_f64(key: &str, value: &serde_json::Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| AnimError::params(format!("'{}' must be a number", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use crate::params::PropValue;

    #[test]
    fn test_full_params() {
        let params = animate_params_from_json(
            r#"{
                "target": ".item",
                "easing": "linear",
                "duration": 160,
                "delay": 16,
                "release": -16,
                "elasticity": 0.25,
                "speed": 2.0,
                "left": ["0px", "160px"],
                "opacity": 1
            }"#,
        )
        .unwrap();

        assert!(matches!(params.target, Some(Target::Selector(ref s)) if s == ".item"));
        assert_eq!(params.easing, Some(Easing::Linear));
        assert_eq!(params.duration, Some(160));
        assert_eq!(params.delay, Some(16));
        assert_eq!(params.release, Some(-16));
        assert_eq!(params.elasticity, Some(0.25));
        assert_eq!(params.speed, Some(2.0));
        assert_eq!(params.props.len(), 2);
        assert_eq!(
            params.props[0],
            (
                "left".to_string(),
                PropertySpec::FromTo(
                    PropValue::Text("0px".to_string()),
                    PropValue::Text("160px".to_string())
                )
            )
        );
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(animate_params_from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_rejects_bad_control_value() {
        assert!(animate_params_from_json(r#"{"target": 5}"#).is_err());
        assert!(animate_params_from_json(r#"{"duration": "fast"}"#).is_err());
    }
}
