//! Typed parsing of the untrusted `/predict` payload

use crate::error::PredictError;
use serde_json::{Map, Value};
use tracing::warn;

/// Payload key carrying the candle timestamp
pub const TIMESTAMP_KEY: &str = "timestamp";
/// Payload key carrying the asset identifier
pub const ASSET_ID_KEY: &str = "Asset_ID";
/// Payload key carrying the asset display name
pub const ASSET_NAME_KEY: &str = "Asset_Name";

/// A validated prediction request.
///
/// Features are resolved against the model's feature-name list: listed
/// features absent from the payload become `0.0`, unknown keys are ignored.
/// The metadata fields are copied verbatim and are `null` when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    /// Feature values in feature-name-list order
    pub features: Vec<f64>,
    /// Listed features that were absent and defaulted to 0.0
    pub missing: Vec<String>,
    pub timestamp: Value,
    pub asset_id: Value,
    pub asset_name: Value,
}

impl PredictionRequest {
    /// Parse a raw request body.
    ///
    /// A body that is not valid JSON, or not a JSON object, is treated as an
    /// empty payload rather than rejected. This includes numbers outside the
    /// f64 range (e.g. `1e400`): the decoder refuses the whole document, so the
    /// metadata fields are dropped along with the features.
    pub fn parse(body: &[u8], feature_names: &[String]) -> Result<Self, PredictError> {
        let payload = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                warn!(
                    kind = json_kind(&other),
                    "Payload is not a JSON object, treating all fields as absent"
                );
                Map::new()
            }
            Err(e) => {
                warn!(
                    error = %e,
                    line = e.line(),
                    column = e.column(),
                    body_len = body.len(),
                    "Payload is not valid JSON, treating all fields and metadata as absent"
                );
                Map::new()
            }
        };

        Self::from_payload(&payload, feature_names)
    }

    /// Resolve features and metadata from an already decoded JSON object
    pub fn from_payload(
        payload: &Map<String, Value>,
        feature_names: &[String],
    ) -> Result<Self, PredictError> {
        let mut features = Vec::with_capacity(feature_names.len());
        let mut missing = Vec::new();

        for name in feature_names {
            match payload.get(name) {
                Some(value) => features.push(coerce_feature(name, value)?),
                None => {
                    missing.push(name.clone());
                    features.push(0.0);
                }
            }
        }

        let field = |key: &str| payload.get(key).cloned().unwrap_or(Value::Null);

        Ok(Self {
            features,
            missing,
            timestamp: field(TIMESTAMP_KEY),
            asset_id: field(ASSET_ID_KEY),
            asset_name: field(ASSET_NAME_KEY),
        })
    }
}

/// Coerce a present payload value to a float.
///
/// Numbers pass through, booleans map to 1.0 / 0.0 and strings must parse as
/// a finite float. Anything else, including `null`, `"NaN"` and `"inf"`, is an
/// error.
pub fn coerce_feature(name: &str, value: &Value) -> Result<f64, PredictError> {
    let resolved = match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| PredictError::invalid_feature(name, format!("{} is out of range", n))),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| PredictError::invalid_feature(name, format!("'{}' is not a number", s))),
        other => Err(PredictError::invalid_feature(
            name,
            format!("expected a number, got {}", json_kind(other)),
        )),
    }?;

    if !resolved.is_finite() {
        return Err(PredictError::invalid_feature(
            name,
            format!("{} is not a finite number", value),
        ));
    }
    Ok(resolved)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_features_follow_name_order() {
        let feature_names = names(&["Open", "High", "Close"]);
        let body = br#"{"Close": 105, "Open": 100, "High": "110.5", "Extra": "ignored"}"#;

        let req = PredictionRequest::parse(body, &feature_names).unwrap();
        assert_eq!(req.features, vec![100.0, 110.5, 105.0]);
        assert!(req.missing.is_empty());
    }

    #[test]
    fn test_missing_features_default_to_zero() {
        let feature_names = names(&["Open", "High", "Close"]);
        let req = PredictionRequest::parse(br#"{"High": 3}"#, &feature_names).unwrap();

        assert_eq!(req.features, vec![0.0, 3.0, 0.0]);
        assert_eq!(req.missing, names(&["Open", "Close"]));
    }

    #[test]
    fn test_metadata_copied_verbatim() {
        let feature_names = names(&["Open"]);
        let body = br#"{"timestamp": 1700000000, "Asset_ID": "BTC", "Open": 1}"#;

        let req = PredictionRequest::parse(body, &feature_names).unwrap();
        assert_eq!(req.timestamp, json!(1700000000));
        assert_eq!(req.asset_id, json!("BTC"));
        assert_eq!(req.asset_name, Value::Null);
    }

    #[test]
    fn test_malformed_body_treated_as_empty() {
        let feature_names = names(&["Open", "Close"]);

        let bodies: [&[u8]; 4] = [b"not json", b"", b"[1, 2]", b"42"];
        for body in bodies {
            let req = PredictionRequest::parse(body, &feature_names).unwrap();
            assert_eq!(req.features, vec![0.0, 0.0]);
            assert_eq!(req.missing.len(), 2);
            assert_eq!(req.timestamp, Value::Null);
        }
    }

    #[test]
    fn test_non_numeric_string_is_error() {
        let feature_names = names(&["Open", "Close"]);
        let err = PredictionRequest::parse(br#"{"Open": "abc"}"#, &feature_names).unwrap_err();

        assert_eq!(
            err,
            PredictError::InvalidFeature {
                name: "Open".to_string(),
                reason: "'abc' is not a number".to_string(),
            }
        );
    }

    #[test]
    fn test_coerce_feature() {
        assert_eq!(coerce_feature("x", &json!(1.5)).unwrap(), 1.5);
        assert_eq!(coerce_feature("x", &json!(-3)).unwrap(), -3.0);
        assert_eq!(coerce_feature("x", &json!(" 42 ")).unwrap(), 42.0);
        assert_eq!(coerce_feature("x", &json!("1e3")).unwrap(), 1000.0);
        assert_eq!(coerce_feature("x", &json!(true)).unwrap(), 1.0);
        assert_eq!(coerce_feature("x", &json!(false)).unwrap(), 0.0);

        assert!(coerce_feature("x", &Value::Null).is_err());
        assert!(coerce_feature("x", &json!([1])).is_err());
        assert!(coerce_feature("x", &json!({"v": 1})).is_err());
        assert!(coerce_feature("x", &json!("")).is_err());
    }

    #[test]
    fn test_non_finite_strings_are_rejected() {
        for raw in ["NaN", "nan", "inf", "-inf", "infinity", "1e400"] {
            let err = coerce_feature("Close", &json!(raw)).unwrap_err();
            assert!(
                matches!(err, PredictError::InvalidFeature { ref name, .. } if name == "Close"),
                "{raw}"
            );
        }
        assert_eq!(coerce_feature("Close", &json!("-1e300")).unwrap(), -1e300);
    }

    #[test]
    fn test_out_of_range_number_drops_whole_payload() {
        let feature_names = names(&["Open", "Close"]);
        let body = br#"{"Open": 1e400, "Close": 5, "Asset_ID": "BTC"}"#;

        let req = PredictionRequest::parse(body, &feature_names).unwrap();
        assert_eq!(req.features, vec![0.0, 0.0]);
        assert_eq!(req.missing, names(&["Open", "Close"]));
        assert_eq!(req.asset_id, Value::Null);
    }
}
