//! Audit record written for every served prediction

use crate::types::signal::Signal;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// One row of the prediction log.
///
/// Serializes as a flat JSON object: `"Data No."`, `"Timestamp"`,
/// `"Asset_ID"`, `"Asset_Name"`, one key per feature in model order, then
/// `"Prediction"`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Sequence number, starting at 1
    pub seq: u64,
    pub timestamp: Value,
    pub asset_id: Value,
    pub asset_name: Value,
    /// Feature names shared with the model artifact
    pub feature_names: Arc<[String]>,
    /// Resolved feature values, parallel to `feature_names`
    pub features: Vec<f64>,
    pub prediction: Signal,
}

impl LogEntry {
    /// Resolved value of a named feature
    pub fn feature(&self, name: &str) -> Option<f64> {
        self.feature_names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.features.get(i).copied())
    }
}

impl Serialize for LogEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5 + self.features.len()))?;
        map.serialize_entry("Data No.", &self.seq)?;
        map.serialize_entry("Timestamp", &self.timestamp)?;
        map.serialize_entry("Asset_ID", &self.asset_id)?;
        map.serialize_entry("Asset_Name", &self.asset_name)?;
        for (name, value) in self.feature_names.iter().zip(&self.features) {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry("Prediction", &self.prediction)?;
        map.end()
    }
}

/// Compact single-line rendering used for the log tail
impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} ts={} asset={}",
            self.seq, self.timestamp, self.asset_id
        )?;
        if !self.asset_name.is_null() {
            write!(f, " ({})", self.asset_name)?;
        }
        for (name, value) in self.feature_names.iter().zip(&self.features) {
            write!(f, " {}={}", name, value)?;
        }
        write!(f, " -> {}", self.prediction)
    }
}
