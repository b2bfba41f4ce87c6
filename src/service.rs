//! Prediction flow: parse, infer, map to a signal, log

use crate::error::PredictError;
use crate::metrics::ServingMetrics;
use crate::models::ModelArtifact;
use crate::prediction_log::PredictionLog;
use crate::types::{LogEntry, PredictionRequest, Signal};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, Level};

/// Number of most recent log rows echoed at debug level after each prediction
const LOG_TAIL_ROWS: usize = 5;

/// Successful `/predict` response body
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    /// Raw model output
    pub prediction: i64,
    pub signal: Signal,
    /// The entry appended to the prediction log
    pub log_row: LogEntry,
}

/// Owns the loaded model and the process-wide prediction log.
pub struct PredictionService {
    artifact: ModelArtifact,
    log: PredictionLog,
    metrics: Arc<ServingMetrics>,
}

impl PredictionService {
    pub fn new(artifact: ModelArtifact, metrics: Arc<ServingMetrics>) -> Self {
        let log = PredictionLog::new(artifact.feature_names.clone().into());
        Self {
            artifact,
            log,
            metrics,
        }
    }

    pub fn log(&self) -> &PredictionLog {
        &self.log
    }

    pub fn metrics(&self) -> &Arc<ServingMetrics> {
        &self.metrics
    }

    /// Serve one prediction from a raw request body.
    ///
    /// On error nothing is appended to the log and the sequence counter does
    /// not advance.
    pub fn predict(&self, body: &[u8]) -> Result<PredictionResponse, PredictError> {
        let start = Instant::now();

        match self.run(body) {
            Ok((response, defaulted)) => {
                let elapsed = start.elapsed();
                self.metrics
                    .record_prediction(elapsed, response.signal, defaulted);
                info!(
                    seq = response.log_row.seq,
                    asset_id = %response.log_row.asset_id,
                    prediction = response.prediction,
                    signal = %response.signal,
                    latency_us = elapsed.as_micros() as u64,
                    "Prediction served"
                );
                Ok(response)
            }
            Err(e) => {
                self.metrics.record_failure(start.elapsed());
                error!(error = %e, "Prediction request failed");
                Err(e)
            }
        }
    }

    /// Returns the response and the number of features that defaulted to 0.0
    fn run(&self, body: &[u8]) -> Result<(PredictionResponse, usize), PredictError> {
        debug!(payload = %String::from_utf8_lossy(body), "Incoming payload");

        let request = PredictionRequest::parse(body, &self.artifact.feature_names)?;
        if !request.missing.is_empty() {
            debug!(missing = ?request.missing, "Missing features filled with 0.0");
        }

        let prediction = self.artifact.classifier.predict(&request.features)?;
        let signal = Signal::from_prediction(prediction);

        let defaulted = request.missing.len();
        let log_row = self.log.record(request, signal);

        if tracing::enabled!(Level::DEBUG) {
            for row in self.log.tail(LOG_TAIL_ROWS) {
                debug!(row = %row, "Prediction log");
            }
        }

        let response = PredictionResponse {
            prediction,
            signal,
            log_row,
        };
        Ok((response, defaulted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Classifier;
    use anyhow::Result;

    struct SumClassifier;

    impl Classifier for SumClassifier {
        fn name(&self) -> &str {
            "sum"
        }

        fn predict(&self, features: &[f64]) -> Result<i64> {
            Ok(i64::from(features.iter().sum::<f64>() > 100.0))
        }
    }

    fn service() -> PredictionService {
        let artifact = ModelArtifact::new(
            Arc::new(SumClassifier),
            vec!["Open".to_string(), "Close".to_string()],
        )
        .unwrap();
        PredictionService::new(artifact, Arc::new(ServingMetrics::new()))
    }

    #[test]
    fn test_predict_buy_and_hold() {
        let service = service();

        let buy = service.predict(br#"{"Open": 60, "Close": 50}"#).unwrap();
        assert_eq!(buy.prediction, 1);
        assert_eq!(buy.signal, Signal::Buy);
        assert_eq!(buy.log_row.seq, 1);

        let hold = service.predict(br#"{"Open": 10}"#).unwrap();
        assert_eq!(hold.prediction, 0);
        assert_eq!(hold.signal, Signal::SellHold);
        assert_eq!(hold.log_row.seq, 2);
        assert_eq!(hold.log_row.feature("Close"), Some(0.0));

        assert_eq!(service.metrics().signal_count(Signal::Buy), 1);
        assert_eq!(service.metrics().signal_count(Signal::SellHold), 1);
    }

    #[test]
    fn test_failed_request_leaves_log_untouched() {
        let service = service();

        let err = service.predict(br#"{"Open": [1, 2]}"#).unwrap_err();
        assert!(matches!(err, PredictError::InvalidFeature { ref name, .. } if name == "Open"));
        assert!(service.log().is_empty());

        let ok = service.predict(b"{}").unwrap();
        assert_eq!(ok.log_row.seq, 1);
        assert_eq!(service.log().last(), Some(ok.log_row));
    }
}
