//! Price Signal Server Library
//!
//! Serves buy / sell-hold trading signals from a pre-trained binary
//! classifier over a single HTTP endpoint, keeping an in-memory audit log
//! of every prediction.

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod prediction_log;
pub mod server;
pub mod service;
pub mod types;

pub use config::AppConfig;
pub use error::PredictError;
pub use models::{Classifier, ModelArtifact, ModelLoader};
pub use prediction_log::PredictionLog;
pub use service::{PredictionResponse, PredictionService};
pub use types::{LogEntry, PredictionRequest, Signal};
