//! Classifier abstraction and the ONNX Runtime implementation

use anyhow::{anyhow, Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use std::sync::Mutex;
use tracing::debug;

/// A pre-trained binary classifier.
///
/// Implementations are immutable after construction and shared across
/// request handlers.
pub trait Classifier: Send + Sync {
    /// Human-readable model name for logs
    fn name(&self) -> &str;

    /// Predict the class for a single feature vector.
    ///
    /// `features` is ordered exactly like the artifact's feature-name list.
    fn predict(&self, features: &[f64]) -> Result<i64>;
}

/// Binary classifier backed by an ONNX Runtime session.
///
/// `Session::run` needs `&mut self`, so the session sits behind a mutex.
pub struct OnnxClassifier {
    name: String,
    session: Mutex<Session>,
    input_name: String,
    label_output: String,
}

impl OnnxClassifier {
    pub fn new(name: String, session: Session, input_name: String, label_output: String) -> Self {
        Self {
            name,
            session: Mutex::new(session),
            input_name,
            label_output,
        }
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &[f64]) -> Result<i64> {
        // Exported sklearn pipelines take float32 input of shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let data: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let input_tensor =
            Tensor::from_array((shape, data)).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        let output = outputs
            .get(self.label_output.as_str())
            .with_context(|| format!("Model output '{}' missing", self.label_output))?;

        let (_, labels) = output
            .try_extract_tensor::<i64>()
            .context("Label output is not an int64 tensor")?;

        let label = labels
            .first()
            .copied()
            .context("Label output is empty")?;

        debug!(model = %self.name, label = label, "Extracted label");
        Ok(label)
    }
}
