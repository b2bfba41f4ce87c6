//! ONNX model artifact loader

use crate::models::inference::{Classifier, OnnxClassifier};
use anyhow::{bail, Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// A loaded model artifact: the classifier plus the ordered feature names
/// it was trained on.
#[derive(Clone)]
pub struct ModelArtifact {
    /// Classifier shared read-only across requests
    pub classifier: Arc<dyn Classifier>,
    /// Expected input columns, in model order
    pub feature_names: Vec<String>,
}

impl ModelArtifact {
    /// Build an artifact from an already constructed classifier.
    ///
    /// Feature names go through the same validation as the ones read from
    /// model metadata.
    pub fn new(classifier: Arc<dyn Classifier>, feature_names: Vec<String>) -> Result<Self> {
        validate_feature_names(&feature_names)?;
        Ok(Self {
            classifier,
            feature_names,
        })
    }

    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }
}

impl std::fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("classifier", &self.classifier.name())
            .field("feature_names", &self.feature_names)
            .finish()
    }
}

/// Loader for ONNX model artifacts
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
    /// Custom metadata key that holds the feature-name list
    feature_names_key: String,
}

impl ModelLoader {
    /// Create a new model loader with specified thread count and metadata key
    pub fn with_threads(onnx_threads: usize, feature_names_key: &str) -> Self {
        Self {
            onnx_threads,
            feature_names_key: feature_names_key.to_string(),
        }
    }

    /// Load the model artifact from file.
    ///
    /// Any problem with the file or its schema is returned as an error; the
    /// caller is expected to abort startup.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<ModelArtifact> {
        let path = path.as_ref();

        info!(path = %path.display(), threads = self.onnx_threads, "Loading model artifact");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        let raw_names = session
            .metadata()
            .context("Failed to read model metadata")?
            .custom(&self.feature_names_key)
            .context("Failed to read custom model metadata")?
            .with_context(|| {
                format!(
                    "Model {} has no '{}' metadata entry",
                    path.display(),
                    self.feature_names_key
                )
            })?;
        let feature_names = parse_feature_names(&raw_names)
            .with_context(|| format!("Invalid '{}' metadata", self.feature_names_key))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .context("Model declares no inputs")?;

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .context("Model declares no outputs")?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());

        info!(
            model = %name,
            input = %input_name,
            output = %label_output,
            features = feature_names.len(),
            "Model loaded successfully"
        );

        let classifier = OnnxClassifier::new(name, session, input_name, label_output);
        ModelArtifact::new(Arc::new(classifier), feature_names)
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::with_threads(1, "feature_names")
    }
}

/// Parse the feature-name list stored in model metadata (a JSON array of
/// strings) and validate it.
pub fn parse_feature_names(raw: &str) -> Result<Vec<String>> {
    let names: Vec<String> =
        serde_json::from_str(raw).context("feature names must be a JSON array of strings")?;
    validate_feature_names(&names)?;
    Ok(names)
}

fn validate_feature_names(names: &[String]) -> Result<()> {
    if names.is_empty() {
        bail!("feature name list is empty");
    }

    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if name.is_empty() {
            bail!("feature name list contains an empty name");
        }
        if !seen.insert(name.as_str()) {
            bail!("duplicate feature name '{}'", name);
        }
    }
    Ok(())
}
