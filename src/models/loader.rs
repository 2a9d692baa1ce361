//! ONNX model loader

use crate::error::PredictError;
use crate::models::inference::Regressor;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{Tensor, ValueType};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Loaded ONNX regression model with metadata
pub struct LoadedModel {
    /// Model name
    pub name: String,
    /// ONNX Runtime session; running it needs exclusive access
    session: Mutex<Session>,
    /// Input name for the model
    pub input_name: String,
    /// Output name for the predicted value
    pub output_name: String,
    /// Static feature dimension of the input, when the model declares one
    pub input_width: Option<usize>,
}

/// Loader for ONNX models
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load a regression model from file
    pub fn load_model<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<LoadedModel> {
        let path = path.as_ref();

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input = session
            .inputs
            .first()
            .context("Model declares no inputs")?;
        let input_name = input.name.clone();
        let input_width = match &input.input_type {
            ValueType::Tensor { shape, .. } => shape
                .last()
                .copied()
                .filter(|&dim| dim > 0)
                .map(|dim| dim as usize),
            _ => None,
        };

        // Regressors exported from sklearn name their output "variable";
        // anything else falls back to the first output.
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("variable") || o.name.contains("predict"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .context("Model declares no outputs")?;

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            input_width = ?input_width,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            name: name.to_string(),
            session: Mutex::new(session),
            input_name,
            output_name,
            input_width,
        })
    }
}

impl LoadedModel {
    /// Pull the first value out of the regression output.
    ///
    /// Regressors emit `[batch, 1]` or `[batch]` float tensors; some
    /// converters emit doubles.
    fn extract_prediction(&self, outputs: &ort::session::SessionOutputs) -> Result<f64, PredictError> {
        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            PredictError::Inference(format!("missing output '{}'", self.output_name))
        })?;

        if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
            return data
                .first()
                .map(|&v| v as f64)
                .ok_or_else(|| PredictError::Inference("empty output tensor".to_string()));
        }

        if let Ok((_, data)) = output.try_extract_tensor::<f64>() {
            return data
                .first()
                .copied()
                .ok_or_else(|| PredictError::Inference("empty output tensor".to_string()));
        }

        Err(PredictError::Inference(format!(
            "output '{}' is not a float tensor",
            self.output_name
        )))
    }
}

impl Regressor for LoadedModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_width(&self) -> Option<usize> {
        self.input_width
    }

    fn predict(&self, features: &[f32]) -> Result<f64, PredictError> {
        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .map_err(|e| PredictError::Inference(format!("failed to create input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| PredictError::Inference(format!("lock error: {e}")))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| PredictError::Inference(e.to_string()))?;

        let value = self.extract_prediction(&outputs)?;
        debug!(model = %self.name, value = value, "Extracted prediction");

        Ok(value)
    }
}
