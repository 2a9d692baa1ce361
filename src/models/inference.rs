//! Prediction invoker for the sales regression model

use crate::config::ModelConfig;
use crate::error::{Error, PredictError, SchemaError};
use crate::feature_encoder::FeatureEncoder;
use crate::models::loader::ModelLoader;
use crate::schema::FeatureSchema;
use crate::types::input::RawInput;
use crate::types::prediction::{FeatureVector, PredictionResult};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// A trained regression model that maps one feature vector to one value.
pub trait Regressor: Send + Sync {
    /// Model name used in logs and responses
    fn name(&self) -> &str;

    /// Feature dimension the model was exported with, if it declares one
    fn input_width(&self) -> Option<usize>;

    /// Run inference on a single feature vector
    fn predict(&self, features: &[f32]) -> Result<f64, PredictError>;
}

/// Encoder and model bound together by one feature schema.
///
/// The model is read-only after construction and can be shared across
/// threads behind an `Arc`.
pub struct SalesPredictor {
    schema: Arc<FeatureSchema>,
    encoder: FeatureEncoder,
    model: Arc<dyn Regressor>,
}

impl SalesPredictor {
    /// Bind a model to a schema.
    ///
    /// Fails when the model declares a static input width that differs from
    /// the schema's feature count.
    pub fn new(schema: FeatureSchema, model: Arc<dyn Regressor>) -> Result<Self, SchemaError> {
        schema.validate()?;

        if let Some(width) = model.input_width() {
            if width != schema.feature_count() {
                return Err(SchemaError::ModelWidth {
                    model: width,
                    schema: schema.feature_count(),
                });
            }
        } else {
            warn!(
                model = %model.name(),
                "Model does not declare a static input width; relying on per-call length checks"
            );
        }

        let schema = Arc::new(schema);
        Ok(Self {
            encoder: FeatureEncoder::new(schema.clone()),
            schema,
            model,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Run the model on an encoded vector.
    ///
    /// The vector length is checked against the schema first; a mismatch is
    /// reported without calling the model.
    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionResult, PredictError> {
        let expected = self.schema.feature_count();
        if features.len() != expected {
            return Err(PredictError::SchemaMismatch {
                expected,
                actual: features.len(),
            });
        }

        let predicted_sales = self.model.predict(features.as_slice())?;
        if !predicted_sales.is_finite() {
            return Err(PredictError::InvalidOutput(predicted_sales));
        }

        debug!(
            model = %self.model.name(),
            predicted_sales = predicted_sales,
            "Prediction complete"
        );

        Ok(PredictionResult {
            predicted_sales,
            model: self.model.name().to_string(),
        })
    }

    /// Encode a raw input and predict on it.
    ///
    /// An encoding failure stops the request before the model is called.
    pub fn predict_input(&self, input: &RawInput) -> Result<(FeatureVector, PredictionResult), Error> {
        let features = self.encoder.encode(input)?;
        let result = self.predict(&features)?;
        Ok((features, result))
    }
}

/// Load the schema and model named by the configuration.
pub fn load_predictor(config: &ModelConfig) -> Result<SalesPredictor> {
    // Checked before the runtime is initialized so a bad path fails fast
    if !Path::new(&config.model_path).exists() {
        anyhow::bail!("Model file not found: {}", config.model_path);
    }

    let schema = match &config.schema_path {
        Some(path) => FeatureSchema::from_path(path)
            .with_context(|| format!("Failed to load feature schema from {}", path))?,
        None => {
            info!("No schema file configured, using built-in standard schema");
            FeatureSchema::standard()
        }
    };

    let loader = ModelLoader::with_threads(config.onnx_threads)?;
    let name = Path::new(&config.model_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model")
        .to_string();
    let model = loader.load_model(&config.model_path, &name)?;

    let predictor = SalesPredictor::new(schema, Arc::new(model))
        .context("Model does not match the feature schema")?;

    info!(
        model = %predictor.model_name(),
        features = predictor.schema().feature_count(),
        schema_version = %predictor.schema().version,
        "Sales predictor ready"
    );

    Ok(predictor)
}

/// Process-wide accessor for the predictor.
///
/// The predictor is loaded on first use and shared read-only afterwards.
pub struct PredictorHandle {
    config: ModelConfig,
    cell: OnceLock<Arc<SalesPredictor>>,
}

impl PredictorHandle {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            cell: OnceLock::new(),
        }
    }

    /// Wrap an already constructed predictor
    pub fn with_predictor(config: ModelConfig, predictor: SalesPredictor) -> Self {
        Self {
            config,
            cell: OnceLock::from(Arc::new(predictor)),
        }
    }

    /// Get the predictor, loading it on the first call.
    pub fn get(&self) -> Result<Arc<SalesPredictor>> {
        if let Some(predictor) = self.cell.get() {
            return Ok(predictor.clone());
        }

        let loaded = Arc::new(load_predictor(&self.config)?);
        Ok(self.cell.get_or_init(|| loaded).clone())
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}
