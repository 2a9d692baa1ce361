//! Big Mart Sales Predictor Library
//!
//! Encodes product and outlet attributes into the feature layout of a
//! pre-trained regression model and returns its predicted item outlet
//! sales.

pub mod config;
pub mod error;
pub mod feature_encoder;
pub mod metrics;
pub mod models;
pub mod schema;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use error::{EncodeError, Error, InputError, PredictError, SchemaError};
pub use feature_encoder::FeatureEncoder;
pub use models::inference::{PredictorHandle, Regressor, SalesPredictor};
pub use schema::{CategoryCodeTable, FeatureSchema};
pub use types::{FeatureVector, PredictionResult, RawInput, SalesInput};
