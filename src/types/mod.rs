//! Type definitions for the sales predictor

pub mod input;
pub mod prediction;

pub use input::{FieldValue, RawInput, SalesInput};
pub use prediction::{FeatureVector, PredictionResponse, PredictionResult};
