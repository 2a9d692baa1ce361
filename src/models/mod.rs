//! ML model loading and inference

pub mod inference;
pub mod loader;

pub use inference::{load_predictor, PredictorHandle, Regressor, SalesPredictor};
pub use loader::{LoadedModel, ModelLoader};
