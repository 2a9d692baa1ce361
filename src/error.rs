//! Error types for encoding, schema handling and prediction

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning a raw input record into a feature vector
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    /// A field required by the schema was not supplied
    #[error("missing value for field '{field}'")]
    MissingField { field: String },

    /// A categorical label outside the field's code table
    #[error("unrecognized value '{label}' for field '{field}'")]
    UnknownCategory { field: String, label: String },

    /// A number supplied where a label was expected, or the reverse
    #[error("field '{field}' expects a {expected} value")]
    TypeMismatch {
        field: String,
        expected: &'static str,
    },
}

impl EncodeError {
    /// Short machine-readable name for API responses and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            EncodeError::MissingField { .. } => "missing_field",
            EncodeError::UnknownCategory { .. } => "unknown_category",
            EncodeError::TypeMismatch { .. } => "type_mismatch",
        }
    }
}

/// Submitted values rejected before encoding, standing in for the form
/// widget limits
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// Form text that does not parse as a number
    #[error("field '{field}' is not a number: '{value}'")]
    InvalidNumber { field: String, value: String },

    /// A numeric value outside the field's declared bounds
    #[error("field '{field}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl InputError {
    pub fn kind(&self) -> &'static str {
        match self {
            InputError::InvalidNumber { .. } => "invalid_number",
            InputError::OutOfRange { .. } => "out_of_range",
        }
    }
}

/// Errors raised by the prediction invoker
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    /// Feature vector length does not match the model's input schema
    #[error("expected {expected} features, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    /// The model runtime failed while running inference
    #[error("inference failed: {0}")]
    Inference(String),

    /// The model produced a value that is not a finite number
    #[error("model returned a non-finite prediction: {0}")]
    InvalidOutput(f64),
}

impl PredictError {
    /// Short machine-readable name for API responses and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::SchemaMismatch { .. } => "schema_mismatch",
            PredictError::Inference(_) => "inference_failed",
            PredictError::InvalidOutput(_) => "invalid_output",
        }
    }
}

/// Errors raised while loading or validating a feature schema
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("schema has no fields")]
    Empty,

    #[error("duplicate field '{0}' in schema")]
    DuplicateField(String),

    #[error("field '{field}' has an invalid range [{min}, {max}]")]
    InvalidRange { field: String, min: f64, max: f64 },

    #[error("field '{0}' has an empty code table")]
    EmptyTable(String),

    /// The model's declared input width disagrees with the schema
    #[error("model expects {model} features but schema defines {schema}")]
    ModelWidth { model: usize, schema: usize },
}

/// Error type covering a full encode-then-predict request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Predict(#[from] PredictError),
}

impl Error {
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Input(e) => e.kind(),
            Error::Encode(e) => e.kind(),
            Error::Predict(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_mismatch_message() {
        let err = PredictError::SchemaMismatch {
            expected: 8,
            actual: 11,
        };
        assert_eq!(err.to_string(), "expected 8 features, got 11");
    }

    #[test]
    fn test_error_kind_passthrough() {
        let err: Error = EncodeError::UnknownCategory {
            field: "Item_Fat_Content".to_string(),
            label: "Ultra Low Fat".to_string(),
        }
        .into();
        assert_eq!(err.kind(), "unknown_category");
        assert_eq!(
            err.to_string(),
            "unrecognized value 'Ultra Low Fat' for field 'Item_Fat_Content'"
        );
    }

    #[test]
    fn test_input_errors_are_not_encode_errors() {
        let err: Error = InputError::OutOfRange {
            field: "Item_MRP".to_string(),
            value: 450.0,
            min: 0.0,
            max: 300.0,
        }
        .into();
        assert!(matches!(err, Error::Input(_)));
        assert_eq!(err.kind(), "out_of_range");
        assert_eq!(
            err.to_string(),
            "field 'Item_MRP' must be between 0 and 300, got 450"
        );
    }
}
