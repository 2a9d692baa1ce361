//! Prediction result data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered numeric model input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Output of a single model invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted item outlet sales
    pub predicted_sales: f64,
    /// Name of the model that produced the value
    pub model: String,
}

impl PredictionResult {
    /// Format the prediction as a currency amount with two decimals
    pub fn formatted(&self, currency_symbol: &str) -> String {
        format_currency(self.predicted_sales, currency_symbol)
    }
}

/// Format an amount the way the result page shows it, e.g. `₹ 1234.57`
pub fn format_currency(amount: f64, currency_symbol: &str) -> String {
    format!("{} {:.2}", currency_symbol, amount)
}

/// Response body of the JSON prediction endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Unique request identifier
    pub request_id: String,

    pub predicted_sales: f64,

    /// Currency-formatted prediction
    pub formatted: String,

    /// Encoded model input, in schema order
    pub features: FeatureVector,

    pub model: String,

    pub timestamp: DateTime<Utc>,
}

impl PredictionResponse {
    pub fn new(result: PredictionResult, features: FeatureVector, currency_symbol: &str) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            formatted: result.formatted(currency_symbol),
            predicted_sales: result.predicted_sales,
            features,
            model: result.model,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_formatting() {
        assert_eq!(format_currency(1234.567, "₹"), "₹ 1234.57");
        assert_eq!(format_currency(0.0, "₹"), "₹ 0.00");
        assert_eq!(format_currency(99.999, "$"), "$ 100.00");
    }

    #[test]
    fn test_response_fields() {
        let result = PredictionResult {
            predicted_sales: 2097.27,
            model: "bigmart_regressor".to_string(),
        };
        let features = FeatureVector::new(vec![12.5, 0.0, 0.05, 4.0, 150.0, 1.0, 1.0, 1.0]);

        let response = PredictionResponse::new(result, features.clone(), "₹");

        assert_eq!(response.formatted, "₹ 2097.27");
        assert_eq!(response.features, features);
        assert!(!response.request_id.is_empty());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["features"].as_array().map(|a| a.len()), Some(8));
    }
}
