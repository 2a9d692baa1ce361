//! HTTP handlers for the form and the JSON API

use super::page::Outcome;
use super::AppState;
use crate::error::{Error, PredictError};
use crate::metrics::MetricsSnapshot;
use crate::schema::FeatureSchema;
use crate::types::input::RawInput;
use crate::types::prediction::{FeatureVector, PredictionResponse, PredictionResult};
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{error, info, warn};

/// Body of `POST /api/predict/features`
#[derive(Debug, Clone, Deserialize)]
pub struct FeaturesRequest {
    pub features: Vec<f32>,
}

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Response {
    page_response(&state, StatusCode::OK, &HashMap::new(), None)
}

/// `POST /predict` from the HTML form
pub async fn predict_form(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let start = Instant::now();
    let outcome = match RawInput::from_form(state.predictor.schema(), &form) {
        Ok(input) => run_prediction(&state, input).await,
        Err(e) => {
            let err = Error::from(e);
            record_failure(&state, start, &err);
            Err(err)
        }
    };

    let (status, outcome) = match outcome {
        Ok((_, result)) => (
            StatusCode::OK,
            Outcome::Prediction(result.formatted(&state.display.currency_symbol)),
        ),
        Err(e) => (status_for(&e), Outcome::Error(e.to_string())),
    };

    page_response(&state, status, &form, Some(&outcome))
}

/// `POST /api/predict` with a JSON record of raw field values
pub async fn predict_json(
    State(state): State<AppState>,
    Json(input): Json<RawInput>,
) -> Response {
    match run_prediction(&state, input).await {
        Ok((features, result)) => Json(PredictionResponse::new(
            result,
            features,
            &state.display.currency_symbol,
        ))
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// `POST /api/predict/features` with an already encoded vector
pub async fn predict_features(
    State(state): State<AppState>,
    Json(request): Json<FeaturesRequest>,
) -> Response {
    let start = Instant::now();
    let features = FeatureVector::new(request.features);
    let predictor = state.predictor.clone();
    let task_features = features.clone();

    let outcome = tokio::task::spawn_blocking(move || predictor.predict(&task_features))
        .await
        .unwrap_or_else(|e| Err(task_failed(e)))
        .map_err(Error::from);

    match outcome {
        Ok(result) => {
            record_success(&state, start, &result);
            Json(PredictionResponse::new(
                result,
                features,
                &state.display.currency_symbol,
            ))
            .into_response()
        }
        Err(e) => {
            record_failure(&state, start, &e);
            error_response(&e)
        }
    }
}

/// `GET /api/schema`
pub async fn schema(State(state): State<AppState>) -> Json<FeatureSchema> {
    Json(state.predictor.schema().clone())
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let schema = state.predictor.schema();
    Json(serde_json::json!({
        "status": "healthy",
        "model": state.predictor.model_name(),
        "features": schema.feature_count(),
        "schema_version": schema.version,
    }))
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// Range-check, encode and predict off the async runtime
async fn run_prediction(
    state: &AppState,
    input: RawInput,
) -> Result<(FeatureVector, PredictionResult), Error> {
    let start = Instant::now();

    if let Err(e) = input.check_ranges(state.predictor.schema()) {
        let err = Error::from(e);
        record_failure(state, start, &err);
        return Err(err);
    }

    let predictor = state.predictor.clone();
    let outcome = tokio::task::spawn_blocking(move || predictor.predict_input(&input))
        .await
        .unwrap_or_else(|e| Err(Error::from(task_failed(e))));

    match &outcome {
        Ok((_, result)) => record_success(state, start, result),
        Err(e) => record_failure(state, start, e),
    }

    outcome
}

fn task_failed(e: tokio::task::JoinError) -> PredictError {
    PredictError::Inference(format!("prediction task failed: {e}"))
}

fn record_success(state: &AppState, start: Instant, result: &PredictionResult) {
    let latency = start.elapsed();
    state
        .metrics
        .record_prediction(latency, result.predicted_sales);
    info!(
        predicted_sales = result.predicted_sales,
        latency_us = latency.as_micros() as u64,
        "Prediction served"
    );
}

fn record_failure(state: &AppState, start: Instant, err: &Error) {
    state.metrics.record_failure(start.elapsed(), err);
    warn!(kind = err.kind(), error = %err, "Prediction rejected");
}

fn page_response(
    state: &AppState,
    status: StatusCode,
    values: &HashMap<String, String>,
    outcome: Option<&Outcome>,
) -> Response {
    match state
        .page
        .render(state.predictor.schema(), &state.display, values, outcome)
    {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render form page");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Input(_)
        | Error::Encode(_)
        | Error::Predict(PredictError::SchemaMismatch { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Predict(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &Error) -> Response {
    (
        status_for(err),
        Json(serde_json::json!({
            "error": err.to_string(),
            "kind": err.kind(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DisplayConfig;
    use crate::metrics::PredictionMetrics;
    use crate::models::inference::tests::stub_predictor;
    use crate::server::page::FormPage;
    use crate::types::input::SalesInput;
    use std::sync::Arc;

    fn test_state() -> AppState {
        AppState {
            predictor: Arc::new(stub_predictor()),
            metrics: Arc::new(PredictionMetrics::new()),
            display: Arc::new(DisplayConfig::default()),
            page: Arc::new(FormPage::new().unwrap()),
        }
    }

    fn scenario_input() -> RawInput {
        RawInput::from(&SalesInput::new(
            12.5,
            "Low Fat",
            0.05,
            "Dairy",
            150.0,
            "Medium",
            "Tier 2",
            "Supermarket Type1",
        ))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_predict_json() {
        let state = test_state();

        let response = predict_json(State(state.clone()), Json(scenario_input())).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["features"].as_array().map(|a| a.len()), Some(8));
        assert!(body["formatted"].as_str().unwrap().starts_with("₹ "));
        assert_eq!(state.metrics.snapshot().predictions_served, 1);
    }

    #[tokio::test]
    async fn test_predict_json_unknown_label() {
        let state = test_state();
        let input = scenario_input().with("Item_Fat_Content", "Ultra Low Fat");

        let response = predict_json(State(state.clone()), Json(input)).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "unknown_category");
        assert_eq!(state.metrics.snapshot().predictions_served, 0);
        assert_eq!(state.metrics.snapshot().failures, 1);
    }

    #[tokio::test]
    async fn test_predict_json_out_of_range() {
        let state = test_state();
        let input = scenario_input().with("Item_MRP", 450.0);

        let response = predict_json(State(state), Json(input)).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["kind"], "out_of_range");
    }

    #[tokio::test]
    async fn test_predict_features_short_vector() {
        let state = test_state();
        let request = FeaturesRequest {
            features: vec![12.5, 0.0, 0.05, 4.0, 150.0],
        };

        let response = predict_features(State(state), Json(request)).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "schema_mismatch");
        assert_eq!(body["error"], "expected 8 features, got 5");
    }

    #[tokio::test]
    async fn test_predict_features_full_vector() {
        let request = FeaturesRequest {
            features: vec![12.5, 0.0, 0.05, 4.0, 150.0, 1.0, 1.0, 1.0],
        };

        let response = predict_features(State(test_state()), Json(request)).await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_predict_form_renders_result() {
        let state = test_state();
        let mut form = HashMap::new();
        for (key, value) in [
            ("Item_Weight", "12.5"),
            ("Item_Fat_Content", "Low Fat"),
            ("Item_Visibility", "0.05"),
            ("Item_Type", "Dairy"),
            ("Item_MRP", "150"),
            ("Outlet_Size", "Medium"),
            ("Outlet_Location_Type", "Tier 2"),
            ("Outlet_Type", "Supermarket Type1"),
        ] {
            form.insert(key.to_string(), value.to_string());
        }

        let response = predict_form(State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("💰 Predicted Sales: ₹ "));
    }

    #[tokio::test]
    async fn test_predict_form_reports_bad_number() {
        let state = test_state();
        let mut form = HashMap::new();
        form.insert("Item_Weight".to_string(), "heavy".to_string());

        let response = predict_form(State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let page = body_text(response).await;
        assert!(page.contains("class=\"error\""));
        assert!(page.contains("value=\"heavy\""));
        assert_eq!(
            state.metrics.get_failures_by_kind().get("invalid_number"),
            Some(&1)
        );
    }

    #[tokio::test]
    async fn test_index_renders_form() {
        let response = index(State(test_state())).await;

        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("<form method=\"post\" action=\"/predict\">"));
        assert!(page.contains("Predict Sales"));
    }

    #[tokio::test]
    async fn test_health_and_schema() {
        let state = test_state();

        let Json(health) = health(State(state.clone())).await;
        assert_eq!(health["model"], "stub");
        assert_eq!(health["features"], 8);

        let Json(schema) = schema(State(state)).await;
        assert_eq!(schema, FeatureSchema::standard());
    }
}
