//! Batch Predictor
//!
//! Runs sales predictions offline, either on JSON lines read from a file or
//! on random inputs drawn from the schema's declared ranges.
//!
//! Usage: batch_predict [config] [count | inputs.jsonl]

use anyhow::{Context, Result};
use bigmart_sales::{
    config::AppConfig,
    metrics::PredictionMetrics,
    models::PredictorHandle,
    schema::{FeatureSchema, FieldKind},
    types::RawInput,
};
use rand::Rng;
use std::time::Instant;
use tracing::{info, warn};

/// Random input generator bounded by a feature schema
struct SampleGenerator<'a> {
    schema: &'a FeatureSchema,
    rng: rand::rngs::ThreadRng,
}

impl<'a> SampleGenerator<'a> {
    fn new(schema: &'a FeatureSchema) -> Self {
        Self {
            schema,
            rng: rand::thread_rng(),
        }
    }

    /// Generate one input with every field inside its valid set
    fn generate(&mut self) -> RawInput {
        let mut input = RawInput::new();

        for field in &self.schema.fields {
            match &field.kind {
                FieldKind::Numeric { min, max, step } => {
                    let raw = self.rng.gen_range(*min..=*max);
                    let value = if *step > 0.0 {
                        ((raw - min) / step).round() * step + min
                    } else {
                        raw
                    };
                    input.set(&field.name, value.clamp(*min, *max));
                }
                FieldKind::Categorical { codes } | FieldKind::Identifier { codes } => {
                    let labels: Vec<&str> = codes.labels().collect();
                    let label = labels[self.rng.gen_range(0..labels.len())];
                    input.set(&field.name, label);
                }
            }
        }

        input
    }
}

fn read_inputs(path: &str) -> Result<Vec<RawInput>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid input on line {}", i + 1))
        })
        .collect()
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("batch_predict=info".parse()?)
                .add_directive("bigmart_sales=info".parse()?),
        )
        .init();

    info!("Starting Batch Predictor");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let config_path = args.get(1).map(|s| s.as_str()).unwrap_or("config/config.toml");
    let source = args.get(2).map(|s| s.as_str()).unwrap_or("100");

    let config = AppConfig::load_from_path(config_path)?;
    let predictor = PredictorHandle::new(config.model.clone()).get()?;
    let currency = &config.display.currency_symbol;

    let inputs: Vec<RawInput> = match source.parse::<usize>() {
        Ok(count) => {
            info!(count = count, "Generating random inputs");
            let mut generator = SampleGenerator::new(predictor.schema());
            (0..count).map(|_| generator.generate()).collect()
        }
        Err(_) => {
            info!(path = %source, "Reading inputs");
            read_inputs(source)?
        }
    };

    let metrics = PredictionMetrics::new();

    for (i, input) in inputs.iter().enumerate() {
        let start = Instant::now();
        match predictor.predict_input(input) {
            Ok((features, result)) => {
                metrics.record_prediction(start.elapsed(), result.predicted_sales);
                info!(
                    row = i + 1,
                    features = ?features.as_slice(),
                    "Predicted Sales: {}",
                    result.formatted(currency)
                );
            }
            Err(e) => {
                metrics.record_failure(start.elapsed(), &e);
                warn!(row = i + 1, error = %e, "Prediction failed");
            }
        }
    }

    info!("Completed {} predictions", inputs.len());
    metrics.print_summary();

    Ok(())
}
