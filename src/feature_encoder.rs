//! Feature encoding for sales model inference.
//!
//! Turns a raw input record into the numeric vector the regression model was
//! trained on. The layout comes entirely from the [`FeatureSchema`]: fields
//! are emitted in schema order, numbers pass through unchanged and labels
//! are replaced by their training-time codes.

use crate::error::EncodeError;
use crate::schema::{FeatureSchema, FieldKind, FieldSpec};
use crate::types::input::{FieldValue, RawInput};
use crate::types::prediction::FeatureVector;
use std::sync::Arc;

/// Feature encoder that transforms raw inputs into model input features.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    schema: Arc<FeatureSchema>,
}

impl FeatureEncoder {
    pub fn new(schema: Arc<FeatureSchema>) -> Self {
        Self { schema }
    }

    /// Encode a raw input into a feature vector.
    ///
    /// Fails on the first field that is missing, has the wrong value type, or
    /// carries a label outside its code table. Numeric values are not
    /// range-checked here.
    pub fn encode(&self, input: &RawInput) -> Result<FeatureVector, EncodeError> {
        let mut features = Vec::with_capacity(self.schema.feature_count());

        for field in &self.schema.fields {
            let value = input
                .get(&field.name)
                .ok_or_else(|| EncodeError::MissingField {
                    field: field.name.clone(),
                })?;
            features.push(encode_field(field, value)?);
        }

        Ok(FeatureVector::new(features))
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        self.schema.feature_count()
    }

    /// Get feature names in model input order.
    pub fn feature_names(&self) -> Vec<&str> {
        self.schema.feature_names()
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }
}

impl Default for FeatureEncoder {
    fn default() -> Self {
        Self::new(Arc::new(FeatureSchema::standard()))
    }
}

fn encode_field(field: &FieldSpec, value: &FieldValue) -> Result<f32, EncodeError> {
    match (&field.kind, value) {
        (FieldKind::Numeric { .. }, FieldValue::Number(n)) => Ok(*n as f32),
        (FieldKind::Numeric { .. }, FieldValue::Label(_)) => Err(EncodeError::TypeMismatch {
            field: field.name.clone(),
            expected: "numeric",
        }),
        (
            FieldKind::Categorical { codes } | FieldKind::Identifier { codes },
            FieldValue::Label(label),
        ) => codes
            .code(label)
            .map(|code| code as f32)
            .ok_or_else(|| EncodeError::UnknownCategory {
                field: field.name.clone(),
                label: label.clone(),
            }),
        (FieldKind::Categorical { .. } | FieldKind::Identifier { .. }, FieldValue::Number(_)) => {
            Err(EncodeError::TypeMismatch {
                field: field.name.clone(),
                expected: "label",
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{fields, CategoryCodeTable, ITEM_TYPES};
    use crate::types::input::SalesInput;

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

    fn extended_encoder() -> FeatureEncoder {
        let items = CategoryCodeTable::ordinal(&["DRC01", "FDA15", "NCD19"]);
        FeatureEncoder::new(Arc::new(FeatureSchema::extended(items)))
    }

    #[test]
    fn test_standard_encoding() {
        let encoder = FeatureEncoder::default();
        let dairy = CategoryCodeTable::item_type().code("Dairy").unwrap() as f32;

        let features = encoder.encode(&scenario_input()).unwrap();

        assert_eq!(
            features.as_slice(),
            &[12.5, 0.0, 0.05, dairy, 150.0, 1.0, 1.0, 1.0]
        );
    }

    #[test]
    fn test_feature_count() {
        let encoder = FeatureEncoder::default();
        assert_eq!(encoder.feature_count(), 8);
        assert_eq!(encoder.feature_names().len(), 8);
        assert_eq!(extended_encoder().feature_count(), 11);
    }

    #[test]
    fn test_every_label_maps_to_its_code() {
        let encoder = FeatureEncoder::default();
        let cases: [(&str, &[(&str, f32)]); 4] = [
            (
                fields::ITEM_FAT_CONTENT,
                &[("Low Fat", 0.0), ("Regular", 1.0)],
            ),
            (
                fields::OUTLET_SIZE,
                &[("Small", 0.0), ("Medium", 1.0), ("High", 2.0)],
            ),
            (
                fields::OUTLET_LOCATION_TYPE,
                &[("Tier 1", 0.0), ("Tier 2", 1.0), ("Tier 3", 2.0)],
            ),
            (
                fields::OUTLET_TYPE,
                &[
                    ("Grocery Store", 0.0),
                    ("Supermarket Type1", 1.0),
                    ("Supermarket Type2", 2.0),
                    ("Supermarket Type3", 3.0),
                ],
            ),
        ];

        for (field, expected) in cases {
            let position = encoder
                .feature_names()
                .iter()
                .position(|&n| n == field)
                .unwrap();
            for &(label, code) in expected {
                let input = scenario_input().with(field, label);
                let features = encoder.encode(&input).unwrap();
                assert_eq!(features.as_slice()[position], code, "{field}={label}");
            }
        }
    }

    #[test]
    fn test_all_item_types_encode() {
        let encoder = FeatureEncoder::default();
        let mut seen = Vec::new();
        for item_type in ITEM_TYPES {
            let input = scenario_input().with(fields::ITEM_TYPE, item_type);
            let features = encoder.encode(&input).unwrap();
            seen.push(features.as_slice()[3] as u32);
        }
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 16);
    }

    #[test]
    fn test_unknown_label_fails() {
        let encoder = FeatureEncoder::default();
        let input = scenario_input().with(fields::ITEM_FAT_CONTENT, "Ultra Low Fat");

        let err = encoder.encode(&input).unwrap_err();

        assert_eq!(
            err,
            EncodeError::UnknownCategory {
                field: "Item_Fat_Content".to_string(),
                label: "Ultra Low Fat".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_field_fails() {
        let encoder = FeatureEncoder::default();
        let input = RawInput::new().with(fields::ITEM_WEIGHT, 10.0);

        let err = encoder.encode(&input).unwrap_err();
        assert_eq!(
            err,
            EncodeError::MissingField {
                field: "Item_Fat_Content".to_string()
            }
        );
    }

    #[test]
    fn test_type_mismatch_fails() {
        let encoder = FeatureEncoder::default();

        let label_for_number = scenario_input().with(fields::ITEM_MRP, "150");
        assert_eq!(
            encoder.encode(&label_for_number).unwrap_err().kind(),
            "type_mismatch"
        );

        let number_for_label = scenario_input().with(fields::OUTLET_SIZE, 1.0);
        assert_eq!(
            encoder.encode(&number_for_label).unwrap_err().kind(),
            "type_mismatch"
        );
    }

    #[test]
    fn test_numbers_pass_through_unchecked() {
        let encoder = FeatureEncoder::default();
        let input = scenario_input().with(fields::ITEM_WEIGHT, 75.0);

        let features = encoder.encode(&input).unwrap();
        assert_eq!(features.as_slice()[0], 75.0);
    }

    #[test]
    fn test_encoding_is_idempotent() {
        let encoder = FeatureEncoder::default();
        let input = scenario_input();
        assert_eq!(
            encoder.encode(&input).unwrap(),
            encoder.encode(&input).unwrap()
        );
    }

    #[test]
    fn test_extended_encoding_order() {
        let encoder = extended_encoder();
        let input = RawInput::from(
            &SalesInput::new(
                9.3,
                "Regular",
                0.016,
                "Canned",
                249.8,
                "High",
                "Tier 3",
                "Grocery Store",
            )
            .with_identifiers("FDA15", "OUT049", 1999),
        );

        let features = encoder.encode(&input).unwrap();

        assert_eq!(
            features.as_slice(),
            &[1.0, 9.3, 1.0, 0.016, 3.0, 249.8, 9.0, 1999.0, 2.0, 2.0, 0.0]
        );
    }

    #[test]
    fn test_unknown_identifier_fails() {
        let encoder = extended_encoder();
        let input = RawInput::from(
            &SalesInput::new(
                9.3,
                "Regular",
                0.016,
                "Canned",
                249.8,
                "High",
                "Tier 3",
                "Grocery Store",
            )
            .with_identifiers("FDZ99", "OUT049", 1999),
        );

        assert!(matches!(
            encoder.encode(&input),
            Err(EncodeError::UnknownCategory { field, .. }) if field == "Item_Identifier"
        ));
    }
}
