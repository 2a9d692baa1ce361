//! Raw input records submitted for prediction

use crate::error::InputError;
use crate::schema::{fields, FeatureSchema};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A single raw field value: a number or a category label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Label(String),
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Label(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Label(value)
    }
}

/// Named raw field values gathered by the presentation layer.
///
/// Keys are schema field names. The record carries no ordering; the schema
/// decides the order of the encoded vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawInput {
    values: BTreeMap<String, FieldValue>,
}

impl RawInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.values.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build a record from submitted form text.
    ///
    /// Numeric schema fields are parsed as numbers; everything else is kept
    /// as a label. Keys the schema does not know are ignored.
    pub fn from_form(
        schema: &FeatureSchema,
        form: &HashMap<String, String>,
    ) -> Result<Self, InputError> {
        let mut input = RawInput::new();

        for field in &schema.fields {
            let Some(text) = form.get(&field.name) else {
                continue;
            };
            let text = text.trim();

            if field.is_numeric() {
                let value = text.parse::<f64>().map_err(|_| InputError::InvalidNumber {
                    field: field.name.clone(),
                    value: text.to_string(),
                })?;
                input.set(&field.name, value);
            } else {
                input.set(&field.name, text);
            }
        }

        Ok(input)
    }

    /// Check every numeric value against the schema bounds.
    ///
    /// This mirrors the limits the form widgets enforce. The encoder itself
    /// does not range-check.
    pub fn check_ranges(&self, schema: &FeatureSchema) -> Result<(), InputError> {
        for field in &schema.fields {
            if let Some(FieldValue::Number(value)) = self.values.get(&field.name) {
                field.check_range(*value)?;
            }
        }
        Ok(())
    }
}

/// Typed form of a Big Mart record, using the dataset's column names.
///
/// The identifier and establishment-year fields are only used by the
/// extended schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesInput {
    #[serde(alias = "Item_Identifier", default)]
    pub item_identifier: Option<String>,

    #[serde(alias = "Item_Weight")]
    pub item_weight: f64,

    /// Low Fat or Regular
    #[serde(alias = "Item_Fat_Content")]
    pub item_fat_content: String,

    /// Share of shelf display area, 0 to 1
    #[serde(alias = "Item_Visibility")]
    pub item_visibility: f64,

    #[serde(alias = "Item_Type")]
    pub item_type: String,

    /// Maximum retail price
    #[serde(alias = "Item_MRP")]
    pub item_mrp: f64,

    #[serde(alias = "Outlet_Identifier", default)]
    pub outlet_identifier: Option<String>,

    #[serde(alias = "Outlet_Establishment_Year", default)]
    pub outlet_establishment_year: Option<u16>,

    /// Small, Medium or High
    #[serde(alias = "Outlet_Size")]
    pub outlet_size: String,

    /// Tier 1, Tier 2 or Tier 3
    #[serde(alias = "Outlet_Location_Type")]
    pub outlet_location_type: String,

    #[serde(alias = "Outlet_Type")]
    pub outlet_type: String,
}

impl SalesInput {
    /// Create an input for the standard schema
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        item_weight: f64,
        item_fat_content: &str,
        item_visibility: f64,
        item_type: &str,
        item_mrp: f64,
        outlet_size: &str,
        outlet_location_type: &str,
        outlet_type: &str,
    ) -> Self {
        Self {
            item_identifier: None,
            item_weight,
            item_fat_content: item_fat_content.to_string(),
            item_visibility,
            item_type: item_type.to_string(),
            item_mrp,
            outlet_identifier: None,
            outlet_establishment_year: None,
            outlet_size: outlet_size.to_string(),
            outlet_location_type: outlet_location_type.to_string(),
            outlet_type: outlet_type.to_string(),
        }
    }

    /// Add the identifier fields used by the extended schema
    pub fn with_identifiers(
        mut self,
        item_identifier: &str,
        outlet_identifier: &str,
        outlet_establishment_year: u16,
    ) -> Self {
        self.item_identifier = Some(item_identifier.to_string());
        self.outlet_identifier = Some(outlet_identifier.to_string());
        self.outlet_establishment_year = Some(outlet_establishment_year);
        self
    }
}

impl From<&SalesInput> for RawInput {
    fn from(input: &SalesInput) -> Self {
        let mut raw = RawInput::new()
            .with(fields::ITEM_WEIGHT, input.item_weight)
            .with(fields::ITEM_FAT_CONTENT, input.item_fat_content.as_str())
            .with(fields::ITEM_VISIBILITY, input.item_visibility)
            .with(fields::ITEM_TYPE, input.item_type.as_str())
            .with(fields::ITEM_MRP, input.item_mrp)
            .with(fields::OUTLET_SIZE, input.outlet_size.as_str())
            .with(
                fields::OUTLET_LOCATION_TYPE,
                input.outlet_location_type.as_str(),
            )
            .with(fields::OUTLET_TYPE, input.outlet_type.as_str());

        if let Some(id) = &input.item_identifier {
            raw.set(fields::ITEM_IDENTIFIER, id.as_str());
        }
        if let Some(id) = &input.outlet_identifier {
            raw.set(fields::OUTLET_IDENTIFIER, id.as_str());
        }
        if let Some(year) = input.outlet_establishment_year {
            raw.set(fields::OUTLET_ESTABLISHMENT_YEAR, f64::from(year));
        }

        raw
    }
}
