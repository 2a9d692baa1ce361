//! Feature schema shared by the encoder and the prediction invoker.
//!
//! A schema is the ordered list of model inputs: field names, their kind,
//! numeric bounds and the category code tables used at training time. It is
//! persisted as JSON next to the model artifact so that inference never
//! regenerates a mapping on its own.

use crate::error::{InputError, SchemaError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

/// Field names of the Big Mart dataset, in the order the models were fit on
pub mod fields {
    pub const ITEM_IDENTIFIER: &str = "Item_Identifier";
    pub const ITEM_WEIGHT: &str = "Item_Weight";
    pub const ITEM_FAT_CONTENT: &str = "Item_Fat_Content";
    pub const ITEM_VISIBILITY: &str = "Item_Visibility";
    pub const ITEM_TYPE: &str = "Item_Type";
    pub const ITEM_MRP: &str = "Item_MRP";
    pub const OUTLET_IDENTIFIER: &str = "Outlet_Identifier";
    pub const OUTLET_ESTABLISHMENT_YEAR: &str = "Outlet_Establishment_Year";
    pub const OUTLET_SIZE: &str = "Outlet_Size";
    pub const OUTLET_LOCATION_TYPE: &str = "Outlet_Location_Type";
    pub const OUTLET_TYPE: &str = "Outlet_Type";
}

/// Version tag written into the built-in schemas
pub const SCHEMA_VERSION: &str = "1";

/// Labels of the item type field, in form display order
pub const ITEM_TYPES: [&str; 16] = [
    "Dairy",
    "Soft Drinks",
    "Meat",
    "Fruits and Vegetables",
    "Household",
    "Baking Goods",
    "Snack Foods",
    "Frozen Foods",
    "Breakfast",
    "Health and Hygiene",
    "Hard Drinks",
    "Canned",
    "Breads",
    "Starchy Foods",
    "Others",
    "Seafood",
];

/// Outlet identifiers present in the training data
pub const OUTLET_IDENTIFIERS: [&str; 10] = [
    "OUT010", "OUT013", "OUT017", "OUT018", "OUT019", "OUT027", "OUT035", "OUT045", "OUT046",
    "OUT049",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub label: String,
    pub code: u32,
}

/// Fixed mapping from category label to integer code.
///
/// Entries keep their declared order, which is the order options are
/// offered in the form. Codes are independent of that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CategoryEntry>", into = "Vec<CategoryEntry>")]
pub struct CategoryCodeTable {
    entries: Vec<CategoryEntry>,
    index: HashMap<String, u32>,
}

impl CategoryCodeTable {
    /// Build a table whose codes follow the position of each label.
    pub fn ordinal(labels: &[&str]) -> Self {
        let pairs: Vec<(&str, u32)> = labels
            .iter()
            .enumerate()
            .map(|(code, &label)| (label, code as u32))
            .collect();
        Self::from_pairs(&pairs)
    }

    /// Build a table from explicit (label, code) pairs.
    pub fn from_pairs(pairs: &[(&str, u32)]) -> Self {
        let entries = pairs
            .iter()
            .map(|&(label, code)| CategoryEntry {
                label: label.to_string(),
                code,
            })
            .collect::<Vec<_>>();
        let index = entries
            .iter()
            .map(|e| (e.label.clone(), e.code))
            .collect();
        Self { entries, index }
    }

    /// Look up the code for a label. Matching is exact.
    pub fn code(&self, label: &str) -> Option<u32> {
        self.index.get(label).copied()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Labels in declared order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fat_content() -> Self {
        Self::ordinal(&["Low Fat", "Regular"])
    }

    /// Item types coded in alphabetical order, as a label encoder fit on
    /// the training column assigns them.
    pub fn item_type() -> Self {
        let mut sorted = ITEM_TYPES;
        sorted.sort_unstable();
        let pairs: Vec<(&str, u32)> = ITEM_TYPES
            .iter()
            .map(|&label| {
                let code = sorted.iter().position(|&s| s == label).unwrap_or(0) as u32;
                (label, code)
            })
            .collect();
        Self::from_pairs(&pairs)
    }

    pub fn outlet_size() -> Self {
        Self::ordinal(&["Small", "Medium", "High"])
    }

    pub fn outlet_location_type() -> Self {
        Self::ordinal(&["Tier 1", "Tier 2", "Tier 3"])
    }

    pub fn outlet_type() -> Self {
        Self::ordinal(&[
            "Grocery Store",
            "Supermarket Type1",
            "Supermarket Type2",
            "Supermarket Type3",
        ])
    }

    pub fn outlet_identifier() -> Self {
        Self::ordinal(&OUTLET_IDENTIFIERS)
    }
}

impl TryFrom<Vec<CategoryEntry>> for CategoryCodeTable {
    type Error = String;

    fn try_from(entries: Vec<CategoryEntry>) -> Result<Self, Self::Error> {
        let mut index = HashMap::with_capacity(entries.len());
        for entry in &entries {
            if index.insert(entry.label.clone(), entry.code).is_some() {
                return Err(format!("duplicate category label '{}'", entry.label));
            }
        }
        Ok(Self { entries, index })
    }
}

impl From<CategoryCodeTable> for Vec<CategoryEntry> {
    fn from(table: CategoryCodeTable) -> Self {
        table.entries
    }
}

/// How a field is turned into a model input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Passed through unchanged; bounds describe the valid input range
    Numeric { min: f64, max: f64, step: f64 },
    /// Enumerated label chosen from a fixed list
    Categorical { codes: CategoryCodeTable },
    /// Free-text identifier resolved through a training-time table
    Identifier { codes: CategoryCodeTable },
}

/// One named model input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Column name used at training time
    pub name: String,
    /// Human readable label shown in the form
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn numeric(name: &str, label: &str, min: f64, max: f64, step: f64) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Numeric { min, max, step },
        }
    }

    pub fn categorical(name: &str, label: &str, codes: CategoryCodeTable) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Categorical { codes },
        }
    }

    pub fn identifier(name: &str, label: &str, codes: CategoryCodeTable) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Identifier { codes },
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, FieldKind::Numeric { .. })
    }

    /// Code table for categorical and identifier fields
    pub fn codes(&self) -> Option<&CategoryCodeTable> {
        match &self.kind {
            FieldKind::Numeric { .. } => None,
            FieldKind::Categorical { codes } | FieldKind::Identifier { codes } => Some(codes),
        }
    }

    /// Check a numeric value against the declared bounds.
    pub fn check_range(&self, value: f64) -> Result<(), InputError> {
        if let FieldKind::Numeric { min, max, .. } = self.kind {
            if !(min..=max).contains(&value) {
                return Err(InputError::OutOfRange {
                    field: self.name.clone(),
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// Ordered list of model inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub version: String,
    pub fields: Vec<FieldSpec>,
}

impl FeatureSchema {
    /// The eight-feature layout used by the basic sales model.
    pub fn standard() -> Self {
        use fields::*;

        Self {
            version: SCHEMA_VERSION.to_string(),
            fields: vec![
                FieldSpec::numeric(ITEM_WEIGHT, "Item Weight", 0.0, 50.0, 0.1),
                FieldSpec::categorical(
                    ITEM_FAT_CONTENT,
                    "Item Fat Content",
                    CategoryCodeTable::fat_content(),
                ),
                FieldSpec::numeric(ITEM_VISIBILITY, "Item Visibility", 0.0, 1.0, 0.001),
                FieldSpec::categorical(ITEM_TYPE, "Item Type", CategoryCodeTable::item_type()),
                FieldSpec::numeric(ITEM_MRP, "Item MRP", 0.0, 300.0, 1.0),
                FieldSpec::categorical(
                    OUTLET_SIZE,
                    "Outlet Size",
                    CategoryCodeTable::outlet_size(),
                ),
                FieldSpec::categorical(
                    OUTLET_LOCATION_TYPE,
                    "Outlet Location Type",
                    CategoryCodeTable::outlet_location_type(),
                ),
                FieldSpec::categorical(
                    OUTLET_TYPE,
                    "Outlet Type",
                    CategoryCodeTable::outlet_type(),
                ),
            ],
        }
    }

    /// The eleven-feature layout that adds identifiers and the outlet
    /// establishment year. Product codes must come from the training
    /// pipeline, so the caller supplies that table.
    pub fn extended(item_identifiers: CategoryCodeTable) -> Self {
        use fields::*;

        Self {
            version: SCHEMA_VERSION.to_string(),
            fields: vec![
                FieldSpec::identifier(ITEM_IDENTIFIER, "Item Identifier", item_identifiers),
                FieldSpec::numeric(ITEM_WEIGHT, "Item Weight", 0.0, 50.0, 0.1),
                FieldSpec::categorical(
                    ITEM_FAT_CONTENT,
                    "Item Fat Content",
                    CategoryCodeTable::fat_content(),
                ),
                FieldSpec::numeric(ITEM_VISIBILITY, "Item Visibility", 0.0, 1.0, 0.001),
                FieldSpec::categorical(ITEM_TYPE, "Item Type", CategoryCodeTable::item_type()),
                FieldSpec::numeric(ITEM_MRP, "Item MRP", 0.0, 300.0, 1.0),
                FieldSpec::identifier(
                    OUTLET_IDENTIFIER,
                    "Outlet Identifier",
                    CategoryCodeTable::outlet_identifier(),
                ),
                FieldSpec::numeric(
                    OUTLET_ESTABLISHMENT_YEAR,
                    "Outlet Establishment Year",
                    1980.0,
                    2025.0,
                    1.0,
                ),
                FieldSpec::categorical(
                    OUTLET_SIZE,
                    "Outlet Size",
                    CategoryCodeTable::outlet_size(),
                ),
                FieldSpec::categorical(
                    OUTLET_LOCATION_TYPE,
                    "Outlet Location Type",
                    CategoryCodeTable::outlet_location_type(),
                ),
                FieldSpec::categorical(
                    OUTLET_TYPE,
                    "Outlet Type",
                    CategoryCodeTable::outlet_type(),
                ),
            ],
        }
    }

    /// Parse and validate a schema from JSON text.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let schema: FeatureSchema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Load and validate a schema file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let schema = Self::from_json(&json)?;

        info!(
            path = %path.display(),
            version = %schema.version,
            features = schema.feature_count(),
            "Feature schema loaded"
        );

        Ok(schema)
    }

    pub fn to_json_pretty(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Structural checks that do not depend on the model.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.fields.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
            match &field.kind {
                FieldKind::Numeric { min, max, .. } => {
                    if !min.is_finite() || !max.is_finite() || min > max {
                        return Err(SchemaError::InvalidRange {
                            field: field.name.clone(),
                            min: *min,
                            max: *max,
                        });
                    }
                }
                FieldKind::Categorical { codes } | FieldKind::Identifier { codes } => {
                    if codes.is_empty() {
                        return Err(SchemaError::EmptyTable(field.name.clone()));
                    }
                }
            }
        }

        Ok(())
    }

    /// Number of model inputs
    pub fn feature_count(&self) -> usize {
        self.fields.len()
    }

    /// Field names in model input order
    pub fn feature_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::standard()
    }
}
