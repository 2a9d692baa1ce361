//! HTML rendering for the prediction form.
//!
//! Widgets are generated from the active feature schema so the form can
//! only offer labels the encoder knows and numeric bounds the model was
//! trained on.

use crate::config::DisplayConfig;
use crate::schema::{FeatureSchema, FieldKind, FieldSpec};
use minijinja::{context, Environment};
use serde::Serialize;
use std::collections::HashMap;

const FORM_TEMPLATE_NAME: &str = "form.html";
const FORM_TEMPLATE: &str = include_str!("templates/form.html");

/// What to show under the form
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Currency-formatted prediction
    Prediction(String),
    /// Message for a rejected submission
    Error(String),
}

/// Compiled form template.
///
/// The template name ends in `.html`, so every interpolated value is
/// HTML-escaped on render.
pub struct FormPage {
    env: Environment<'static>,
}

#[derive(Debug, Serialize)]
struct FieldView<'a> {
    name: &'a str,
    label: &'a str,
    widget: &'static str,
    min: String,
    max: String,
    step: String,
    value: String,
    options: Vec<OptionView<'a>>,
}

#[derive(Debug, Serialize)]
struct OptionView<'a> {
    label: &'a str,
    selected: bool,
}

impl FormPage {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(FORM_TEMPLATE_NAME, FORM_TEMPLATE)?;
        Ok(Self { env })
    }

    /// Render the full form page.
    ///
    /// `values` holds previously submitted form text, which is written back
    /// into the widgets.
    pub fn render(
        &self,
        schema: &FeatureSchema,
        display: &DisplayConfig,
        values: &HashMap<String, String>,
        outcome: Option<&Outcome>,
    ) -> Result<String, minijinja::Error> {
        let fields: Vec<FieldView> = schema
            .fields
            .iter()
            .map(|field| field_view(field, values.get(&field.name).map(String::as_str)))
            .collect();

        let (prediction, error) = match outcome {
            Some(Outcome::Prediction(formatted)) => (Some(formatted.as_str()), None),
            Some(Outcome::Error(message)) => (None, Some(message.as_str())),
            None => (None, None),
        };

        self.env.get_template(FORM_TEMPLATE_NAME)?.render(context! {
            title => &display.title,
            fields => fields,
            prediction => prediction,
            error => error,
        })
    }
}

fn field_view<'a>(field: &'a FieldSpec, value: Option<&str>) -> FieldView<'a> {
    let mut view = FieldView {
        name: &field.name,
        label: &field.label,
        widget: "text",
        min: String::new(),
        max: String::new(),
        step: String::new(),
        value: value.unwrap_or("").to_string(),
        options: Vec::new(),
    };

    match &field.kind {
        FieldKind::Numeric { min, max, step } => {
            view.widget = "number";
            view.min = min.to_string();
            view.max = max.to_string();
            view.step = step.to_string();
            if value.is_none() {
                view.value = min.to_string();
            }
        }
        FieldKind::Categorical { codes } => {
            view.widget = "select";
            view.options = codes
                .labels()
                .map(|label| OptionView {
                    label,
                    selected: value == Some(label),
                })
                .collect();
        }
        FieldKind::Identifier { .. } => {}
    }

    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CategoryCodeTable;

    fn render(
        schema: &FeatureSchema,
        values: &HashMap<String, String>,
        outcome: Option<&Outcome>,
    ) -> String {
        FormPage::new()
            .unwrap()
            .render(schema, &DisplayConfig::default(), values, outcome)
            .unwrap()
    }

    #[test]
    fn test_form_lists_every_field() {
        let schema = FeatureSchema::standard();
        let html = render(&schema, &HashMap::new(), None);

        for name in schema.feature_names() {
            assert!(html.contains(&format!("name=\"{name}\"")), "missing {name}");
        }
        assert!(html.contains("<option value=\"Supermarket Type3\">"));
        assert!(html.contains("max=\"300\""));
        assert!(html.contains("step=\"0.001\""));
        assert!(html.contains("Big Mart Sales Prediction"));
        assert!(!html.contains("class=\"success\""));
        assert!(!html.contains("class=\"error\""));
    }

    #[test]
    fn test_form_keeps_submitted_values() {
        let schema = FeatureSchema::standard();
        let mut values = HashMap::new();
        values.insert("Outlet_Size".to_string(), "High".to_string());
        values.insert("Item_MRP".to_string(), "150".to_string());

        let html = render(&schema, &values, None);

        assert!(html.contains("<option value=\"High\" selected>"));
        assert!(html.contains("value=\"150\""));
    }

    #[test]
    fn test_outcomes_rendered() {
        let schema = FeatureSchema::standard();

        let ok = render(
            &schema,
            &HashMap::new(),
            Some(&Outcome::Prediction("₹ 2097.27".to_string())),
        );
        assert!(ok.contains("💰 Predicted Sales: ₹ 2097.27"));

        let err = render(
            &schema,
            &HashMap::new(),
            Some(&Outcome::Error("unrecognized value '<b>'".to_string())),
        );
        assert!(err.contains("class=\"error\""));
        assert!(err.contains("&lt;b&gt;"));
        assert!(!err.contains("<b>"));
    }

    #[test]
    fn test_submitted_text_is_escaped() {
        let schema = FeatureSchema::standard();
        let mut values = HashMap::new();
        values.insert(
            "Item_Weight".to_string(),
            "\"><script>alert(1)</script>".to_string(),
        );

        let html = render(&schema, &values, None);

        assert!(!html.contains("<script>"));
        assert!(html.contains("&quot;&gt;&lt;script&gt;"));
    }

    #[test]
    fn test_identifier_fields_are_text_inputs() {
        let schema = FeatureSchema::extended(CategoryCodeTable::ordinal(&["FDA15"]));
        let html = render(&schema, &HashMap::new(), None);

        assert!(html.contains("<input type=\"text\" id=\"Item_Identifier\""));
        assert!(html.contains("<input type=\"text\" id=\"Outlet_Identifier\""));
        assert!(html.contains("value=\"1980\""));
    }
}
