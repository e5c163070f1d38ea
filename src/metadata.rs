//! Field metadata extraction for converted templates.

use crate::validate::ValidationReport;
use serde::{Deserialize, Serialize};

const DATE_TOKENS: [&str; 4] = ["date", "day", "month", "year"];
const NUMBER_TOKENS: [&str; 4] = ["amount", "price", "rent", "fee"];

/// Input kind inferred for a template field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Date,
    Number,
    Email,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Date => "date",
            FieldKind::Number => "number",
            FieldKind::Email => "email",
        }
    }
}

/// Form configuration for one template variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMetadata {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub required: bool,
    pub example: String,
}

/// Everything a template catalog needs to register a converted template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateMetadata {
    pub name: String,
    pub category: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub fields: Vec<FieldMetadata>,
    pub variable_count: usize,
}

/// Infers a field kind from the variable name.
///
/// The name is split on underscores and each token is compared exactly, so
/// `monthly_rent` reads as a number via its `rent` token rather than as a
/// date via the `month` fragment inside `monthly`. Date tokens outrank
/// number tokens, which outrank `email`.
pub fn infer_kind(variable_name: &str) -> FieldKind {
    let lowered = variable_name.to_lowercase();
    let tokens: Vec<&str> = lowered.split('_').filter(|t| !t.is_empty()).collect();

    if tokens.iter().any(|t| DATE_TOKENS.contains(t)) {
        FieldKind::Date
    } else if tokens.iter().any(|t| NUMBER_TOKENS.contains(t)) {
        FieldKind::Number
    } else if tokens.contains(&"email") {
        FieldKind::Email
    } else {
        FieldKind::Text
    }
}

/// Turns a snake_case variable name into a display label.
pub fn label_for(variable_name: &str) -> String {
    variable_name
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds template metadata from a validation report. Fields follow the
/// first-seen order of the variables; every field starts out required with
/// an empty example.
pub fn build_metadata(
    template_name: &str,
    category: &str,
    validation: &ValidationReport,
) -> TemplateMetadata {
    let fields = validation
        .unique_variables
        .iter()
        .map(|variable| FieldMetadata {
            name: variable.clone(),
            label: label_for(variable),
            kind: infer_kind(variable),
            required: true,
            example: String::new(),
        })
        .collect();

    TemplateMetadata {
        name: template_name.to_string(),
        category: category.to_string(),
        description: format!("User-uploaded template: {}", template_name),
        keywords: vec![template_name.to_lowercase(), category.to_lowercase()],
        fields,
        variable_count: validation.variable_count,
    }
}
