use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Current draft values, keyed by field name.
pub type FieldValues = BTreeMap<String, FieldValue>;

/// Validation messages, keyed by field name. A missing key means "no error".
pub type FieldErrors = BTreeMap<String, String>;

/// Input kind of a form field. Drives both validation and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Email,
    Password,
    Tel,
    Url,
    Textarea,
    Select,
    Number,
    Date,
    Checkbox,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Password => "password",
            FieldType::Tel => "tel",
            FieldType::Url => "url",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Checkbox => "checkbox",
        }
    }

    /// Types whose value is free text, so length and pattern constraints apply.
    pub fn is_textual(&self) -> bool {
        !matches!(
            self,
            FieldType::Select | FieldType::Number | FieldType::Checkbox
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a `select` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// Optional constraints attached to a field.
/// `pattern` is a regular expression matched against the raw string;
/// `min`/`max`/`step` only mean something for `number` fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

/// Declarative description of a single form input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldDefinitionError {
    #[error("field '{0}' has an empty name")]
    EmptyName(String),
    #[error("select field '{0}' has no options")]
    MissingOptions(String),
    #[error("field '{name}' of type {field_type} must not declare options")]
    UnexpectedOptions { name: String, field_type: FieldType },
    #[error("select field '{0}' has an option with an empty value")]
    EmptyOptionValue(String),
    #[error("field '{name}' has an invalid pattern: {reason}")]
    InvalidPattern { name: String, reason: String },
    #[error("field '{0}' declares minLength greater than maxLength")]
    InvertedLength(String),
    #[error("field '{0}' declares min greater than max")]
    InvertedRange(String),
}

impl FieldDefinition {
    pub fn new(name: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            field_type,
            required: false,
            placeholder: None,
            options: Vec::new(),
            validation: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn options(mut self, options: &[(&str, &str)]) -> Self {
        self.options = options
            .iter()
            .map(|(value, label)| SelectOption::new(value, label))
            .collect();
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.rules_mut().min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.rules_mut().max_length = Some(n);
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.rules_mut().pattern = Some(pattern.to_string());
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        let rules = self.rules_mut();
        rules.min = Some(min);
        rules.max = Some(max);
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.rules_mut().step = Some(step);
        self
    }

    fn rules_mut(&mut self) -> &mut ValidationRules {
        self.validation.get_or_insert_with(ValidationRules::default)
    }

    pub fn rules(&self) -> Option<&ValidationRules> {
        self.validation.as_ref()
    }

    /// Structural checks on the definition itself (not on user input).
    pub fn check(&self) -> Result<(), FieldDefinitionError> {
        if self.name.trim().is_empty() {
            return Err(FieldDefinitionError::EmptyName(self.label.clone()));
        }

        match (self.field_type, self.options.is_empty()) {
            (FieldType::Select, true) => {
                return Err(FieldDefinitionError::MissingOptions(self.name.clone()));
            }
            (FieldType::Select, false) => {
                if self.options.iter().any(|o| o.value.is_empty()) {
                    return Err(FieldDefinitionError::EmptyOptionValue(self.name.clone()));
                }
            }
            (field_type, false) => {
                return Err(FieldDefinitionError::UnexpectedOptions {
                    name: self.name.clone(),
                    field_type,
                });
            }
            _ => {}
        }

        if let Some(rules) = &self.validation {
            if let Some(pattern) = &rules.pattern {
                regex::Regex::new(pattern).map_err(|e| FieldDefinitionError::InvalidPattern {
                    name: self.name.clone(),
                    reason: e.to_string(),
                })?;
            }
            if let (Some(min), Some(max)) = (rules.min_length, rules.max_length)
                && min > max
            {
                return Err(FieldDefinitionError::InvertedLength(self.name.clone()));
            }
            if let (Some(min), Some(max)) = (rules.min, rules.max)
                && min > max
            {
                return Err(FieldDefinitionError::InvertedRange(self.name.clone()));
            }
        }

        Ok(())
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}

/// A single draft value. Serialized untagged so a draft is a plain JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// String form used for pattern, length and numeric-parse checks.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(s) => Cow::Borrowed(s.as_str()),
            FieldValue::Number(n) => Cow::Owned(n.to_string()),
            FieldValue::Bool(b) => Cow::Owned(b.to_string()),
        }
    }

    /// Empty text, whitespace-only text and an unticked box count as blank.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(_) => false,
            FieldValue::Bool(b) => !b,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            FieldValue::Text(s) => matches!(s.trim(), "true" | "on" | "yes" | "1"),
            FieldValue::Number(n) => *n != 0.0,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_without_options_is_rejected() {
        let field = FieldDefinition::new("role", "Role", FieldType::Select);
        assert_eq!(
            field.check(),
            Err(FieldDefinitionError::MissingOptions("role".to_string()))
        );
    }

    #[test]
    fn options_on_non_select_are_rejected() {
        let field =
            FieldDefinition::new("city", "City", FieldType::Text).options(&[("pune", "Pune")]);
        assert!(matches!(
            field.check(),
            Err(FieldDefinitionError::UnexpectedOptions { .. })
        ));
    }

    #[test]
    fn empty_option_value_collides_with_placeholder() {
        let field =
            FieldDefinition::new("role", "Role", FieldType::Select).options(&[("", "None")]);
        assert_eq!(
            field.check(),
            Err(FieldDefinitionError::EmptyOptionValue("role".to_string()))
        );
    }

    #[test]
    fn broken_pattern_is_reported_not_panicked() {
        let field = FieldDefinition::new("code", "Code", FieldType::Text).pattern("([a-z");
        assert!(matches!(
            field.check(),
            Err(FieldDefinitionError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let field = FieldDefinition::new("age", "Age", FieldType::Number).range(10.0, 1.0);
        assert_eq!(
            field.check(),
            Err(FieldDefinitionError::InvertedRange("age".to_string()))
        );
    }

    #[test]
    fn field_definition_serializes_type_key() {
        let field = FieldDefinition::new("email", "Email", FieldType::Email)
            .required()
            .min_length(5);
        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(value["type"], "email");
        assert_eq!(value["validation"]["minLength"], 5);
        assert!(value.get("options").is_none());
    }

    #[test]
    fn field_values_deserialize_untagged() {
        let values: FieldValues =
            serde_json::from_str(r#"{"name":"Jane","capacity":250,"floodlights":true}"#).unwrap();
        assert_eq!(values["name"], FieldValue::Text("Jane".to_string()));
        assert_eq!(values["capacity"], FieldValue::Number(250.0));
        assert_eq!(values["floodlights"], FieldValue::Bool(true));
    }

    #[test]
    fn blank_detection() {
        assert!(FieldValue::from("   ").is_blank());
        assert!(FieldValue::from(false).is_blank());
        assert!(!FieldValue::from(0.0).is_blank());
        assert!(!FieldValue::from("x").is_blank());
    }
}
