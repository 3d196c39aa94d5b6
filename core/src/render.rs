use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::field::{FieldDefinition, FieldErrors, FieldType, FieldValue, FieldValues, SelectOption};

/// Semantic kind of a single-line input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Text,
    Email,
    Tel,
    Url,
    Date,
}

/// Which control to paint for a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum ControlKind {
    Input {
        input_type: InputType,
    },
    /// Bounds are input-level hints only; the validator stays authoritative.
    Number {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
    },
    TextArea,
    /// `options[0]` is always the "not yet chosen" entry with an empty value.
    Select {
        options: Vec<SelectOption>,
    },
    Checkbox {
        checked: bool,
    },
    Password {
        visible: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Span {
    Full,
    Half,
}

/// One bound control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub name: String,
    pub label: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Display text of the current value; empty when unset.
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub span: Span,
    #[serde(flatten)]
    pub kind: ControlKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormView {
    pub controls: Vec<Control>,
}

impl FormView {
    pub fn control(&self, name: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.name == name)
    }

    pub fn has_errors(&self) -> bool {
        self.controls.iter().any(|c| c.error.is_some())
    }
}

/// Per-field reveal toggles for password inputs.
#[derive(Debug, Clone, Default)]
pub struct PasswordVisibility {
    visible: BTreeSet<String>,
}

impl PasswordVisibility {
    /// Flip the toggle for one field and return the new state.
    pub fn toggle(&mut self, name: &str) -> bool {
        if self.visible.remove(name) {
            false
        } else {
            self.visible.insert(name.to_string());
            true
        }
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.visible.contains(name)
    }

    pub fn clear(&mut self) {
        self.visible.clear();
    }
}

pub const SELECT_PLACEHOLDER_VALUE: &str = "";

pub fn render_form(
    fields: &[FieldDefinition],
    values: &FieldValues,
    errors: &FieldErrors,
    visibility: &PasswordVisibility,
) -> FormView {
    FormView {
        controls: fields
            .iter()
            .map(|field| render_control(field, values.get(&field.name), errors, visibility))
            .collect(),
    }
}

fn render_control(
    field: &FieldDefinition,
    value: Option<&FieldValue>,
    errors: &FieldErrors,
    visibility: &PasswordVisibility,
) -> Control {
    let rules = field.rules();
    let kind = match field.field_type {
        FieldType::Text => ControlKind::Input {
            input_type: InputType::Text,
        },
        FieldType::Email => ControlKind::Input {
            input_type: InputType::Email,
        },
        FieldType::Tel => ControlKind::Input {
            input_type: InputType::Tel,
        },
        FieldType::Url => ControlKind::Input {
            input_type: InputType::Url,
        },
        FieldType::Date => ControlKind::Input {
            input_type: InputType::Date,
        },
        FieldType::Number => ControlKind::Number {
            min: rules.and_then(|r| r.min),
            max: rules.and_then(|r| r.max),
            step: rules.and_then(|r| r.step),
        },
        FieldType::Textarea => ControlKind::TextArea,
        FieldType::Select => {
            let mut options = Vec::with_capacity(field.options.len() + 1);
            options.push(SelectOption {
                value: SELECT_PLACEHOLDER_VALUE.to_string(),
                label: format!("Select {}", field.label),
            });
            options.extend(field.options.iter().cloned());
            ControlKind::Select { options }
        }
        FieldType::Checkbox => ControlKind::Checkbox {
            checked: value.is_some_and(FieldValue::as_bool),
        },
        FieldType::Password => ControlKind::Password {
            visible: visibility.is_visible(&field.name),
        },
    };

    let span = match field.field_type {
        FieldType::Textarea => Span::Full,
        _ => Span::Half,
    };

    Control {
        name: field.name.clone(),
        label: field.label.clone(),
        required: field.required,
        placeholder: field.placeholder.clone(),
        value: value
            .filter(|_| field.field_type != FieldType::Checkbox)
            .map(|v| v.as_text().into_owned())
            .unwrap_or_default(),
        error: errors.get(&field.name).cloned(),
        span,
        kind,
    }
}

/// Turn raw text from an input control into a draft value.
///
/// Checkboxes become booleans and numbers that parse become numeric values.
/// Anything else stays text, so bad numeric input still reaches the
/// validator and is reported as "must be a valid number".
pub fn parse_input(field: &FieldDefinition, raw: &str) -> FieldValue {
    match field.field_type {
        FieldType::Checkbox => FieldValue::Bool(FieldValue::from(raw).as_bool()),
        FieldType::Number => match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => FieldValue::Number(n),
            _ => FieldValue::Text(raw.to_string()),
        },
        _ => FieldValue::Text(raw.to_string()),
    }
}
