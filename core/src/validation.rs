use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::field::{FieldDefinition, FieldErrors, FieldType, FieldValue, FieldValues};

pub const PASSWORD_FIELD: &str = "password";
pub const CONFIRM_PASSWORD_FIELD: &str = "confirm_password";

pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
pub const PHONE_PATTERN: &str = r"^\+?[0-9][0-9\s\-()]{6,19}$";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("valid email regex"));

/// Outcome of a validation pass over a whole form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: FieldErrors,
}

impl ValidationResult {
    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }
}

/// Validate `values` against `fields`.
///
/// Fields are checked in declaration order and each field gets at most one
/// message. Malformed input (wrong value kind, unparsable numbers, broken
/// patterns) becomes an error entry; this never panics.
pub fn validate(values: &FieldValues, fields: &[FieldDefinition]) -> ValidationResult {
    let mut errors = FieldErrors::new();

    for field in fields {
        if let Some(message) = validate_field(field, values.get(&field.name)) {
            errors.insert(field.name.clone(), message);
        }
    }

    check_password_confirmation(values, &mut errors);

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Validate a single value. Returns the message for the first failing check.
pub fn validate_field(field: &FieldDefinition, value: Option<&FieldValue>) -> Option<String> {
    let blank = value.is_none_or(FieldValue::is_blank);
    if blank {
        return field
            .required
            .then(|| format!("{} is required", field.label));
    }
    let value = value?;
    let raw = value.as_text();
    let rules = field.rules();
    let pattern = rules.and_then(|r| r.pattern.as_deref());

    if let Some(message) = check_shape(field, &raw, pattern) {
        return Some(message);
    }

    if field.field_type.is_textual()
        && let Some(rules) = rules
    {
        let len = raw.chars().count();
        if let Some(min) = rules.min_length
            && len < min
        {
            return Some(format!("{} must be at least {min} characters", field.label));
        }
        if let Some(max) = rules.max_length
            && len > max
        {
            return Some(format!("{} must be at most {max} characters", field.label));
        }
    }

    if field.field_type == FieldType::Number {
        let number = match value {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            FieldValue::Bool(_) => None,
        };
        let Some(number) = number.filter(|n| n.is_finite()) else {
            return Some(format!("{} must be a valid number", field.label));
        };
        if let Some(min) = rules.and_then(|r| r.min)
            && number < min
        {
            return Some(format!("{} must be at least {min}", field.label));
        }
        if let Some(max) = rules.and_then(|r| r.max)
            && number > max
        {
            return Some(format!("{} must be at most {max}", field.label));
        }
    }

    None
}

fn check_shape(field: &FieldDefinition, raw: &str, pattern: Option<&str>) -> Option<String> {
    match field.field_type {
        FieldType::Email => {
            let ok = match pattern {
                Some(p) => matches_pattern(p, raw),
                None => EMAIL_RE.is_match(raw),
            };
            (!ok).then(|| "Please enter a valid email address".to_string())
        }
        FieldType::Tel => {
            let ok = match pattern {
                Some(p) => matches_pattern(p, raw),
                None => true,
            };
            (!ok).then(|| "Please enter a valid phone number".to_string())
        }
        FieldType::Url => match url::Url::parse(raw.trim()) {
            Ok(parsed) if parsed.has_host() || parsed.scheme() == "mailto" => None,
            _ => Some("Please enter a valid URL".to_string()),
        },
        FieldType::Date => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .is_err()
            .then(|| "Please enter a valid date (YYYY-MM-DD)".to_string()),
        FieldType::Select => (!field.has_option(raw))
            .then(|| format!("Please choose a valid option for {}", field.label)),
        FieldType::Text | FieldType::Password | FieldType::Textarea => {
            let ok = match pattern {
                Some(p) => matches_pattern(p, raw),
                None => true,
            };
            (!ok).then(|| format!("{} has an invalid format", field.label))
        }
        FieldType::Number | FieldType::Checkbox => None,
    }
}

/// A pattern that fails to compile never matches.
fn matches_pattern(pattern: &str, raw: &str) -> bool {
    match Regex::new(pattern) {
        Ok(re) => re.is_match(raw),
        Err(err) => {
            tracing::warn!(pattern, error = %err, "field pattern does not compile");
            false
        }
    }
}

fn check_password_confirmation(values: &FieldValues, errors: &mut FieldErrors) {
    let (Some(password), Some(confirm)) = (
        values.get(PASSWORD_FIELD),
        values.get(CONFIRM_PASSWORD_FIELD),
    ) else {
        return;
    };
    if password.is_blank() || confirm.is_blank() {
        return;
    }
    if password.as_text() != confirm.as_text() {
        errors
            .entry(CONFIRM_PASSWORD_FIELD.to_string())
            .or_insert_with(|| "Passwords do not match".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDefinition;
    use crate::schema::SchemaRegistry;

    fn values(pairs: &[(&str, &str)]) -> FieldValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::from(*v)))
            .collect()
    }

    fn account_fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("email", "Email", FieldType::Email)
                .required()
                .pattern(EMAIL_PATTERN),
            FieldDefinition::new("password", "Password", FieldType::Password)
                .required()
                .min_length(6),
            FieldDefinition::new("confirm_password", "Confirm Password", FieldType::Password)
                .required(),
        ]
    }

    #[test]
    fn coach_without_email_is_invalid() {
        let registry = SchemaRegistry::builtin();
        let coach = registry.get("coach").unwrap();
        let email = coach.field("email").unwrap();
        assert!(email.required);

        let result = validate(&values(&[("name", "Jane")]), &coach.fields);
        assert!(!result.is_valid);
        assert_eq!(result.error("email"), Some("Email Address is required"));
    }

    #[test]
    fn mismatched_passwords_flag_only_confirmation() {
        let result = validate(
            &values(&[
                ("email", "a@b.com"),
                ("password", "secret1"),
                ("confirm_password", "secret2"),
            ]),
            &account_fields(),
        );
        assert!(!result.is_valid);
        assert_eq!(result.error("confirm_password"), Some("Passwords do not match"));
        assert_eq!(result.error("email"), None);
        assert_eq!(result.error("password"), None);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn matching_passwords_pass() {
        let result = validate(
            &values(&[
                ("email", "a@b.com"),
                ("password", "secret1"),
                ("confirm_password", "secret1"),
            ]),
            &account_fields(),
        );
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn password_mismatch_applies_without_schema_fields() {
        let result = validate(&values(&[("password", "a"), ("confirm_password", "b")]), &[]);
        assert_eq!(result.error("confirm_password"), Some("Passwords do not match"));
    }

    #[test]
    fn number_bounds_cite_limits() {
        let fields = vec![
            FieldDefinition::new("overs", "Overs", FieldType::Number).range(1.0, 100.0),
        ];

        let low = validate(&values(&[("overs", "0")]), &fields);
        assert_eq!(low.error("overs"), Some("Overs must be at least 1"));

        let high = validate(&values(&[("overs", "101")]), &fields);
        assert_eq!(high.error("overs"), Some("Overs must be at most 100"));

        let ok = validate(&values(&[("overs", "50")]), &fields);
        assert!(ok.is_valid);
    }

    #[test]
    fn non_numeric_input_is_an_error_entry() {
        let fields = vec![FieldDefinition::new("overs", "Overs", FieldType::Number)];
        let result = validate(&values(&[("overs", "twenty")]), &fields);
        assert_eq!(result.error("overs"), Some("Overs must be a valid number"));

        let mut bool_value = FieldValues::new();
        bool_value.insert("overs".to_string(), FieldValue::Bool(true));
        let result = validate(&bool_value, &fields);
        assert_eq!(result.error("overs"), Some("Overs must be a valid number"));
    }

    #[test]
    fn whitespace_counts_as_missing_for_required() {
        let fields = vec![FieldDefinition::new("city", "City", FieldType::Text).required()];
        let result = validate(&values(&[("city", "   ")]), &fields);
        assert_eq!(result.error("city"), Some("City is required"));
    }

    #[test]
    fn optional_empty_fields_skip_all_checks() {
        let fields = vec![
            FieldDefinition::new("website", "Website", FieldType::Url),
            FieldDefinition::new("phone", "Phone", FieldType::Tel).pattern(PHONE_PATTERN),
            FieldDefinition::new("bio", "Bio", FieldType::Textarea).min_length(20),
        ];
        let result = validate(&values(&[("website", ""), ("bio", "")]), &fields);
        assert!(result.is_valid);
    }

    #[test]
    fn required_error_is_single_and_independent_of_other_fields() {
        let fields = vec![
            FieldDefinition::new("city", "City", FieldType::Text).required(),
            FieldDefinition::new("bio", "Bio", FieldType::Textarea).min_length(50),
        ];
        let long_bio = "x".repeat(60);
        let cases: [Vec<(&str, &str)>; 3] = [
            vec![],
            vec![("bio", "short")],
            vec![("bio", long_bio.as_str())],
        ];
        for others in &cases {
            let result = validate(&values(others), &fields);
            assert_eq!(result.error("city"), Some("City is required"));
            assert_eq!(
                result.errors.keys().filter(|k| k.as_str() == "city").count(),
                1
            );
        }
    }

    #[test]
    fn shape_checks_use_fixed_messages() {
        let fields = vec![
            FieldDefinition::new("email", "Email", FieldType::Email),
            FieldDefinition::new("phone", "Phone", FieldType::Tel).pattern(PHONE_PATTERN),
            FieldDefinition::new("website", "Website", FieldType::Url),
        ];
        let result = validate(
            &values(&[
                ("email", "not-an-email"),
                ("phone", "call me"),
                ("website", "pitchside dot cc"),
            ]),
            &fields,
        );
        assert_eq!(result.error("email"), Some("Please enter a valid email address"));
        assert_eq!(result.error("phone"), Some("Please enter a valid phone number"));
        assert_eq!(result.error("website"), Some("Please enter a valid URL"));

        let ok = validate(
            &values(&[
                ("email", "keeper@club.org"),
                ("phone", "+91 98765 43210"),
                ("website", "https://club.org/nets"),
            ]),
            &fields,
        );
        assert!(ok.is_valid, "{:?}", ok.errors);
    }

    #[test]
    fn length_bounds_count_characters() {
        let fields = vec![
            FieldDefinition::new("name", "Name", FieldType::Text)
                .min_length(2)
                .max_length(4),
        ];
        assert_eq!(
            validate(&values(&[("name", "A")]), &fields).error("name"),
            Some("Name must be at least 2 characters")
        );
        assert_eq!(
            validate(&values(&[("name", "Anand")]), &fields).error("name"),
            Some("Name must be at most 4 characters")
        );
        // four multi-byte characters
        assert!(validate(&values(&[("name", "ÅÄÖÜ")]), &fields).is_valid);
    }

    #[test]
    fn broken_pattern_flags_the_field() {
        let fields = vec![FieldDefinition::new("code", "Code", FieldType::Text).pattern("([a-z")];
        let result = validate(&values(&[("code", "abc")]), &fields);
        assert_eq!(result.error("code"), Some("Code has an invalid format"));
    }

    #[test]
    fn select_rejects_unknown_option() {
        let fields = vec![
            FieldDefinition::new("role", "Playing Role", FieldType::Select)
                .options(&[("batsman", "Batsman"), ("bowler", "Bowler")]),
        ];
        assert!(validate(&values(&[("role", "bowler")]), &fields).is_valid);
        assert_eq!(
            validate(&values(&[("role", "umpire")]), &fields).error("role"),
            Some("Please choose a valid option for Playing Role")
        );
    }

    #[test]
    fn required_checkbox_must_be_ticked() {
        let fields =
            vec![FieldDefinition::new("terms", "Terms", FieldType::Checkbox).required()];
        let mut v = FieldValues::new();
        v.insert("terms".to_string(), FieldValue::Bool(false));
        assert_eq!(validate(&v, &fields).error("terms"), Some("Terms is required"));
        v.insert("terms".to_string(), FieldValue::Bool(true));
        assert!(validate(&v, &fields).is_valid);
    }

    #[test]
    fn validate_is_deterministic_and_idempotent() {
        let registry = SchemaRegistry::builtin();
        let player = registry.get("player").unwrap();
        let input = values(&[("full_name", "R"), ("email", "bad"), ("password", "abc")]);

        let first = validate(&input, &player.fields);
        let second = validate(&input, &player.fields);
        assert_eq!(first, second);

        let clean = values(&[
            ("full_name", "Rahul Dravid"),
            ("email", "rahul@example.com"),
            ("password", "wall1973"),
            ("confirm_password", "wall1973"),
            ("playing_role", "batsman"),
        ]);
        let once = validate(&clean, &player.fields);
        assert!(once.is_valid, "{:?}", once.errors);
        assert_eq!(validate(&clean, &player.fields), once);
    }
}
