use clap::Args;
use pitchside_core::field::FieldErrors;
use pitchside_core::render::{self, PasswordVisibility};
use pitchside_core::schema::SchemaRegistry;
use pitchside_core::validation::{self, ValidationResult};

use super::schema_or_exit;
use crate::util::{parse_values, print_json};

#[derive(Args)]
pub struct FormArgs {
    /// Profile type whose form to render
    pub profile_type: String,
    /// Field values as a JSON object
    #[arg(long)]
    pub values: Option<String>,
    /// Read field values from file (use '-' for stdin)
    #[arg(long, short = 'f', conflicts_with = "values")]
    pub values_file: Option<String>,
    /// Run validation and attach errors to the controls
    #[arg(long)]
    pub validate: bool,
    /// Password fields to render unmasked (repeatable)
    #[arg(long)]
    pub show_password: Vec<String>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Profile type to validate against
    pub profile_type: String,
    /// Field values as a JSON object
    #[arg(long, required_unless_present = "values_file")]
    pub values: Option<String>,
    /// Read field values from file (use '-' for stdin)
    #[arg(long, short = 'f', conflicts_with = "values")]
    pub values_file: Option<String>,
}

/// Print the bound control tree for a profile type.
pub fn render(args: FormArgs) -> i32 {
    let registry = SchemaRegistry::builtin();
    let schema = schema_or_exit(&registry, &args.profile_type);
    let values = parse_values(args.values.as_deref(), args.values_file.as_deref());

    let errors = if args.validate {
        validation::validate(&values, &schema.fields).errors
    } else {
        FieldErrors::new()
    };
    let mut visibility = PasswordVisibility::default();
    for name in &args.show_password {
        visibility.toggle(name);
    }

    print_json(&render::render_form(&schema.fields, &values, &errors, &visibility))
}

/// Validate values offline. Exit code 1 when any field is invalid.
pub fn validate(args: ValidateArgs) -> i32 {
    let registry = SchemaRegistry::builtin();
    let schema = schema_or_exit(&registry, &args.profile_type);
    let values = parse_values(args.values.as_deref(), args.values_file.as_deref());

    let result = validation::validate(&values, &schema.fields);
    match print_json(&result) {
        0 => validation_exit_code(&result),
        code => code,
    }
}

fn validation_exit_code(result: &ValidationResult) -> i32 {
    if result.is_valid { 0 } else { 1 }
}
