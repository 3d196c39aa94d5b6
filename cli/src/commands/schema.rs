use clap::Subcommand;
use pitchside_core::schema::SchemaRegistry;
use serde_json::json;

use super::schema_or_exit;
use crate::util::print_json;

#[derive(Subcommand)]
pub enum SchemaCommands {
    /// List the available profile types
    List,
    /// Show one profile type's fields and validation rules
    Show {
        /// Profile type (e.g. player, coach, academy, venue, community)
        profile_type: String,
    },
}

pub fn run(command: SchemaCommands) -> i32 {
    let registry = SchemaRegistry::builtin();
    match command {
        SchemaCommands::List => list(&registry),
        SchemaCommands::Show { profile_type } => print_json(schema_or_exit(&registry, &profile_type)),
    }
}

fn list(registry: &SchemaRegistry) -> i32 {
    let types: Vec<_> = registry
        .iter()
        .map(|schema| {
            json!({
                "profile_type": schema.profile_type,
                "title": schema.title,
                "description": schema.description,
                "icon": schema.icon,
                "fields": schema.fields.len(),
                "required": schema.required_fields().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            })
        })
        .collect();
    print_json(&json!({ "profile_types": types }))
}
