pub mod auth;
pub mod connection;
pub mod form;
pub mod message;
pub mod profile;
pub mod schema;

use std::sync::Arc;

use pitchside_core::schema::{ProfileSchema, SchemaRegistry};
use pitchside_core::session::Session;
use pitchside_core::toast::{ToastChannel, ToastKind};
use serde_json::json;

use crate::backend::HttpBackend;
use crate::util::{exit_error, resolve_token};

/// Connection settings shared by every command that talks to the API.
pub struct Context {
    pub api_url: String,
    pub toast_duration: std::time::Duration,
}

impl Context {
    pub fn session(&self) -> Session<HttpBackend> {
        let token = resolve_token(&self.api_url);
        if token.is_none() {
            tracing::debug!(api_url = %self.api_url, "no API key configured, sending anonymous requests");
        }
        Session::new(
            HttpBackend::new(&self.api_url, token),
            Arc::new(SchemaRegistry::builtin()),
            ToastChannel::new(self.toast_duration),
        )
    }
}

/// Print every pending toast to stderr, one JSON object per line.
pub fn emit_toasts(session: &mut Session<HttpBackend>) {
    for toast in session.toasts_mut().drain() {
        let level = match toast.kind {
            ToastKind::Error => "error",
            ToastKind::Warning => "warning",
            ToastKind::Success => "success",
            ToastKind::Info => "info",
        };
        eprintln!(
            "{}",
            json!({"toast": level, "title": toast.title, "message": toast.message})
        );
    }
}

/// Look up a schema or exit with a usage error naming the closest type.
pub fn schema_or_exit<'a>(registry: &'a SchemaRegistry, profile_type: &str) -> &'a ProfileSchema {
    if let Some(schema) = registry.get(profile_type) {
        return schema;
    }
    exit_error(
        &format!("Unknown profile type '{profile_type}'"),
        Some(&unknown_type_hint(registry, profile_type)),
    );
}

fn unknown_type_hint(registry: &SchemaRegistry, profile_type: &str) -> String {
    match registry.suggest(profile_type) {
        Some(close) => format!("Did you mean '{close}'?"),
        None => format!(
            "Available profile types: {}",
            registry.profile_types().collect::<Vec<_>>().join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typo_hint_names_closest_type() {
        let registry = SchemaRegistry::builtin();
        assert_eq!(unknown_type_hint(&registry, "plyer"), "Did you mean 'player'?");
        assert_eq!(unknown_type_hint(&registry, "Venu"), "Did you mean 'venue'?");
    }

    #[test]
    fn unrelated_type_lists_every_type() {
        let registry = SchemaRegistry::builtin();
        assert_eq!(
            unknown_type_hint(&registry, "umpire"),
            "Available profile types: player, coach, academy, venue, community"
        );
    }
}
