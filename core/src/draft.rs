use std::fmt;

use serde::{Deserialize, Serialize};

use crate::field::{FieldErrors, FieldValue, FieldValues};
use crate::profile::{NewProfileRequest, Profile};
use crate::schema::{ProfileSchema, SchemaRegistry};
use crate::validation::{self, ValidationResult};

/// Where a profile-creation session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftPhase {
    SelectingType,
    Editing,
    Confirming,
    Submitting,
    Succeeded,
    Failed,
}

impl DraftPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftPhase::SelectingType => "selecting_type",
            DraftPhase::Editing => "editing",
            DraftPhase::Confirming => "confirming",
            DraftPhase::Submitting => "submitting",
            DraftPhase::Succeeded => "succeeded",
            DraftPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for DraftPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("profile type '{profile_type}' is not available")]
    UnknownProfileType {
        profile_type: String,
        suggestion: Option<String>,
    },
    #[error("field '{0}' is not part of this form")]
    UnknownField(String),
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: DraftPhase,
        action: &'static str,
    },
}

/// Identifies one in-flight submission. A reset or a newer submission
/// bumps the draft's generation, so a late response carrying an older
/// token cannot overwrite the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionToken {
    generation: u64,
}

/// What happened when a submission outcome was handed back to the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied(DraftPhase),
    /// The token was superseded; the outcome was dropped.
    Stale,
}

/// Mutable state of one profile-creation session.
#[derive(Debug, Clone)]
pub struct ProfileDraft {
    schema: Option<ProfileSchema>,
    values: FieldValues,
    errors: FieldErrors,
    phase: DraftPhase,
    generation: u64,
    history: Vec<DraftPhase>,
    last_error: Option<String>,
    created: Option<Profile>,
}

impl Default for ProfileDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileDraft {
    pub fn new() -> Self {
        Self {
            schema: None,
            values: FieldValues::new(),
            errors: FieldErrors::new(),
            phase: DraftPhase::SelectingType,
            generation: 0,
            history: vec![DraftPhase::SelectingType],
            last_error: None,
            created: None,
        }
    }

    pub fn phase(&self) -> DraftPhase {
        self.phase
    }

    pub fn schema(&self) -> Option<&ProfileSchema> {
        self.schema.as_ref()
    }

    pub fn profile_type(&self) -> Option<&str> {
        self.schema.as_ref().map(|s| s.profile_type.as_str())
    }

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Phases visited since the draft was last reset, oldest first.
    pub fn history(&self) -> &[DraftPhase] {
        &self.history
    }

    /// Message of the last failed submission, kept for the retry prompt.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn created(&self) -> Option<&Profile> {
        self.created.as_ref()
    }

    fn transition(&mut self, to: DraftPhase) {
        tracing::debug!(from = %self.phase, to = %to, "draft transition");
        self.phase = to;
        self.history.push(to);
    }

    fn expect_phase(&self, phase: DraftPhase, action: &'static str) -> Result<(), DraftError> {
        if self.phase != phase {
            return Err(DraftError::InvalidTransition {
                from: self.phase,
                action,
            });
        }
        Ok(())
    }

    pub fn select_type(
        &mut self,
        registry: &SchemaRegistry,
        profile_type: &str,
    ) -> Result<&ProfileSchema, DraftError> {
        self.expect_phase(DraftPhase::SelectingType, "select a profile type")?;
        let Some(schema) = registry.get(profile_type) else {
            return Err(DraftError::UnknownProfileType {
                profile_type: profile_type.to_string(),
                suggestion: registry.suggest(profile_type).map(str::to_string),
            });
        };
        self.values.clear();
        self.errors.clear();
        self.transition(DraftPhase::Editing);
        Ok(self.schema.insert(schema.clone()))
    }

    /// Change handler: sets exactly one value and clears that field's error.
    /// The error is not recomputed until the next submit.
    pub fn change(&mut self, name: &str, value: FieldValue) -> Result<(), DraftError> {
        self.expect_phase(DraftPhase::Editing, "edit fields")?;
        let known = self
            .schema
            .as_ref()
            .is_some_and(|schema| schema.field(name).is_some());
        if !known {
            return Err(DraftError::UnknownField(name.to_string()));
        }
        self.values.insert(name.to_string(), value);
        self.errors.remove(name);
        Ok(())
    }

    /// Run the validator. Valid drafts move on to confirmation; invalid ones
    /// stay in editing with `errors` populated.
    pub fn submit(&mut self) -> Result<ValidationResult, DraftError> {
        self.expect_phase(DraftPhase::Editing, "submit")?;
        let fields = self.schema.as_ref().map(|s| s.fields.as_slice()).unwrap_or(&[]);
        let result = validation::validate(&self.values, fields);
        self.errors = result.errors.clone();
        if result.is_valid {
            self.transition(DraftPhase::Confirming);
        } else {
            tracing::debug!(errors = result.errors.len(), "draft failed validation");
        }
        Ok(result)
    }

    pub fn cancel_confirm(&mut self) -> Result<(), DraftError> {
        self.expect_phase(DraftPhase::Confirming, "go back to editing")?;
        self.transition(DraftPhase::Editing);
        Ok(())
    }

    /// Confirming -> submitting. The returned token must accompany the
    /// backend outcome passed to [`ProfileDraft::resolve`].
    pub fn confirm(&mut self) -> Result<SubmissionToken, DraftError> {
        self.expect_phase(DraftPhase::Confirming, "confirm")?;
        self.generation += 1;
        self.last_error = None;
        self.transition(DraftPhase::Submitting);
        Ok(SubmissionToken {
            generation: self.generation,
        })
    }

    /// Body for the backend create call.
    pub fn request(&self) -> Option<NewProfileRequest> {
        let schema = self.schema.as_ref()?;
        Some(NewProfileRequest {
            profile_type: schema.profile_type.clone(),
            values: self.values.clone(),
        })
    }

    pub fn resolve(
        &mut self,
        token: SubmissionToken,
        outcome: Result<Profile, String>,
    ) -> Resolution {
        if token.generation != self.generation || self.phase != DraftPhase::Submitting {
            tracing::debug!(
                token = token.generation,
                current = self.generation,
                phase = %self.phase,
                "dropping superseded submission outcome"
            );
            return Resolution::Stale;
        }
        match outcome {
            Ok(profile) => {
                self.created = Some(profile);
                self.transition(DraftPhase::Succeeded);
            }
            Err(message) => {
                self.last_error = Some(message);
                self.transition(DraftPhase::Failed);
            }
        }
        Resolution::Applied(self.phase)
    }

    /// Attach a backend rejection to one field so it shows inline once the
    /// draft is back in editing. Ignored for fields the schema lacks.
    pub fn flag_field(&mut self, name: &str, message: String) -> bool {
        let known = self
            .schema
            .as_ref()
            .is_some_and(|schema| schema.field(name).is_some());
        if known {
            self.errors.insert(name.to_string(), message);
        }
        known
    }

    /// Failed -> editing with every value intact.
    pub fn retry(&mut self) -> Result<(), DraftError> {
        self.expect_phase(DraftPhase::Failed, "retry")?;
        self.transition(DraftPhase::Editing);
        Ok(())
    }

    /// Succeeded -> selecting a new type with an empty draft.
    pub fn create_another(&mut self) -> Result<(), DraftError> {
        self.expect_phase(DraftPhase::Succeeded, "create another profile")?;
        self.reset();
        Ok(())
    }

    /// Succeeded -> hand the created profile to the caller and reset.
    pub fn finish(&mut self) -> Result<Option<Profile>, DraftError> {
        self.expect_phase(DraftPhase::Succeeded, "finish")?;
        let created = self.created.take();
        self.reset();
        Ok(created)
    }

    /// Discard everything and go back to type selection. Any submission
    /// still in flight is superseded.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.schema = None;
        self.values.clear();
        self.errors.clear();
        self.last_error = None;
        self.created = None;
        self.phase = DraftPhase::SelectingType;
        self.history = vec![DraftPhase::SelectingType];
        tracing::debug!(generation = self.generation, "draft reset");
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    pub fn venue_values() -> Vec<(&'static str, FieldValue)> {
        vec![
            ("venue_name", FieldValue::from("Wankhede Stadium")),
            ("email", FieldValue::from("bookings@wankhede.in")),
            ("phone", FieldValue::from("+91 22 2279 5500")),
            ("venue_type", FieldValue::from("stadium")),
            ("address", FieldValue::from("D Road, Churchgate")),
            ("city", FieldValue::from("Mumbai")),
            ("capacity", FieldValue::from(33_000.0)),
            ("floodlights", FieldValue::from(true)),
        ]
    }

    pub fn created_profile(profile_type: &str, name: &str) -> Profile {
        Profile {
            id: Uuid::now_v7(),
            profile_type: profile_type.to_string(),
            name: name.to_string(),
            username: name.to_lowercase().replace(' ', "_"),
            avatar: None,
            theme: crate::schema::Theme {
                from: "#16a34a".to_string(),
                to: "#65a30d".to_string(),
            },
            is_active: false,
            created_at: Utc::now(),
            user_id: Uuid::now_v7(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn editing_venue(registry: &SchemaRegistry) -> ProfileDraft {
        let mut draft = ProfileDraft::new();
        draft.select_type(registry, "venue").unwrap();
        for (name, value) in venue_values() {
            draft.change(name, value).unwrap();
        }
        draft
    }

    #[test]
    fn venue_happy_path_visits_phases_in_order() {
        let registry = SchemaRegistry::builtin();
        let mut draft = editing_venue(&registry);

        let result = draft.submit().unwrap();
        assert!(result.is_valid, "{:?}", result.errors);
        let token = draft.confirm().unwrap();
        let resolution = draft.resolve(token, Ok(created_profile("venue", "Wankhede Stadium")));

        assert_eq!(resolution, Resolution::Applied(DraftPhase::Succeeded));
        assert_eq!(
            draft.history(),
            &[
                DraftPhase::SelectingType,
                DraftPhase::Editing,
                DraftPhase::Confirming,
                DraftPhase::Submitting,
                DraftPhase::Succeeded,
            ]
        );
    }

    #[test]
    fn invalid_submit_stays_in_editing_with_errors() {
        let registry = SchemaRegistry::builtin();
        let mut draft = ProfileDraft::new();
        draft.select_type(&registry, "coach").unwrap();
        draft.change("full_name", FieldValue::from("Jane")).unwrap();

        let result = draft.submit().unwrap();
        assert!(!result.is_valid);
        assert_eq!(draft.phase(), DraftPhase::Editing);
        assert!(draft.errors().contains_key("email"));
    }

    #[test]
    fn change_clears_only_that_fields_error() {
        let registry = SchemaRegistry::builtin();
        let mut draft = ProfileDraft::new();
        draft.select_type(&registry, "coach").unwrap();
        draft.submit().unwrap();
        assert!(draft.errors().contains_key("email"));
        assert!(draft.errors().contains_key("full_name"));

        draft.change("email", FieldValue::from("not-yet")).unwrap();
        assert!(!draft.errors().contains_key("email"));
        assert!(draft.errors().contains_key("full_name"));
    }

    #[test]
    fn unknown_type_keeps_selecting_and_suggests() {
        let registry = SchemaRegistry::builtin();
        let mut draft = ProfileDraft::new();
        let err = draft.select_type(&registry, "venu").unwrap_err();
        assert_eq!(
            err,
            DraftError::UnknownProfileType {
                profile_type: "venu".to_string(),
                suggestion: Some("venue".to_string()),
            }
        );
        assert_eq!(draft.phase(), DraftPhase::SelectingType);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let registry = SchemaRegistry::builtin();
        let mut draft = ProfileDraft::new();
        draft.select_type(&registry, "venue").unwrap();
        assert_eq!(
            draft.change("batting_style", FieldValue::from("left_hand")),
            Err(DraftError::UnknownField("batting_style".to_string()))
        );
    }

    #[test]
    fn cancel_confirm_keeps_values() {
        let registry = SchemaRegistry::builtin();
        let mut draft = editing_venue(&registry);
        draft.submit().unwrap();
        draft.cancel_confirm().unwrap();
        assert_eq!(draft.phase(), DraftPhase::Editing);
        assert_eq!(draft.values().len(), venue_values().len());
    }

    #[test]
    fn failure_then_retry_preserves_values() {
        let registry = SchemaRegistry::builtin();
        let mut draft = editing_venue(&registry);
        draft.submit().unwrap();
        let token = draft.confirm().unwrap();
        let before = draft.values().clone();

        let resolution = draft.resolve(token, Err("backend unavailable".to_string()));
        assert_eq!(resolution, Resolution::Applied(DraftPhase::Failed));
        assert_eq!(draft.last_error(), Some("backend unavailable"));

        draft.retry().unwrap();
        assert_eq!(draft.phase(), DraftPhase::Editing);
        assert_eq!(draft.values(), &before);
    }

    #[test]
    fn outcome_after_reset_is_stale() {
        let registry = SchemaRegistry::builtin();
        let mut draft = editing_venue(&registry);
        draft.submit().unwrap();
        let token = draft.confirm().unwrap();

        draft.reset();
        let resolution = draft.resolve(token, Ok(created_profile("venue", "Eden Gardens")));
        assert_eq!(resolution, Resolution::Stale);
        assert_eq!(draft.phase(), DraftPhase::SelectingType);
        assert!(draft.created().is_none());
    }

    #[test]
    fn create_another_resets_draft() {
        let registry = SchemaRegistry::builtin();
        let mut draft = editing_venue(&registry);
        draft.submit().unwrap();
        let token = draft.confirm().unwrap();
        draft.resolve(token, Ok(created_profile("venue", "Chinnaswamy")));

        draft.create_another().unwrap();
        assert_eq!(draft.phase(), DraftPhase::SelectingType);
        assert!(draft.values().is_empty());
        assert!(draft.schema().is_none());
    }

    #[test]
    fn finish_hands_back_created_profile() {
        let registry = SchemaRegistry::builtin();
        let mut draft = editing_venue(&registry);
        draft.submit().unwrap();
        let token = draft.confirm().unwrap();
        draft.resolve(token, Ok(created_profile("venue", "Chepauk")));

        let created = draft.finish().unwrap().unwrap();
        assert_eq!(created.name, "Chepauk");
        assert_eq!(draft.phase(), DraftPhase::SelectingType);
    }

    #[test]
    fn illegal_transitions_are_errors() {
        let mut draft = ProfileDraft::new();
        assert_eq!(
            draft.confirm(),
            Err(DraftError::InvalidTransition {
                from: DraftPhase::SelectingType,
                action: "confirm",
            })
        );
        assert!(draft.submit().is_err());
        assert!(draft.retry().is_err());
        assert!(draft.finish().is_err());
    }
}
