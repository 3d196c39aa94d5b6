use std::sync::Arc;

use uuid::Uuid;

use crate::backend::{BackendError, ProfileBackend};
use crate::draft::{DraftError, DraftPhase, ProfileDraft, Resolution, SubmissionToken};
use crate::field::FieldValue;
use crate::optimistic::{Optimistic, OptimisticError, Ticket};
use crate::profile::{
    Connection, ConnectionPatch, ConnectionStatus, Message, NewProfileRequest, Profile,
    ProfilePatch, UserProfile,
};
use crate::render::{self, FormView, PasswordVisibility};
use crate::schema::{ProfileSchema, SchemaRegistry};
use crate::switcher::ProfileSwitcher;
use crate::toast::ToastChannel;
use crate::validation::ValidationResult;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Optimistic(#[from] OptimisticError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("user profile has not been loaded yet")]
    ProfileNotLoaded,
}

/// A submission that has left the draft but whose backend outcome has not
/// been handed back yet.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub token: SubmissionToken,
    pub request: NewProfileRequest,
}

/// Everything one signed-in user's client holds. Collaborators are passed in
/// at construction; nothing here reaches for global state.
pub struct Session<B> {
    backend: B,
    registry: Arc<SchemaRegistry>,
    toasts: ToastChannel,
    switcher: ProfileSwitcher,
    draft: ProfileDraft,
    visibility: PasswordVisibility,
    profile: Option<Optimistic<UserProfile, ProfilePatch>>,
    // layer applied by `queue_profile_update` that `flush_profile_updates` still owes the backend
    queued_in_flight: Option<Ticket>,
    connections: Optimistic<Vec<Connection>, ConnectionPatch>,
}

impl<B: ProfileBackend> Session<B> {
    pub fn new(backend: B, registry: Arc<SchemaRegistry>, toasts: ToastChannel) -> Self {
        Self {
            backend,
            registry,
            toasts,
            switcher: ProfileSwitcher::default(),
            draft: ProfileDraft::new(),
            visibility: PasswordVisibility::default(),
            profile: None,
            queued_in_flight: None,
            connections: Optimistic::new(Vec::new()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn draft(&self) -> &ProfileDraft {
        &self.draft
    }

    pub fn toasts(&self) -> &ToastChannel {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut ToastChannel {
        &mut self.toasts
    }

    pub fn switcher(&self) -> &ProfileSwitcher {
        &self.switcher
    }

    pub fn switcher_mut(&mut self) -> &mut ProfileSwitcher {
        &mut self.switcher
    }

    pub fn user_profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref().map(Optimistic::get)
    }

    pub fn connections(&self) -> &[Connection] {
        self.connections.get()
    }

    // ── Profile creation ───────────────────────────────────────────────

    pub fn select_type(&mut self, profile_type: &str) -> Result<&ProfileSchema, SessionError> {
        self.visibility.clear();
        Ok(self.draft.select_type(&self.registry, profile_type)?)
    }

    pub fn change_field(&mut self, name: &str, value: FieldValue) -> Result<(), SessionError> {
        Ok(self.draft.change(name, value)?)
    }

    /// Change a field from raw control text, converting it per field type.
    pub fn change_field_raw(&mut self, name: &str, raw: &str) -> Result<(), SessionError> {
        let value = self
            .draft
            .schema()
            .and_then(|schema| schema.field(name))
            .map(|field| render::parse_input(field, raw))
            .ok_or_else(|| DraftError::UnknownField(name.to_string()))?;
        self.change_field(name, value)
    }

    pub fn toggle_password_visibility(&mut self, name: &str) -> bool {
        self.visibility.toggle(name)
    }

    /// Current form, or `None` while no profile type is selected.
    pub fn form_view(&self) -> Option<FormView> {
        let schema = self.draft.schema()?;
        Some(render::render_form(
            &schema.fields,
            self.draft.values(),
            self.draft.errors(),
            &self.visibility,
        ))
    }

    pub fn submit_draft(&mut self) -> Result<ValidationResult, SessionError> {
        let result = self.draft.submit()?;
        if !result.is_valid {
            let count = result.errors.len();
            let noun = if count == 1 { "field needs" } else { "fields need" };
            self.toasts.error(
                "Please check the form",
                Some(format!("{count} {noun} attention.")),
            );
        }
        Ok(result)
    }

    pub fn cancel_confirm(&mut self) -> Result<(), SessionError> {
        Ok(self.draft.cancel_confirm()?)
    }

    /// Confirming -> submitting. The caller performs the backend call and
    /// hands the outcome to [`Session::complete_submission`].
    pub fn begin_submission(&mut self) -> Result<PendingSubmission, SessionError> {
        let request = self
            .draft
            .request()
            .ok_or(DraftError::InvalidTransition {
                from: self.draft.phase(),
                action: "confirm",
            })?;
        let token = self.draft.confirm()?;
        Ok(PendingSubmission { token, request })
    }

    pub fn complete_submission(
        &mut self,
        pending: PendingSubmission,
        outcome: Result<Profile, BackendError>,
    ) -> Resolution {
        let (resolved, failure) = match outcome {
            Ok(profile) => (Ok(profile), None),
            Err(err) => (Err(err.to_string()), Some(err)),
        };
        let resolution = self.draft.resolve(pending.token, resolved);
        if resolution == Resolution::Stale {
            return resolution;
        }

        match failure {
            None => {
                if let Some(profile) = self.draft.created().cloned() {
                    let title = format!("{} created", profile.name);
                    self.switcher.add(profile);
                    self.toasts.success(&title, None);
                }
            }
            Some(err) => {
                tracing::warn!(error = %err, profile_type = %pending.request.profile_type, "profile creation failed");
                if let Some(field) = err.field() {
                    self.draft.flag_field(field, err.user_message());
                }
                self.toasts
                    .error("Could not create profile", Some(err.user_message()));
            }
        }
        resolution
    }

    /// Confirm the draft, create the profile and reconcile, in one step.
    pub async fn confirm_and_create(&mut self) -> Result<DraftPhase, SessionError> {
        let pending = self.begin_submission()?;
        let outcome = self.backend.create_profile(&pending.request).await;
        self.complete_submission(pending, outcome);
        Ok(self.draft.phase())
    }

    pub fn retry(&mut self) -> Result<(), SessionError> {
        Ok(self.draft.retry()?)
    }

    pub fn create_another(&mut self) -> Result<(), SessionError> {
        self.visibility.clear();
        Ok(self.draft.create_another()?)
    }

    /// Leave the creation flow; the returned profile is what the navigation
    /// layer should open next.
    pub fn finish(&mut self) -> Result<Option<Profile>, SessionError> {
        self.visibility.clear();
        Ok(self.draft.finish()?)
    }

    pub fn reset_draft(&mut self) {
        self.visibility.clear();
        self.draft.reset();
    }

    // ── User profile ───────────────────────────────────────────────────

    pub async fn load_user_profile(&mut self) -> Result<&UserProfile, SessionError> {
        let fetched = self.backend.fetch_user_profile().await.inspect_err(|err| {
            self.toasts
                .error("Could not load your profile", Some(err.user_message()));
        })?;
        self.queued_in_flight = None;
        let cell = match self.profile.take() {
            Some(mut cell) => {
                cell.replace(fetched);
                cell
            }
            None => Optimistic::new(fetched),
        };
        Ok(self.profile.insert(cell).get())
    }

    /// Apply `patch` immediately, push the result to the backend, then
    /// reconcile or roll back. Edits still waiting from
    /// [`Session::queue_profile_update`] or an interrupted flush go first,
    /// so the backend always sees edits in the order they were made.
    pub async fn update_user_profile(
        &mut self,
        patch: ProfilePatch,
    ) -> Result<&UserProfile, SessionError> {
        self.queue_profile_update(patch)?;
        self.flush_profile_updates().await?;
        self.user_profile().ok_or(SessionError::ProfileNotLoaded)
    }

    /// Queue an edit behind any unsettled one. The first edit is shown right
    /// away; nothing reaches the backend until [`Session::flush_profile_updates`].
    /// Returns the number of edits waiting, the visible one included.
    pub fn queue_profile_update(&mut self, patch: ProfilePatch) -> Result<usize, SessionError> {
        let cell = self.profile.as_mut().ok_or(SessionError::ProfileNotLoaded)?;
        if let Some(ticket) = cell.enqueue(patch) {
            self.queued_in_flight = Some(ticket);
        }
        Ok(cell.queued() + usize::from(cell.is_pending()))
    }

    /// Settle queued edits one at a time, in the order they were issued.
    /// Stops at the first backend failure; later edits stay queued.
    pub async fn flush_profile_updates(&mut self) -> Result<usize, SessionError> {
        let mut settled = 0;
        if let Some(ticket) = self.queued_in_flight.take() {
            self.settle_profile(ticket).await?;
            settled += 1;
        }
        loop {
            let cell = self.profile.as_mut().ok_or(SessionError::ProfileNotLoaded)?;
            let Some(ticket) = cell.apply_next() else {
                break;
            };
            self.settle_profile(ticket).await?;
            settled += 1;
        }
        Ok(settled)
    }

    async fn settle_profile(&mut self, ticket: Ticket) -> Result<(), SessionError> {
        let cell = self.profile.as_mut().ok_or(SessionError::ProfileNotLoaded)?;
        let speculative = cell.get().clone();
        match self.backend.update_user_profile(&speculative).await {
            Ok(server) => {
                cell.confirm(ticket, server)?;
                Ok(())
            }
            Err(err) => {
                cell.rollback(ticket)?;
                self.toasts
                    .error("Could not save your changes", Some(err.user_message()));
                Err(err.into())
            }
        }
    }

    // ── Connections & messages ─────────────────────────────────────────

    pub async fn load_connections(&mut self) -> Result<&[Connection], SessionError> {
        let fetched = self.backend.list_connections().await.inspect_err(|err| {
            self.toasts
                .error("Could not load connections", Some(err.user_message()));
        })?;
        self.connections.replace(fetched);
        Ok(self.connections.get())
    }

    /// Shows a pending placeholder right away and swaps in the backend's
    /// record once it answers.
    pub async fn add_connection(&mut self, user_id: Uuid) -> Result<Connection, SessionError> {
        let placeholder = Connection {
            id: Uuid::now_v7(),
            user_id,
            username: user_id.to_string(),
            full_name: None,
            status: ConnectionStatus::Pending,
        };
        let placeholder_id = placeholder.id;
        let ticket = self.connections.apply(ConnectionPatch::Add(placeholder))?;

        match self.backend.add_connection(user_id).await {
            Ok(created) => {
                let mut server = self.connections.get().clone();
                server.retain(|c| c.id != placeholder_id);
                server.push(created.clone());
                self.connections.confirm(ticket, Some(server))?;
                Ok(created)
            }
            Err(err) => {
                self.connections.rollback(ticket)?;
                self.toasts
                    .error("Could not send connection request", Some(err.user_message()));
                Err(err.into())
            }
        }
    }

    pub async fn remove_connection(&mut self, connection_id: Uuid) -> Result<(), SessionError> {
        let ticket = self
            .connections
            .apply(ConnectionPatch::Remove(connection_id))?;
        match self.backend.remove_connection(connection_id).await {
            Ok(()) => {
                self.connections.confirm(ticket, None)?;
                Ok(())
            }
            Err(err) => {
                self.connections.rollback(ticket)?;
                self.toasts
                    .error("Could not remove connection", Some(err.user_message()));
                Err(err.into())
            }
        }
    }

    pub async fn list_messages(&mut self, with_user: Uuid) -> Result<Vec<Message>, SessionError> {
        self.backend.list_messages(with_user).await.map_err(|err| {
            self.toasts
                .error("Could not load messages", Some(err.user_message()));
            err.into()
        })
    }

    pub async fn send_message(
        &mut self,
        recipient_id: Uuid,
        body: &str,
    ) -> Result<Message, SessionError> {
        self.backend
            .send_message(recipient_id, body)
            .await
            .map_err(|err| {
                self.toasts
                    .error("Message not sent", Some(err.user_message()));
                err.into()
            })
    }
}
