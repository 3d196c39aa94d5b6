use std::collections::VecDeque;

/// A speculative change to some state `T`.
pub trait Patch<T> {
    fn apply(&self, state: &mut T);

    /// Short description for logs.
    fn describe(&self) -> String {
        "patch".to_string()
    }
}

/// Handle for one applied-but-unreconciled patch. Only the ticket of the
/// current pending layer is accepted by [`Optimistic::confirm`] and
/// [`Optimistic::rollback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptimisticError {
    #[error("an earlier optimistic update is still pending or queued for this entity")]
    Pending,
    #[error("ticket {0} does not match the pending update")]
    StaleTicket(u64),
}

#[derive(Debug)]
struct PendingLayer<T> {
    generation: u64,
    snapshot: T,
    description: String,
}

/// Visible state of one logical entity plus at most one speculative layer.
///
/// `apply` snapshots the state and applies the patch immediately. The caller
/// then performs the backend round-trip and settles the layer with `confirm`
/// (optionally replacing the state with the authoritative value) or
/// `rollback` (restoring the snapshot exactly). Patches issued while a layer
/// is pending go through `enqueue` and are applied in issue order by
/// `apply_next` once the layer settles.
#[derive(Debug)]
pub struct Optimistic<T, P> {
    visible: T,
    pending: Option<PendingLayer<T>>,
    queue: VecDeque<P>,
    generation: u64,
}

impl<T, P> Optimistic<T, P>
where
    T: Clone,
    P: Patch<T>,
{
    pub fn new(state: T) -> Self {
        Self {
            visible: state,
            pending: None,
            queue: VecDeque::new(),
            generation: 0,
        }
    }

    /// The state the user sees, speculative layer included.
    pub fn get(&self) -> &T {
        &self.visible
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Apply `patch` now. Refused while a layer is pending or older patches
    /// are still queued, so edits never overtake one another.
    pub fn apply(&mut self, patch: P) -> Result<Ticket, OptimisticError> {
        if self.pending.is_some() || !self.queue.is_empty() {
            return Err(OptimisticError::Pending);
        }
        Ok(self.apply_unchecked(patch))
    }

    fn apply_unchecked(&mut self, patch: P) -> Ticket {
        self.generation += 1;
        let description = patch.describe();
        let snapshot = self.visible.clone();
        patch.apply(&mut self.visible);
        tracing::debug!(generation = self.generation, patch = %description, "optimistic update applied");
        self.pending = Some(PendingLayer {
            generation: self.generation,
            snapshot,
            description,
        });
        Ticket {
            generation: self.generation,
        }
    }

    /// Queue a patch behind the pending layer, or apply it right away when
    /// nothing is pending. Returns the ticket when it was applied.
    pub fn enqueue(&mut self, patch: P) -> Option<Ticket> {
        if self.pending.is_none() && self.queue.is_empty() {
            return Some(self.apply_unchecked(patch));
        }
        self.queue.push_back(patch);
        None
    }

    /// Apply the oldest queued patch if no layer is pending.
    pub fn apply_next(&mut self) -> Option<Ticket> {
        if self.pending.is_some() {
            return None;
        }
        let patch = self.queue.pop_front()?;
        Some(self.apply_unchecked(patch))
    }

    /// Settle the pending layer as successful. `server` replaces the
    /// speculative state when the backend returned an authoritative value.
    pub fn confirm(&mut self, ticket: Ticket, server: Option<T>) -> Result<&T, OptimisticError> {
        let layer = self.take_layer(ticket)?;
        if let Some(server) = server {
            self.visible = server;
        }
        tracing::debug!(generation = layer.generation, patch = %layer.description, "optimistic update confirmed");
        Ok(&self.visible)
    }

    /// Settle the pending layer as failed and restore the pre-patch snapshot.
    pub fn rollback(&mut self, ticket: Ticket) -> Result<&T, OptimisticError> {
        let layer = self.take_layer(ticket)?;
        self.visible = layer.snapshot;
        tracing::warn!(generation = layer.generation, patch = %layer.description, "optimistic update rolled back");
        Ok(&self.visible)
    }

    /// Abandon the pending layer (restoring its snapshot) and every queued
    /// patch. Tickets handed out before this call become stale.
    pub fn cancel(&mut self) {
        if let Some(layer) = self.pending.take() {
            self.visible = layer.snapshot;
        }
        self.queue.clear();
        self.generation += 1;
    }

    /// Replace the state wholesale with an authoritative value. Any pending
    /// layer and queued patches are dropped.
    pub fn replace(&mut self, state: T) {
        self.pending = None;
        self.queue.clear();
        self.generation += 1;
        self.visible = state;
    }

    fn take_layer(&mut self, ticket: Ticket) -> Result<PendingLayer<T>, OptimisticError> {
        let current = self
            .pending
            .as_ref()
            .is_some_and(|layer| layer.generation == ticket.generation);
        if !current {
            return Err(OptimisticError::StaleTicket(ticket.generation));
        }
        self.pending
            .take()
            .ok_or(OptimisticError::StaleTicket(ticket.generation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfilePatch;
    use crate::profile::fixtures::{experience, user_profile};

    #[derive(Debug, Clone)]
    struct Push(i32);

    impl Patch<Vec<i32>> for Push {
        fn apply(&self, state: &mut Vec<i32>) {
            state.push(self.0);
        }
    }

    #[test]
    fn rejected_bio_update_restores_old_bio() {
        let mut cell = Optimistic::new(user_profile("old bio"));
        let ticket = cell
            .apply(ProfilePatch::SetBio("new bio".to_string()))
            .unwrap();
        assert_eq!(cell.get().profile.bio, "new bio");

        cell.rollback(ticket).unwrap();
        assert_eq!(cell.get().profile.bio, "old bio");
        assert!(!cell.is_pending());
    }

    #[test]
    fn rollback_restores_exact_snapshot() {
        let original = user_profile("opening bowler");
        let mut cell = Optimistic::new(original.clone());
        let ticket = cell
            .apply(ProfilePatch::AddExperience(experience("Mumbai Indians")))
            .unwrap();
        assert_ne!(cell.get(), &original);

        cell.rollback(ticket).unwrap();
        assert_eq!(
            serde_json::to_vec(cell.get()).unwrap(),
            serde_json::to_vec(&original).unwrap()
        );
    }

    #[test]
    fn confirm_prefers_server_state() {
        let mut cell = Optimistic::new(user_profile("old bio"));
        let ticket = cell
            .apply(ProfilePatch::SetBio("new bio".to_string()))
            .unwrap();

        let mut server = cell.get().clone();
        server.profile.bio = "new bio (edited by moderator)".to_string();
        cell.confirm(ticket, Some(server)).unwrap();
        assert_eq!(cell.get().profile.bio, "new bio (edited by moderator)");
    }

    #[test]
    fn confirm_without_server_state_keeps_speculative_value() {
        let mut cell = Optimistic::new(vec![1]);
        let ticket = cell.apply(Push(2)).unwrap();
        cell.confirm(ticket, None).unwrap();
        assert_eq!(cell.get(), &vec![1, 2]);
    }

    #[test]
    fn second_apply_while_pending_is_refused() {
        let mut cell = Optimistic::new(Vec::<i32>::new());
        let _ticket = cell.apply(Push(1)).unwrap();
        assert_eq!(cell.apply(Push(2)), Err(OptimisticError::Pending));
        assert_eq!(cell.get(), &vec![1]);
    }

    #[test]
    fn queued_patches_apply_in_issue_order_after_settlement() {
        let mut cell = Optimistic::new(Vec::<i32>::new());
        let first = cell.enqueue(Push(1)).unwrap();
        assert!(cell.enqueue(Push(2)).is_none());
        assert!(cell.enqueue(Push(3)).is_none());
        assert_eq!(cell.queued(), 2);
        assert!(cell.apply_next().is_none());

        cell.confirm(first, None).unwrap();
        let second = cell.apply_next().unwrap();
        assert_eq!(cell.get(), &vec![1, 2]);

        cell.rollback(second).unwrap();
        let third = cell.apply_next().unwrap();
        cell.confirm(third, None).unwrap();
        assert_eq!(cell.get(), &vec![1, 3]);
        assert!(cell.apply_next().is_none());
    }

    #[test]
    fn apply_waits_behind_queued_patches() {
        let mut cell = Optimistic::new(Vec::<i32>::new());
        let first = cell.enqueue(Push(1)).unwrap();
        cell.enqueue(Push(2));
        cell.confirm(first, None).unwrap();

        assert_eq!(cell.apply(Push(3)), Err(OptimisticError::Pending));
        assert_eq!(cell.get(), &vec![1]);

        let second = cell.apply_next().unwrap();
        cell.confirm(second, None).unwrap();
        let third = cell.apply(Push(3)).unwrap();
        cell.confirm(third, None).unwrap();
        assert_eq!(cell.get(), &vec![1, 2, 3]);
    }

    #[test]
    fn tickets_go_stale_after_cancel() {
        let mut cell = Optimistic::new(vec![7]);
        let ticket = cell.apply(Push(8)).unwrap();
        cell.enqueue(Push(9));
        cell.cancel();

        assert_eq!(cell.get(), &vec![7]);
        assert_eq!(cell.queued(), 0);
        assert_eq!(
            cell.confirm(ticket, None),
            Err(OptimisticError::StaleTicket(ticket.generation()))
        );
    }

    #[test]
    fn old_ticket_cannot_settle_newer_layer() {
        let mut cell = Optimistic::new(Vec::<i32>::new());
        let first = cell.apply(Push(1)).unwrap();
        cell.confirm(first, None).unwrap();
        let _second = cell.apply(Push(2)).unwrap();

        assert!(matches!(
            cell.rollback(first),
            Err(OptimisticError::StaleTicket(_))
        ));
        assert_eq!(cell.get(), &vec![1, 2]);
    }
}
