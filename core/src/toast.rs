use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToastId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

/// A timed, dismissible notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    pub id: ToastId,
    pub kind: ToastKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToastEvent {
    Published(Toast),
    Dismissed(ToastId),
    Expired(ToastId),
}

/// Fire-and-forget notification queue.
///
/// Publishers never wait on subscribers: events go out over a broadcast
/// channel and are simply dropped when nobody is listening.
#[derive(Debug)]
pub struct ToastChannel {
    toasts: Vec<Toast>,
    next_id: u64,
    default_duration: TimeDelta,
    events: broadcast::Sender<ToastEvent>,
}

impl ToastChannel {
    pub fn new(default_duration: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            toasts: Vec::new(),
            next_id: 1,
            default_duration: lifetime(default_duration),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ToastEvent> {
        self.events.subscribe()
    }

    pub fn publish(&mut self, kind: ToastKind, title: &str, message: Option<String>) -> ToastId {
        self.publish_at(kind, title, message, self.default_duration)
    }

    pub fn publish_for(
        &mut self,
        kind: ToastKind,
        title: &str,
        message: Option<String>,
        duration: Duration,
    ) -> ToastId {
        self.publish_at(kind, title, message, lifetime(duration))
    }

    fn publish_at(
        &mut self,
        kind: ToastKind,
        title: &str,
        message: Option<String>,
        lifetime: TimeDelta,
    ) -> ToastId {
        let id = ToastId(self.next_id);
        self.next_id += 1;
        let now = Utc::now();
        let toast = Toast {
            id,
            kind,
            title: title.to_string(),
            message,
            created_at: now,
            expires_at: now
                .checked_add_signed(lifetime)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        tracing::debug!(id = id.0, kind = ?kind, title = %toast.title, "toast published");
        self.toasts.push(toast.clone());
        let _ = self.events.send(ToastEvent::Published(toast));
        id
    }

    pub fn success(&mut self, title: &str, message: Option<String>) -> ToastId {
        self.publish(ToastKind::Success, title, message)
    }

    pub fn error(&mut self, title: &str, message: Option<String>) -> ToastId {
        self.publish(ToastKind::Error, title, message)
    }

    /// Returns false when the toast was already gone.
    pub fn dismiss(&mut self, id: ToastId) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        let removed = self.toasts.len() != before;
        if removed {
            let _ = self.events.send(ToastEvent::Dismissed(id));
        }
        removed
    }

    /// Drop every toast whose deadline is at or before `now`.
    pub fn expire(&mut self, now: DateTime<Utc>) -> Vec<ToastId> {
        let mut expired = Vec::new();
        self.toasts.retain(|t| {
            if t.expires_at <= now {
                expired.push(t.id);
                false
            } else {
                true
            }
        });
        for id in &expired {
            let _ = self.events.send(ToastEvent::Expired(*id));
        }
        expired
    }

    /// Toasts still within their duration, oldest first.
    pub fn active(&self) -> Vec<&Toast> {
        self.active_at(Utc::now())
    }

    pub fn active_at(&self, now: DateTime<Utc>) -> Vec<&Toast> {
        self.toasts.iter().filter(|t| t.expires_at > now).collect()
    }

    /// Expire overdue toasts, then remove and return the rest.
    pub fn drain(&mut self) -> Vec<Toast> {
        self.expire(Utc::now());
        std::mem::take(&mut self.toasts)
    }
}

/// Toast lifetimes too large for a timestamp are capped at `MAX_LIFETIME`.
const MAX_LIFETIME: TimeDelta = TimeDelta::days(365);

fn lifetime(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration)
        .unwrap_or(MAX_LIFETIME)
        .min(MAX_LIFETIME)
}
