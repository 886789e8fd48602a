/// Auth-state change notifications
///
/// Sign-in, sign-out and token refresh are published on an in-process
/// broadcast bus. Each SSE subscriber gets a stream filtered to its own user.
/// Subscribers that fall behind by more than the channel capacity skip the
/// missed events.
///
/// # Example
///
/// ```
/// use gearloan_shared::auth::events::{AuthEvent, AuthEventBus, AuthEventKind};
/// use uuid::Uuid;
///
/// let bus = AuthEventBus::new(16);
/// let mut rx = bus.subscribe();
///
/// let user_id = Uuid::new_v4();
/// bus.publish(AuthEvent::new(AuthEventKind::SignedIn, user_id, Uuid::new_v4()));
///
/// let event = rx.try_recv().unwrap();
/// assert_eq!(event.user_id, user_id);
/// ```

use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

/// Default channel capacity
pub const DEFAULT_CAPACITY: usize = 256;

/// Kind of auth-state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

impl AuthEventKind {
    /// SSE event name
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthEventKind::SignedIn => "signed_in",
            AuthEventKind::SignedOut => "signed_out",
            AuthEventKind::TokenRefreshed => "token_refreshed",
        }
    }
}

/// An auth-state change of one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub at: DateTime<Utc>,
}

impl AuthEvent {
    pub fn new(kind: AuthEventKind, user_id: Uuid, session_id: Uuid) -> Self {
        Self {
            kind,
            user_id,
            session_id,
            at: Utc::now(),
        }
    }
}

/// In-process broadcast bus for auth events
#[derive(Debug, Clone)]
pub struct AuthEventBus {
    sender: broadcast::Sender<AuthEvent>,
}

impl AuthEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event, returning how many subscribers received it
    pub fn publish(&self, event: AuthEvent) -> usize {
        tracing::debug!(
            kind = event.kind.as_str(),
            user_id = %event.user_id,
            session_id = %event.session_id,
            "Auth event"
        );

        // Err only means nobody is listening
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    /// Stream of one user's events
    pub fn stream_for_user(&self, user_id: Uuid) -> impl Stream<Item = AuthEvent> + Send + 'static {
        BroadcastStream::new(self.subscribe()).filter_map(move |result| async move {
            match result {
                Ok(event) if event.user_id == user_id => Some(event),
                Ok(_) => None,
                Err(err) => {
                    tracing::warn!(error = %err, "Auth event subscriber lagged");
                    None
                }
            }
        })
    }
}

impl Default for AuthEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = AuthEventBus::default();
        let sent = bus.publish(AuthEvent::new(
            AuthEventKind::SignedOut,
            Uuid::new_v4(),
            Uuid::new_v4(),
        ));
        assert_eq!(sent, 0);
    }

    #[test]
    fn test_event_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&AuthEventKind::TokenRefreshed).unwrap(),
            "\"token_refreshed\""
        );
        assert_eq!(AuthEventKind::SignedIn.as_str(), "signed_in");
    }

    #[tokio::test]
    async fn test_stream_filters_by_user() {
        let bus = AuthEventBus::new(8);
        let me = Uuid::new_v4();
        let someone_else = Uuid::new_v4();

        let stream = bus.stream_for_user(me);
        tokio::pin!(stream);

        bus.publish(AuthEvent::new(AuthEventKind::SignedIn, someone_else, Uuid::new_v4()));
        bus.publish(AuthEvent::new(AuthEventKind::SignedIn, me, Uuid::new_v4()));
        bus.publish(AuthEvent::new(AuthEventKind::SignedOut, me, Uuid::new_v4()));

        let first = stream.next().await.unwrap();
        assert_eq!(first.user_id, me);
        assert_eq!(first.kind, AuthEventKind::SignedIn);

        let second = stream.next().await.unwrap();
        assert_eq!(second.kind, AuthEventKind::SignedOut);
    }
}
