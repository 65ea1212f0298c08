//! Application events for the event-driven architecture

use serde::{Deserialize, Serialize};

use crate::session::{ExchangeId, SessionId};

/// Events that can occur in the application
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// The session list was (re)loaded
    SessionsLoaded {
        count: usize,
    },

    /// A new session was created
    SessionCreated {
        session_id: SessionId,
    },

    /// A session became the active one
    SessionSelected {
        session_id: SessionId,
    },

    /// A session was renamed from its first message
    SessionRenamed {
        session_id: SessionId,
        title: String,
    },

    /// A session was deleted
    SessionDeleted {
        session_id: SessionId,
    },

    /// A message was sent by the user
    MessageSent {
        session_id: SessionId,
        exchange_id: ExchangeId,
    },

    /// A simulated reply was filled in
    MessageReceived {
        session_id: SessionId,
        exchange_id: ExchangeId,
    },

    /// A session's exchanges were rebuilt from the server's turn log
    ExchangesRefreshed {
        session_id: SessionId,
        count: usize,
    },

    /// An error occurred
    Error {
        error: String,
    },

    /// Application is shutting down
    Shutdown,
}

impl AppEvent {
    /// Get the session ID associated with this event, if any
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            AppEvent::SessionCreated { session_id }
            | AppEvent::SessionSelected { session_id }
            | AppEvent::SessionRenamed { session_id, .. }
            | AppEvent::SessionDeleted { session_id }
            | AppEvent::MessageSent { session_id, .. }
            | AppEvent::MessageReceived { session_id, .. }
            | AppEvent::ExchangesRefreshed { session_id, .. } => Some(*session_id),
            AppEvent::SessionsLoaded { .. } | AppEvent::Error { .. } | AppEvent::Shutdown => None,
        }
    }

    /// Check if this event is an error
    pub fn is_error(&self) -> bool {
        matches!(self, AppEvent::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id() {
        let event = AppEvent::MessageSent {
            session_id: 3,
            exchange_id: 10,
        };
        assert_eq!(event.session_id(), Some(3));
        assert_eq!(AppEvent::Shutdown.session_id(), None);
    }

    #[test]
    fn test_serialized_tag() {
        let event = AppEvent::SessionRenamed {
            session_id: 1,
            title: "Explain X".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "session_renamed");
        assert_eq!(value["title"], "Explain X");
    }
}
