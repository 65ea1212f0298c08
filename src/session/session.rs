//! Sessions and their exchanges

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of a session, assigned by the server or by the demo store
pub type SessionId = u64;

/// Identifier of an exchange. Provisional ids are time based and never
/// reused as server ids.
pub type ExchangeId = u64;

/// Title given to a freshly created session
pub const NEW_SESSION_TITLE: &str = "New Conversation";

/// Titles that mark a session as not yet named. The second one is the
/// server's default topic.
pub const UNTITLED_SENTINELS: &[&str] = &[NEW_SESSION_TITLE, "New Chat"];

/// Whether `title` is one of the untitled placeholders
pub fn is_untitled(title: &str) -> bool {
    UNTITLED_SENTINELS.contains(&title)
}

/// A named conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    pub owner_id: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    pub exchanges: Vec<Exchange>,
}

impl Session {
    /// Create an empty session
    pub fn new(id: SessionId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            owner_id: None,
            created_at: None,
            exchanges: Vec::new(),
        }
    }

    /// Title to show to the user, never empty
    pub fn display_title(&self) -> String {
        if self.title.trim().is_empty() {
            format!("Chat {}", self.id)
        } else {
            self.title.clone()
        }
    }

    pub fn is_untitled(&self) -> bool {
        is_untitled(&self.title)
    }

    pub fn exchange(&self, id: ExchangeId) -> Option<&Exchange> {
        self.exchanges.iter().find(|e| e.id == id)
    }
}

/// One user submission paired with its (possibly pending) assistant reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub id: ExchangeId,
    pub session_id: SessionId,
    pub user_content: String,
    /// Empty while the reply is pending
    pub assistant_content: String,
    pub created_at: Option<DateTime<Utc>>,
    /// Set for optimistic exchanges carrying a locally generated id
    pub provisional: bool,
}

impl Exchange {
    /// Create an optimistic exchange for content the user just submitted
    pub fn provisional(session_id: SessionId, user_content: impl Into<String>) -> Self {
        Self {
            id: next_provisional_id(),
            session_id,
            user_content: user_content.into(),
            assistant_content: String::new(),
            created_at: Some(Utc::now()),
            provisional: true,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.assistant_content.is_empty()
    }
}

static LAST_PROVISIONAL_ID: AtomicU64 = AtomicU64::new(0);

/// Current time in milliseconds, bumped past the last id handed out
fn next_provisional_id() -> ExchangeId {
    let now = Utc::now().timestamp_millis().max(0) as u64;
    let mut last = LAST_PROVISIONAL_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_PROVISIONAL_ID.compare_exchange_weak(
            last,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_titles() {
        assert!(is_untitled("New Conversation"));
        assert!(is_untitled("New Chat"));
        assert!(!is_untitled("new conversation"));
        assert!(!is_untitled("React vs Vue"));
    }

    #[test]
    fn test_display_title_falls_back_to_id() {
        let session = Session::new(9, "  ");
        assert_eq!(session.display_title(), "Chat 9");

        let session = Session::new(9, "Go Fiber Setup");
        assert_eq!(session.display_title(), "Go Fiber Setup");
    }

    #[test]
    fn test_provisional_ids_are_unique() {
        let ids: Vec<ExchangeId> = (0..1000)
            .map(|_| Exchange::provisional(1, "hi").id)
            .collect();

        for pair in ids.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_provisional_exchange_is_pending() {
        let exchange = Exchange::provisional(4, "Explain X");
        assert!(exchange.is_pending());
        assert!(exchange.provisional);
        assert_eq!(exchange.session_id, 4);
    }
}
