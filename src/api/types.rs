//! Wire types for the assistant API

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Session, SessionId};

/// Role of a turn in the remote log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single-role entry of a session's remote log
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    /// Monotonic sequence index assigned by the server
    pub index: u64,
    pub role: Role,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Turn {
    pub fn new(index: u64, role: Role, text: impl Into<String>) -> Self {
        Self {
            index,
            role,
            text: text.into(),
            created_at: None,
        }
    }
}

/// Response envelope used by every endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Session record. The list endpoint sends `{index, title}` while the create
/// endpoint sends the full stored record, so both spellings are accepted.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatRecord {
    #[serde(alias = "ID", alias = "index")]
    pub id: SessionId,
    #[serde(default, alias = "topic")]
    pub title: String,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default, alias = "CreatedAt")]
    pub created_at: Option<String>,
}

impl From<ChatRecord> for Session {
    fn from(record: ChatRecord) -> Self {
        let mut session = Session::new(record.id, record.title);
        session.owner_id = record.user_id;
        session.created_at = record.created_at.as_deref().and_then(parse_timestamp);
        session
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TurnRecord {
    pub index: u64,
    pub role: Role,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl From<TurnRecord> for Turn {
    fn from(record: TurnRecord) -> Self {
        Self {
            index: record.index,
            role: record.role,
            text: record.text,
            created_at: record.created_at.as_deref().and_then(parse_timestamp),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TitleBody<'a> {
    pub title: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitTurnBody<'a> {
    pub text: &'a str,
    pub role: Role,
}

/// Parse a server timestamp. Accepts RFC 3339 and the backend's
/// `YYYY-MM-DD HH:MM:SS` format (interpreted as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_decode_chat_list() {
        let body = r#"{
            "success": true,
            "data": [{"index": 3, "title": "Go Fiber Setup"}, {"index": 7, "title": ""}],
            "message": "Chats retrieved successfully"
        }"#;

        let envelope: Envelope<Vec<ChatRecord>> = serde_json::from_str(body).unwrap();
        let sessions: Vec<Session> = envelope
            .data
            .unwrap()
            .into_iter()
            .map(Session::from)
            .collect();

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, 3);
        assert_eq!(sessions[0].title, "Go Fiber Setup");
        assert_eq!(sessions[1].display_title(), "Chat 7");
    }

    #[test]
    fn test_decode_created_chat_record() {
        let body = r#"{
            "success": true,
            "data": {
                "ID": 12,
                "CreatedAt": "2025-01-04T10:20:30.123456+07:00",
                "UpdatedAt": "2025-01-04T10:20:30.123456+07:00",
                "DeletedAt": null,
                "title": "New Conversation",
                "user_id": 5
            },
            "message": "Chat created successfully"
        }"#;

        let envelope: Envelope<ChatRecord> = serde_json::from_str(body).unwrap();
        let session = Session::from(envelope.data.unwrap());

        assert_eq!(session.id, 12);
        assert_eq!(session.owner_id, Some(5));
        assert_eq!(session.title, "New Conversation");
        assert_eq!(session.created_at.unwrap().hour(), 3);
    }

    #[test]
    fn test_decode_turns_with_null_data() {
        let body = r#"{"success": true, "data": null, "message": "message retrieved successfully"}"#;
        let envelope: Envelope<Vec<TurnRecord>> = serde_json::from_str(body).unwrap();
        assert!(envelope.data.unwrap_or_default().is_empty());
    }

    #[test]
    fn test_decode_turns() {
        let body = r#"{
            "success": true,
            "data": [
                {"index": 1, "role": "user", "text": "hi", "created_at": "2025-03-01 08:15:00"},
                {"index": 2, "role": "assistant", "text": "hello", "related_document_ids": [4]}
            ]
        }"#;

        let envelope: Envelope<Vec<TurnRecord>> = serde_json::from_str(body).unwrap();
        let turns: Vec<Turn> = envelope
            .data
            .unwrap()
            .into_iter()
            .map(Turn::from)
            .collect();

        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].created_at.unwrap().day(), 1);
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[1].text, "hello");
        assert!(turns[1].created_at.is_none());
    }

    #[test]
    fn test_submit_body_shape() {
        let body = SubmitTurnBody {
            text: "Explain X",
            role: Role::User,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value, serde_json::json!({"text": "Explain X", "role": "user"}));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2025-03-01T08:15:00Z").is_some());
        assert!(parse_timestamp("2025-03-01 08:15:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
