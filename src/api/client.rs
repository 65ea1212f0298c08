//! Remote assistant service trait

use async_trait::async_trait;

use crate::api::{errors::ApiResult, types::Turn};
use crate::session::{Session, SessionId};

/// The remote assistant service, one method per logical operation.
///
/// Implementations own every detail of the wire format so that callers only
/// ever see domain types.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// List the caller's sessions in server order
    async fn list_sessions(&self) -> ApiResult<Vec<Session>>;

    /// Create a session; the server assigns its identifier
    async fn create_session(&self, title: &str) -> ApiResult<Session>;

    /// Fetch the flat, ordered turn log of a session
    async fn fetch_turns(&self, session_id: SessionId) -> ApiResult<Vec<Turn>>;

    /// Append a user turn to a session
    async fn submit_turn(&self, session_id: SessionId, content: &str) -> ApiResult<()>;

    async fn rename_session(&self, session_id: SessionId, title: &str) -> ApiResult<()>;

    async fn delete_session(&self, session_id: SessionId) -> ApiResult<()>;

    /// Service name used in logs
    fn name(&self) -> &str;
}
