//! HTTP implementation of the assistant service

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, RequestBuilder, Url,
};
use serde::de::DeserializeOwned;
use std::{sync::Arc, time::Duration};
use tracing::debug;

use crate::api::{
    client::ChatService,
    errors::{ApiError, ApiResult},
    types::{ChatRecord, Envelope, Role, SubmitTurnBody, TitleBody, Turn, TurnRecord},
};
use crate::session::{CredentialSource, Session, SessionId};

const USER_AGENT: &str = concat!("readsum/", env!("CARGO_PKG_VERSION"));

/// Assistant service reached over the REST API
#[derive(Clone)]
pub struct HttpChatService {
    client: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialSource>,
}

impl HttpChatService {
    /// Create a new client against `base_url`
    pub fn new(
        base_url: &str,
        timeout: Duration,
        credentials: Arc<dyn CredentialSource>,
    ) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Config(format!("Invalid endpoint '{}': {}", path, e)))
    }

    /// Attach the current credential, send, and unwrap the response envelope.
    /// The token is read per request so a login or logout is picked up
    /// without rebuilding the client.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<Option<T>> {
        let request = match self.credentials.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = extract_error_message(response).await;
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        if envelope.success == Some(false) {
            return Err(ApiError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "request was not successful".to_string()),
            ));
        }

        Ok(envelope.data)
    }
}

#[async_trait]
impl ChatService for HttpChatService {
    async fn list_sessions(&self) -> ApiResult<Vec<Session>> {
        let url = self.endpoint("api/v1/chats/")?;
        debug!("GET {}", url);

        let records: Option<Vec<ChatRecord>> = self.execute(self.client.get(url)).await?;
        Ok(records
            .unwrap_or_default()
            .into_iter()
            .map(Session::from)
            .collect())
    }

    async fn create_session(&self, title: &str) -> ApiResult<Session> {
        let url = self.endpoint("api/v1/chats/")?;
        debug!("POST {}", url);

        let record: Option<ChatRecord> = self
            .execute(self.client.post(url).json(&TitleBody { title }))
            .await?;
        record
            .map(Session::from)
            .ok_or_else(|| ApiError::Rejected("create returned no session".to_string()))
    }

    async fn fetch_turns(&self, session_id: SessionId) -> ApiResult<Vec<Turn>> {
        let url = self.endpoint(&format!("api/v1/chats/{}/messages/", session_id))?;
        debug!("GET {}", url);

        let records: Option<Vec<TurnRecord>> = self.execute(self.client.get(url)).await?;
        Ok(records
            .unwrap_or_default()
            .into_iter()
            .map(Turn::from)
            .collect())
    }

    async fn submit_turn(&self, session_id: SessionId, content: &str) -> ApiResult<()> {
        let url = self.endpoint(&format!("api/v1/chats/{}/messages/", session_id))?;
        debug!("POST {}", url);

        let body = SubmitTurnBody {
            text: content,
            role: Role::User,
        };
        self.execute::<serde_json::Value>(self.client.post(url).json(&body))
            .await?;
        Ok(())
    }

    async fn rename_session(&self, session_id: SessionId, title: &str) -> ApiResult<()> {
        let url = self.endpoint(&format!("api/v1/chats/{}", session_id))?;
        debug!("PATCH {}", url);

        self.execute::<serde_json::Value>(self.client.patch(url).json(&TitleBody { title }))
            .await?;
        Ok(())
    }

    async fn delete_session(&self, session_id: SessionId) -> ApiResult<()> {
        let url = self.endpoint(&format!("api/v1/chats/{}", session_id))?;
        debug!("DELETE {}", url);

        self.execute::<serde_json::Value>(self.client.delete(url))
            .await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "readsum-http"
    }
}

/// Parse the base URL and make sure it ends with a slash so relative
/// endpoint paths keep any path prefix.
fn normalize_base_url(raw: &str) -> ApiResult<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ApiError::Config(format!("Invalid base URL '{}': {}", raw, e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Extract error message from HTTP response
async fn extract_error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(text) => {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&text) {
                if let Some(message) = json.get("error").and_then(|e| {
                    e.as_str()
                        .or_else(|| e.get("message").and_then(|m| m.as_str()))
                }) {
                    return message.to_string();
                }
                if let Some(message) = json.get("message").and_then(|m| m.as_str()) {
                    return message.to_string();
                }
            }
            if text.trim().is_empty() {
                status.to_string()
            } else {
                text
            }
        }
        Err(_) => format!("{}: Failed to read error response", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryCredential;

    #[test]
    fn test_normalize_base_url_keeps_prefix() {
        let url = normalize_base_url("http://localhost:8080").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/");

        let url = normalize_base_url("https://example.com/readsum").unwrap();
        assert_eq!(
            url.join("api/v1/chats/").unwrap().as_str(),
            "https://example.com/readsum/api/v1/chats/"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let credentials = Arc::new(MemoryCredential::empty());
        let result = HttpChatService::new("not a url", Duration::from_secs(5), credentials);
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn test_endpoints() {
        let credentials = Arc::new(MemoryCredential::empty());
        let service =
            HttpChatService::new("http://localhost:8080", Duration::from_secs(5), credentials)
                .unwrap();

        assert_eq!(
            service.endpoint("api/v1/chats/42/messages/").unwrap().as_str(),
            "http://localhost:8080/api/v1/chats/42/messages/"
        );
        assert_eq!(service.name(), "readsum-http");
    }
}
