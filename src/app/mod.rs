//! Core application logic and orchestration
//!
//! This module provides the main application structure that wires the
//! configuration, the assistant service client and the session store
//! together and drives them for the front-ends.

mod events;

pub use events::*;

use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, warn};

use crate::{
    api::{ChatService, HttpChatService},
    cli::Shell,
    config::Config,
    session::{Mode, Session, SessionStore},
};

/// Main application structure
pub struct App {
    store: SessionStore,
    service_name: String,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    event_rx: RwLock<Option<mpsc::UnboundedReceiver<AppEvent>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: &Config) -> Result<Self> {
        debug!("Creating new App instance");

        let credentials = config.credentials();
        let service = HttpChatService::new(&config.base_url, config.timeout(), credentials.clone())?;
        let service_name = service.name().to_string();

        // Create event channel
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let store = SessionStore::new(Arc::new(service), credentials).with_events(event_tx.clone());

        Ok(App {
            store,
            service_name,
            event_tx,
            event_rx: RwLock::new(Some(event_rx)),
            shutdown_tx: None,
        })
    }

    /// Get the session store
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Start the application event loop
    pub async fn start_event_loop(&mut self) -> Result<()> {
        let mut event_rx = self
            .event_rx
            .write()
            .await
            .take()
            .ok_or_else(|| anyhow!("Event loop already started"))?;

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        self.shutdown_tx = Some(shutdown_tx);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(event) = event_rx.recv() => {
                        if let Err(e) = Self::handle_event(event).await {
                            error!("Error handling event: {}", e);
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Shutting down event loop");
                        break;
                    }
                }
            }
        });

        Ok(())
    }

    /// Handle application events
    async fn handle_event(event: AppEvent) -> Result<()> {
        if event.is_error() {
            debug!(session_id = ?event.session_id(), "Handling error event");
        }

        match event {
            AppEvent::SessionsLoaded { count } => {
                debug!("Loaded {} sessions", count);
            }
            AppEvent::SessionCreated { session_id } => {
                info!("Session created: {}", session_id);
            }
            AppEvent::SessionSelected { session_id } => {
                debug!("Session selected: {}", session_id);
            }
            AppEvent::SessionRenamed { session_id, title } => {
                debug!("Session {} renamed to {:?}", session_id, title);
            }
            AppEvent::SessionDeleted { session_id } => {
                info!("Session deleted: {}", session_id);
            }
            AppEvent::MessageSent { session_id, exchange_id } => {
                debug!("Message sent in session {}: {}", session_id, exchange_id);
            }
            AppEvent::MessageReceived { session_id, exchange_id } => {
                debug!("Message received in session {}: {}", session_id, exchange_id);
            }
            AppEvent::ExchangesRefreshed { session_id, count } => {
                debug!("Session {} now has {} exchanges", session_id, count);
            }
            AppEvent::Error { error } => {
                warn!("Application error: {}", error);
            }
            AppEvent::Shutdown => {
                info!("Application shutdown requested");
            }
        }

        Ok(())
    }

    fn log_mode(&self) {
        match self.store.mode() {
            Mode::Remote => info!("Using assistant service: {}", self.service_name),
            Mode::Local => info!("No credential found, running in preview mode"),
        }
    }

    /// Run the interactive shell
    pub async fn run_interactive(&mut self) -> Result<()> {
        info!("Starting interactive mode");
        self.log_mode();

        // Start event loop
        self.start_event_loop().await?;

        self.store.list_sessions().await;
        Shell::new(self.store.clone()).run().await
    }

    /// Run a single prompt non-interactively and return the reply
    pub async fn run_non_interactive(&mut self, prompt: &str, quiet: bool) -> Result<String> {
        info!("Running non-interactive prompt");
        debug!("Prompt: {}", prompt);
        self.log_mode();

        if !quiet {
            eprintln!("Processing prompt...");
        }

        self.start_event_loop().await?;
        let result = self.ask(prompt).await;
        self.shutdown().await?;
        result
    }

    async fn ask(&self, prompt: &str) -> Result<String> {
        // Create a new session for this interaction
        let session_id = self
            .store
            .create_session()
            .await
            .ok_or_else(|| anyhow!("Failed to create a session"))?;

        let exchange_id = self
            .store
            .send_content(prompt, Some(session_id))
            .await
            .ok_or_else(|| anyhow!("Nothing to send"))?;

        let state = self.store.snapshot();
        let reply = state
            .session(session_id)
            .and_then(|session| {
                // After a remote send the provisional exchange is replaced by
                // the server's copy, so fall back to the newest exchange
                session
                    .exchange(exchange_id)
                    .or_else(|| session.exchanges.last())
            })
            .map(|exchange| exchange.assistant_content.clone())
            .unwrap_or_default();

        if reply.is_empty() {
            return Err(anyhow!("No reply received for session {}", session_id));
        }

        Ok(reply)
    }

    /// Fetch the session list
    pub async fn list_sessions(&mut self) -> Result<Vec<Session>> {
        self.log_mode();

        self.start_event_loop().await?;
        let sessions = self.store.list_sessions().await;
        self.shutdown().await?;

        Ok(sessions)
    }

    /// Shutdown the application gracefully
    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Shutting down application");

        let _ = self.event_tx.send(AppEvent::Shutdown);
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(()).await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_config() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.token_file = dir.path().join("token");
        (dir, config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_interactive_preview_reply() {
        let (_dir, config) = offline_config();
        let mut app = App::new(&config).unwrap();

        let reply = app.run_non_interactive("Explain X", true).await.unwrap();

        assert_eq!(reply, crate::session::SIMULATED_REPLY);
        let state = app.store().snapshot();
        assert_eq!(state.exchanges().len(), 1);
        assert_eq!(state.active_session().unwrap().title, "Explain X");
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_flows_drain_events() {
        let (_dir, config) = offline_config();
        let mut app = App::new(&config).unwrap();

        app.run_non_interactive("Explain X", true).await.unwrap();
        assert!(app.event_rx.read().await.is_none());
        assert!(app.shutdown_tx.is_none());

        let mut app = App::new(&config).unwrap();
        let sessions = app.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 3);
        assert!(app.event_rx.read().await.is_none());
        assert!(app.shutdown_tx.is_none());
    }

    #[tokio::test]
    async fn test_event_loop_starts_once() {
        let (_dir, config) = offline_config();
        let mut app = App::new(&config).unwrap();

        app.start_event_loop().await.unwrap();
        assert!(app.start_event_loop().await.is_err());
        app.shutdown().await.unwrap();
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let (_dir, mut config) = offline_config();
        config.base_url = "::nope::".to_string();
        assert!(App::new(&config).is_err());
    }
}
