//! The session store: authoritative session state and the operations the
//! front-end drives it with

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, warn};

use crate::{
    api::{ApiError, ApiResult, ChatService},
    app::AppEvent,
    session::{
        demo, derive_topic, pair_turns, CredentialSource, Exchange, ExchangeId, Mode,
        ModeResolver, Session, SessionId, SimulatedResponder, NEW_SESSION_TITLE,
    },
};

/// Snapshot of everything the front-end observes
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    sessions: Vec<Session>,
    active: Option<SessionId>,
    in_flight: usize,
}

impl StoreState {
    /// Sessions, newest first for locally created ones
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn active(&self) -> Option<SessionId> {
        self.active
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.active.and_then(|id| self.session(id))
    }

    /// Exchanges of the active session, empty when none is active
    pub fn exchanges(&self) -> &[Exchange] {
        self.active_session()
            .map(|s| s.exchanges.as_slice())
            .unwrap_or(&[])
    }

    /// Whether a send is outstanding
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    fn session_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Drop an active pointer that names a session no longer listed
    fn heal_active(&mut self) {
        if let Some(id) = self.active {
            if self.session(id).is_none() {
                debug!("Active session {} is gone, clearing selection", id);
                self.active = None;
            }
        }
    }
}

/// Keeps the busy flag raised while alive
struct BusyGuard {
    state: Arc<watch::Sender<StoreState>>,
}

impl BusyGuard {
    fn raise(state: &Arc<watch::Sender<StoreState>>) -> Self {
        state.send_modify(|s| s.in_flight += 1);
        Self {
            state: state.clone(),
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.state
            .send_modify(|s| s.in_flight = s.in_flight.saturating_sub(1));
    }
}

/// Session store shared between the front-end and in-flight sends.
///
/// All state lives in one watch channel: every mutation is a single
/// `send_modify`, and observers `subscribe()` instead of reading shared
/// globals. Cloning the store clones the handle, not the state.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<watch::Sender<StoreState>>,
    service: Arc<dyn ChatService>,
    mode: ModeResolver,
    responder: SimulatedResponder,
    event_tx: Option<mpsc::UnboundedSender<AppEvent>>,
}

impl SessionStore {
    /// Create a store backed by `service` when `credentials` hold a token
    pub fn new(service: Arc<dyn ChatService>, credentials: Arc<dyn CredentialSource>) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            state: Arc::new(state),
            service,
            mode: ModeResolver::new(credentials),
            responder: SimulatedResponder::new(),
            event_tx: None,
        }
    }

    /// Report store activity on `event_tx`
    pub fn with_events(mut self, event_tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    /// Current operating mode, resolved fresh
    pub fn mode(&self) -> Mode {
        self.mode.resolve()
    }

    /// Load the session list. Remote mode fetches it from the service; demo
    /// mode installs the seed set.
    pub async fn list_sessions(&self) -> Vec<Session> {
        match self.mode() {
            Mode::Local => {
                debug!("Loading demo sessions");
                self.state.send_modify(|state| {
                    state.sessions = demo::seed_sessions();
                    state.heal_active();
                });
            }
            Mode::Remote => match self.service.list_sessions().await {
                Ok(mut sessions) => {
                    self.state.send_modify(|state| {
                        // Keep exchanges already loaded for sessions we still list
                        for session in &mut sessions {
                            if let Some(known) = state.session(session.id) {
                                session.exchanges = known.exchanges.clone();
                            }
                        }
                        state.sessions = sessions;
                        state.heal_active();
                    });
                }
                Err(e) => self.report_failure("fetch sessions", &e),
            },
        }

        let sessions = self.state.borrow().sessions.clone();
        self.emit(AppEvent::SessionsLoaded {
            count: sessions.len(),
        });
        sessions
    }

    /// Make `id` the active session and load its exchanges. An unknown id
    /// clears the selection instead of failing.
    pub async fn select_session(&self, id: SessionId) {
        let mode = self.mode();

        let mut known = false;
        self.state.send_modify(|state| {
            known = state.session(id).is_some();
            state.active = known.then_some(id);
        });

        if !known {
            debug!("Session {} not found, clearing selection", id);
            return;
        }

        self.emit(AppEvent::SessionSelected { session_id: id });

        match mode {
            Mode::Local => {
                self.state.send_modify(|state| {
                    if let Some(session) = state.session_mut(id) {
                        if session.exchanges.is_empty() && !session.is_untitled() {
                            session.exchanges = demo::seed_exchanges(id);
                        }
                    }
                });
            }
            Mode::Remote => {
                if let Err(e) = self.refresh_exchanges(id).await {
                    self.report_failure("fetch messages", &e);
                }
            }
        }
    }

    /// Create a new untitled session, prepend it and make it active.
    ///
    /// The id is returned so a caller can send into the session right away
    /// without waiting to observe the new selection.
    pub async fn create_session(&self) -> Option<SessionId> {
        let id = match self.mode() {
            Mode::Local => {
                let mut id = 0;
                self.state.send_modify(|state| {
                    id = state.sessions.iter().map(|s| s.id).max().unwrap_or(0) + 1;
                    let mut session = Session::new(id, NEW_SESSION_TITLE);
                    session.created_at = Some(chrono::Utc::now());
                    state.sessions.insert(0, session);
                    state.active = Some(id);
                });
                id
            }
            Mode::Remote => match self.service.create_session(NEW_SESSION_TITLE).await {
                Ok(session) => {
                    let id = session.id;
                    self.state.send_modify(|state| {
                        state.sessions.retain(|s| s.id != id);
                        state.sessions.insert(0, session);
                        state.active = Some(id);
                    });
                    id
                }
                Err(e) => {
                    self.report_failure("create session", &e);
                    return None;
                }
            },
        };

        debug!("Session created: {}", id);
        self.emit(AppEvent::SessionCreated { session_id: id });
        Some(id)
    }

    /// Delete a session. Confirmation is up to the caller. Returns whether the
    /// session was removed.
    pub async fn delete_session(&self, id: SessionId) -> bool {
        if self.mode() == Mode::Remote {
            if let Err(e) = self.service.delete_session(id).await {
                self.report_failure("delete session", &e);
                return false;
            }
        }

        let mut removed = false;
        self.state.send_modify(|state| {
            let before = state.sessions.len();
            state.sessions.retain(|s| s.id != id);
            removed = state.sessions.len() != before;
            if state.active == Some(id) {
                state.active = None;
            }
            state.heal_active();
        });

        if removed {
            self.emit(AppEvent::SessionDeleted { session_id: id });
        }
        removed
    }

    /// Send `content` into `target`, or into the active session when no
    /// target is given.
    ///
    /// The user's exchange is appended before anything is awaited and an
    /// untitled session is renamed from the content. Demo mode then fills the
    /// reply in place; remote mode submits the content (and the new title),
    /// then rebuilds the session's exchanges from the server's turn log.
    /// Failures are logged and leave the optimistic exchange pending.
    ///
    /// Returns the provisional exchange id, or `None` when there was nothing
    /// to send or nowhere to send it.
    pub async fn send_content(&self, content: &str, target: Option<SessionId>) -> Option<ExchangeId> {
        if content.trim().is_empty() {
            debug!("Ignoring empty message");
            return None;
        }

        let mode = self.mode();

        let mut accepted = None;
        self.state.send_modify(|state| {
            let Some(session_id) = target.or(state.active) else {
                return;
            };
            let Some(session) = state.session_mut(session_id) else {
                return;
            };

            let exchange = Exchange::provisional(session_id, content);
            let exchange_id = exchange.id;
            session.exchanges.push(exchange);

            let renamed = session.is_untitled().then(|| derive_topic(content));
            if let Some(title) = &renamed {
                session.title = title.clone();
            }

            accepted = Some((session_id, exchange_id, renamed));
        });

        let Some((session_id, exchange_id, renamed)) = accepted else {
            debug!("No session to send into");
            return None;
        };

        self.emit(AppEvent::MessageSent {
            session_id,
            exchange_id,
        });
        if let Some(title) = &renamed {
            self.emit(AppEvent::SessionRenamed {
                session_id,
                title: title.clone(),
            });
        }

        let _busy = BusyGuard::raise(&self.state);

        match mode {
            Mode::Local => {
                let reply = self.responder.respond(content).await;
                if self.patch_exchange(session_id, exchange_id, reply) {
                    self.emit(AppEvent::MessageReceived {
                        session_id,
                        exchange_id,
                    });
                } else {
                    debug!(
                        "Exchange {} in session {} is gone, dropping reply",
                        exchange_id, session_id
                    );
                }
            }
            Mode::Remote => {
                if let Err(e) = self
                    .send_remote(session_id, content, renamed.as_deref())
                    .await
                {
                    self.report_failure("send message", &e);
                }
            }
        }

        Some(exchange_id)
    }

    /// Send a starter prompt, creating a session first when none is active.
    /// The new session's id is passed explicitly rather than read back from
    /// the selection.
    pub async fn send_suggestion(&self, content: &str) -> Option<ExchangeId> {
        let active = self.state.borrow().active;

        let target = match active {
            Some(id) => id,
            None => self.create_session().await?,
        };

        self.send_content(content, Some(target)).await
    }

    async fn send_remote(
        &self,
        session_id: SessionId,
        content: &str,
        title: Option<&str>,
    ) -> ApiResult<()> {
        let submit = self.service.submit_turn(session_id, content);
        let rename = async {
            match title {
                Some(title) => self.service.rename_session(session_id, title).await,
                None => Ok(()),
            }
        };
        // Both calls run to completion before either error is reported
        let (submitted, renamed) = tokio::join!(submit, rename);
        submitted?;
        renamed?;

        let fetched = self.refresh_exchanges(session_id).await?;
        debug!(
            "Session {} reconciled with {} exchanges",
            session_id, fetched
        );
        Ok(())
    }

    /// Re-fetch a session's turn log and replace its exchanges with the
    /// paired result
    async fn refresh_exchanges(&self, session_id: SessionId) -> ApiResult<usize> {
        let turns = self.service.fetch_turns(session_id).await?;
        let exchanges = pair_turns(session_id, &turns);
        let count = exchanges.len();

        if self.replace_exchanges(session_id, exchanges) {
            self.emit(AppEvent::ExchangesRefreshed { session_id, count });
        } else {
            debug!("Session {} is gone, discarding fetched turns", session_id);
        }
        Ok(count)
    }

    /// Fill in the reply of one exchange. Returns false when the session or
    /// exchange no longer exists.
    fn patch_exchange(&self, session_id: SessionId, exchange_id: ExchangeId, reply: String) -> bool {
        self.state.send_if_modified(|state| {
            let exchange = state
                .session_mut(session_id)
                .and_then(|s| s.exchanges.iter_mut().find(|e| e.id == exchange_id));
            match exchange {
                Some(exchange) => {
                    exchange.assistant_content = reply;
                    true
                }
                None => false,
            }
        })
    }

    /// Replace a session's exchanges wholesale. Returns false when the
    /// session no longer exists.
    fn replace_exchanges(&self, session_id: SessionId, exchanges: Vec<Exchange>) -> bool {
        self.state.send_if_modified(|state| match state.session_mut(session_id) {
            Some(session) => {
                session.exchanges = exchanges;
                true
            }
            None => false,
        })
    }

    fn report_failure(&self, action: &str, error: &ApiError) {
        error!("Failed to {}: {}", action, error);
        if error.is_unauthorized() {
            warn!("The stored credential was rejected by the server");
        }
        self.emit(AppEvent::Error {
            error: format!("Failed to {}: {}", action, error),
        });
    }

    fn emit(&self, event: AppEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }
}
