//! Line-oriented interactive front-end over the session store

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::{
    api::Role,
    session::{
        flatten_exchanges,
        suggestions::{suggestion, SUGGESTIONS},
        SessionId, SessionStore, StoreState,
    },
};

const HELP: &str = "\
Commands:
  /list            show sessions
  /new             start a new conversation
  /select <id>     open a session
  /delete <id>     delete a session
  /suggest [n]     list suggestions, or send suggestion n
  /show            print the open conversation
  /help            show this help
  /quit            exit
Anything else is sent to the assistant.";

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    New,
    Select(SessionId),
    Delete(SessionId),
    Suggest(Option<usize>),
    Show,
    Help,
    Quit,
    Send(String),
    Empty,
    Invalid(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Command::Send(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    let id_arg = |usage: &str| match arg.map(str::parse::<SessionId>) {
        Some(Ok(id)) => Ok(id),
        _ => Err(Command::Invalid(format!("usage: {}", usage))),
    };

    match name {
        "list" | "ls" => Command::List,
        "new" => Command::New,
        "select" | "open" => id_arg("/select <id>").map_or_else(|e| e, Command::Select),
        "delete" | "rm" => id_arg("/delete <id>").map_or_else(|e| e, Command::Delete),
        "suggest" => match arg.map(str::parse::<usize>) {
            None => Command::Suggest(None),
            Some(Ok(n)) => Command::Suggest(Some(n)),
            Some(Err(_)) => Command::Invalid("usage: /suggest [n]".to_string()),
        },
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => Command::Invalid(format!("unknown command: /{}", other)),
    }
}

/// Tracks what has already been printed for the open session so each state
/// change only prints what is new
#[derive(Debug, Default)]
struct ViewCursor {
    session: Option<SessionId>,
    users: usize,
    replies: usize,
    busy: bool,
}

impl ViewCursor {
    fn update(&mut self, state: &StoreState) -> Vec<String> {
        let mut out = Vec::new();

        if state.active() != self.session {
            self.session = state.active();
            self.users = 0;
            self.replies = 0;
            if let Some(session) = state.active_session() {
                out.push(format!("== {} ==", session.display_title()));
            }
        }

        let exchanges = state.exchanges();
        // A refetch may have collapsed the list
        self.users = self.users.min(exchanges.len());
        self.replies = self.replies.min(self.users);

        for (i, exchange) in exchanges.iter().enumerate().skip(self.replies) {
            if i >= self.users {
                if !exchange.user_content.is_empty() {
                    out.push(format!("you> {}", exchange.user_content));
                }
                self.users = i + 1;
            }

            if exchange.is_pending() {
                if i + 1 == exchanges.len() {
                    break;
                }
                self.replies = i + 1;
                continue;
            }

            out.push(format!("assistant> {}", exchange.assistant_content));
            self.replies = i + 1;
        }

        if state.is_busy() && !self.busy {
            out.push("assistant is typing...".to_string());
        }
        self.busy = state.is_busy();

        out
    }
}

/// Interactive shell. Sends run as spawned tasks, so the prompt stays
/// responsive and replies are printed when the store reports them.
pub struct Shell {
    store: SessionStore,
    cursor: ViewCursor,
    pending_delete: Option<SessionId>,
}

impl Shell {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            cursor: ViewCursor::default(),
            pending_delete: None,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let mut state_rx = self.store.subscribe();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        self.print_welcome();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if !self.handle_line(&line).await {
                        break;
                    }
                }
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = state_rx.borrow_and_update().clone();
                    for line in self.cursor.update(&state) {
                        println!("{}", line);
                    }
                }
            }
        }

        debug!("Shell finished");
        Ok(())
    }

    /// Handle one input line; returns false to exit
    async fn handle_line(&mut self, line: &str) -> bool {
        if let Some(id) = self.pending_delete.take() {
            if matches!(line.trim().to_lowercase().as_str(), "y" | "yes") {
                if self.store.delete_session(id).await {
                    println!("Deleted session {}", id);
                } else {
                    println!("Session {} was not deleted", id);
                }
            } else {
                println!("Cancelled");
            }
            return true;
        }

        match parse_command(line) {
            Command::Empty => {}
            Command::Quit => return false,
            Command::Help => println!("{}", HELP),
            Command::List => {
                self.store.list_sessions().await;
                self.print_sessions();
            }
            Command::New => {
                if self.store.create_session().await.is_none() {
                    println!("Could not create a session");
                }
            }
            Command::Select(id) => {
                self.store.select_session(id).await;
                if self.store.snapshot().active().is_none() {
                    println!("No session {}", id);
                }
            }
            Command::Delete(id) => {
                println!("Are you sure you want to delete this chat? [y/N]");
                self.pending_delete = Some(id);
            }
            Command::Suggest(None) => print_suggestions(),
            Command::Suggest(Some(n)) => match suggestion(n) {
                Some(suggestion) if !self.is_busy() => {
                    let store = self.store.clone();
                    let prompt = suggestion.prompt;
                    tokio::spawn(async move {
                        store.send_suggestion(prompt).await;
                    });
                }
                Some(_) => println!("Still waiting for the previous reply"),
                None => println!("No suggestion {}", n),
            },
            Command::Show => self.print_transcript(),
            Command::Send(content) => {
                if self.store.snapshot().active().is_none() {
                    println!("Start a new chat with /new or pick a suggestion with /suggest");
                } else if self.is_busy() {
                    println!("Still waiting for the previous reply");
                } else {
                    let store = self.store.clone();
                    tokio::spawn(async move {
                        store.send_content(&content, None).await;
                    });
                }
            }
            Command::Invalid(message) => println!("{}", message),
        }

        true
    }

    fn is_busy(&self) -> bool {
        self.store.snapshot().is_busy()
    }

    fn print_welcome(&self) {
        println!("Hello, Learner");
        println!("How can I help you learn today?");
        println!();
        print_suggestions();
        println!();
        self.print_sessions();
        println!("Type /help for commands.");
    }

    fn print_sessions(&self) {
        let state = self.store.snapshot();
        if state.sessions().is_empty() {
            println!("No chats yet.");
            return;
        }
        for session in state.sessions() {
            let marker = if state.active() == Some(session.id) { '*' } else { ' ' };
            println!("{} {:>4}  {}", marker, session.id, session.display_title());
        }
    }

    fn print_transcript(&self) {
        let state = self.store.snapshot();
        let Some(session) = state.active_session() else {
            println!("No conversation is open");
            return;
        };

        println!("== {} ==", session.display_title());
        for (role, text) in flatten_exchanges(&session.exchanges) {
            let speaker = match role {
                Role::User => "you",
                Role::Assistant => "assistant",
            };
            println!("{}> {}", speaker, text);
        }
    }
}

fn print_suggestions() {
    for (i, suggestion) in SUGGESTIONS.iter().enumerate() {
        println!("  {}. {} - {}", i + 1, suggestion.label, suggestion.description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiResult, ChatService, Turn};
    use crate::session::{MemoryCredential, Session, SIMULATED_REPLY};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Offline;

    #[async_trait]
    impl ChatService for Offline {
        async fn list_sessions(&self) -> ApiResult<Vec<Session>> {
            Ok(Vec::new())
        }
        async fn create_session(&self, title: &str) -> ApiResult<Session> {
            Ok(Session::new(1, title))
        }
        async fn fetch_turns(&self, _session_id: SessionId) -> ApiResult<Vec<Turn>> {
            Ok(Vec::new())
        }
        async fn submit_turn(&self, _session_id: SessionId, _content: &str) -> ApiResult<()> {
            Ok(())
        }
        async fn rename_session(&self, _session_id: SessionId, _title: &str) -> ApiResult<()> {
            Ok(())
        }
        async fn delete_session(&self, _session_id: SessionId) -> ApiResult<()> {
            Ok(())
        }
        fn name(&self) -> &str {
            "offline"
        }
    }

    fn demo_store() -> SessionStore {
        SessionStore::new(Arc::new(Offline), Arc::new(MemoryCredential::empty()))
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("  "), Command::Empty);
        assert_eq!(parse_command("/new"), Command::New);
        assert_eq!(parse_command("/select 3"), Command::Select(3));
        assert_eq!(parse_command("/rm 2"), Command::Delete(2));
        assert_eq!(parse_command("/suggest"), Command::Suggest(None));
        assert_eq!(parse_command("/suggest 2"), Command::Suggest(Some(2)));
        assert_eq!(
            parse_command("  what is a monad? "),
            Command::Send("what is a monad?".to_string())
        );
        assert!(matches!(parse_command("/select x"), Command::Invalid(_)));
        assert!(matches!(parse_command("/bogus"), Command::Invalid(_)));
    }

    #[tokio::test]
    async fn test_cursor_prints_history_once() {
        let store = demo_store();
        store.list_sessions().await;
        store.select_session(1).await;

        let mut cursor = ViewCursor::default();
        let first = cursor.update(&store.snapshot());
        assert_eq!(first[0], "== Machine Learning Basics ==");
        assert_eq!(first.len(), 5);

        assert!(cursor.update(&store.snapshot()).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cursor_prints_reply_when_it_arrives() {
        let store = demo_store();
        store.create_session().await;
        let mut cursor = ViewCursor::default();
        cursor.update(&store.snapshot());

        let sender = store.clone();
        let handle = tokio::spawn(async move { sender.send_content("Explain X", None).await });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let pending = cursor.update(&store.snapshot());
        assert_eq!(pending, vec!["you> Explain X", "assistant is typing..."]);

        handle.await.unwrap();
        let answered = cursor.update(&store.snapshot());
        assert_eq!(answered, vec![format!("assistant> {}", SIMULATED_REPLY)]);
    }
}
