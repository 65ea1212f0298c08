//! Pairing of the flat remote turn log into exchanges

use crate::api::{Role, Turn};
use crate::session::{Exchange, SessionId};

/// Pair an ordered turn log into exchanges.
///
/// At most one exchange is open at a time. A user turn closes any open
/// exchange and opens a new one; an assistant turn answers the open exchange
/// or, when nothing is open, becomes a standalone exchange with empty user
/// content. A trailing unanswered user turn is kept with an empty reply.
pub fn pair_turns(session_id: SessionId, turns: &[Turn]) -> Vec<Exchange> {
    let mut paired = Vec::with_capacity(turns.len() / 2 + 1);
    let mut open: Option<Exchange> = None;

    for turn in turns {
        match turn.role {
            Role::User => {
                if let Some(previous) = open.take() {
                    paired.push(previous);
                }
                open = Some(opened_by(session_id, turn, turn.text.clone(), String::new()));
            }
            Role::Assistant => match open.take() {
                Some(mut exchange) => {
                    exchange.assistant_content = turn.text.clone();
                    paired.push(exchange);
                }
                None => {
                    paired.push(opened_by(session_id, turn, String::new(), turn.text.clone()));
                }
            },
        }
    }

    if let Some(last) = open {
        paired.push(last);
    }

    paired
}

fn opened_by(
    session_id: SessionId,
    turn: &Turn,
    user_content: String,
    assistant_content: String,
) -> Exchange {
    Exchange {
        id: turn.index,
        session_id,
        user_content,
        assistant_content,
        created_at: turn.created_at,
        provisional: false,
    }
}

/// Flatten exchanges back into (role, text) turns: the user part, then the
/// reply when there is one. Empty user content is skipped.
pub fn flatten_exchanges(exchanges: &[Exchange]) -> Vec<(Role, &str)> {
    let mut turns = Vec::with_capacity(exchanges.len() * 2);
    for exchange in exchanges {
        if !exchange.user_content.is_empty() {
            turns.push((Role::User, exchange.user_content.as_str()));
        }
        if !exchange.assistant_content.is_empty() {
            turns.push((Role::Assistant, exchange.assistant_content.as_str()));
        }
    }
    turns
}
