//! Seed content shown in demo mode

use crate::session::{Exchange, Session, SessionId};

/// The fixed session list shown when no credential is stored
pub fn seed_sessions() -> Vec<Session> {
    let mut sessions = vec![
        Session::new(1, "Machine Learning Basics"),
        Session::new(2, "React vs Vue"),
        Session::new(3, "Go Fiber Setup"),
    ];
    for session in &mut sessions {
        session.owner_id = Some(1);
    }
    sessions
}

/// Canned history for a seeded session, empty for anything else
pub fn seed_exchanges(session_id: SessionId) -> Vec<Exchange> {
    let pairs: &[(u64, &str, &str)] = match session_id {
        1 => &[
            (
                101,
                "Can you explain how Transformer models work in simple terms? I am looking for a high-level overview.",
                "Transformer models are a type of neural network architecture introduced by Google in 2017. They are designed to handle sequential data, like text, but unlike previous models (RNNs), they can process the entire input at once using a mechanism called \"Self-Attention\".\n\nThink of it like reading a sentence: instead of reading one word at a time, a Transformer looks at the whole sentence simultaneously and understands the relationship between every word, regardless of how far apart they are. This makes them incredibly fast and effective for tasks like translation and text generation.",
            ),
            (
                102,
                "That sounds impressive. What are the key components?",
                "The key components are:\n\n1. **Encoder:** Processes the input data.\n2. **Decoder:** Generates the output.\n3. **Self-Attention Mechanism:** Weighs the importance of different words in the sequence.\n4. **Positional Encoding:** Helps the model understand the order of words since it processes them in parallel.",
            ),
        ],
        2 => &[(
            201,
            "Compare React and Vue",
            "React is a library, Vue is a framework. Both use Virtual DOM.",
        )],
        _ => &[],
    };

    pairs
        .iter()
        .map(|(id, user_content, assistant_content)| Exchange {
            id: *id,
            session_id,
            user_content: user_content.to_string(),
            assistant_content: assistant_content.to_string(),
            created_at: None,
            provisional: false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_sessions_have_no_content() {
        let sessions = seed_sessions();
        assert_eq!(sessions.len(), 3);
        assert!(sessions.iter().all(|s| s.exchanges.is_empty()));
        assert!(sessions.iter().all(|s| !s.is_untitled()));
    }

    #[test]
    fn test_seed_exchanges() {
        assert_eq!(seed_exchanges(1).len(), 2);
        assert_eq!(seed_exchanges(2)[0].id, 201);
        assert!(seed_exchanges(3).is_empty());
        assert!(seed_exchanges(1).iter().all(|e| e.session_id == 1 && !e.is_pending()));
    }
}
