//! Session title derivation

/// Maximum number of characters kept from the first message
pub const TOPIC_MAX_CHARS: usize = 30;

const ELLIPSIS: &str = "...";

/// Derive a session title from the content of its first exchange.
///
/// Callers check that the session still carries an untitled placeholder
/// before renaming.
pub fn derive_topic(content: &str) -> String {
    let mut chars = content.chars();
    let mut topic: String = chars.by_ref().take(TOPIC_MAX_CHARS).collect();
    if chars.next().is_some() {
        topic.push_str(ELLIPSIS);
    }
    topic
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_content_unchanged() {
        assert_eq!(derive_topic("short"), "short");
    }

    #[test]
    fn test_exactly_thirty_chars_unchanged() {
        let content = "a".repeat(30);
        assert_eq!(derive_topic(&content), content);
    }

    #[test]
    fn test_thirty_one_chars_truncated() {
        let content = "Explain the concept of Recursio";
        assert_eq!(content.chars().count(), 31);
        assert_eq!(derive_topic(content), "Explain the concept of Recursi...");
    }

    #[test]
    fn test_multibyte_content_cut_on_char_boundary() {
        let content = "é".repeat(40);
        let topic = derive_topic(&content);
        assert_eq!(topic, format!("{}...", "é".repeat(30)));
    }
}
