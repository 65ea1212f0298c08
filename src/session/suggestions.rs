//! Starter prompts offered when no session is open

/// A one-click starter prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestion {
    pub label: &'static str,
    pub description: &'static str,
    pub prompt: &'static str,
}

pub const SUGGESTIONS: &[Suggestion] = &[
    Suggestion {
        label: "Summarize Article",
        description: "Paste a link or text to get a quick summary",
        prompt: "Summarize this article about Quantum Computing",
    },
    Suggestion {
        label: "Explain Concept",
        description: "Get clear explanations for complex topics",
        prompt: "Explain the concept of Recursion in programming",
    },
    Suggestion {
        label: "Study Plan",
        description: "Generate a structured learning path",
        prompt: "Create a study plan for learning Python",
    },
    Suggestion {
        label: "Quiz Me",
        description: "Test your knowledge with interactive quizzes",
        prompt: "Quiz me on World History basics",
    },
];

/// Look up a suggestion by its 1-based position
pub fn suggestion(number: usize) -> Option<&'static Suggestion> {
    number.checked_sub(1).and_then(|index| SUGGESTIONS.get(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_one_based() {
        assert_eq!(suggestion(1).map(|s| s.label), Some("Summarize Article"));
        assert_eq!(suggestion(4).map(|s| s.label), Some("Quiz Me"));
        assert!(suggestion(0).is_none());
        assert!(suggestion(5).is_none());
    }
}
