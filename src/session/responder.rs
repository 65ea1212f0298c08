//! Simulated assistant used in demo mode

use std::time::Duration;
use tokio::time::sleep;

/// Latency of every simulated reply
pub const SIMULATED_LATENCY: Duration = Duration::from_millis(1000);

/// The reply produced for any input
pub const SIMULATED_REPLY: &str = "This is a simulated AI response in Preview Mode. \n\nIn the real app, this would be generated by Google Gemini 2.0 Flash working via Fiber Go Backend.";

/// Stand-in for the remote assistant when no credential is stored. Replies
/// after a fixed delay with a canned text, independent of the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedResponder;

impl SimulatedResponder {
    pub fn new() -> Self {
        Self
    }

    pub async fn respond(&self, _content: &str) -> String {
        sleep(SIMULATED_LATENCY).await;
        SIMULATED_REPLY.to_string()
    }
}
