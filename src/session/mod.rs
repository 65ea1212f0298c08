//! Session management and conversation handling
//!
//! This module provides the session store, the pairing of remote turn logs
//! into exchanges, title derivation, and the demo-mode fallback used when no
//! credential is stored.

mod session;
mod pairing;
mod topic;
mod mode;
mod responder;
mod store;
pub mod demo;
pub mod suggestions;

pub use session::*;
pub use pairing::*;
pub use topic::*;
pub use mode::*;
pub use responder::*;
pub use store::*;
