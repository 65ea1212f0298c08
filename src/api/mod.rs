//! Client for the remote assistant service
//!
//! This module exposes the typed `ChatService` interface consumed by the
//! session store, the wire types it decodes, and the HTTP implementation
//! talking to the ReadSum backend.

pub mod client;
pub mod errors;
pub mod http;
pub mod types;

pub use client::*;
pub use errors::*;
pub use http::*;
pub use types::*;
