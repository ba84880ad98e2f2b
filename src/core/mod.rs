//! Core module - server configuration, state and lifecycle
//!
//! - [`Config`] - environment-driven configuration
//! - [`ServerState`] - shared service references
//! - [`Server`] - HTTP server lifecycle
//! - [`ServerError`] - fatal server-level errors

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
