//! Utility module - shared helpers and types
//!
//! # Contents
//!
//! - [`AppError`] / [`AppResponse`] - unified API error and response envelope
//! - [`logger`] - tracing subscriber setup
//! - [`time`] - timestamp helpers

pub mod error;
pub mod logger;
pub mod time;

pub use error::{AppError, AppResponse, AppResult};
pub use error::{ok, ok_with_message};
pub use time::now_millis;
