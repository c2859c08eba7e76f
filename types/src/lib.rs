//! Core domain types for chatlog.
//!
//! This crate is intentionally free of IO and async: everything here is a
//! plain value type the other crates agree on. Validation happens at
//! construction, so downstream code never re-checks: existence of a value
//! is the proof of its validity.

mod auth;
mod ids;
mod message;
mod mode;
mod window;

pub use auth::{AuthHeaders, AuthHeadersError, Identity, REQUIRED_HEADERS};
pub use ids::{Login, LoginError, UserId};
pub use message::ChatMessage;
pub use mode::{BroadcastsAgo, FetchMode, MessageCount, PositiveCountError};
pub use window::{StreamWindow, WindowPosition, timecode};
