//! Application engine: the fetch worker, transcript archiving, and the
//! UI-agnostic state machine the TUI renders.
//!
//! The engine never draws. The CLI event loop calls [`App::tick`] once per
//! frame to drain worker events, and the TUI crate reads `App` state to
//! render. At most one background operation runs at a time: either a chat
//! fetch or a login lookup.

pub mod app;
pub mod archive;
pub mod fetch;

pub use app::{App, ConsoleLine, ModeChoice, ProgressState, Screen};
pub use fetch::{FetchEvent, FetchPlan, FetchSummary};
