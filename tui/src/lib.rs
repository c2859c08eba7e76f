//! TUI rendering and input handling for chatlog using ratatui.
//!
//! The crate is stateless over the engine: [`draw`] renders
//! [`chatlog_engine::App`] plus the purely-visual [`UiState`], and
//! [`handle_event`] folds one terminal event into both.

mod input;
mod theme;
mod ui;

pub use input::{Action, AuthInput, Focus, PendingTarget, UiState, handle_event};
pub use ui::draw;
