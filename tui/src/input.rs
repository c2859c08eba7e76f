//! Input handling for the chatlog TUI.
//!
//! One entry point, [`handle_event`], folds a terminal event into the engine
//! [`App`] and the purely-visual [`UiState`]. Keys route by the active
//! screen; background-operation guards live in the engine, so routing here
//! stays mechanical.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use unicode_segmentation::UnicodeSegmentation;

use chatlog_engine::{App, Screen};

/// What the event loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
}

/// Focusable widgets on the main screen, in Tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Channel,
    Mode,
    Count,
    Ago,
    Timecodes,
    Archive,
}

impl Focus {
    const ORDER: [Self; 6] = [
        Self::Channel,
        Self::Mode,
        Self::Count,
        Self::Ago,
        Self::Timecodes,
        Self::Archive,
    ];

    fn step(self, forward: bool) -> Self {
        let index = Self::ORDER
            .iter()
            .position(|f| *f == self)
            .unwrap_or_default();
        let len = Self::ORDER.len();
        let next = if forward {
            (index + 1) % len
        } else {
            (index + len - 1) % len
        };
        Self::ORDER[next]
    }
}

/// Which login the channels-screen inline input is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingTarget {
    AddChannel,
    SetIdentity,
}

/// Multi-line paste buffer for the auth screen.
#[derive(Debug, Default)]
pub struct AuthInput {
    pub text: String,
}

/// Visual state the engine has no business knowing about.
#[derive(Debug)]
pub struct UiState {
    pub focus: Focus,
    /// 0 = "Manage channels", 1 = "Enter auth data".
    pub settings_cursor: usize,
    pub pending: Option<(PendingTarget, String)>,
    pub auth: AuthInput,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            focus: Focus::Channel,
            settings_cursor: 0,
            pending: None,
            auth: AuthInput::default(),
        }
    }
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn pop_grapheme(text: &mut String) {
    if let Some((index, _)) = text.grapheme_indices(true).next_back() {
        text.truncate(index);
    }
}

/// Fold one terminal event into the app and UI state.
pub fn handle_event(app: &mut App, ui: &mut UiState, event: &Event) -> Action {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, ui, key),
        Event::Paste(text) => {
            handle_paste(app, ui, text);
            Action::None
        }
        _ => Action::None,
    }
}

fn handle_paste(app: &App, ui: &mut UiState, text: &str) {
    match app.screen {
        Screen::AuthEntry => ui.auth.text.push_str(&normalize_line_endings(text)),
        Screen::Channels => {
            if let Some((_, buffer)) = &mut ui.pending {
                // Logins are single-line; drop any pasted line breaks.
                buffer.extend(text.chars().filter(|c| !c.is_control()));
            }
        }
        Screen::Main | Screen::Settings => {}
    }
}

fn handle_key(app: &mut App, ui: &mut UiState, key: &KeyEvent) -> Action {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl && matches!(key.code, KeyCode::Char('c' | 'q')) {
        return Action::Quit;
    }

    match app.screen {
        Screen::Main => handle_main_key(app, ui, key, ctrl),
        Screen::Settings => handle_settings_key(app, ui, key),
        Screen::Channels => handle_channels_key(app, ui, key),
        Screen::AuthEntry => handle_auth_key(app, ui, key, ctrl),
    }
}

fn handle_main_key(app: &mut App, ui: &mut UiState, key: &KeyEvent, ctrl: bool) -> Action {
    if ctrl {
        match key.code {
            KeyCode::Char('s') => app.stop(),
            KeyCode::Char('l') => app.clear_console(),
            _ => {}
        }
        return Action::None;
    }

    match key.code {
        KeyCode::Esc => return Action::Quit,
        KeyCode::F(2) => app.screen = Screen::Settings,
        KeyCode::Tab => ui.focus = ui.focus.step(true),
        KeyCode::BackTab => ui.focus = ui.focus.step(false),
        KeyCode::Enter => app.confirm(),
        KeyCode::Left | KeyCode::Up => cycle_focused(app, ui.focus, false),
        KeyCode::Right | KeyCode::Down => cycle_focused(app, ui.focus, true),
        KeyCode::Char(' ') => match ui.focus {
            Focus::Timecodes => app.with_timecodes = !app.with_timecodes,
            Focus::Archive => app.archive = !app.archive,
            _ => {}
        },
        KeyCode::Char(c) if c.is_ascii_digit() => match ui.focus {
            Focus::Count => app.count_input.push(c),
            Focus::Ago => app.ago_input.push(c),
            _ => {}
        },
        KeyCode::Backspace => match ui.focus {
            Focus::Count => {
                app.count_input.pop();
            }
            Focus::Ago => {
                app.ago_input.pop();
            }
            _ => {}
        },
        _ => {}
    }
    Action::None
}

fn cycle_focused(app: &mut App, focus: Focus, forward: bool) {
    match focus {
        Focus::Channel => app.cycle_channel(forward),
        Focus::Mode => app.cycle_mode(forward),
        Focus::Count | Focus::Ago | Focus::Timecodes | Focus::Archive => {}
    }
}

fn handle_settings_key(app: &mut App, ui: &mut UiState, key: &KeyEvent) -> Action {
    match key.code {
        KeyCode::Esc => app.screen = Screen::Main,
        KeyCode::Up | KeyCode::Down => ui.settings_cursor = 1 - ui.settings_cursor.min(1),
        KeyCode::Enter => {
            app.screen = if ui.settings_cursor == 0 {
                Screen::Channels
            } else {
                Screen::AuthEntry
            };
        }
        _ => {}
    }
    Action::None
}

fn handle_channels_key(app: &mut App, ui: &mut UiState, key: &KeyEvent) -> Action {
    if ui.pending.is_some() {
        match key.code {
            KeyCode::Esc => ui.pending = None,
            KeyCode::Enter => {
                if let Some((target, buffer)) = ui.pending.take() {
                    match target {
                        PendingTarget::AddChannel => app.add_channel(&buffer),
                        PendingTarget::SetIdentity => app.set_identity(&buffer),
                    }
                }
            }
            KeyCode::Backspace => {
                if let Some((_, buffer)) = &mut ui.pending {
                    pop_grapheme(buffer);
                }
            }
            KeyCode::Char(c) => {
                if let Some((_, buffer)) = &mut ui.pending {
                    buffer.push(c);
                }
            }
            _ => {}
        }
        return Action::None;
    }

    match key.code {
        KeyCode::Esc => app.screen = Screen::Settings,
        KeyCode::Up => app.cycle_channel(false),
        KeyCode::Down => app.cycle_channel(true),
        KeyCode::Char('a') => ui.pending = Some((PendingTarget::AddChannel, String::new())),
        KeyCode::Char('u') => ui.pending = Some((PendingTarget::SetIdentity, String::new())),
        KeyCode::Char('d') | KeyCode::Delete => app.remove_selected_channel(),
        _ => {}
    }
    Action::None
}

fn handle_auth_key(app: &mut App, ui: &mut UiState, key: &KeyEvent, ctrl: bool) -> Action {
    if ctrl && key.code == KeyCode::Char('v') {
        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.get_text()) {
            Ok(text) => ui.auth.text.push_str(&normalize_line_endings(&text)),
            Err(e) => tracing::debug!("Clipboard read failed: {e}"),
        }
        return Action::None;
    }

    match key.code {
        KeyCode::Esc => app.screen = Screen::Settings,
        KeyCode::Enter => {
            if app.apply_curl_text(&ui.auth.text) {
                ui.auth.text.clear();
                app.screen = Screen::Main;
            }
        }
        KeyCode::Backspace => pop_grapheme(&mut ui.auth.text),
        KeyCode::Char(c) => ui.auth.text.push(c),
        _ => {}
    }
    Action::None
}
