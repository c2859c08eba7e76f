//! chatlog - binary entry point and terminal session management.
//!
//! Bridges [`chatlog_engine`] (application state) and [`chatlog_tui`]
//! (rendering) with RAII-based terminal management and a fixed-cadence
//! event loop:
//!
//! 1. Wait for the frame tick
//! 2. Drain pending terminal events
//! 3. Advance application state (`app.tick()`)
//! 4. Render the frame

use std::fs::{self, OpenOptions};
use std::io::{Stdout, Write, stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use chatlog_config::SettingsStore;
use chatlog_engine::App;
use chatlog_tui::{Action, UiState, draw, handle_event};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // If we can't open a log file, prefer "no logs" over corrupting the TUI
    // by writing to stdout/stderr.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.chatlog/logs/chatlog.log
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".chatlog").join("logs").join("chatlog.log"));
    }

    // Fallback: ./.chatlog/logs/chatlog.log (useful in constrained environments)
    candidates.push(PathBuf::from(".chatlog").join("logs").join("chatlog.log"));

    candidates
}

/// RAII wrapper: raw mode + alternate screen + bracketed paste, restored on
/// drop so a panic or early return cannot leave the terminal unusable.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen, EnableBracketedPaste)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableBracketedPaste, LeaveAlternateScreen);
    }
}

fn restore_terminal_on_panic() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableBracketedPaste, LeaveAlternateScreen);
        default_hook(info);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    restore_terminal_on_panic();

    let store = SettingsStore::open_default()?;
    let mut app = App::new(store);
    let mut ui = UiState::default();

    let mut session = TerminalSession::new()?;
    let mut frames = tokio::time::interval(FRAME_INTERVAL);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        frames.tick().await;

        while crossterm::event::poll(Duration::ZERO)? {
            let event = crossterm::event::read()?;
            if handle_event(&mut app, &mut ui, &event) == Action::Quit {
                app.shutdown();
                return Ok(());
            }
        }

        app.tick();
        session.terminal.draw(|frame| draw(frame, &app, &ui))?;
    }
}
