//! UI-agnostic application state.
//!
//! The TUI renders this struct and feeds user intent into it; the CLI event
//! loop calls [`App::tick`] every frame to drain background-task events.
//! Only one background operation runs at a time, a chat fetch or a login
//! lookup, tracked by [`Operation`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chatlog_config::curl::{CurlParseError, parse_curl_headers};
use chatlog_config::{Settings, SettingsStore};
use chatlog_gql::{GQL_API_URL, GqlClient, GqlError, user};
use chatlog_types::{BroadcastsAgo, FetchMode, Identity, Login, MessageCount, UserId};
use futures_util::future::{AbortHandle, Abortable};
use tokio::sync::{mpsc, oneshot};

use crate::fetch::{self, FetchEvent, FetchPlan};

const FETCH_EVENT_CHANNEL_CAPACITY: usize = 1024;
const MAX_EVENTS_PER_TICK: usize = 256;
const MAX_CONSOLE_LINES: usize = 2000;
/// Indeterminate-bar phase advance per tick.
const INDETERMINATE_STEP: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Main,
    Settings,
    Channels,
    AuthEntry,
}

/// One console entry, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub text: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressState {
    Idle,
    /// Fraction complete in `[0, 1]`.
    Determinate(f64),
    /// No total is knowable; the payload is the animation phase.
    Indeterminate(f64),
}

/// Mode selector state: which fetch mode is chosen, before its numeric
/// input (if any) has been validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChoice {
    All,
    LastN,
    FromBroadcast,
}

impl ModeChoice {
    pub const ALL: [Self; 3] = [Self::All, Self::LastN, Self::FromBroadcast];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All messages",
            Self::LastN => "Last ... messages",
            Self::FromBroadcast => "From ... broadcast ago",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupPurpose {
    AddChannel,
    SetIdentity,
}

struct LookupReply {
    purpose: LookupPurpose,
    login: Login,
    result: Result<Option<UserId>, GqlError>,
}

struct ActiveFetch {
    rx: mpsc::Receiver<FetchEvent>,
    stop: Arc<AtomicBool>,
    abort: AbortHandle,
}

struct ActiveLookup {
    rx: oneshot::Receiver<LookupReply>,
    abort: AbortHandle,
}

enum Operation {
    Idle,
    Fetching(ActiveFetch),
    Lookup(ActiveLookup),
}

pub struct App {
    store: SettingsStore,
    pub settings: Settings,
    pub screen: Screen,
    console: VecDeque<ConsoleLine>,
    pub progress: ProgressState,
    op: Operation,
    pub selected_channel: Option<usize>,
    pub selected_mode: Option<ModeChoice>,
    pub count_input: String,
    pub ago_input: String,
    pub with_timecodes: bool,
    pub archive: bool,
    endpoint: String,
}

impl App {
    #[must_use]
    pub fn new(store: SettingsStore) -> Self {
        let settings = store.load();
        let selected_channel = if settings.channels.is_empty() {
            None
        } else {
            Some(0)
        };
        Self {
            store,
            settings,
            screen: Screen::Main,
            console: VecDeque::new(),
            progress: ProgressState::Idle,
            op: Operation::Idle,
            selected_channel,
            selected_mode: None,
            count_input: String::new(),
            ago_input: String::new(),
            with_timecodes: false,
            archive: false,
            endpoint: GQL_API_URL.to_string(),
        }
    }

    /// Point background requests at a non-default endpoint (tests).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    // --- console ---

    pub fn console_print(&mut self, text: impl Into<String>) {
        self.push_console(text.into(), false);
    }

    pub fn console_error(&mut self, text: impl Into<String>) {
        self.push_console(text.into(), true);
    }

    fn push_console(&mut self, text: String, is_error: bool) {
        self.console.push_front(ConsoleLine { text, is_error });
        self.console.truncate(MAX_CONSOLE_LINES);
    }

    pub fn clear_console(&mut self) {
        self.console.clear();
    }

    /// Console lines, newest first.
    pub fn console(&self) -> impl Iterator<Item = &ConsoleLine> {
        self.console.iter()
    }

    // --- selection ---

    #[must_use]
    pub fn selected_channel_entry(&self) -> Option<(Login, UserId)> {
        let index = self.selected_channel?;
        let login = self.settings.channel_logins().into_iter().nth(index)?;
        let id = self.settings.channels.get(&login)?.clone();
        Some((login, id))
    }

    pub fn cycle_channel(&mut self, forward: bool) {
        let len = self.settings.channels.len();
        if len == 0 {
            self.selected_channel = None;
            return;
        }
        let current = self.selected_channel.unwrap_or(0);
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.selected_channel = Some(next);
    }

    pub fn cycle_mode(&mut self, forward: bool) {
        let modes = ModeChoice::ALL;
        let current = self
            .selected_mode
            .and_then(|mode| modes.iter().position(|m| *m == mode));
        let next = match (current, forward) {
            (None, _) => 0,
            (Some(i), true) => (i + 1) % modes.len(),
            (Some(i), false) => (i + modes.len() - 1) % modes.len(),
        };
        self.selected_mode = Some(modes[next]);
    }

    // --- background operations ---

    #[must_use]
    pub fn is_busy(&self) -> bool {
        !matches!(self.op, Operation::Idle)
    }

    #[must_use]
    pub fn fetch_in_progress(&self) -> bool {
        matches!(self.op, Operation::Fetching(_))
    }

    fn client(&self) -> Option<GqlClient> {
        self.settings
            .auth
            .clone()
            .map(|auth| GqlClient::with_endpoint(auth, self.endpoint.clone()))
    }

    /// Validate the current selection and start a fetch.
    ///
    /// Validation order and messages follow the settled UI contract: mode,
    /// channel, identity, mode input, auth. The first failure prints a
    /// console error and nothing is started. Inert while a fetch or lookup
    /// is already running.
    pub fn confirm(&mut self) {
        if self.is_busy() {
            return;
        }

        let Some(mode_choice) = self.selected_mode else {
            self.console_error("Mode not selected!");
            return;
        };
        let Some((channel_login, channel_id)) = self.selected_channel_entry() else {
            self.console_error("Channel not selected!");
            return;
        };
        let Some(identity) = self.settings.identity.clone() else {
            self.console_error("User id not found!");
            return;
        };

        let mode = match mode_choice {
            ModeChoice::All => FetchMode::All,
            ModeChoice::LastN => match MessageCount::parse(&self.count_input) {
                Ok(count) => FetchMode::LastN(count),
                Err(_) => {
                    self.console_error("Invalid messages count!");
                    return;
                }
            },
            ModeChoice::FromBroadcast => match BroadcastsAgo::parse(&self.ago_input) {
                Ok(ago) => FetchMode::FromBroadcast(ago),
                Err(_) => {
                    self.console_error("Invalid streams ago!");
                    return;
                }
            },
        };

        let Some(client) = self.client() else {
            self.console_error("Auth data not found!");
            return;
        };

        let plan = FetchPlan {
            channel_login,
            channel: channel_id,
            sender: identity.id,
            mode,
            with_timecodes: self.with_timecodes,
            archive: self.archive,
        };

        let (tx, rx) = mpsc::channel(FETCH_EVENT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let (abort, registration) = AbortHandle::new_pair();
        let task = fetch::run_fetch(client, plan, tx, Arc::clone(&stop));
        tokio::spawn(async move {
            let _ = Abortable::new(task, registration).await;
        });

        self.progress = match mode {
            FetchMode::All => ProgressState::Indeterminate(0.0),
            FetchMode::LastN(_) | FetchMode::FromBroadcast(_) => ProgressState::Determinate(0.0),
        };
        self.op = Operation::Fetching(ActiveFetch { rx, stop, abort });
    }

    /// Request a cooperative stop of the running fetch, if any.
    pub fn stop(&mut self) {
        if let Operation::Fetching(active) = &self.op {
            active.stop.store(true, Ordering::Relaxed);
        }
    }

    /// Hard-abort any background task (quit path).
    pub fn shutdown(&mut self) {
        match &self.op {
            Operation::Fetching(active) => active.abort.abort(),
            Operation::Lookup(active) => active.abort.abort(),
            Operation::Idle => {}
        }
        self.op = Operation::Idle;
    }

    pub fn add_channel(&mut self, raw_login: &str) {
        self.begin_lookup(LookupPurpose::AddChannel, raw_login);
    }

    pub fn set_identity(&mut self, raw_login: &str) {
        self.begin_lookup(LookupPurpose::SetIdentity, raw_login);
    }

    fn begin_lookup(&mut self, purpose: LookupPurpose, raw_login: &str) {
        if self.is_busy() {
            return;
        }
        // Empty input is silently ignored, matching the dialog flow.
        let Ok(login) = Login::parse(raw_login) else {
            return;
        };
        let Some(client) = self.client() else {
            self.console_error("Auth data not found!");
            return;
        };

        let (tx, rx) = oneshot::channel();
        let (abort, registration) = AbortHandle::new_pair();
        let task = async move {
            let result = user::user_id_by_login(&client, &login).await;
            let _ = tx.send(LookupReply {
                purpose,
                login,
                result,
            });
        };
        tokio::spawn(async move {
            let _ = Abortable::new(task, registration).await;
        });

        self.op = Operation::Lookup(ActiveLookup { rx, abort });
    }

    pub fn remove_selected_channel(&mut self) {
        match self.selected_channel_entry() {
            Some((login, _)) => {
                self.settings.remove_channel(&login);
                let len = self.settings.channels.len();
                self.selected_channel = if len == 0 {
                    None
                } else {
                    Some(self.selected_channel.unwrap_or(0).min(len - 1))
                };
                self.save_settings();
            }
            None => self.console_error("No channel selected!"),
        }
    }

    /// Parse pasted curl text into auth headers and persist them.
    ///
    /// Returns true on success so the caller can leave the auth screen.
    pub fn apply_curl_text(&mut self, text: &str) -> bool {
        match parse_curl_headers(text) {
            Ok(headers) => {
                self.settings.auth = Some(headers);
                self.save_settings();
                self.console_print("Auth data parsed successfully!");
                true
            }
            Err(CurlParseError::Empty) => {
                self.console_error("Curl text is empty!");
                false
            }
            Err(CurlParseError::MissingHeader(name)) => {
                self.console_error(format!("Header '{name}' not found in curl text!"));
                false
            }
        }
    }

    fn save_settings(&mut self) {
        if let Err(e) = self.store.save(&self.settings) {
            tracing::warn!("Failed to save settings: {e}");
            self.console_error(format!("Failed to save settings: {e}"));
        }
    }

    // --- per-frame advance ---

    /// Drain pending background events and advance animations.
    pub fn tick(&mut self) {
        if let ProgressState::Indeterminate(phase) = &mut self.progress {
            *phase = (*phase + INDETERMINATE_STEP).fract();
        }

        let mut events = Vec::new();
        let mut worker_gone = false;
        let mut lookup_reply = None;
        let mut lookup_gone = false;

        match &mut self.op {
            Operation::Idle => {}
            Operation::Fetching(active) => {
                for _ in 0..MAX_EVENTS_PER_TICK {
                    match active.rx.try_recv() {
                        Ok(event) => events.push(event),
                        Err(mpsc::error::TryRecvError::Empty) => break,
                        Err(mpsc::error::TryRecvError::Disconnected) => {
                            worker_gone = true;
                            break;
                        }
                    }
                }
            }
            Operation::Lookup(active) => match active.rx.try_recv() {
                Ok(reply) => lookup_reply = Some(reply),
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => lookup_gone = true,
            },
        }

        for event in events {
            self.handle_fetch_event(event);
        }
        if worker_gone && matches!(self.op, Operation::Fetching(_)) {
            // Worker died without a terminal event (aborted); recover the UI.
            self.finish_fetch();
        }

        if let Some(reply) = lookup_reply {
            self.op = Operation::Idle;
            self.handle_lookup_reply(reply);
        } else if lookup_gone {
            self.op = Operation::Idle;
        }
    }

    fn handle_fetch_event(&mut self, event: FetchEvent) {
        match event {
            FetchEvent::Line(line) => self.console_print(line),
            FetchEvent::Progress(fraction) => {
                if let ProgressState::Determinate(value) = &mut self.progress {
                    *value = fraction.clamp(0.0, 1.0);
                }
            }
            FetchEvent::Done(summary) => {
                if let Some(path) = &summary.archived {
                    self.console_print(format!(
                        "Saved {} messages to {}",
                        summary.total,
                        path.display()
                    ));
                }
                self.finish_fetch();
            }
            FetchEvent::Failed(message) => {
                self.console_error(message);
                self.finish_fetch();
            }
        }
    }

    fn finish_fetch(&mut self) {
        self.op = Operation::Idle;
        self.progress = ProgressState::Idle;
    }

    fn handle_lookup_reply(&mut self, reply: LookupReply) {
        match reply.result {
            Ok(Some(id)) => match reply.purpose {
                LookupPurpose::AddChannel => {
                    self.settings.add_channel(reply.login.clone(), id);
                    if self.selected_channel.is_none() {
                        self.selected_channel = self
                            .settings
                            .channel_logins()
                            .iter()
                            .position(|login| *login == reply.login);
                    }
                    self.save_settings();
                }
                LookupPurpose::SetIdentity => {
                    self.settings.identity = Some(Identity {
                        login: reply.login,
                        id,
                    });
                    self.save_settings();
                }
            },
            Ok(None) => {
                self.console_error(format!("Channel '{}' not found!", reply.login));
            }
            Err(GqlError::IntegrityCheck) => {
                self.console_error("Failed integrity check! Auth data is probably out of date.");
            }
            Err(e) => {
                self.console_error(format!("An error occurred: {e}"));
            }
        }
    }
}
