//! The chat-history fetch worker.
//!
//! One background task pages the sender's chat log newest-first, filters by
//! broadcast window when one is requested, renders display lines, and
//! reports through an event channel. The UI requests a stop by flipping a
//! shared flag; the worker checks it per message so a stop still archives
//! what was collected.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chatlog_gql::{GqlClient, GqlError, chat_log, videos};
use chatlog_types::{
    ChatMessage, FetchMode, Login, StreamWindow, UserId, WindowPosition, timecode,
};
use chrono::Local;
use tokio::sync::mpsc;

use crate::archive;

/// Events the worker reports to the UI, terminated by exactly one
/// `Done` or `Failed`.
#[derive(Debug)]
pub enum FetchEvent {
    /// One rendered message line, in display (newest-first) order.
    Line(String),
    /// Determinate progress in `[0, 1]` when the mode allows computing one.
    Progress(f64),
    /// Fetch finished (naturally, window-exhausted, limit hit, or stopped).
    Done(FetchSummary),
    /// Fetch aborted on an error; no transcript was archived.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSummary {
    pub total: usize,
    pub archived: Option<PathBuf>,
    pub stopped: bool,
}

/// Everything a fetch needs, resolved up front by the app layer.
#[derive(Debug, Clone)]
pub struct FetchPlan {
    pub channel_login: Login,
    pub channel: UserId,
    pub sender: UserId,
    pub mode: FetchMode,
    pub with_timecodes: bool,
    pub archive: bool,
}

#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error(transparent)]
    Gql(#[from] GqlError),
    #[error("failed to archive transcript: {0}")]
    Archive(#[from] std::io::Error),
}

/// Render one message the way the console and the archive show it:
/// `[HH:MM:SS] (DD.MM.YYYY HH:MM:SS) sender: text`, timecode prefix only
/// when a broadcast window is in play. Timestamps are local time.
fn render_line(message: &ChatMessage, timecode_prefix: Option<&str>) -> String {
    let stamp = message
        .sent_at
        .with_timezone(&Local)
        .format("%d.%m.%Y %H:%M:%S");
    match timecode_prefix {
        Some(tc) => format!("[{tc}] ({stamp}) {}: {}", message.sender, message.text),
        None => format!("({stamp}) {}: {}", message.sender, message.text),
    }
}

/// Run a fetch to completion, reporting through `tx`.
///
/// Never returns an error: terminal outcomes are delivered as the final
/// channel event so the UI has a single place to observe them.
pub async fn run_fetch(
    client: GqlClient,
    plan: FetchPlan,
    tx: mpsc::Sender<FetchEvent>,
    stop: Arc<AtomicBool>,
) {
    match fetch_inner(&client, &plan, &tx, &stop, Path::new(archive::ARCHIVE_DIR)).await {
        Ok(summary) => {
            let _ = tx.send(FetchEvent::Done(summary)).await;
        }
        Err(e) => {
            tracing::warn!("Fetch failed: {e}");
            let _ = tx.send(FetchEvent::Failed(user_message(&e))).await;
        }
    }
}

fn user_message(error: &FetchError) -> String {
    match error {
        FetchError::Gql(GqlError::IntegrityCheck) => {
            "Failed integrity check! Auth data is probably out of date.".to_string()
        }
        other => format!("An error occurred: {other}"),
    }
}

async fn fetch_inner(
    client: &GqlClient,
    plan: &FetchPlan,
    tx: &mpsc::Sender<FetchEvent>,
    stop: &AtomicBool,
    archive_dir: &Path,
) -> Result<FetchSummary, FetchError> {
    let window: Option<StreamWindow> = match plan.mode {
        FetchMode::FromBroadcast(ago) => {
            Some(videos::broadcast_window(client, &plan.channel_login, ago).await?)
        }
        FetchMode::All | FetchMode::LastN(_) => None,
    };
    let limit = match plan.mode {
        FetchMode::LastN(count) => Some(count.get()),
        FetchMode::All | FetchMode::FromBroadcast(_) => None,
    };

    // Collected newest-first (arrival order); reversed before archiving.
    let mut transcript: Vec<String> = Vec::new();
    let mut cursor = String::new();
    let mut count = 0usize;
    let mut stopped = false;

    'pages: loop {
        let page = chat_log::chat_log_page(client, &plan.channel, &plan.sender, &cursor).await?;

        for message in page.messages {
            if stop.load(Ordering::Relaxed) {
                stopped = true;
                break 'pages;
            }

            let mut timecode_prefix = None;
            if let Some(window) = window {
                match window.classify(message.sent_at) {
                    WindowPosition::AfterEnd => continue,
                    WindowPosition::Inside { offset } => {
                        if plan.with_timecodes {
                            timecode_prefix = Some(timecode(offset));
                        }
                        let _ = tx.send(FetchEvent::Progress(window.progress(offset))).await;
                    }
                    // Pages are newest-first: once a message predates the
                    // window, nothing further can fall inside it.
                    WindowPosition::BeforeStart => break 'pages,
                }
            }

            let line = render_line(&message, timecode_prefix.as_deref());
            transcript.push(line.clone());
            if tx.send(FetchEvent::Line(line)).await.is_err() {
                // Receiver gone; the UI no longer cares.
                return Ok(FetchSummary {
                    total: count,
                    archived: None,
                    stopped: true,
                });
            }
            count += 1;

            if let Some(limit) = limit {
                let _ = tx
                    .send(FetchEvent::Progress(count as f64 / limit as f64))
                    .await;
                if count >= limit {
                    break 'pages;
                }
            }
        }

        match page.next_cursor {
            Some(next) => cursor = next,
            None => break,
        }
    }

    let archived = if plan.archive && !transcript.is_empty() {
        transcript.reverse();
        Some(archive::write_transcript(archive_dir, &transcript)?)
    } else {
        None
    };

    Ok(FetchSummary {
        total: count,
        archived,
        stopped,
    })
}
