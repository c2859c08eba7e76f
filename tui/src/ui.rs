//! Screen rendering for the chatlog TUI.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Gauge, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use chatlog_engine::{App, ProgressState, Screen};

use crate::input::{Focus, PendingTarget, UiState};
use crate::theme::{self, Palette};

const LEFT_PANEL_WIDTH: u16 = 32;

pub fn draw(frame: &mut Frame, app: &App, ui: &UiState) {
    let palette = theme::palette();
    match app.screen {
        Screen::Main => draw_main(frame, app, ui, &palette),
        Screen::Settings => draw_settings(frame, ui, &palette),
        Screen::Channels => draw_channels(frame, app, ui, &palette),
        Screen::AuthEntry => draw_auth(frame, ui, &palette),
    }
}

fn bordered(title: &str, palette: &Palette) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.border))
        .title(title.to_string())
}

/// Truncate to a display width, appending an ellipsis when shortened.
fn fit(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    for c in text.chars() {
        if out.width() + 1 >= max_width {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}

fn selector_line<'a>(
    label: &'a str,
    value: String,
    focused: bool,
    palette: &Palette,
) -> Line<'a> {
    let value_style = if focused {
        theme::focused(palette)
    } else {
        theme::unfocused(palette)
    };
    let marker = if focused { "> " } else { "  " };
    Line::from(vec![
        Span::styled(marker, value_style),
        Span::styled(format!("{label}: "), theme::muted(palette)),
        Span::styled(value, value_style),
    ])
}

fn checkbox_line<'a>(label: &'a str, on: bool, focused: bool, palette: &Palette) -> Line<'a> {
    let style = if focused {
        theme::focused(palette)
    } else {
        theme::unfocused(palette)
    };
    let marker = if focused { "> " } else { "  " };
    let box_glyph = if on { "[x]" } else { "[ ]" };
    Line::from(vec![
        Span::styled(marker, style),
        Span::styled(format!("{box_glyph} {label}"), style),
    ])
}

fn draw_main(frame: &mut Frame, app: &App, ui: &UiState, palette: &Palette) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Length(LEFT_PANEL_WIDTH), Constraint::Min(1)])
        .split(frame.area());

    draw_main_panel(frame, app, ui, palette, columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(columns[1]);

    draw_progress(frame, app, palette, right[0]);
    draw_console(frame, app, palette, right[1]);
}

fn draw_main_panel(frame: &mut Frame, app: &App, ui: &UiState, palette: &Palette, area: Rect) {
    let channel_value = app
        .selected_channel_entry()
        .map(|(login, _)| login.to_string())
        .unwrap_or_else(|| "Select channel".to_string());
    let mode_value = app
        .selected_mode
        .map(chatlog_engine::ModeChoice::label)
        .unwrap_or("Select mode")
        .to_string();

    let max = LEFT_PANEL_WIDTH as usize - 4;
    let mut lines = vec![
        selector_line(
            "Channel",
            fit(&channel_value, max),
            ui.focus == Focus::Channel,
            palette,
        ),
        selector_line("Mode", mode_value, ui.focus == Focus::Mode, palette),
        selector_line(
            "Count",
            app.count_input.clone(),
            ui.focus == Focus::Count,
            palette,
        ),
        selector_line(
            "Broadcasts ago",
            app.ago_input.clone(),
            ui.focus == Focus::Ago,
            palette,
        ),
        Line::from(""),
        checkbox_line(
            "Stream timecodes",
            app.with_timecodes,
            ui.focus == Focus::Timecodes,
            palette,
        ),
        checkbox_line(
            "Save to file",
            app.archive,
            ui.focus == Focus::Archive,
            palette,
        ),
        Line::from(""),
    ];

    let user = app
        .settings
        .identity
        .as_ref()
        .map(|identity| identity.login.to_string())
        .unwrap_or_else(|| "None".to_string());
    lines.push(Line::from(Span::styled(
        format!("User: {}", fit(&user, max)),
        theme::muted(palette),
    )));
    lines.push(Line::from(""));

    for hint in [
        "Enter confirm   Ctrl+S stop",
        "Ctrl+L clear    F2 settings",
        "Tab focus       Esc quit",
    ] {
        lines.push(Line::from(Span::styled(hint, theme::muted(palette))));
    }

    let panel = Paragraph::new(lines).block(bordered("chatlog", palette));
    frame.render_widget(panel, area);
}

fn draw_progress(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let (ratio, label) = match app.progress {
        ProgressState::Idle => (1.0, String::new()),
        ProgressState::Determinate(value) => (value, format!("{:.0}%", value * 100.0)),
        ProgressState::Indeterminate(phase) => {
            // Triangle wave: the bar sweeps back and forth.
            let t = phase * 2.0;
            let ratio = if t > 1.0 { 2.0 - t } else { t };
            (ratio, "working...".to_string())
        }
    };

    let gauge = Gauge::default()
        .block(bordered("Progress", palette))
        .gauge_style(Style::default().fg(palette.accent))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(label);
    frame.render_widget(gauge, area);
}

fn draw_console(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    // Newest lines first, matching the engine's console order.
    let lines: Vec<Line> = app
        .console()
        .map(|entry| {
            let style = if entry.is_error {
                theme::error(palette)
            } else {
                theme::unfocused(palette)
            };
            Line::from(Span::styled(entry.text.clone(), style))
        })
        .collect();

    let console = Paragraph::new(lines)
        .block(bordered("Console", palette))
        .wrap(Wrap { trim: false });
    frame.render_widget(console, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_settings(frame: &mut Frame, ui: &UiState, palette: &Palette) {
    let area = centered_rect(40, 6, frame.area());

    let entries = ["Manage channels", "Enter auth data"];
    let mut lines = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let style = if index == ui.settings_cursor {
            theme::focused(palette)
        } else {
            theme::unfocused(palette)
        };
        let marker = if index == ui.settings_cursor { "> " } else { "  " };
        lines.push(Line::from(Span::styled(format!("{marker}{entry}"), style)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter select   Esc back",
        theme::muted(palette),
    )));

    let panel = Paragraph::new(lines)
        .alignment(Alignment::Left)
        .block(bordered("Settings", palette));
    frame.render_widget(panel, area);
}

fn draw_channels(frame: &mut Frame, app: &App, ui: &UiState, palette: &Palette) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(frame.area());

    let logins = app.settings.channel_logins();
    let mut lines = Vec::new();
    if logins.is_empty() {
        lines.push(Line::from(Span::styled(
            "No channels yet. Press 'a' to add one.",
            theme::muted(palette),
        )));
    }
    for (index, login) in logins.iter().enumerate() {
        let selected = app.selected_channel == Some(index);
        let style = if selected {
            theme::focused(palette)
        } else {
            theme::unfocused(palette)
        };
        let marker = if selected { "> " } else { "  " };
        lines.push(Line::from(Span::styled(
            format!("{marker}{login}"),
            style,
        )));
    }

    let list = Paragraph::new(lines).block(bordered("Channels", palette));
    frame.render_widget(list, rows[0]);

    let footer = match &ui.pending {
        Some((PendingTarget::AddChannel, buffer)) => Line::from(vec![
            Span::styled("Add channel: ", theme::muted(palette)),
            Span::styled(format!("{buffer}_"), theme::focused(palette)),
        ]),
        Some((PendingTarget::SetIdentity, buffer)) => Line::from(vec![
            Span::styled("Set username: ", theme::muted(palette)),
            Span::styled(format!("{buffer}_"), theme::focused(palette)),
        ]),
        None => {
            let user = app
                .settings
                .identity
                .as_ref()
                .map(|identity| identity.login.to_string())
                .unwrap_or_else(|| "None".to_string());
            Line::from(Span::styled(
                format!("Current user: {user}   a add  u set user  d remove  Esc back"),
                theme::muted(palette),
            ))
        }
    };

    let footer = Paragraph::new(footer).block(bordered("", palette));
    frame.render_widget(footer, rows[1]);
}

fn draw_auth(frame: &mut Frame, ui: &UiState, palette: &Palette) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(4), Constraint::Min(1)])
        .split(frame.area());

    let help = Paragraph::new(vec![
        Line::from(Span::styled(
            "Open the site, press F12 -> Network, find the gql request,",
            theme::muted(palette),
        )),
        Line::from(Span::styled(
            "right-click -> Copy -> Copy as cURL (bash), then paste it below.",
            theme::muted(palette),
        )),
    ])
    .block(bordered("Parse auth data", palette));
    frame.render_widget(help, rows[0]);

    let char_count = ui.auth.text.chars().count();
    let body = if ui.auth.text.is_empty() {
        Paragraph::new(Line::from(Span::styled(
            "Paste curl text here (terminal paste or Ctrl+V)...",
            theme::muted(palette).add_modifier(Modifier::ITALIC),
        )))
    } else {
        Paragraph::new(ui.auth.text.clone()).wrap(Wrap { trim: false })
    };
    let body = body.block(bordered(
        &format!("Curl text ({char_count} chars): Enter parse, Esc back"),
        palette,
    ));
    frame.render_widget(body, rows[1]);
}
