//! Color palette for the chatlog TUI.

use ratatui::style::{Color, Modifier, Style};

pub struct Palette {
    pub accent: Color,
    pub error: Color,
    pub text: Color,
    pub muted: Color,
    pub border: Color,
}

#[must_use]
pub fn palette() -> Palette {
    Palette {
        accent: Color::Cyan,
        error: Color::Red,
        text: Color::White,
        muted: Color::DarkGray,
        border: Color::Gray,
    }
}

#[must_use]
pub fn focused(palette: &Palette) -> Style {
    Style::default()
        .fg(palette.accent)
        .add_modifier(Modifier::BOLD)
}

#[must_use]
pub fn unfocused(palette: &Palette) -> Style {
    Style::default().fg(palette.text)
}

#[must_use]
pub fn muted(palette: &Palette) -> Style {
    Style::default().fg(palette.muted)
}

#[must_use]
pub fn error(palette: &Palette) -> Style {
    Style::default().fg(palette.error)
}
