use ratatui::style::{Color, Modifier, Style};

pub(crate) const HEADER_BG: Color = Color::Rgb(29, 32, 33);
pub(crate) const HEADER_FG: Color = Color::Rgb(235, 219, 178);
pub(crate) const ACCENT: Color = Color::Rgb(131, 165, 152);
pub(crate) const GREEN: Color = Color::Rgb(184, 187, 38);
pub(crate) const RED: Color = Color::Rgb(251, 73, 52);
pub(crate) const YELLOW: Color = Color::Rgb(250, 189, 47);
pub(crate) const SURFACE: Color = Color::Rgb(50, 48, 47);
pub(crate) const TEXT: Color = Color::Rgb(235, 219, 178);
pub(crate) const TEXT_DIM: Color = Color::Rgb(146, 131, 116);
pub(crate) const OVERLAY: Color = Color::Rgb(80, 73, 69);
pub(crate) const COMMAND_BG: Color = Color::Rgb(40, 40, 40);

/// Budget bar color for a clamped remaining fraction.
pub(crate) fn remaining_color(ratio: f64) -> Color {
    if ratio < 0.1 {
        RED
    } else if ratio < 0.3 {
        YELLOW
    } else {
        GREEN
    }
}

pub(crate) fn header_style() -> Style {
    Style::default()
        .fg(HEADER_FG)
        .bg(HEADER_BG)
        .add_modifier(Modifier::BOLD)
}

pub(crate) fn selected_style() -> Style {
    Style::default().fg(HEADER_BG).bg(ACCENT)
}

pub(crate) fn normal_style() -> Style {
    Style::default().fg(TEXT)
}

pub(crate) fn dim_style() -> Style {
    Style::default().fg(TEXT_DIM)
}

pub(crate) fn income_style() -> Style {
    Style::default().fg(GREEN)
}

pub(crate) fn expense_style() -> Style {
    Style::default().fg(RED)
}

pub(crate) fn alt_row_style() -> Style {
    Style::default().fg(TEXT).bg(SURFACE)
}

pub(crate) fn command_bar_style() -> Style {
    Style::default().fg(TEXT).bg(COMMAND_BG)
}

pub(crate) fn status_bar_style() -> Style {
    Style::default().fg(TEXT_DIM).bg(SURFACE)
}

pub(crate) fn title_style() -> Style {
    Style::default()
        .fg(TEXT_DIM)
        .add_modifier(Modifier::BOLD)
}
