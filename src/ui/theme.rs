use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::allocate::BudgetStatus;
use crate::tracking::UsageLevel;

pub(crate) const BASE: Color = Color::Rgb(30, 30, 46);
pub(crate) const MANTLE: Color = Color::Rgb(24, 24, 37);
pub(crate) const SURFACE: Color = Color::Rgb(49, 50, 68);
pub(crate) const OVERLAY: Color = Color::Rgb(69, 71, 90);
pub(crate) const TEXT: Color = Color::Rgb(205, 214, 244);
pub(crate) const TEXT_DIM: Color = Color::Rgb(127, 132, 156);
pub(crate) const ACCENT: Color = Color::Rgb(137, 180, 250);
pub(crate) const GREEN: Color = Color::Rgb(166, 227, 161);
pub(crate) const YELLOW: Color = Color::Rgb(249, 226, 175);
pub(crate) const PEACH: Color = Color::Rgb(250, 179, 135);
pub(crate) const RED: Color = Color::Rgb(243, 139, 168);

pub(crate) fn header_style() -> Style {
    Style::default().fg(TEXT).bg(BASE).add_modifier(Modifier::BOLD)
}

fn selected_style() -> Style {
    Style::default().fg(BASE).bg(ACCENT)
}

pub(crate) fn normal_style() -> Style {
    Style::default().fg(TEXT)
}

pub(crate) fn dim_style() -> Style {
    Style::default().fg(TEXT_DIM)
}

/// Money already spent.
pub(crate) fn spent_style() -> Style {
    Style::default().fg(RED)
}

fn alt_row_style() -> Style {
    Style::default().fg(TEXT).bg(SURFACE)
}

/// Zebra striping with the cursor row highlighted.
pub(crate) fn row_style(index: usize, selected: usize) -> Style {
    if index == selected {
        selected_style()
    } else if index % 2 == 1 {
        alt_row_style()
    } else {
        normal_style()
    }
}

pub(crate) fn command_bar_style() -> Style {
    Style::default().fg(TEXT).bg(MANTLE)
}

pub(crate) fn status_bar_style() -> Style {
    Style::default().fg(TEXT_DIM).bg(SURFACE)
}

/// Dark bold text on a coloured background.
pub(crate) fn badge_style(bg: Color) -> Style {
    Style::default().fg(BASE).bg(bg).add_modifier(Modifier::BOLD)
}

pub(crate) fn status_color(status: &BudgetStatus) -> Color {
    match status {
        BudgetStatus::Matched => GREEN,
        BudgetStatus::Above(_) => ACCENT,
        BudgetStatus::Below(_) => PEACH,
        BudgetStatus::Undetermined(_) => TEXT_DIM,
    }
}

pub(crate) fn usage_color(level: UsageLevel) -> Color {
    match level {
        UsageLevel::Ok => GREEN,
        UsageLevel::Warning => YELLOW,
        UsageLevel::Exceeded => RED,
    }
}

/// Bordered panel with a dim bold title.
pub(crate) fn panel(title: impl Into<String>) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(OVERLAY))
        .title(Span::styled(
            title.into(),
            Style::default().fg(TEXT_DIM).add_modifier(Modifier::BOLD),
        ))
}

/// Centered placeholder shown when a screen has nothing to list.
pub(crate) fn empty_state(title: &str, headline: &str, hint: &str) -> Paragraph<'static> {
    Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(headline.to_string(), dim_style())),
        Line::from(""),
        Line::from(Span::styled(hint.to_string(), dim_style())),
    ])
    .centered()
    .block(panel(format!(" {title} ")))
}
