use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::tracking::{alerts, total_spent, UsageLevel};
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_money, format_percent, progress_bar, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    if app.state().trip.is_none() {
        render_empty(f, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Trip summary
            Constraint::Min(8),    // Category table
        ])
        .split(area);

    render_summary(f, chunks[0], app);
    render_categories(f, chunks[1], app);
}

fn render_summary(f: &mut Frame, area: Rect, app: &App) {
    let state = app.state();
    let Some(trip) = state.trip.as_ref() else {
        return;
    };
    let currency = trip.currency.as_str();
    let status = state.status();
    let spent = total_spent(&state.expenses);
    let flagged = alerts(&app.usage);

    let recommended = if state.recommended.is_zero() {
        "—".to_string()
    } else {
        format_money(state.recommended, currency)
    };
    let days = trip
        .days()
        .map_or_else(|| "no dates".to_string(), |d| format!("{d} days"));

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" {} ", trip.destination),
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    "{} · {} · {} traveler(s) · {}",
                    trip.trip_type,
                    trip.date_range_label(),
                    trip.travelers,
                    days
                ),
                theme::dim_style(),
            ),
        ]),
        Line::from(vec![
            Span::styled(" Budget ", theme::dim_style()),
            Span::styled(
                format_money(trip.total_budget, currency),
                theme::normal_style().add_modifier(Modifier::BOLD),
            ),
            Span::styled("   Recommended ", theme::dim_style()),
            Span::styled(recommended, theme::normal_style()),
            Span::styled("   Spent ", theme::dim_style()),
            Span::styled(format_money(spent, currency), theme::spent_style()),
        ]),
        Line::from(vec![
            Span::styled(
                format!(" {} ", status.label()),
                theme::badge_style(theme::status_color(&status)),
            ),
            Span::styled(
                format!(" {status}"),
                Style::default().fg(theme::status_color(&status)),
            ),
        ]),
    ];

    if let Some(worst) = flagged.first() {
        let verb = if worst.level == UsageLevel::Exceeded {
            "over budget"
        } else {
            "nearly spent"
        };
        lines.push(Line::from(Span::styled(
            format!(
                " ! {} is {verb} ({:.0}%)",
                worst.label,
                worst.ratio * 100.0
            ),
            Style::default().fg(theme::usage_color(worst.level)),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(
            format!(" {} ", trip.name),
            Style::default()
                .fg(theme::TEXT)
                .add_modifier(Modifier::BOLD),
        ));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_categories(f: &mut Frame, area: Rect, app: &App) {
    let state = app.state();
    let currency = app.currency();

    let header_cells = ["", "Category", "Share", "Amount", "Spent", "Usage"]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style()));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = state
        .categories
        .iter()
        .enumerate()
        .map(|(i, cat)| {
            let marker = match (cat.locked, cat.is_buffer) {
                (true, _) => "🔒",
                (false, true) => "◆",
                (false, false) => " ",
            };
            let used = app.usage.iter().find(|u| u.key == cat.key);
            let (spent, gauge, color) = match used {
                Some(u) => (
                    format_money(u.spent, currency),
                    format!("{} {:.0}%", progress_bar(u.ratio, 12), u.ratio * 100.0),
                    theme::usage_color(u.level),
                ),
                None => (String::new(), String::new(), theme::TEXT_DIM),
            };

            Row::new(vec![
                Cell::from(marker),
                Cell::from(truncate(&cat.label, 22)),
                Cell::from(format_percent(cat.percentage)),
                Cell::from(format_money(state.amount_for(&cat.key), currency)),
                Cell::from(spent),
                Cell::from(Span::styled(gauge, Style::default().fg(color))),
            ])
            .style(theme::row_style(i, app.category_index))
        })
        .collect();

    let widths = [
        Constraint::Length(3),
        Constraint::Min(16),
        Constraint::Length(8),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(20),
    ];

    let title = format!(
        " Categories · total {} · buffer min {} ",
        format_percent(state.categories.total()),
        format_percent(app.store.allocator().buffer_minimum())
    );
    let table = Table::new(rows, widths)
        .header(header)
        .block(theme::panel(title));
    f.render_widget(table, area);
}

fn render_empty(f: &mut Frame, area: Rect) {
    f.render_widget(
        theme::empty_state(
            "Planner",
            "No trip open",
            "Create one with :trip <name> to <country>, or pick one on the Trips tab",
        ),
        area,
    );
}
