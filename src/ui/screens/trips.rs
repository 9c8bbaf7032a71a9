use ratatui::{
    layout::{Constraint, Rect},
    widgets::{Cell, Row, Table},
    Frame,
};

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_money, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    if app.trips.is_empty() {
        f.render_widget(
            theme::empty_state(
                "Trips",
                "No trips yet",
                "Plan one with :trip <name> to <country>",
            ),
            area,
        );
        return;
    }

    let header = Row::new(
        ["", "Trip", "Destination", "Type", "Dates", "Budget"]
            .iter()
            .map(|h| Cell::from(*h).style(theme::header_style())),
    );

    let active = app.state().trip_id();
    let rows: Vec<Row> = app
        .trips
        .iter()
        .enumerate()
        .skip(app.trip_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, trip)| {
            let marker = if trip.id.is_some() && trip.id == active {
                "▶"
            } else {
                " "
            };
            Row::new(vec![
                Cell::from(marker),
                Cell::from(truncate(&trip.name, 28)),
                Cell::from(truncate(&trip.destination, 18)),
                Cell::from(trip.trip_type.as_str()),
                Cell::from(trip.date_range_label()),
                Cell::from(format_money(trip.total_budget, &trip.currency)),
            ])
            .style(theme::row_style(i, app.trip_index))
        })
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Min(16),
        Constraint::Length(18),
        Constraint::Length(12),
        Constraint::Length(26),
        Constraint::Length(16),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(theme::panel(format!(" Trips ({}) ", app.trips.len())));
    f.render_widget(table, area);
}
