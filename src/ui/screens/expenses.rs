use ratatui::{
    layout::{Constraint, Rect},
    text::Span,
    widgets::{Cell, Row, Table},
    Frame,
};

use crate::tracking::total_spent;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_money, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let state = app.state();
    if state.expenses.is_empty() {
        let hint = if state.trip.is_some() {
            "Record one with :spend <amount> <description> [@category]"
        } else {
            "Open a trip first (:open <name>)"
        };
        f.render_widget(
            theme::empty_state("Expenses (0)", "No expenses yet", hint),
            area,
        );
        return;
    }

    let currency = app.currency();
    let header = Row::new(
        ["Date", "Description", "Category", "Amount"]
            .iter()
            .map(|h| Cell::from(*h).style(theme::header_style())),
    );

    let rows: Vec<Row> = state
        .expenses
        .iter()
        .enumerate()
        .skip(app.expense_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, expense)| {
            // Keys the set no longer knows are charged to the buffer.
            let category = state
                .categories
                .get(&expense.category_key)
                .map(|c| c.label.clone())
                .unwrap_or_else(|| format!("{} (buffer)", expense.category_key));

            Row::new(vec![
                Cell::from(expense.date.clone()),
                Cell::from(truncate(&expense.description, 40)),
                Cell::from(truncate(&category, 20)),
                Cell::from(Span::styled(
                    format_money(expense.amount, currency),
                    theme::spent_style(),
                )),
            ])
            .style(theme::row_style(i, app.expense_index))
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Min(20),
        Constraint::Length(20),
        Constraint::Length(14),
    ];

    let title = format!(
        " Expenses ({}) · {} spent ",
        state.expenses.len(),
        format_money(total_spent(&state.expenses), currency)
    );
    let table = Table::new(rows, widths)
        .header(header)
        .block(theme::panel(title));
    f.render_widget(table, area);
}
