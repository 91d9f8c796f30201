use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    if app.history.is_empty() {
        let msg = vec![
            Line::from(""),
            Line::from(Span::styled("Nothing recorded yet", theme::dim_style())),
            Line::from(""),
            Line::from(Span::styled(
                "Add one with :income or :expense",
                theme::dim_style(),
            )),
        ];
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                " History (0) ",
                theme::title_style(),
            ));
        f.render_widget(Paragraph::new(msg).centered().block(block), area);
        return;
    }

    let header_cells = ["#", "Type", "Description", "Amount", "Category", "Timestamp"]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style()));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .history
        .iter()
        .skip(app.history_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|entry| {
            let amount_style = if entry.is_income() {
                theme::income_style()
            } else {
                theme::expense_style()
            };

            let style = if entry.index == app.history_index {
                theme::selected_style()
            } else if entry.index % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };

            Row::new(vec![
                Cell::from(entry.index.to_string()),
                Cell::from(entry.kind.as_str()),
                Cell::from(truncate(&entry.description, 40)),
                Cell::from(Span::styled(
                    format_amount(entry.amount, &app.currency),
                    amount_style,
                )),
                Cell::from(entry.category.as_deref().unwrap_or("-").to_string()),
                Cell::from(entry.timestamp.clone()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Length(8),
        Constraint::Min(20),
        Constraint::Length(18),
        Constraint::Length(18),
        Constraint::Length(20),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                format!(" History ({}) ", app.history.len()),
                theme::title_style(),
            )),
    );

    f.render_widget(table, area);
}
