use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::ledger::BudgetProgress;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, progress_bar, progress_ratio, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    if app.budgets.is_empty() {
        render_empty(f, area);
        return;
    }

    let items: Vec<ListItem> = app
        .budgets
        .iter()
        .enumerate()
        .skip(app.budget_scroll)
        .take(area.height.saturating_sub(2) as usize)
        .map(|(i, budget)| {
            let style = if i == app.budget_index {
                theme::selected_style()
            } else if i % 2 == 0 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };
            budget_line(budget, &app.currency, style, 20)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                format!(" Budgets ({}) ", app.budgets.len()),
                theme::title_style(),
            )),
    );
    f.render_widget(list, area);
}

/// One budget row: name, remaining/allocated, bar and percent left.
/// Shared with the dashboard.
pub(crate) fn budget_line<'a>(
    budget: &BudgetProgress,
    currency: &str,
    name_style: Style,
    bar_width: usize,
) -> ListItem<'a> {
    let ratio = progress_ratio(budget.fraction_remaining);
    let color = theme::remaining_color(ratio);
    let percent = match budget.fraction_remaining {
        Some(_) => format!(" {:.0}% left", ratio * 100.0),
        None => " no allocation".to_string(),
    };

    ListItem::new(Line::from(vec![
        Span::styled(format!("{:<18}", truncate(&budget.category, 17)), name_style),
        Span::styled(
            format!(
                "{} / {} ",
                format_amount(budget.remaining, currency),
                format_amount(budget.amount, currency)
            ),
            Style::default().fg(color),
        ),
        Span::styled(progress_bar(ratio, bar_width), Style::default().fg(color)),
        Span::styled(
            percent,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
    ]))
}

fn render_empty(f: &mut Frame, area: Rect) {
    let msg = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("No budgets yet", theme::dim_style())),
        Line::from(""),
        Line::from(Span::styled(
            "Use :budget <category> <amount> to allocate one",
            theme::dim_style(),
        )),
    ])
    .centered()
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                " Budgets ",
                theme::title_style(),
            )),
    );
    f.render_widget(msg, area);
}
