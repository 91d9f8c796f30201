use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use rust_decimal::Decimal;

use crate::ui::app::App;
use crate::ui::screens::budgets::budget_line;
use crate::ui::theme;
use crate::ui::util::{format_amount, truncate};

const RECENT_ROWS: usize = 8;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Summary cards
            Constraint::Min(6),    // Budget progress
            Constraint::Length(RECENT_ROWS as u16 + 2),
        ])
        .split(area);

    render_summary_cards(f, chunks[0], app);
    render_budget_progress(f, chunks[1], app);
    render_recent(f, chunks[2], app);
}

fn render_summary_cards(f: &mut Frame, area: Rect, app: &App) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    let summary = &app.summary;
    let balance_color = if summary.remaining_balance >= Decimal::ZERO {
        theme::GREEN
    } else {
        theme::RED
    };

    render_card(f, cards[0], "Income", summary.total_income, theme::GREEN, app);
    render_card(
        f,
        cards[1],
        "Budgeted Expenses",
        summary.total_budgeted_expenses,
        theme::RED,
        app,
    );
    render_card(
        f,
        cards[2],
        "Uncategorized",
        summary.total_uncategorized_expenses,
        theme::YELLOW,
        app,
    );
    render_card(
        f,
        cards[3],
        "Remaining",
        summary.remaining_balance,
        balance_color,
        app,
    );
}

fn render_card(f: &mut Frame, area: Rect, title: &str, amount: Decimal, color: Color, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(
            format!(" {title} "),
            theme::title_style(),
        ));

    let text = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format_amount(amount, &app.currency),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
    ])
    .centered()
    .block(block);

    f.render_widget(text, area);
}

fn titled(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(
            title,
            theme::title_style(),
        ))
}

fn render_budget_progress(f: &mut Frame, area: Rect, app: &App) {
    if app.budgets.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "No budgets yet. Set one with :budget <category> <amount>",
            theme::dim_style(),
        )))
        .centered()
        .block(titled(" Budget Progress "));
        f.render_widget(msg, area);
        return;
    }

    let items: Vec<ListItem> = app
        .budgets
        .iter()
        .take(area.height.saturating_sub(2) as usize)
        .map(|b| budget_line(b, &app.currency, theme::normal_style(), 16))
        .collect();

    f.render_widget(List::new(items).block(titled(" Budget Progress ")), area);
}

fn render_recent(f: &mut Frame, area: Rect, app: &App) {
    let skip = app.history.len().saturating_sub(RECENT_ROWS);
    let items: Vec<ListItem> = app
        .history
        .iter()
        .skip(skip)
        .map(|entry| {
            let (sign, style) = if entry.is_income() {
                ("+", theme::income_style())
            } else {
                ("-", theme::expense_style())
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<32}", truncate(&entry.description, 30)),
                    theme::normal_style(),
                ),
                Span::styled(
                    format!("{:>20}", format!("{sign}{}", format_amount(entry.amount, &app.currency))),
                    style,
                ),
                Span::styled(
                    format!("  {}", entry.category.as_deref().unwrap_or("")),
                    theme::dim_style(),
                ),
            ]))
        })
        .collect();

    f.render_widget(List::new(items).block(titled(" Recent Activity ")), area);
}
