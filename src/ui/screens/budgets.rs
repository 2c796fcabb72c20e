use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::db::format_date;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::truncate;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let title = Span::styled(
        format!(" Budgets ({}) {}", app.budgets.len(), filter_label(app)),
        Style::default()
            .fg(theme::TEXT_DIM)
            .add_modifier(Modifier::BOLD),
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(title);

    if app.budgets.is_empty() {
        let msg = if app.budget_filter.is_empty() {
            vec![
                Line::from(""),
                Line::from(Span::styled("No budgets yet", theme::dim_style())),
                Line::from(""),
                Line::from(Span::styled(
                    "Use :budget <name> | <responsible> [| <event>] to create one",
                    theme::dim_style(),
                )),
            ]
        } else {
            vec![
                Line::from(""),
                Line::from(Span::styled(
                    "No budgets match the current filter",
                    theme::dim_style(),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Press Esc or run :filter to clear it",
                    theme::dim_style(),
                )),
            ]
        };
        f.render_widget(Paragraph::new(msg).centered().block(block), area);
        return;
    }

    let header = Row::new(
        ["Created", "Name", "Responsible", "Event", "Status"]
            .iter()
            .map(|h| Cell::from(*h).style(theme::header_style())),
    )
    .height(1);

    let rows: Vec<Row> = app
        .budgets
        .iter()
        .enumerate()
        .skip(app.budget_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, budget)| {
            let style = if i == app.budget_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };
            let event_style = if budget.linked_event_name.is_some() {
                Style::default()
            } else {
                theme::dim_style()
            };

            Row::new(vec![
                Cell::from(format!(" {}", format_date(budget.creation_date))),
                Cell::from(truncate(&budget.name, 30)),
                Cell::from(truncate(&budget.responsible, 18)),
                Cell::from(Span::styled(truncate(budget.event_label(), 24), event_style)),
                Cell::from(Span::styled(
                    budget.status.as_str(),
                    theme::budget_status_style(budget.status),
                )),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Min(16),
        Constraint::Length(19),
        Constraint::Length(25),
        Constraint::Length(12),
    ];

    f.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

fn filter_label(app: &App) -> String {
    let f = &app.budget_filter;
    let mut parts = Vec::new();
    if let Some(event) = &f.event_contains {
        parts.push(format!("event~'{event}'"));
    }
    if let Some(date) = f.created_on {
        parts.push(format!("date={}", format_date(date)));
    }
    if let Some(status) = f.status {
        parts.push(format!("status={status}"));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("[{}] ", parts.join(" "))
    }
}
