use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;

use crate::db::format_date;
use crate::summary::BudgetSummary;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, format_percent, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let Some(budget) = app.budget.as_ref() else {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No budget open", theme::dim_style())),
            Line::from(""),
            Line::from(Span::styled(
                "Pick one on the Budgets screen and press Enter",
                theme::dim_style(),
            )),
        ])
        .centered()
        .block(panel(" Budget "));
        f.render_widget(msg, area);
        return;
    };

    let show_chart = app.summary.as_ref().is_some_and(BudgetSummary::has_lines);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Length(5), // Summary cards
            Constraint::Min(8),    // Lines
        ])
        .split(area);

    let header = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                format!(" {} ", budget.name),
                Style::default()
                    .fg(theme::TEXT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(budget.status.as_str(), theme::budget_status_style(budget.status)),
        ]),
        Line::from(Span::styled(
            format!(
                " {} · {} · created {}{}",
                budget.responsible,
                budget.event_label(),
                format_date(budget.creation_date),
                if budget.description.is_empty() {
                    String::new()
                } else {
                    format!(" · {}", budget.description)
                }
            ),
            theme::dim_style(),
        )),
    ])
    .block(panel(format!(" Budget #{} ", budget.id.unwrap_or_default())));
    f.render_widget(header, chunks[0]);

    if let Some(summary) = &app.summary {
        render_summary_cards(f, chunks[1], summary);
    }

    let body = if show_chart {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(40), Constraint::Length(30)])
            .split(chunks[2])
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(40)])
            .split(chunks[2])
    };

    let lines = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(body[0]);
    render_revenue(f, lines[0], app);
    render_expenses(f, lines[1], app);

    if show_chart {
        if let Some(summary) = &app.summary {
            render_chart(f, body[1], summary);
        }
    }
}

fn panel(title: impl Into<String>) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(
            title.into(),
            Style::default()
                .fg(theme::TEXT_DIM)
                .add_modifier(Modifier::BOLD),
        ))
}

fn render_summary_cards(f: &mut Frame, area: Rect, summary: &BudgetSummary) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    render_card(
        f,
        cards[0],
        "Revenue",
        format_amount(summary.total_revenue),
        theme::GREEN,
        format!("{} lines", summary.revenue_lines),
    );
    render_card(
        f,
        cards[1],
        "Expenses",
        format_amount(summary.total_expense),
        theme::RED,
        format!("{} lines", summary.expense_lines),
    );
    render_card(
        f,
        cards[2],
        "Balance",
        format_amount(summary.balance),
        theme::balance_color(summary.balance),
        String::new(),
    );
    render_card(
        f,
        cards[3],
        "Margin",
        format_percent(summary.margin_percent),
        theme::balance_color(summary.margin_percent),
        "of revenue".to_string(),
    );
}

fn render_card(
    f: &mut Frame,
    area: Rect,
    title: &str,
    value: String,
    color: Color,
    subtitle: String,
) {
    let text = Paragraph::new(vec![
        Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(subtitle, theme::dim_style())),
    ])
    .centered()
    .block(panel(format!(" {title} ")));

    f.render_widget(text, area);
}

fn render_revenue(f: &mut Frame, area: Rect, app: &App) {
    let block = panel(" Revenue ");
    if app.revenue_lines.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "No revenue yet. Add one with :revenue <amount> <source>",
            theme::dim_style(),
        )))
        .centered()
        .block(block);
        f.render_widget(msg, area);
        return;
    }

    let header = Row::new(
        ["#", "Source", "Amount"]
            .iter()
            .map(|h| Cell::from(*h).style(theme::header_style())),
    );
    let rows: Vec<Row> = app
        .revenue_lines
        .iter()
        .enumerate()
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, line)| {
            let style = if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };
            Row::new(vec![
                Cell::from(format!(" {}", line.id.unwrap_or_default())),
                Cell::from(truncate(&line.source_label, 40)),
                Cell::from(Span::styled(
                    format!("{:>14}", format_amount(line.projected_amount)),
                    theme::income_style(),
                )),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Min(16),
        Constraint::Length(15),
    ];
    f.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

fn render_expenses(f: &mut Frame, area: Rect, app: &App) {
    let block = panel(" Expenses ")
        .title_bottom(Span::styled(app.expense_hint(), theme::dim_style()));

    if app.expense_lines.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "No expenses yet. Add one with :expense <amount> <category> <description>",
            theme::dim_style(),
        )))
        .centered()
        .block(block);
        f.render_widget(msg, area);
        return;
    }

    let header = Row::new(
        [
            "#",
            "Description",
            "Category",
            "Amount",
            "Status",
            "Authorized",
            "Payment",
            "Notes",
        ]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style())),
    );

    let rows: Vec<Row> = app
        .expense_lines
        .iter()
        .enumerate()
        .skip(app.expense_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, line)| {
            let selected = i == app.expense_index;
            let style = if selected {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };
            let amount_style = if selected {
                style
            } else {
                theme::expense_style()
            };
            let status_style = if selected {
                style
            } else {
                theme::expense_status_style(line.status)
            };

            Row::new(vec![
                Cell::from(format!(" {}", line.id.unwrap_or_default())),
                Cell::from(truncate(&line.description, 30)),
                Cell::from(line.category.as_str()),
                Cell::from(Span::styled(
                    format!("{:>12}", format_amount(line.projected_amount)),
                    amount_style,
                )),
                Cell::from(Span::styled(line.status.as_str(), status_style)),
                Cell::from(line.authorized_date.map(format_date).unwrap_or_default()),
                Cell::from(
                    line.payment_method
                        .map(|m| m.as_str())
                        .unwrap_or_default(),
                ),
                Cell::from(truncate(&line.notes, 24)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Min(14),
        Constraint::Length(10),
        Constraint::Length(13),
        Constraint::Length(10),
        Constraint::Length(11),
        Constraint::Length(13),
        Constraint::Length(24),
    ];
    f.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

fn render_chart(f: &mut Frame, area: Rect, summary: &BudgetSummary) {
    let colors = [theme::GREEN, theme::RED];
    let bars: Vec<Bar> = summary
        .chart_bars()
        .iter()
        .zip(colors)
        .map(|((label, amount), color)| {
            Bar::default()
                .value(amount.abs().to_u64().unwrap_or(0))
                .label(Line::from(*label))
                .text_value(format_amount(*amount))
                .style(Style::default().fg(color))
                .value_style(
                    Style::default()
                        .fg(theme::HEADER_BG)
                        .bg(color)
                        .add_modifier(Modifier::BOLD),
                )
        })
        .collect();

    let chart = BarChart::default()
        .block(panel(" Revenue vs Expenses "))
        .data(BarGroup::default().bars(&bars))
        .bar_width(12)
        .bar_gap(2);

    f.render_widget(chart, area);
}
