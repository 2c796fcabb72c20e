use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::truncate;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(
            format!(" Events ({}) ", app.events.len()),
            Style::default()
                .fg(theme::TEXT_DIM)
                .add_modifier(Modifier::BOLD),
        ));

    if app.events.is_empty() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No events registered", theme::dim_style())),
            Line::from(""),
            Line::from(Span::styled(
                "Use :event <name> to register one",
                theme::dim_style(),
            )),
        ])
        .centered()
        .block(block);
        f.render_widget(msg, area);
        return;
    }

    let width = area.width.saturating_sub(10) as usize;
    let items: Vec<ListItem> = app
        .events
        .iter()
        .enumerate()
        .skip(app.event_scroll)
        .take(area.height.saturating_sub(2) as usize)
        .map(|(i, event)| {
            let style = if i == app.event_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };
            let id = event.id.map(|id| format!("#{id}")).unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {id:>5} "), theme::dim_style()),
                Span::styled(format!("{:<w$}", truncate(&event.name, width), w = width), style),
            ]))
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}
