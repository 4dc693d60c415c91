use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};
use serde_json::Value;

use crate::{
    binder::{FieldState, ReferenceFieldBinder},
    domain::storage_key,
    window::WindowPlatform,
};

pub(crate) struct HostView<'a> {
    pub status: &'a str,
    pub help: Option<&'a str>,
    pub host_focused: bool,
}

pub(crate) fn draw_host<P: WindowPlatform>(
    frame: &mut Frame<'_>,
    binder: &ReferenceFieldBinder<P>,
    view: HostView<'_>,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_field(frame, rows[0], binder, view.host_focused);

    let help = Paragraph::new(view.help.unwrap_or(" "))
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(help, rows[1]);

    let status = Paragraph::new(Line::from(vec![
        Span::raw("Status: "),
        Span::raw(view.status.to_string()),
    ]));
    frame.render_widget(status, rows[2]);
}

fn render_field<P: WindowPlatform>(
    frame: &mut Frame<'_>,
    area: Rect,
    binder: &ReferenceFieldBinder<P>,
    focused: bool,
) {
    let config = binder.config();
    let mut title = format!("Reference · {}", config.content_type);
    if !binder.is_editable() {
        title.push_str(" · read-only");
    }
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(inner);

    let state_line = match binder.state() {
        FieldState::Empty => Line::from(Span::styled(
            "No entry selected.",
            Style::default().fg(Color::Gray),
        )),
        FieldState::Selecting => Line::from(Span::styled(
            "Selecting an entry in the popup…",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::ITALIC),
        )),
        FieldState::Populated => Line::from(vec![
            Span::raw("Selected "),
            Span::styled(
                binder.value().uid().unwrap_or_default().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
    };
    frame.render_widget(Paragraph::new(state_line), layout[0]);

    let Some(reference) = binder.value().as_populated() else {
        return;
    };
    let rows = config.columns().iter().map(|column| {
        let value = reference
            .fields
            .get(&storage_key(&column.id))
            .map(display_value)
            .unwrap_or_default();
        Row::new(vec![
            Cell::from(column.name.clone()).style(Style::default().fg(Color::Yellow)),
            Cell::from(value),
        ])
    });
    let table = Table::new(rows, [Constraint::Length(16), Constraint::Fill(1)]);
    frame.render_widget(table, layout[1]);
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
