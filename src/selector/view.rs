use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, StatefulWidget, Table, TableState, Widget},
};
use serde_json::Value;

use crate::{domain::RawRecord, query::SortDirection, window::PopupContent};

use super::SelectorState;

/// Read-only projection of a [`SelectorState`] into a popup container.
#[derive(Debug, Clone, Copy)]
pub struct SelectorView<'a> {
    state: &'a SelectorState,
    focused: bool,
}

impl<'a> SelectorView<'a> {
    pub fn new(state: &'a SelectorState) -> Self {
        Self {
            state,
            focused: true,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn render_search(&self, area: Rect, buf: &mut Buffer) {
        let text = self.state.search_text();
        let line = Line::from(vec![
            Span::styled("Search: ", Style::default().fg(Color::Cyan)),
            Span::raw(text.to_string()),
            Span::styled(
                if self.focused { "_" } else { "" },
                Style::default().add_modifier(Modifier::SLOW_BLINK),
            ),
        ]);
        Paragraph::new(line).render(area, buf);
    }

    fn render_table(&self, area: Rect, buf: &mut Buffer) {
        let state = self.state;
        if state.rows().is_empty() {
            let message = if state.is_loading() {
                "Loading…"
            } else {
                "No entries"
            };
            Paragraph::new(message)
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::TOP))
                .render(area, buf);
            return;
        }

        let header = Row::new(state.columns().iter().map(|column| {
            let marker = match state.sort() {
                Some(sort) if sort.column_id == column.id => match sort.direction {
                    SortDirection::Ascending => " ▲",
                    SortDirection::Descending => " ▼",
                },
                _ => "",
            };
            Cell::from(format!("{}{marker}", column.header))
        }))
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let rows = state.rows().iter().map(|record| {
            Row::new(
                state
                    .columns()
                    .iter()
                    .map(|column| Cell::from(cell_text(record, &column.id))),
            )
        });
        let widths = state
            .columns()
            .iter()
            .map(|column| Constraint::Fill(column.width_weight));

        let highlight = if self.focused {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().add_modifier(Modifier::REVERSED)
        };
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::TOP))
            .row_highlight_style(highlight)
            .highlight_symbol("» ");
        let mut table_state = TableState::default().with_selected(Some(state.highlighted()));
        StatefulWidget::render(table, area, buf, &mut table_state);
    }

    fn render_footer(&self, area: Rect, buf: &mut Buffer) {
        let state = self.state;
        let mut status = format!(
            "Page {}/{} • {} per page • {} total",
            state.page() + 1,
            state.page_count(),
            state.page_size(),
            state.total_count()
        );
        if state.is_loading() {
            status.push_str(" • loading");
        }
        Paragraph::new(status)
            .style(Style::default().fg(Color::Gray))
            .render(area, buf);
    }
}

impl PopupContent for SelectorView<'_> {
    fn project(&self, area: Rect, buf: &mut Buffer) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(2),
                Constraint::Length(1),
            ])
            .split(area);
        self.render_search(rows[0], buf);
        self.render_table(rows[1], buf);
        self.render_footer(rows[2], buf);
    }
}

fn cell_text(record: &RawRecord, column_id: &str) -> String {
    match record.resolve(column_id) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::validate_config, query::QueryResult, selector::DEFAULT_PAGE_SIZE};
    use serde_json::json;

    fn state() -> SelectorState {
        let config = validate_config(&json!({
            "api_key": "k",
            "delivery_token": "t",
            "environment": "e",
            "content_type": "blog_article",
            "content_type_columns": [
                {"id": "title", "name": "Title"},
                {"id": "author.name", "name": "Author"}
            ]
        }))
        .expect("config");
        SelectorState::new(&config, DEFAULT_PAGE_SIZE)
    }

    fn render(state: &SelectorState) -> String {
        let area = Rect::new(0, 0, 60, 8);
        let mut buf = Buffer::empty(area);
        SelectorView::new(state).project(area, &mut buf);
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .filter_map(|x| buf.cell((x, y)).map(|cell| cell.symbol().to_string()))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn empty_list_reads_no_entries() {
        let text = render(&state());
        assert!(text.contains("No entries"));
        assert!(text.contains("Page 1/1"));
    }

    #[test]
    fn rows_show_nested_cells_and_headers() {
        let mut state = state();
        state.toggle_sort("title");
        state.apply_result(QueryResult {
            rows: vec![
                RawRecord::from_value(json!({
                    "uid": "x1",
                    "title": "Why Cats",
                    "author": {"name": "Ada"}
                }))
                .unwrap(),
            ],
            total_count: 1,
        });
        let text = render(&state);
        assert!(text.contains("Title ▲"));
        assert!(text.contains("Author"));
        assert!(text.contains("Why Cats"));
        assert!(text.contains("Ada"));
        assert!(text.contains("1 total"));
    }
}
