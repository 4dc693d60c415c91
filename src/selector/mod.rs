mod view;

pub use view::SelectorView;

use crate::{
    domain::{FieldConfig, RawRecord},
    query::{QueryRequest, QueryResult, SortBy, SortDirection},
};

pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 30, 50, 100];
pub const DEFAULT_PAGE_SIZE: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    pub id: String,
    pub header: String,
    /// Relative width; the primary column is three times as wide as the rest.
    pub width_weight: u16,
}

/// List state of the reference selector shown inside the popup.
#[derive(Debug, Clone)]
pub struct SelectorState {
    columns: Vec<TableColumn>,
    rows: Vec<RawRecord>,
    total_count: usize,
    loading: bool,
    search: String,
    sort: Option<SortBy>,
    page: usize,
    page_size: usize,
    highlighted: usize,
}

impl SelectorState {
    pub fn new(config: &FieldConfig, page_size: usize) -> Self {
        let columns = config
            .columns()
            .iter()
            .enumerate()
            .map(|(index, column)| TableColumn {
                id: column.id.clone(),
                header: column.name.clone(),
                width_weight: if index == 0 { 3 } else { 1 },
            })
            .collect();
        Self {
            columns,
            rows: Vec::new(),
            total_count: 0,
            loading: false,
            search: String::new(),
            sort: config
                .columns()
                .last()
                .map(|column| SortBy::new(column.id.clone(), SortDirection::Descending)),
            page: 0,
            page_size: normalize_page_size(page_size),
            highlighted: 0,
        }
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    pub fn rows(&self) -> &[RawRecord] {
        &self.rows
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn search_text(&self) -> &str {
        &self.search
    }

    pub fn sort(&self) -> Option<&SortBy> {
        self.sort.as_ref()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.total_count.div_ceil(self.page_size).max(1)
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    pub fn highlighted_record(&self) -> Option<&RawRecord> {
        self.rows.get(self.highlighted)
    }

    /// The request describing what the list should currently show.
    pub fn request(&self) -> QueryRequest {
        let mut request = QueryRequest::page(self.page * self.page_size, self.page_size)
            .with_search(self.search.clone());
        request.sort = self.sort.clone();
        request
    }

    pub fn set_search(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if text == self.search {
            return false;
        }
        self.search = text;
        self.page = 0;
        true
    }

    pub fn push_search_char(&mut self, ch: char) {
        let mut text = self.search.clone();
        text.push(ch);
        self.set_search(text);
    }

    pub fn pop_search_char(&mut self) -> bool {
        let mut text = self.search.clone();
        text.pop().is_some() && self.set_search(text)
    }

    /// Clicking the active column flips direction; another column starts ascending.
    pub fn toggle_sort(&mut self, column_id: &str) -> bool {
        if !self.columns.iter().any(|column| column.id == column_id) {
            return false;
        }
        self.sort = Some(match self.sort.take() {
            Some(sort) if sort.column_id == column_id => {
                SortBy::new(sort.column_id, sort.direction.flipped())
            }
            _ => SortBy::new(column_id, SortDirection::Ascending),
        });
        true
    }

    /// Sort by the column after the currently sorted one.
    pub fn cycle_sort_column(&mut self) -> bool {
        if self.columns.is_empty() {
            return false;
        }
        let next = match &self.sort {
            Some(sort) => self
                .columns
                .iter()
                .position(|column| column.id == sort.column_id)
                .map_or(0, |index| (index + 1) % self.columns.len()),
            None => 0,
        };
        let column_id = self.columns[next].id.clone();
        self.toggle_sort(&column_id)
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        let page = page.min(self.page_count() - 1);
        if page == self.page {
            return false;
        }
        self.page = page;
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.page + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        match self.page.checked_sub(1) {
            Some(page) => self.go_to_page(page),
            None => false,
        }
    }

    /// Only the sizes offered in `PAGE_SIZE_OPTIONS` are accepted.
    pub fn set_page_size(&mut self, size: usize) -> bool {
        if !PAGE_SIZE_OPTIONS.contains(&size) || size == self.page_size {
            return false;
        }
        let first_row = self.page * self.page_size;
        self.page_size = size;
        self.page = first_row / size;
        true
    }

    pub fn move_highlight(&mut self, delta: isize) {
        if self.rows.is_empty() {
            self.highlighted = 0;
            return;
        }
        let last = self.rows.len() - 1;
        self.highlighted = self.highlighted.saturating_add_signed(delta).min(last);
    }

    pub fn mark_loading(&mut self) {
        self.loading = true;
    }

    pub fn apply_result(&mut self, result: QueryResult) {
        self.rows = result.rows;
        self.total_count = result.total_count;
        self.loading = false;
        self.highlighted = self.highlighted.min(self.rows.len().saturating_sub(1));
    }

    /// A failed fetch keeps the previously displayed rows.
    pub fn mark_failed(&mut self) {
        self.loading = false;
    }
}

fn normalize_page_size(size: usize) -> usize {
    if PAGE_SIZE_OPTIONS.contains(&size) {
        size
    } else {
        DEFAULT_PAGE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validate_config;
    use serde_json::json;

    fn state() -> SelectorState {
        let config = validate_config(&json!({
            "api_key": "k",
            "delivery_token": "t",
            "environment": "e",
            "content_type": "blog_article",
            "content_type_columns": [
                {"id": "title", "name": "Title"},
                {"id": "author.name", "name": "Author"},
                {"id": "sort_date", "name": "Date"}
            ]
        }))
        .expect("config");
        SelectorState::new(&config, DEFAULT_PAGE_SIZE)
    }

    fn rows(n: usize) -> QueryResult {
        QueryResult {
            rows: (0..n)
                .map(|i| RawRecord::from_value(json!({"uid": format!("e{i}")})).unwrap())
                .collect(),
            total_count: 95,
        }
    }

    #[test]
    fn initial_request_sorts_last_column_descending() {
        let state = state();
        let request = state.request();
        assert_eq!(
            request.sort,
            Some(SortBy::new("sort_date", SortDirection::Descending))
        );
        assert_eq!((request.skip, request.limit), (0, 30));
        assert_eq!(request.search_text, None);
        assert_eq!(state.columns()[0].width_weight, 3);
        assert_eq!(state.columns()[2].width_weight, 1);
    }

    #[test]
    fn search_resets_to_first_page() {
        let mut state = state();
        state.apply_result(rows(30));
        assert!(state.next_page());
        assert_eq!(state.request().skip, 30);
        assert!(state.set_search("cats"));
        assert_eq!(state.page(), 0);
        assert_eq!(state.request().search_text.as_deref(), Some("cats"));
        assert!(!state.set_search("cats"));
    }

    #[test]
    fn sort_toggles_direction_on_same_column() {
        let mut state = state();
        assert!(state.toggle_sort("title"));
        assert_eq!(
            state.sort(),
            Some(&SortBy::new("title", SortDirection::Ascending))
        );
        assert!(state.toggle_sort("sort_date"));
        assert_eq!(
            state.sort(),
            Some(&SortBy::new("sort_date", SortDirection::Ascending))
        );
        assert!(!state.toggle_sort("unknown"));
    }

    #[test]
    fn paging_is_clamped_to_total() {
        let mut state = state();
        state.apply_result(rows(30));
        assert_eq!(state.page_count(), 4);
        assert!(state.go_to_page(10));
        assert_eq!(state.page(), 3);
        assert!(!state.next_page());
        assert!(state.previous_page());
        assert_eq!(state.request().skip, 60);
    }

    #[test]
    fn page_size_keeps_first_visible_row() {
        let mut state = state();
        state.apply_result(rows(30));
        state.go_to_page(2);
        assert!(state.set_page_size(10));
        assert_eq!(state.page(), 6);
        assert!(!state.set_page_size(7));
    }

    #[test]
    fn failure_keeps_stale_rows() {
        let mut state = state();
        state.apply_result(rows(5));
        state.mark_loading();
        state.mark_failed();
        assert!(!state.is_loading());
        assert_eq!(state.rows().len(), 5);
    }

    #[test]
    fn highlight_stays_within_rows() {
        let mut state = state();
        state.apply_result(rows(3));
        state.move_highlight(10);
        assert_eq!(state.highlighted(), 2);
        state.move_highlight(-10);
        assert_eq!(state.highlighted(), 0);
        assert_eq!(state.highlighted_record().and_then(RawRecord::uid), Some("e0"));
    }
}
