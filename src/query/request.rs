use crate::domain::RawRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn is_descending(self) -> bool {
        matches!(self, SortDirection::Descending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortBy {
    pub column_id: String,
    pub direction: SortDirection,
}

impl SortBy {
    pub fn new(column_id: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column_id: column_id.into(),
            direction,
        }
    }
}

/// UI-level description of one page of the selector list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryRequest {
    pub search_text: Option<String>,
    pub sort: Option<SortBy>,
    /// Zero-based offset of the first row.
    pub skip: usize,
    pub limit: usize,
}

impl QueryRequest {
    pub fn page(skip: usize, limit: usize) -> Self {
        Self {
            search_text: None,
            sort: None,
            skip,
            limit,
        }
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.search_text = (!text.is_empty()).then_some(text);
        self
    }

    pub fn with_sort(mut self, sort: SortBy) -> Self {
        self.sort = Some(sort);
        self
    }
}

/// A normalized page of rows plus the total number of matching records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub rows: Vec<RawRecord>,
    pub total_count: usize,
}
