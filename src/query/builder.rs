use anyhow::Result;
use tracing::{debug, warn};

use crate::{
    domain::{FieldConfig, RawRecord},
    error::ReferenceError,
};

use super::{
    request::{QueryRequest, QueryResult},
    source::{ListingSource, RemotePage, RemoteQuery},
};

/// A sequenced listing request. Only the most recently issued ticket may
/// update visible state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingTicket {
    pub seq: u64,
    pub query: RemoteQuery,
}

impl ListingTicket {
    /// Run the ticket's query against `source`.
    pub fn run(&self, source: &impl ListingSource) -> Result<RemotePage> {
        source.find(&self.query)
    }
}

/// Maps selector requests onto remote queries and filters out superseded responses.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    content_type: String,
    search_field: Option<String>,
    latest: u64,
}

impl QueryBuilder {
    pub fn new(config: &FieldConfig) -> Self {
        Self {
            content_type: config.content_type.clone(),
            search_field: config.primary_column().map(|column| column.id.clone()),
            latest: 0,
        }
    }

    pub fn build(&self, request: &QueryRequest) -> RemoteQuery {
        let filter_text = request
            .search_text
            .as_ref()
            .filter(|text| !text.is_empty())
            .cloned();
        RemoteQuery {
            content_type: self.content_type.clone(),
            filter_field: filter_text.as_ref().and(self.search_field.clone()),
            filter_text,
            case_insensitive: true,
            sort_field: request.sort.as_ref().map(|sort| sort.column_id.clone()),
            sort_descending: request
                .sort
                .as_ref()
                .is_some_and(|sort| sort.direction.is_descending()),
            skip: request.skip,
            limit: request.limit,
            include_count: true,
        }
    }

    pub fn issue(&mut self, request: &QueryRequest) -> ListingTicket {
        self.latest += 1;
        ListingTicket {
            seq: self.latest,
            query: self.build(request),
        }
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest
    }

    /// Normalize the outcome of `ticket`, or `None` when a newer ticket was issued since.
    pub fn resolve(
        &self,
        ticket: &ListingTicket,
        outcome: Result<RemotePage>,
    ) -> Option<Result<QueryResult, ReferenceError>> {
        if !self.is_current(ticket.seq) {
            debug!(
                seq = ticket.seq,
                latest = self.latest,
                "discarding superseded listing response"
            );
            return None;
        }
        Some(
            outcome
                .map(|page| normalize_page(page, ticket.query.limit))
                .map_err(|err| ReferenceError::listing(format!("{err:#}"))),
        )
    }
}

/// Keep rows carrying a string `uid`, cap them at `limit`, and make the total
/// at least the number of rows returned.
pub fn normalize_page(page: RemotePage, limit: usize) -> QueryResult {
    let mut rows: Vec<RawRecord> = Vec::with_capacity(page.entries.len().min(limit));
    for entry in page.entries {
        match RawRecord::from_value(entry) {
            Some(record) if record.uid().is_some() => rows.push(record),
            Some(record) => warn!(entry = %record.into_value(), "dropping entry without uid"),
            None => warn!("dropping non-object entry"),
        }
    }
    rows.truncate(limit);
    let total_count = page.count.unwrap_or(rows.len()).max(rows.len());
    QueryResult { rows, total_count }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::validate_config,
        query::request::{SortBy, SortDirection},
    };
    use anyhow::anyhow;
    use serde_json::json;

    fn builder() -> QueryBuilder {
        let config = validate_config(&json!({
            "api_key": "k",
            "delivery_token": "t",
            "environment": "production",
            "content_type": "blog_article",
            "content_type_columns": [
                {"id": "title", "name": "Title"},
                {"id": "sort_date", "name": "Date"}
            ]
        }))
        .expect("config");
        QueryBuilder::new(&config)
    }

    #[test]
    fn search_targets_primary_column_only() {
        let query = builder().build(&QueryRequest::page(0, 30).with_search("cats"));
        assert_eq!(query.filter_field.as_deref(), Some("title"));
        assert_eq!(query.filter_text.as_deref(), Some("cats"));
        assert!(query.case_insensitive);
        assert!(query.include_count);
    }

    #[test]
    fn empty_search_has_no_filter_and_no_sort_without_request() {
        let query = builder().build(&QueryRequest::page(0, 30).with_search(""));
        assert_eq!(query.filter_field, None);
        assert_eq!(query.filter_text, None);
        assert_eq!(query.sort_field, None);
        assert!(!query.sort_descending);
    }

    #[test]
    fn sort_and_window_are_forwarded() {
        let request = QueryRequest::page(20, 10)
            .with_sort(SortBy::new("sort_date", SortDirection::Descending));
        let query = builder().build(&request);
        assert_eq!(query.sort_field.as_deref(), Some("sort_date"));
        assert!(query.sort_descending);
        assert_eq!((query.skip, query.limit), (20, 10));
    }

    #[test]
    fn page_is_capped_and_total_is_independent() {
        let mut b = builder();
        let ticket = b.issue(&QueryRequest::page(20, 10));
        let entries = (0..15).map(|i| json!({"uid": format!("e{i}")})).collect();
        let result = b
            .resolve(&ticket, Ok(RemotePage { entries, count: Some(42) }))
            .expect("current")
            .expect("ok");
        assert_eq!(result.rows.len(), 10);
        assert_eq!(result.total_count, 42);
    }

    #[test]
    fn rows_without_uid_are_dropped_and_total_covers_rows() {
        let page = RemotePage {
            entries: vec![json!({"uid": "a"}), json!({"title": "x"}), json!(3)],
            count: Some(0),
        };
        let result = normalize_page(page, 10);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.total_count, 1);
    }

    #[test]
    fn superseded_ticket_is_discarded() {
        let mut b = builder();
        let first = b.issue(&QueryRequest::page(0, 30).with_search("c"));
        let second = b.issue(&QueryRequest::page(0, 30).with_search("ca"));
        assert!(b.resolve(&second, Ok(RemotePage::default())).is_some());
        assert!(b.resolve(&first, Ok(RemotePage::default())).is_none());
    }

    #[test]
    fn transport_errors_become_listing_failures() {
        let mut b = builder();
        let ticket = b.issue(&QueryRequest::page(0, 30));
        let outcome = b
            .resolve(&ticket, Err(anyhow!("connection reset")))
            .expect("current");
        match outcome {
            Err(ReferenceError::ListingFailed { reason }) => {
                assert!(reason.contains("connection reset"))
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
