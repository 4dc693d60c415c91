use std::{cmp::Ordering, sync::Arc};

use anyhow::{Context, Result};
use regex::RegexBuilder;
use serde_json::Value;

use crate::domain::resolve_path;

/// Parameters of one call against the remote listing collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteQuery {
    pub content_type: String,
    pub filter_field: Option<String>,
    /// Literal text matched as a substring of `filter_field`.
    pub filter_text: Option<String>,
    pub case_insensitive: bool,
    pub sort_field: Option<String>,
    pub sort_descending: bool,
    pub skip: usize,
    pub limit: usize,
    pub include_count: bool,
}

impl RemoteQuery {
    /// The filter as a regular expression with metacharacters escaped.
    pub fn filter_pattern(&self) -> Option<String> {
        self.filter_text.as_deref().map(regex::escape)
    }
}

/// Raw response of the listing collaborator, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemotePage {
    pub entries: Vec<Value>,
    pub count: Option<usize>,
}

/// A paged, filterable, sortable list API.
pub trait ListingSource {
    fn find(&self, query: &RemoteQuery) -> Result<RemotePage>;
}

impl<T: ListingSource + ?Sized> ListingSource for &T {
    fn find(&self, query: &RemoteQuery) -> Result<RemotePage> {
        (**self).find(query)
    }
}

impl<T: ListingSource + ?Sized> ListingSource for Box<T> {
    fn find(&self, query: &RemoteQuery) -> Result<RemotePage> {
        (**self).find(query)
    }
}

impl<T: ListingSource + ?Sized> ListingSource for Arc<T> {
    fn find(&self, query: &RemoteQuery) -> Result<RemotePage> {
        (**self).find(query)
    }
}

/// Listing source backed by records held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: Vec<Value>,
}

impl MemorySource {
    pub fn new(entries: Vec<Value>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ListingSource for MemorySource {
    fn find(&self, query: &RemoteQuery) -> Result<RemotePage> {
        let matcher = match (&query.filter_field, query.filter_pattern()) {
            (Some(field), Some(pattern)) => {
                let regex = RegexBuilder::new(&pattern)
                    .case_insensitive(query.case_insensitive)
                    .build()
                    .with_context(|| format!("invalid filter on {field}"))?;
                Some((field.as_str(), regex))
            }
            _ => None,
        };

        let mut matched: Vec<&Value> = self
            .entries
            .iter()
            .filter(|entry| match &matcher {
                Some((field, regex)) => resolve_path(entry, field)
                    .and_then(Value::as_str)
                    .is_some_and(|text| regex.is_match(text)),
                None => true,
            })
            .collect();

        if let Some(field) = &query.sort_field {
            matched.sort_by(|a, b| {
                let ordering = compare_values(resolve_path(a, field), resolve_path(b, field));
                if query.sort_descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        let count = matched.len();
        let entries = matched
            .into_iter()
            .skip(query.skip)
            .take(query.limit)
            .cloned()
            .collect();
        Ok(RemotePage {
            entries,
            count: query.include_count.then_some(count),
        })
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (a, b) => rank(a).cmp(&rank(b)),
    }
}

fn rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}
