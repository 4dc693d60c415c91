//! Content delivery REST API mapping for remote listing queries.

use anyhow::{Context, Result, bail};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::{Map, Value, json};

use crate::domain::FieldConfig;

use super::source::{RemotePage, RemoteQuery};

const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Credentials and endpoint of the delivery API for one field session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryApi {
    host: String,
    api_key: String,
    delivery_token: String,
    environment: String,
    branch: String,
}

impl DeliveryApi {
    pub fn from_config(config: &FieldConfig) -> Self {
        Self {
            host: config.delivery_host().to_string(),
            api_key: config.api_key.clone(),
            delivery_token: config.delivery_token.clone(),
            environment: config.environment.clone(),
            branch: config.branch.clone(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Full entries URL for `query`, including the row window and count flag.
    pub fn entries_url(&self, query: &RemoteQuery) -> String {
        let mut params: Vec<(&str, String)> = vec![("environment", self.environment.clone())];
        if query.include_count {
            params.push(("include_count", "true".to_string()));
        }
        params.push(("skip", query.skip.to_string()));
        params.push(("limit", query.limit.to_string()));
        if let Some(field) = &query.sort_field {
            let key = if query.sort_descending { "desc" } else { "asc" };
            params.push((key, field.clone()));
        }
        if let (Some(field), Some(pattern)) = (&query.filter_field, query.filter_pattern()) {
            let mut condition = json!({ "$regex": pattern });
            if query.case_insensitive {
                condition["$options"] = json!("i");
            }
            let mut filter = Map::new();
            filter.insert(field.clone(), condition);
            params.push(("query", Value::Object(filter).to_string()));
        }

        let query_string = params
            .iter()
            .map(|(key, value)| format!("{key}={}", utf8_percent_encode(value, COMPONENT)))
            .collect::<Vec<_>>()
            .join("&");
        format!(
            "https://{}/v3/content_types/{}/entries?{}",
            self.host,
            utf8_percent_encode(&query.content_type, COMPONENT),
            query_string
        )
    }

    pub fn headers(&self) -> [(&'static str, &str); 3] {
        [
            ("api_key", self.api_key.as_str()),
            ("access_token", self.delivery_token.as_str()),
            ("branch", self.branch.as_str()),
        ]
    }

    /// Parse an `{"entries": [...], "count": n}` response body.
    pub fn parse_response(body: Value) -> Result<RemotePage> {
        let Value::Object(mut body) = body else {
            bail!("delivery API response is not a JSON object");
        };
        let entries = match body.remove("entries") {
            Some(Value::Array(entries)) => entries,
            Some(_) => bail!("delivery API response field `entries` is not an array"),
            None => {
                let message = body
                    .get("error_message")
                    .and_then(Value::as_str)
                    .unwrap_or("response did not contain entries");
                bail!("delivery API error: {message}");
            }
        };
        let count = match body.get("count") {
            None => None,
            Some(value) => {
                let count = value
                    .as_u64()
                    .context("delivery API response field `count` is not a number")?;
                Some(usize::try_from(count).with_context(|| {
                    format!("delivery API count {count} does not fit this platform")
                })?)
            }
        };
        Ok(RemotePage { entries, count })
    }
}

#[cfg(feature = "http")]
pub use client::HttpListingSource;

#[cfg(feature = "http")]
mod client {
    use anyhow::{Context, Result};
    use serde_json::Value;

    use super::DeliveryApi;
    use crate::query::source::{ListingSource, RemotePage, RemoteQuery};

    /// Blocking delivery API client.
    #[derive(Debug, Clone)]
    pub struct HttpListingSource {
        api: DeliveryApi,
        agent: ureq::Agent,
    }

    impl HttpListingSource {
        pub fn new(api: DeliveryApi) -> Self {
            Self {
                api,
                agent: ureq::Agent::new(),
            }
        }
    }

    impl ListingSource for HttpListingSource {
        fn find(&self, query: &RemoteQuery) -> Result<RemotePage> {
            let url = self.api.entries_url(query);
            let mut request = self.agent.get(&url);
            for (name, value) in self.api.headers() {
                request = request.set(name, value);
            }
            let response = request
                .call()
                .with_context(|| format!("request to {} failed", self.api.host()))?;
            let body: Value = response
                .into_json()
                .context("failed to decode delivery API response")?;
            DeliveryApi::parse_response(body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validate_config;

    fn api() -> DeliveryApi {
        let config = validate_config(&json!({
            "api_key": "blt-key",
            "delivery_token": "cs-token",
            "environment": "production",
            "content_type": "blog_article",
            "content_type_columns": [{"id": "title", "name": "Title"}]
        }))
        .expect("config");
        DeliveryApi::from_config(&config)
    }

    fn query() -> RemoteQuery {
        RemoteQuery {
            content_type: "blog_article".into(),
            filter_field: Some("title".into()),
            filter_text: Some("cats".into()),
            case_insensitive: true,
            sort_field: Some("sort_date".into()),
            sort_descending: true,
            skip: 20,
            limit: 10,
            include_count: true,
        }
    }

    #[test]
    fn url_carries_window_sort_and_regex_filter() {
        let url = api().entries_url(&query());
        assert!(url.starts_with("https://cdn.contentstack.io/v3/content_types/blog_article/entries?"));
        assert!(url.contains("environment=production"));
        assert!(url.contains("include_count=true"));
        assert!(url.contains("skip=20&limit=10"));
        assert!(url.contains("desc=sort_date"));
        let encoded = utf8_percent_encode(
            r#"{"title":{"$regex":"cats","$options":"i"}}"#,
            COMPONENT,
        )
        .to_string();
        assert!(url.ends_with(&format!("query={encoded}")));
    }

    #[test]
    fn headers_carry_credentials_and_branch() {
        let binding = api();
        let headers = binding.headers();
        assert_eq!(headers[0], ("api_key", "blt-key"));
        assert_eq!(headers[1], ("access_token", "cs-token"));
        assert_eq!(headers[2], ("branch", "main"));
    }

    #[test]
    fn parses_entries_and_count() {
        let page = DeliveryApi::parse_response(json!({
            "entries": [{"uid": "a"}, {"uid": "b"}],
            "count": 17
        }))
        .unwrap();
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.count, Some(17));
    }

    #[test]
    fn error_bodies_surface_their_message() {
        let err = DeliveryApi::parse_response(json!({
            "error_message": "Access denied. You have insufficient permissions.",
            "error_code": 141
        }))
        .unwrap_err();
        assert!(err.to_string().contains("Access denied"));
    }

    #[test]
    fn count_must_be_a_non_negative_integer() {
        for count in [json!(-1), json!(2.5), json!("17")] {
            let err = DeliveryApi::parse_response(json!({"entries": [], "count": count}))
                .unwrap_err();
            assert!(err.to_string().contains("`count`"));
        }
        let page = DeliveryApi::parse_response(json!({"entries": []})).unwrap();
        assert_eq!(page.count, None);
    }
}
