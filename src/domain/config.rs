use std::sync::LazyLock;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ReferenceError, ValidationReport};

use super::report::SchemaCheck;

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_DELIVERY_HOST: &str = "cdn.contentstack.io";

static CONFIG_SCHEMA: LazyLock<SchemaCheck> = LazyLock::new(SchemaCheck::for_type::<FieldConfig>);

/// A remote field shown in the selector and cached in the reference value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    pub name: String,
    /// Remote field id; may be a dotted path into nested structures.
    pub id: String,
}

impl Column {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// Static configuration of a reference field, read once per session from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldConfig {
    pub api_key: String,
    pub delivery_token: String,
    pub environment: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Remote collection the references are picked from.
    pub content_type: String,
    #[schemars(length(min = 1))]
    pub content_type_columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

impl FieldConfig {
    pub fn columns(&self) -> &[Column] {
        &self.content_type_columns
    }

    /// The display column: default search target and widest list column.
    pub fn primary_column(&self) -> Option<&Column> {
        self.content_type_columns.first()
    }

    pub fn delivery_host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_DELIVERY_HOST)
    }
}

/// Validate the raw configuration object handed over by the host platform.
pub fn validate_config(raw: &Value) -> Result<FieldConfig, ReferenceError> {
    let report = CONFIG_SCHEMA.check(raw);
    if !report.is_empty() {
        return Err(ReferenceError::ConfigInvalid(report));
    }
    serde_json::from_value(raw.clone())
        .map_err(|err| ReferenceError::ConfigInvalid(ValidationReport::single("", err.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_config() -> Value {
        json!({
            "api_key": "blt-key",
            "delivery_token": "cs-token",
            "environment": "production",
            "content_type": "blog_article",
            "content_type_columns": [
                {"id": "title", "name": "Title"},
                {"id": "author.name", "name": "Author"},
                {"id": "sort_date", "name": "Date"}
            ]
        })
    }

    #[test]
    fn branch_defaults_to_main_and_columns_keep_order() {
        let config = validate_config(&raw_config()).expect("valid config");
        assert_eq!(config.branch, "main");
        let ids: Vec<_> = config.columns().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["title", "author.name", "sort_date"]);
        assert_eq!(config.primary_column().map(|c| c.id.as_str()), Some("title"));
        assert_eq!(config.delivery_host(), DEFAULT_DELIVERY_HOST);
    }

    #[test]
    fn explicit_branch_is_kept() {
        let mut raw = raw_config();
        raw["branch"] = json!("staging");
        let config = validate_config(&raw).expect("valid config");
        assert_eq!(config.branch, "staging");
    }

    #[test]
    fn empty_columns_are_rejected() {
        let mut raw = raw_config();
        raw["content_type_columns"] = json!([]);
        let err = validate_config(&raw).unwrap_err();
        let report = err.report().expect("config report");
        assert_eq!(report.issues()[0].location(), "content_type_columns");
    }

    #[test]
    fn missing_columns_are_rejected() {
        let mut raw = raw_config();
        raw.as_object_mut().unwrap().remove("content_type_columns");
        let err = validate_config(&raw).unwrap_err();
        assert!(matches!(err, ReferenceError::ConfigInvalid(_)));
        assert!(err.to_string().contains("content_type_columns"));
    }

    #[test]
    fn column_without_id_reports_its_location() {
        let mut raw = raw_config();
        raw["content_type_columns"] = json!([{"name": "Title"}]);
        let err = validate_config(&raw).unwrap_err();
        let report = err.report().expect("config report");
        assert!(
            report
                .issues()
                .iter()
                .any(|issue| issue.location() == "content_type_columns[0]"
                    && issue.message.contains("\"id\""))
        );
    }

    #[test]
    fn non_object_config_fails_without_panicking() {
        assert!(validate_config(&json!(null)).is_err());
        assert!(validate_config(&json!("config")).is_err());
        assert!(validate_config(&json!([1, 2])).is_err());
    }
}
