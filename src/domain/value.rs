use std::sync::LazyLock;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{ReferenceError, ValidationReport};

use super::report::{SchemaCheck, kind_of};

static POPULATED_SCHEMA: LazyLock<SchemaCheck> =
    LazyLock::new(SchemaCheck::for_type::<PopulatedReference>);

/// A chosen remote record, cached at the time it was picked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PopulatedReference {
    pub uid: String,
    /// Keys are the hyphen-flattened column ids.
    pub fields: IndexMap<String, Value>,
    #[serde(alias = "contentType")]
    pub content_type: String,
}

/// The persisted value of a reference field.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ReferenceValue {
    #[default]
    Empty,
    Populated(PopulatedReference),
}

impl ReferenceValue {
    pub fn populated(
        uid: impl Into<String>,
        content_type: impl Into<String>,
        fields: IndexMap<String, Value>,
    ) -> Self {
        Self::Populated(PopulatedReference {
            uid: uid.into(),
            fields,
            content_type: content_type.into(),
        })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ReferenceValue::Empty)
    }

    pub fn as_populated(&self) -> Option<&PopulatedReference> {
        match self {
            ReferenceValue::Populated(reference) => Some(reference),
            ReferenceValue::Empty => None,
        }
    }

    pub fn uid(&self) -> Option<&str> {
        self.as_populated().map(|reference| reference.uid.as_str())
    }

    /// Wire form handed to the host setter: `{}` when empty.
    pub fn to_stored(&self) -> Value {
        match self {
            ReferenceValue::Empty => Value::Object(Map::new()),
            ReferenceValue::Populated(reference) => {
                serde_json::to_value(reference).unwrap_or_else(|_| Value::Object(Map::new()))
            }
        }
    }
}

impl Serialize for ReferenceValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ReferenceValue::Empty => serializer.serialize_map(Some(0))?.end(),
            ReferenceValue::Populated(reference) => reference.serialize(serializer),
        }
    }
}

/// Accept exactly `{}` or the populated shape; anything else fails.
pub fn validate_value(raw: &Value) -> Result<ReferenceValue, ReferenceError> {
    match raw {
        Value::Object(map) if map.is_empty() => Ok(ReferenceValue::Empty),
        Value::Object(map) => {
            let mut map = map.clone();
            if !map.contains_key("content_type")
                && let Some(tag) = map.remove("contentType")
            {
                map.insert("content_type".to_string(), tag);
            }
            let candidate = Value::Object(map);
            let report = POPULATED_SCHEMA.check(&candidate);
            if !report.is_empty() {
                return Err(ReferenceError::ValueInvalid(report));
            }
            serde_json::from_value::<PopulatedReference>(candidate)
                .map(ReferenceValue::Populated)
                .map_err(|err| {
                    ReferenceError::ValueInvalid(ValidationReport::single("", err.to_string()))
                })
        }
        other => Err(ReferenceError::ValueInvalid(ValidationReport::single(
            "",
            format!("expected an object, found {}", kind_of(other)),
        ))),
    }
}

/// Outcome of reading the stored value at startup.
#[derive(Debug)]
pub struct ValueLoad {
    pub value: ReferenceValue,
    /// The stored value differs from its normalized form and must be written back.
    pub needs_write: bool,
    pub warning: Option<ReferenceError>,
}

/// Validate the stored value, degrading to `Empty` (with a warning) when invalid.
pub fn load_value(raw: &Value) -> ValueLoad {
    match validate_value(raw) {
        Ok(value) => ValueLoad {
            needs_write: value.to_stored() != *raw,
            value,
            warning: None,
        },
        Err(err) => {
            warn!(stored = %raw, error = %err, "existing field data has an invalid format");
            ValueLoad {
                value: ReferenceValue::Empty,
                needs_write: true,
                warning: Some(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored_article() -> Value {
        json!({
            "uid": "bltf7fa2d359507a7db",
            "fields": {
                "title": "Why Do Cats Like High Places?",
                "sort_date": "2023-07-25"
            },
            "content_type": "Blog_Article"
        })
    }

    #[test]
    fn empty_object_is_the_empty_value() {
        assert_eq!(validate_value(&json!({})).unwrap(), ReferenceValue::Empty);
        assert_eq!(ReferenceValue::Empty.to_stored(), json!({}));
    }

    #[test]
    fn populated_shape_round_trips_to_the_same_wire_form() {
        let value = validate_value(&stored_article()).expect("valid value");
        assert_eq!(value.uid(), Some("bltf7fa2d359507a7db"));
        assert_eq!(value.to_stored(), stored_article());
    }

    #[test]
    fn populated_looking_value_without_uid_fails() {
        let raw = json!({"fields": {}, "content_type": "Blog_Article"});
        let err = validate_value(&raw).unwrap_err();
        assert!(matches!(err, ReferenceError::ValueInvalid(_)));
        assert!(err.to_string().contains("\"uid\" is a required property"));
    }

    #[test]
    fn non_objects_and_wrong_types_fail() {
        for raw in [
            json!(null),
            json!("blt123"),
            json!(42),
            json!([]),
            json!({"uid": 7, "fields": {}, "content_type": "a"}),
            json!({"uid": "x", "fields": [], "content_type": "a"}),
            json!({"title": "stray"}),
        ] {
            assert!(validate_value(&raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn invalid_stored_value_degrades_to_empty_and_requests_a_write() {
        let load = load_value(&json!({"uid": 1}));
        assert_eq!(load.value, ReferenceValue::Empty);
        assert!(load.needs_write);
        assert!(load.warning.is_some());
    }

    #[test]
    fn valid_stored_value_needs_no_write() {
        let load = load_value(&stored_article());
        assert!(!load.needs_write);
        assert!(load.warning.is_none());
        assert!(!load_value(&json!({})).needs_write);
    }

    #[test]
    fn camel_case_content_type_is_accepted_and_rewritten() {
        let raw = json!({
            "uid": "x1",
            "fields": {"title": "Why Cats"},
            "contentType": "Blog_Article"
        });
        let load = load_value(&raw);
        assert!(load.warning.is_none());
        assert!(load.needs_write);
        assert_eq!(load.value.to_stored()["content_type"], "Blog_Article");
    }

    #[test]
    fn extra_keys_are_stripped_on_normalization() {
        let mut raw = stored_article();
        raw["title"] = json!("legacy");
        let load = load_value(&raw);
        assert!(load.needs_write);
        assert_eq!(load.value.to_stored(), stored_article());
    }
}
