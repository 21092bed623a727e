//! Folio test utilities.
//!
//! Helpers for integration testing: schema fixtures, raw payload builders,
//! and assertion utilities for compiled documents.

use folio_sdk::types::{GroupId, PropType};
use serde_json::{Map, Value as JsonValue, json};

/// Start a raw prop payload.
pub fn payload() -> TestPayload {
    TestPayload { props: Vec::new() }
}

/// A raw prop payload builder, rendered in either accepted collection form.
#[derive(Debug, Clone, Default)]
pub struct TestPayload {
    pub props: Vec<(String, PropType, JsonValue)>,
}

impl TestPayload {
    /// Add a prop with its declared type.
    pub fn prop(mut self, name: &str, prop_type: PropType, value: JsonValue) -> Self {
        self.props.push((name.to_string(), prop_type, value));
        self
    }

    /// Add a STRING prop.
    pub fn string(self, name: &str, value: &str) -> Self {
        self.prop(name, PropType::String, json!(value))
    }

    /// Add a QUILL prop with a single paragraph block.
    pub fn quill(self, name: &str, text: &str, slug: Option<&str>) -> Self {
        self.prop(name, PropType::Quill, quill_value(text, slug))
    }

    /// `[{"name", "type", "value"}, ...]`
    pub fn into_array(self) -> JsonValue {
        JsonValue::Array(
            self.props
                .into_iter()
                .map(|(name, prop_type, value)| {
                    json!({"name": name, "type": prop_type.as_str(), "value": value})
                })
                .collect(),
        )
    }

    /// `{"<name>": {"type", "value"}, ...}`
    pub fn into_object(self) -> JsonValue {
        let map: Map<String, JsonValue> = self
            .props
            .into_iter()
            .map(|(name, prop_type, value)| {
                (name, json!({"type": prop_type.as_str(), "value": value}))
            })
            .collect();
        JsonValue::Object(map)
    }

    /// Same as [`into_object`](Self::into_object) with the entries reversed.
    pub fn into_reversed_object(mut self) -> JsonValue {
        self.props.reverse();
        self.into_object()
    }
}

/// Raw QUILL value. `slug: None` leaves it to be derived from the text.
pub fn quill_value(text: &str, slug: Option<&str>) -> JsonValue {
    let mut heading = json!({"text": text});
    if let (Some(slug), Some(obj)) = (slug, heading.as_object_mut()) {
        obj.insert("slug".to_string(), json!(slug));
    }
    json!({
        "heading": heading,
        "blocks": [{"type": "paragraph", "value": format!("About {text}")}]
    })
}

/// Schema fixtures.
pub mod schemas {
    use folio_sdk::types::{GroupId, PropDefinition, PropType, Schema};

    /// Schema for a rich content article: `title`, `body` (QUILL), `tags`.
    pub fn article() -> Schema {
        Schema::new(vec![
            PropDefinition::new("title", PropType::String).required(),
            PropDefinition::new("body", PropType::Quill).required(),
            PropDefinition::new("tags", PropType::String).array(),
        ])
    }

    /// Schema for a data model record with one of each scalar type.
    pub fn product() -> Schema {
        Schema::new(vec![
            PropDefinition::new("name", PropType::String).required(),
            PropDefinition::new("price", PropType::Number).required(),
            PropDefinition::new("available", PropType::Boolean),
            PropDefinition::new("released", PropType::Date),
            PropDefinition::new("related", PropType::EntryPointer).array(),
        ])
    }

    /// Schema with a single group prop.
    pub fn with_group(name: &str, group_id: GroupId, is_array: bool) -> Schema {
        let def = PropDefinition::group(name, group_id);
        Schema::new(vec![if is_array { def.array() } else { def }])
    }
}

/// Raw group value in the `{_id, props}` form.
pub fn group_value(group_id: GroupId, props: JsonValue) -> JsonValue {
    json!({"_id": group_id.to_string(), "props": props})
}

/// Assertion helpers for JSON content.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a JSON value equals expected.
    pub fn json_eq(actual: &Value, expected: &Value) {
        assert_eq!(
            actual,
            expected,
            "JSON mismatch:\nactual: {}\nexpected: {}",
            serde_json::to_string_pretty(actual).unwrap_or_default(),
            serde_json::to_string_pretty(expected).unwrap_or_default()
        );
    }

    /// Assert the exact key order of a JSON object.
    pub fn key_order(value: &Value, expected: &[&str]) {
        let keys: Vec<&str> = value
            .as_object()
            .map(|obj| obj.keys().map(String::as_str).collect())
            .unwrap_or_default();
        assert_eq!(keys, expected, "Unexpected key order in {value}");
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn payload_forms() {
        let p = payload().string("title", "Hi").quill("body", "Intro", None);

        let array = p.clone().into_array();
        assert_eq!(array[0], json!({"name": "title", "type": "STRING", "value": "Hi"}));
        assert_eq!(array[1]["type"], "QUILL");

        let object = p.clone().into_object();
        assert::key_order(&object, &["title", "body"]);
        let reversed = p.into_reversed_object();
        assert::key_order(&reversed, &["body", "title"]);
    }

    #[test]
    fn quill_slug_is_optional() {
        assert!(quill_value("A", None)["heading"].get("slug").is_none());
        assert_eq!(quill_value("A", Some("a"))["heading"]["slug"], "a");
    }

    #[test]
    fn schema_fixtures() {
        assert_eq!(schemas::article().len(), 3);
        let id = Uuid::now_v7();
        let schema = schemas::with_group("seo", id, true);
        let def = schema.get("seo").unwrap();
        assert!(def.is_array);
        assert_eq!(def.group_ref, Some(id));
        assert_eq!(group_value(id, json!({}))["_id"], id.to_string());
    }

    #[test]
    fn test_assertions() {
        let json = json!({"name": "test", "value": 42});
        assert::has_key(&json, "name");
        assert::json_eq(&json, &json!({"name": "test", "value": 42}));
        assert::contains("hello world", "world");
    }
}
