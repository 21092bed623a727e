//! Validation of untrusted content payloads.
//!
//! Turns an arbitrary JSON value into props that conform to a schema,
//! resolving GROUP_POINTER props through a [`GroupResolver`] and recursing
//! into the group's own schema.
//!
//! A prop collection is either an array of prop objects
//! (`{"name": "title", "type": "STRING", "value": "Hello"}`) or an object
//! keyed by prop name whose values are prop objects (`{"type", "value"}`)
//! or bare values typed by the schema. Output follows schema order no
//! matter how the input was ordered; absent optional props are omitted.

use std::borrow::Cow;
use std::collections::HashMap;

use anyhow::Context;
use chrono::DateTime;
use folio_sdk::types::{
    EntryId, GroupPointerValue, Multi, Prop, PropDefinition, PropType, PropValue, QuillBlock,
    QuillHeading, QuillValue, Schema,
};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use super::BoxFuture;
use super::path::PropPath;
use super::slug::{is_url_safe, slugify};
use crate::config::DEFAULT_MAX_GROUP_DEPTH;
use crate::error::{ContentResult, ValidationError, ValidationErrorKind};
use crate::store::GroupResolver;

static NULL: Value = Value::Null;

/// Validate `raw` against `schema` with the default group depth bound.
pub async fn validate(
    raw: &Value,
    schema: &Schema,
    resolver: &dyn GroupResolver,
    path: &str,
) -> ContentResult<Vec<Prop>> {
    Validator::new(resolver, DEFAULT_MAX_GROUP_DEPTH)
        .validate(raw, schema, path)
        .await
}

/// Schema validator for untrusted payloads.
///
/// Holds no state between calls; a single validator may serve any number
/// of concurrent validations.
pub struct Validator<'r> {
    resolver: &'r dyn GroupResolver,
    max_depth: usize,
}

impl<'r> Validator<'r> {
    /// `max_depth` is the number of nested group levels a payload may use.
    pub fn new(resolver: &'r dyn GroupResolver, max_depth: usize) -> Self {
        Self {
            resolver,
            max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Validate a prop collection. `path` prefixes every error location
    /// (e.g. `entry[0]`); pass `""` for none.
    pub async fn validate(
        &self,
        raw: &Value,
        schema: &Schema,
        path: &str,
    ) -> ContentResult<Vec<Prop>> {
        self.validate_props(raw, schema, PropPath::new(path), 0)
            .await
    }

    fn validate_props<'a>(
        &'a self,
        raw: &'a Value,
        schema: &'a Schema,
        path: PropPath,
        depth: usize,
    ) -> BoxFuture<'a, ContentResult<Vec<Prop>>> {
        Box::pin(async move {
            let elements = collect_elements(raw, schema, &path)?;

            let mut props = Vec::with_capacity(elements.len());
            for def in schema {
                let prop_path = path.prop(&def.name);
                let value = match elements.get(def.name.as_str()) {
                    Some(value) if !value.is_null() => *value,
                    _ if def.required => {
                        return Err(ValidationError::missing_field(&prop_path).into());
                    }
                    _ => continue,
                };
                let value = self.validate_value(def, value, &prop_path, depth).await?;
                props.push(Prop::new(def.name.clone(), value));
            }
            Ok(props)
        })
    }

    async fn validate_value(
        &self,
        def: &PropDefinition,
        value: &Value,
        path: &PropPath,
        depth: usize,
    ) -> ContentResult<PropValue> {
        let value = match def.prop_type {
            PropType::String => PropValue::String(multi(def, value, path, parse_string)?),
            PropType::Number => PropValue::Number(multi(def, value, path, parse_number)?),
            PropType::Boolean => PropValue::Boolean(multi(def, value, path, parse_boolean)?),
            PropType::Date => PropValue::Date(multi(def, value, path, parse_date)?),
            PropType::Quill => {
                if def.is_array {
                    return Err(ValidationError::new(
                        ValidationErrorKind::TypeMismatch,
                        path,
                        "QUILL props cannot be arrays",
                    )
                    .into());
                }
                PropValue::Quill(parse_quill(value, path)?)
            }
            PropType::GroupPointer => {
                PropValue::GroupPointer(self.validate_group(def, value, path, depth).await?)
            }
            PropType::EntryPointer => {
                PropValue::EntryPointer(multi(def, value, path, parse_entry_id)?)
            }
        };
        Ok(value)
    }

    async fn validate_group(
        &self,
        def: &PropDefinition,
        value: &Value,
        path: &PropPath,
        depth: usize,
    ) -> ContentResult<GroupPointerValue> {
        let Some(group_id) = def.group_ref else {
            return Err(ValidationError::new(
                ValidationErrorKind::UnknownGroup,
                path,
                "prop definition has no group reference",
            )
            .into());
        };
        if depth >= self.max_depth {
            return Err(ValidationError::recursion_limit(path, self.max_depth).into());
        }
        check_group_id(value, group_id, path)?;

        let schema = self
            .resolver
            .group_schema(group_id)
            .await
            .with_context(|| format!("failed to resolve group '{group_id}'"))?
            .ok_or_else(|| ValidationError::unknown_group(path, group_id))?;
        debug!(group_id = %group_id, depth = depth + 1, path = %path, "resolved group schema");

        let items = if def.is_array {
            let raw_items = group_items(value, path)?;
            let mut items = Vec::with_capacity(raw_items.len());
            for (i, raw) in raw_items.iter().enumerate() {
                let item_path = path.index(i);
                let raw = group_props(raw, &schema, &item_path)?;
                items.push(
                    self.validate_props(&raw, &schema, item_path, depth + 1)
                        .await?,
                );
            }
            Multi::Many(items)
        } else {
            let raw = group_props(value, &schema, path)?;
            Multi::One(
                self.validate_props(&raw, &schema, path.clone(), depth + 1)
                    .await?,
            )
        };

        Ok(GroupPointerValue { group_id, items })
    }
}

/// Index a raw prop collection by name, rejecting unknown, duplicate and
/// mistyped props.
fn collect_elements<'a>(
    raw: &'a Value,
    schema: &Schema,
    path: &PropPath,
) -> Result<HashMap<&'a str, &'a Value>, ValidationError> {
    let mut elements = HashMap::new();

    match raw {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let item_path = path.prop(&i.to_string());
                let Some(obj) = item.as_object() else {
                    return Err(ValidationError::type_mismatch(
                        &item_path,
                        "prop object",
                        json_kind(item),
                    ));
                };
                let name = required_str(obj, "name", &item_path)?;
                let declared = match obj.get("type") {
                    Some(t) if !t.is_null() => t,
                    _ => return Err(ValidationError::missing_field(path.prop(name).field("type"))),
                };
                let value = obj.get("value").unwrap_or(&NULL);
                accept(&mut elements, schema, path, name, Some(declared), value)?;
            }
        }
        Value::Object(map) => {
            for (name, item) in map {
                let (declared, value) = match typed_wrapper(item, schema.get(name)) {
                    Some((declared, value)) => (Some(declared), value),
                    None => (None, item),
                };
                accept(&mut elements, schema, path, name, declared, value)?;
            }
        }
        other => {
            return Err(ValidationError::type_mismatch(
                path.collection(),
                "array or object of props",
                json_kind(other),
            ));
        }
    }

    Ok(elements)
}

/// Split a `{type, value}` wrapper in the object form. A group's own props
/// may be named `type` and `value`, so for group props only a wrapper
/// declaring `GROUP_POINTER` counts.
fn typed_wrapper<'a>(
    item: &'a Value,
    def: Option<&PropDefinition>,
) -> Option<(&'a Value, &'a Value)> {
    let obj = item.as_object()?;
    let declared = obj.get("type")?;
    let value = obj.get("value")?;
    if let Some(def) = def
        && def.prop_type == PropType::GroupPointer
        && declared.as_str() != Some(PropType::GroupPointer.as_str())
    {
        return None;
    }
    Some((declared, value))
}

fn accept<'a>(
    elements: &mut HashMap<&'a str, &'a Value>,
    schema: &Schema,
    path: &PropPath,
    name: &'a str,
    declared: Option<&'a Value>,
    value: &'a Value,
) -> Result<(), ValidationError> {
    let prop_path = path.prop(name);
    let Some(def) = schema.get(name) else {
        return Err(ValidationError::unknown_prop(&prop_path, name, &schema.names()));
    };

    if let Some(declared) = declared {
        let type_path = prop_path.field("type");
        let Some(type_name) = declared.as_str() else {
            return Err(ValidationError::type_mismatch(
                &type_path,
                "type name",
                json_kind(declared),
            ));
        };
        let Some(prop_type) = PropType::parse(type_name) else {
            return Err(ValidationError::unknown_type(&type_path, type_name));
        };
        if prop_type != def.prop_type {
            return Err(ValidationError::type_mismatch(
                &prop_path,
                def.prop_type.as_str(),
                prop_type.as_str(),
            ));
        }
    }

    if elements.insert(name, value).is_some() {
        return Err(ValidationError::duplicate_prop(&prop_path, name));
    }
    Ok(())
}

/// Apply `parse` to a single value or to each element of an array,
/// following the definition's `is_array`.
fn multi<T>(
    def: &PropDefinition,
    value: &Value,
    path: &PropPath,
    parse: fn(&Value, &PropPath) -> Result<T, ValidationError>,
) -> Result<Multi<T>, ValidationError> {
    if !def.is_array {
        return parse(value, path).map(Multi::One);
    }
    let Some(items) = value.as_array() else {
        return Err(ValidationError::type_mismatch(
            path,
            &format!("array of {}", def.prop_type),
            json_kind(value),
        ));
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse(item, &path.index(i)))
        .collect::<Result<Vec<_>, _>>()
        .map(Multi::Many)
}

fn parse_string(value: &Value, path: &PropPath) -> Result<String, ValidationError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ValidationError::type_mismatch(path, "STRING", json_kind(value)))
}

fn parse_number(value: &Value, path: &PropPath) -> Result<f64, ValidationError> {
    value
        .as_f64()
        .ok_or_else(|| ValidationError::type_mismatch(path, "NUMBER", json_kind(value)))
}

fn parse_boolean(value: &Value, path: &PropPath) -> Result<bool, ValidationError> {
    value
        .as_bool()
        .ok_or_else(|| ValidationError::type_mismatch(path, "BOOLEAN", json_kind(value)))
}

/// Dates are unix milliseconds, or RFC 3339 strings converted to them.
fn parse_date(value: &Value, path: &PropPath) -> Result<i64, ValidationError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|d| d.timestamp_millis()),
        _ => None,
    };
    parsed.ok_or_else(|| {
        ValidationError::type_mismatch(
            path,
            "DATE (unix milliseconds or RFC 3339 string)",
            json_kind(value),
        )
    })
}

fn parse_entry_id(value: &Value, path: &PropPath) -> Result<EntryId, ValidationError> {
    let raw = match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(obj) => obj.get("_id").and_then(Value::as_str),
        _ => None,
    };
    raw.and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| ValidationError::type_mismatch(path, "ENTRY_POINTER (entry id)", json_kind(value)))
}

fn parse_quill(value: &Value, path: &PropPath) -> Result<QuillValue, ValidationError> {
    let Some(obj) = value.as_object() else {
        return Err(ValidationError::type_mismatch(
            path,
            "QUILL (object with heading and blocks)",
            json_kind(value),
        ));
    };

    let heading_path = path.field("heading");
    let heading = required_object(obj, "heading", path)?;
    let text = required_str(heading, "text", &heading_path)?;

    let slug_path = heading_path.field("slug");
    let slug = match heading.get("slug") {
        None | Some(Value::Null) => slugify(text),
        Some(Value::String(s)) if s.is_empty() => slugify(text),
        Some(Value::String(s)) if is_url_safe(s) => s.clone(),
        Some(Value::String(_)) => {
            return Err(ValidationError::new(
                ValidationErrorKind::TypeMismatch,
                &slug_path,
                "expected a URL-safe slug (lowercase letters, digits and single hyphens)",
            ));
        }
        Some(other) => {
            return Err(ValidationError::type_mismatch(
                &slug_path,
                "string",
                json_kind(other),
            ));
        }
    };
    if slug.is_empty() {
        return Err(ValidationError::new(
            ValidationErrorKind::MissingField,
            &slug_path,
            "slug could not be derived from the heading text",
        ));
    }

    let blocks_path = path.field("blocks");
    let raw_blocks = match obj.get("blocks") {
        Some(Value::Array(blocks)) => blocks,
        Some(other) if !other.is_null() => {
            return Err(ValidationError::type_mismatch(
                &blocks_path,
                "array",
                json_kind(other),
            ));
        }
        _ => return Err(ValidationError::missing_field(&blocks_path)),
    };

    let mut blocks = Vec::with_capacity(raw_blocks.len());
    for (i, block) in raw_blocks.iter().enumerate() {
        let block_path = blocks_path.index(i);
        let Some(block) = block.as_object() else {
            return Err(ValidationError::type_mismatch(
                &block_path,
                "block object",
                json_kind(block),
            ));
        };
        blocks.push(QuillBlock {
            block_type: required_str(block, "type", &block_path)?.to_string(),
            value: block.get("value").cloned().unwrap_or(Value::Null),
        });
    }

    Ok(QuillValue {
        heading: QuillHeading {
            text: text.to_string(),
            slug,
        },
        blocks,
    })
}

/// A raw group value may name its group with `_id`; it must agree with
/// the definition.
fn check_group_id(value: &Value, group_id: Uuid, path: &PropPath) -> Result<(), ValidationError> {
    let Some(raw_id) = value.as_object().and_then(|obj| obj.get("_id")) else {
        return Ok(());
    };
    let matches = raw_id
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .is_some_and(|id| id == group_id);
    if matches {
        Ok(())
    } else {
        Err(ValidationError::new(
            ValidationErrorKind::TypeMismatch,
            path.field("_id"),
            format!("expected group '{group_id}', found {raw_id}"),
        ))
    }
}

/// Raw elements of an array GROUP_POINTER: a JSON array, or `{"items": [...]}`.
fn group_items<'v>(value: &'v Value, path: &PropPath) -> Result<&'v Vec<Value>, ValidationError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(obj) => match obj.get("items") {
            Some(Value::Array(items)) => Ok(items),
            Some(other) if !other.is_null() => Err(ValidationError::type_mismatch(
                path.field("items"),
                "array",
                json_kind(other),
            )),
            _ => Err(ValidationError::missing_field(path.field("items"))),
        },
        other => Err(ValidationError::type_mismatch(
            path,
            "array of group content",
            json_kind(other),
        )),
    }
}

/// Raw prop collection of one group value: `{"props": ...}`, or the value
/// itself with any `_id` key set aside.
fn group_props<'v>(
    value: &'v Value,
    schema: &Schema,
    path: &PropPath,
) -> Result<Cow<'v, Value>, ValidationError> {
    match value {
        Value::Object(obj) => {
            if schema.get("props").is_none()
                && let Some(inner) = obj.get("props")
            {
                return Ok(Cow::Borrowed(inner));
            }
            if schema.get("_id").is_none() && obj.contains_key("_id") {
                let stripped: Map<String, Value> = obj
                    .iter()
                    .filter(|(k, _)| k.as_str() != "_id")
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                return Ok(Cow::Owned(Value::Object(stripped)));
            }
            Ok(Cow::Borrowed(value))
        }
        Value::Array(_) => Ok(Cow::Borrowed(value)),
        other => Err(ValidationError::type_mismatch(
            path,
            "GROUP_POINTER (group content)",
            json_kind(other),
        )),
    }
}

fn required_object<'v>(
    obj: &'v Map<String, Value>,
    key: &str,
    parent: &PropPath,
) -> Result<&'v Map<String, Value>, ValidationError> {
    match obj.get(key) {
        Some(Value::Object(inner)) => Ok(inner),
        Some(other) if !other.is_null() => Err(ValidationError::type_mismatch(
            parent.field(key),
            "object",
            json_kind(other),
        )),
        _ => Err(ValidationError::missing_field(parent.field(key))),
    }
}

fn required_str<'v>(
    obj: &'v Map<String, Value>,
    key: &str,
    parent: &PropPath,
) -> Result<&'v str, ValidationError> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) if !other.is_null() => Err(ValidationError::type_mismatch(
            parent.field(key),
            "string",
            json_kind(other),
        )),
        _ => Err(ValidationError::missing_field(parent.field(key))),
    }
}

/// JSON kind name for messages.
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
