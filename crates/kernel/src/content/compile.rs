//! Compilation of stored entries into public documents.
//!
//! A compiled document is a flat JSON object per language: entry metadata
//! first, then one key per prop in schema declaration order. Group contents
//! follow their group's declared order. Props the schema no longer declares
//! come last, in stored order. Equal content compiles to identical bytes
//! whatever order it was stored in.

use anyhow::Context;
use folio_sdk::types::{
    EntryId, GroupPointerValue, Multi, Prop, PropDefinition, PropValue, QuillValue, Schema,
};
use serde::Serialize;
use serde_json::{Map, Number, Value};

use super::BoxFuture;
use super::path::PropPath;
use crate::config::DEFAULT_MAX_GROUP_DEPTH;
use crate::error::{ContentError, ContentResult, ValidationError};
use crate::models::{Entry, EntryContent};
use crate::store::GroupResolver;

/// Keys reserved for entry metadata in a compiled document.
pub const META_KEYS: [&str; 4] = ["_id", "createdAt", "updatedAt", "user"];

/// Integers up to this magnitude survive a round trip through `f64`.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Entry metadata written at the top of every compiled document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta {
    pub id: EntryId,
    pub created_at: i64,
    pub updated_at: i64,
    pub owner_id: String,
}

impl From<&Entry> for EntryMeta {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
            owner_id: entry.user_id.clone(),
        }
    }
}

/// One language's compiled view of an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledDocument {
    pub lng: String,
    pub data: Map<String, Value>,
}

/// Compile every content block against `schema` using the default group
/// depth bound.
pub async fn compile(
    content: &[EntryContent],
    meta: &EntryMeta,
    schema: &Schema,
    resolver: &dyn GroupResolver,
) -> ContentResult<Vec<CompiledDocument>> {
    Compiler::new(resolver, DEFAULT_MAX_GROUP_DEPTH)
        .compile(content, meta, schema)
        .await
}

/// Compile a stored entry against its template's schema.
pub async fn compile_entry(
    entry: &Entry,
    schema: &Schema,
    resolver: &dyn GroupResolver,
) -> ContentResult<Vec<CompiledDocument>> {
    Compiler::new(resolver, DEFAULT_MAX_GROUP_DEPTH)
        .compile_entry(entry, schema)
        .await
}

pub struct Compiler<'r> {
    resolver: &'r dyn GroupResolver,
    max_depth: usize,
}

impl<'r> Compiler<'r> {
    pub fn new(resolver: &'r dyn GroupResolver, max_depth: usize) -> Self {
        Self {
            resolver,
            max_depth,
        }
    }

    /// One document per content block, in block order.
    pub async fn compile(
        &self,
        content: &[EntryContent],
        meta: &EntryMeta,
        schema: &Schema,
    ) -> ContentResult<Vec<CompiledDocument>> {
        let mut docs = Vec::with_capacity(content.len());
        for (i, block) in content.iter().enumerate() {
            let path = PropPath::new(&format!("entry[{i}]"));
            let props = self.arrange(&block.props, schema, path, 0).await?;
            docs.push(CompiledDocument {
                lng: block.lng.clone(),
                data: compile_block(&props, meta),
            });
        }
        Ok(docs)
    }

    pub async fn compile_entry(
        &self,
        entry: &Entry,
        schema: &Schema,
    ) -> ContentResult<Vec<CompiledDocument>> {
        self.compile(&entry.content, &EntryMeta::from(entry), schema)
            .await
    }

    /// Reorder `props` to follow `schema`, recursing into groups.
    fn arrange<'a>(
        &'a self,
        props: &'a [Prop],
        schema: &'a Schema,
        path: PropPath,
        depth: usize,
    ) -> BoxFuture<'a, ContentResult<Vec<Prop>>> {
        Box::pin(async move {
            let mut ordered = Vec::with_capacity(props.len());
            for def in schema.iter() {
                if let Some(prop) = props.iter().find(|p| p.name == def.name) {
                    let prop_path = path.prop(&prop.name);
                    ordered.push(self.arrange_prop(prop, def, &prop_path, depth).await?);
                }
            }
            ordered.extend(
                props
                    .iter()
                    .filter(|p| schema.get(&p.name).is_none())
                    .cloned(),
            );
            Ok(ordered)
        })
    }

    async fn arrange_prop(
        &self,
        prop: &Prop,
        def: &PropDefinition,
        path: &PropPath,
        depth: usize,
    ) -> ContentResult<Prop> {
        let PropValue::GroupPointer(group) = &prop.value else {
            return Ok(prop.clone());
        };
        if def.group_ref != Some(group.group_id) {
            return Ok(prop.clone());
        }
        if depth >= self.max_depth {
            return Err(ValidationError::recursion_limit(path, self.max_depth).into());
        }

        let schema = self
            .resolver
            .group_schema(group.group_id)
            .await
            .with_context(|| format!("failed to resolve group '{}'", group.group_id))?
            .ok_or_else(|| ContentError::not_found("group", group.group_id))?;

        let items = match &group.items {
            Multi::One(item) => {
                Multi::One(self.arrange(item, &schema, path.clone(), depth + 1).await?)
            }
            Multi::Many(list) => {
                let mut arranged = Vec::with_capacity(list.len());
                for (i, item) in list.iter().enumerate() {
                    arranged.push(self.arrange(item, &schema, path.index(i), depth + 1).await?);
                }
                Multi::Many(arranged)
            }
        };
        Ok(Prop::new(
            prop.name.clone(),
            PropValue::GroupPointer(GroupPointerValue {
                group_id: group.group_id,
                items,
            }),
        ))
    }
}

fn compile_block(props: &[Prop], meta: &EntryMeta) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("_id".into(), Value::String(meta.id.hyphenated().to_string()));
    data.insert("createdAt".into(), Value::from(meta.created_at));
    data.insert("updatedAt".into(), Value::from(meta.updated_at));
    let mut user = Map::new();
    user.insert("_id".into(), Value::String(meta.owner_id.clone()));
    data.insert("user".into(), Value::Object(user));

    for prop in props {
        if META_KEYS.contains(&prop.name.as_str()) {
            continue;
        }
        data.insert(prop.name.clone(), compile_value(&prop.value));
    }
    data
}

fn compile_props(props: &[Prop]) -> Value {
    Value::Object(
        props
            .iter()
            .map(|p| (p.name.clone(), compile_value(&p.value)))
            .collect(),
    )
}

fn compile_value(value: &PropValue) -> Value {
    match value {
        PropValue::String(v) => multi(v, |s| Value::String(s.clone())),
        PropValue::Number(v) => multi(v, |n| number(*n)),
        PropValue::Boolean(v) => multi(v, |b| Value::Bool(*b)),
        PropValue::Date(v) => multi(v, |ms| Value::from(*ms)),
        PropValue::Quill(quill) => compile_quill(quill),
        PropValue::GroupPointer(group) => multi(&group.items, |props| compile_props(props)),
        PropValue::EntryPointer(v) => multi(v, |id| Value::String(id.hyphenated().to_string())),
    }
}

fn multi<T>(value: &Multi<T>, f: impl Fn(&T) -> Value) -> Value {
    match value {
        Multi::One(v) => f(v),
        Multi::Many(items) => Value::Array(items.iter().map(f).collect()),
    }
}

/// Whole numbers serialize as integers.
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Value::from(n as i64);
    }
    Number::from_f64(n).map_or(Value::Null, Value::Number)
}

fn compile_quill(quill: &QuillValue) -> Value {
    let mut heading = Map::new();
    heading.insert("text".into(), Value::String(quill.heading.text.clone()));
    heading.insert("slug".into(), Value::String(quill.heading.slug.clone()));

    let blocks = quill
        .blocks
        .iter()
        .map(|block| {
            let mut out = Map::new();
            out.insert("type".into(), Value::String(block.block_type.clone()));
            out.insert("value".into(), block.value.clone());
            Value::Object(out)
        })
        .collect();

    let mut out = Map::new();
    out.insert("heading".into(), Value::Object(heading));
    out.insert("blocks".into(), Value::Array(blocks));
    Value::Object(out)
}
