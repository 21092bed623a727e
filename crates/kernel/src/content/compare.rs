//! Structural comparison of typed props against a schema.
//!
//! Where validation parses untrusted JSON, comparison checks props that are
//! already typed: that each one is defined by the schema with the same type
//! and arity, that required props are present, and that group contents
//! match their group's schema all the way down. Matching is by name, so
//! prop order does not matter.

use std::collections::HashSet;

use anyhow::Context;
use folio_sdk::types::{GroupPointerValue, Prop, PropDefinition, PropValue, Schema};

use super::BoxFuture;
use super::path::PropPath;
use crate::config::DEFAULT_MAX_GROUP_DEPTH;
use crate::error::{ContentError, ContentResult, SchemaMismatchError, ValidationError};
use crate::store::GroupResolver;

/// Compare `props` with `schema` using the default group depth bound.
pub async fn compare(
    props: &[Prop],
    schema: &Schema,
    resolver: &dyn GroupResolver,
    path: &str,
) -> ContentResult<()> {
    Comparator::new(resolver, DEFAULT_MAX_GROUP_DEPTH)
        .compare(props, schema, path)
        .await
}

pub struct Comparator<'r> {
    resolver: &'r dyn GroupResolver,
    max_depth: usize,
}

impl<'r> Comparator<'r> {
    pub fn new(resolver: &'r dyn GroupResolver, max_depth: usize) -> Self {
        Self {
            resolver,
            max_depth,
        }
    }

    /// Succeeds when `props` conforms to `schema`.
    pub async fn compare(&self, props: &[Prop], schema: &Schema, path: &str) -> ContentResult<()> {
        self.compare_props(props, schema, PropPath::new(path), 0)
            .await
    }

    fn compare_props<'a>(
        &'a self,
        props: &'a [Prop],
        schema: &'a Schema,
        path: PropPath,
        depth: usize,
    ) -> BoxFuture<'a, ContentResult<()>> {
        Box::pin(async move {
            if props.len() > schema.len() {
                return Err(SchemaMismatchError::new(
                    path.collection(),
                    format!(
                        "cardinality mismatch: {} props for {} definitions",
                        props.len(),
                        schema.len()
                    ),
                )
                .into());
            }

            let mut seen = HashSet::with_capacity(props.len());
            for prop in props {
                let prop_path = path.prop(&prop.name);
                if !seen.insert(prop.name.as_str()) {
                    return Err(mismatch(&prop_path, format!("duplicate prop '{}'", prop.name)));
                }
                let Some(def) = schema.get(&prop.name) else {
                    return Err(mismatch(
                        &prop_path,
                        format!(
                            "name mismatch: '{}' is not one of {}",
                            prop.name,
                            schema.names()
                        ),
                    ));
                };
                self.compare_prop(prop, def, &prop_path, depth).await?;
            }

            if let Some(missing) = schema
                .iter()
                .find(|def| def.required && !seen.contains(def.name.as_str()))
            {
                return Err(mismatch(&path.prop(&missing.name), "missing required prop"));
            }
            Ok(())
        })
    }

    async fn compare_prop(
        &self,
        prop: &Prop,
        def: &PropDefinition,
        path: &PropPath,
        depth: usize,
    ) -> ContentResult<()> {
        let found = prop.prop_type();
        if found != def.prop_type {
            return Err(mismatch(
                path,
                format!("type mismatch: expected {}, found {found}", def.prop_type),
            ));
        }
        if prop.value.is_array() != def.is_array {
            let arity = |is_array: bool| if is_array { "an array" } else { "a single value" };
            return Err(mismatch(
                path,
                format!(
                    "array mismatch: expected {}, found {}",
                    arity(def.is_array),
                    arity(prop.value.is_array())
                ),
            ));
        }

        match &prop.value {
            PropValue::GroupPointer(group) => self.compare_group(group, def, path, depth).await,
            _ => Ok(()),
        }
    }

    async fn compare_group(
        &self,
        group: &GroupPointerValue,
        def: &PropDefinition,
        path: &PropPath,
        depth: usize,
    ) -> ContentResult<()> {
        if def.group_ref != Some(group.group_id) {
            let expected = def
                .group_ref
                .map_or_else(|| "none".to_string(), |id| id.to_string());
            return Err(mismatch(
                path,
                format!(
                    "group mismatch: expected group '{expected}', found '{}'",
                    group.group_id
                ),
            ));
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

        if group.items.is_array() {
            for (i, item) in group.items.iter().enumerate() {
                self.compare_props(item, &schema, path.index(i), depth + 1)
                    .await?;
            }
        } else {
            for item in group.items.iter() {
                self.compare_props(item, &schema, path.clone(), depth + 1)
                    .await?;
            }
        }
        Ok(())
    }
}

fn mismatch(path: &PropPath, description: impl Into<String>) -> ContentError {
    SchemaMismatchError::new(path, description).into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::content::validate::validate;
    use crate::models::Group;
    use crate::store::MemoryStore;
    use folio_sdk::types::{Multi, PropType};
    use serde_json::json;
    use uuid::Uuid;

    fn string(name: &str, value: &str) -> Prop {
        Prop::new(name, PropValue::String(Multi::One(value.into())))
    }

    fn schema() -> Schema {
        Schema::new(vec![
            PropDefinition::new("title", PropType::String).required(),
            PropDefinition::new("subtitle", PropType::String),
        ])
    }

    fn description(err: ContentError) -> String {
        match err {
            ContentError::SchemaMismatch(e) => e.description,
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn order_does_not_matter() {
        let store = MemoryStore::new();
        let props = vec![string("subtitle", "b"), string("title", "a")];
        compare(&props, &schema(), &store, "").await.unwrap();
    }

    #[tokio::test]
    async fn cardinality_and_names() {
        let store = MemoryStore::new();

        let props = vec![string("title", "a"), string("subtitle", "b"), string("x", "c")];
        let err = compare(&props, &schema(), &store, "").await.unwrap_err();
        assert!(description(err).starts_with("cardinality mismatch"));

        let props = vec![string("title", "a"), string("other", "b")];
        let err = compare(&props, &schema(), &store, "").await.unwrap_err();
        assert!(description(err).starts_with("name mismatch"));

        let props = vec![string("title", "a"), string("title", "b")];
        let err = compare(&props, &schema(), &store, "").await.unwrap_err();
        assert!(description(err).starts_with("duplicate prop"));
    }

    #[tokio::test]
    async fn type_and_arity() {
        let store = MemoryStore::new();

        let props = vec![Prop::new("title", PropValue::Number(Multi::One(1.0)))];
        let err = compare(&props, &schema(), &store, "").await.unwrap_err();
        assert_eq!(description(err), "type mismatch: expected STRING, found NUMBER");

        let props = vec![Prop::new(
            "title",
            PropValue::String(Multi::Many(vec!["a".into()])),
        )];
        let err = compare(&props, &schema(), &store, "").await.unwrap_err();
        assert!(description(err).starts_with("array mismatch"));
    }

    #[tokio::test]
    async fn missing_required() {
        let store = MemoryStore::new();
        let props = vec![string("subtitle", "b")];
        let err = compare(&props, &schema(), &store, "entry[0]").await.unwrap_err();
        let ContentError::SchemaMismatch(e) = err else {
            panic!("expected schema mismatch");
        };
        assert_eq!(e.path, "entry[0].props[title]");
        assert_eq!(e.description, "missing required prop");
    }

    #[tokio::test]
    async fn groups_are_compared_recursively() {
        let store = MemoryStore::new();
        let group = Group::new(
            "seo",
            Schema::new(vec![PropDefinition::new("keywords", PropType::String).array()]),
        );
        store.insert_group(group.clone());
        let schema = Schema::new(vec![PropDefinition::group("seo", group.id)]);

        let props = validate(&json!({"seo": {"keywords": ["a"]}}), &schema, &store, "")
            .await
            .unwrap();
        compare(&props, &schema, &store, "").await.unwrap();

        let wrong = vec![Prop::new(
            "seo",
            PropValue::GroupPointer(GroupPointerValue {
                group_id: group.id,
                items: Multi::One(vec![string("keywords", "a")]),
            }),
        )];
        let err = compare(&wrong, &schema, &store, "").await.unwrap_err();
        let ContentError::SchemaMismatch(e) = err else {
            panic!("expected schema mismatch");
        };
        assert_eq!(e.path, "props[seo].keywords");

        let other_group = vec![Prop::new(
            "seo",
            PropValue::GroupPointer(GroupPointerValue {
                group_id: Uuid::now_v7(),
                items: Multi::One(vec![]),
            }),
        )];
        let err = compare(&other_group, &schema, &store, "").await.unwrap_err();
        assert!(description(err).starts_with("group mismatch"));
    }

    #[tokio::test]
    async fn missing_group_is_not_found() {
        let store = MemoryStore::new();
        let id = Uuid::now_v7();
        let schema = Schema::new(vec![PropDefinition::group("g", id)]);
        let props = vec![Prop::new(
            "g",
            PropValue::GroupPointer(GroupPointerValue {
                group_id: id,
                items: Multi::One(vec![]),
            }),
        )];
        let err = compare(&props, &schema, &store, "").await.unwrap_err();
        assert!(matches!(err, ContentError::NotFound { kind: "group", .. }));
    }
}
