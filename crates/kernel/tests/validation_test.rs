#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for payload validation and structural comparison.

use folio_kernel::content::{Comparator, EntryMeta, Validator, compare, compile, validate};
use folio_kernel::error::{ContentError, ValidationErrorKind};
use folio_kernel::models::{EntryContent, Group};
use folio_kernel::store::MemoryStore;
use folio_sdk::types::{PropDefinition, PropType, Schema};
use folio_test_utils::{assert, group_value, payload, quill_value, schemas};
use serde_json::{Value, json};
use uuid::Uuid;

fn kind_and_path(err: ContentError) -> (ValidationErrorKind, String) {
    match err {
        ContentError::Validation(e) => (e.kind, e.path),
        other => panic!("expected validation error, got {other:?}"),
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn required_prop_missing_from_empty_payload() {
    let store = MemoryStore::new();
    let schema = Schema::new(vec![PropDefinition::new("title", PropType::String).required()]);

    let err = validate(&json!([]), &schema, &store, "").await.unwrap_err();
    assert_eq!(
        kind_and_path(err),
        (ValidationErrorKind::MissingField, "props[title]".to_string())
    );
}

#[tokio::test]
async fn group_prop_type_mismatch_reports_nested_path() {
    let store = MemoryStore::new();
    let group = Group::new(
        "G",
        Schema::new(vec![PropDefinition::new("x", PropType::Number)]),
    );
    store.insert_group(group.clone());
    let schema = schemas::with_group("g", group.id, false);

    let raw = json!({"g": {"props": {"x": "not-a-number"}}});
    let err = validate(&raw, &schema, &store, "").await.unwrap_err();
    assert_eq!(
        kind_and_path(err),
        (ValidationErrorKind::TypeMismatch, "props[g].x".to_string())
    );
}

// ============================================================================
// Properties
// ============================================================================

#[tokio::test]
async fn output_follows_schema_order_for_any_input_order() {
    let store = MemoryStore::new();
    let schema = schemas::article();
    let build = || {
        payload()
            .string("title", "Hello")
            .quill("body", "Intro", None)
            .prop("tags", PropType::String, json!(["a", "b"]))
    };

    let forward = validate(&build().into_array(), &schema, &store, "")
        .await
        .unwrap();
    let reversed = validate(&build().into_reversed_object(), &schema, &store, "")
        .await
        .unwrap();
    assert_eq!(forward, reversed);

    let meta = EntryMeta {
        id: Uuid::nil(),
        created_at: 0,
        updated_at: 0,
        owner_id: "u".into(),
    };
    let docs = compile(&[EntryContent::new("en", reversed)], &meta, &schema, &store)
        .await
        .unwrap();
    assert::key_order(
        &Value::Object(docs[0].data.clone()),
        &["_id", "createdAt", "updatedAt", "user", "title", "body", "tags"],
    );
}

#[tokio::test]
async fn validated_props_always_compare() {
    let store = MemoryStore::new();
    let seo = Group::new(
        "seo",
        Schema::new(vec![
            PropDefinition::new("keywords", PropType::String).array(),
            PropDefinition::new("score", PropType::Number).required(),
        ]),
    );
    store.insert_group(seo.clone());

    let mut defs: Vec<PropDefinition> = schemas::product().iter().cloned().collect();
    defs.push(PropDefinition::group("seo", seo.id).array());
    let schema = Schema::new(defs);

    let payloads = [
        json!({"name": "Lamp", "price": 10}),
        json!({
            "name": "Desk",
            "price": 99.5,
            "available": true,
            "released": "2024-02-01T00:00:00Z",
            "related": [Uuid::now_v7().to_string()],
            "seo": [
                group_value(seo.id, json!({"score": 1})),
                {"keywords": ["wood"], "score": 2},
            ],
        }),
        json!([
            {"name": "price", "type": "NUMBER", "value": 1},
            {"name": "name", "type": "STRING", "value": "Chair"},
            {"name": "seo", "type": "GROUP_POINTER", "value": {"items": []}},
        ]),
    ];

    for raw in &payloads {
        let props = validate(raw, &schema, &store, "").await.unwrap();
        compare(&props, &schema, &store, "").await.unwrap();
    }
}

#[tokio::test]
async fn validate_then_compile_is_deterministic() {
    let store = MemoryStore::new();
    let schema = schemas::article();
    let raw = payload()
        .quill("body", "Déjà vu", None)
        .string("title", "x")
        .into_object();
    let meta = EntryMeta {
        id: Uuid::now_v7(),
        created_at: 5,
        updated_at: 6,
        owner_id: "u".into(),
    };

    let mut rendered = Vec::new();
    for _ in 0..3 {
        let props = validate(&raw, &schema, &store, "").await.unwrap();
        let docs = compile(&[EntryContent::new("en", props)], &meta, &schema, &store)
            .await
            .unwrap();
        rendered.push(serde_json::to_string(&docs).unwrap());
    }
    assert!(rendered.windows(2).all(|w| w[0] == w[1]));
    assert::contains(&rendered[0], "\"slug\":\"d-j-vu\"");
}

// ============================================================================
// Depth bound
// ============================================================================

/// Groups chained `levels` deep; the last one holds a NUMBER.
fn group_chain(store: &MemoryStore, levels: usize) -> Schema {
    let mut inner = Schema::new(vec![PropDefinition::new("x", PropType::Number)]);
    for level in 0..levels {
        let group = Group::new(&format!("level{level}"), inner);
        store.insert_group(group.clone());
        inner = Schema::new(vec![PropDefinition::group("next", group.id)]);
    }
    inner
}

#[tokio::test]
async fn acyclic_nesting_respects_the_bound() {
    let store = MemoryStore::new();
    // Top-level schema with a single `next` group prop, three groups deep.
    let schema = group_chain(&store, 3);
    let raw = json!({"next": {"next": {"next": {"x": 1}}}});

    let props = Validator::new(&store, 3)
        .validate(&raw, &schema, "")
        .await
        .unwrap();
    Comparator::new(&store, 3)
        .compare(&props, &schema, "")
        .await
        .unwrap();

    let err = Validator::new(&store, 2)
        .validate(&raw, &schema, "")
        .await
        .unwrap_err();
    assert_eq!(
        kind_and_path(err),
        (
            ValidationErrorKind::RecursionLimit,
            "props[next].next.next".to_string()
        )
    );

    let err = Comparator::new(&store, 2)
        .compare(&props, &schema, "")
        .await
        .unwrap_err();
    assert_eq!(err.validation_kind(), Some(ValidationErrorKind::RecursionLimit));
}

#[tokio::test]
async fn cyclic_groups_terminate() {
    let store = MemoryStore::new();
    let id = Uuid::now_v7();
    store.insert_group(
        Group::new(
            "node",
            Schema::new(vec![PropDefinition::group("child", id).required()]),
        )
        .with_id(id),
    );
    let schema = schemas::with_group("root", id, false);

    // Every level requires another, so only the bound stops the walk.
    let mut raw = json!({});
    for _ in 0..40 {
        raw = json!({"child": raw});
    }
    let err = validate(&json!({"root": raw}), &schema, &store, "")
        .await
        .unwrap_err();
    assert_eq!(err.validation_kind(), Some(ValidationErrorKind::RecursionLimit));
}

// ============================================================================
// Payload shapes
// ============================================================================

#[tokio::test]
async fn quill_payloads() {
    let store = MemoryStore::new();
    let schema = Schema::new(vec![PropDefinition::new("body", PropType::Quill).required()]);

    let ok = validate(
        &json!({"body": quill_value("Hello", Some("custom-slug"))}),
        &schema,
        &store,
        "entry[0]",
    )
    .await
    .unwrap();
    assert_eq!(ok[0].as_quill().unwrap().heading.slug, "custom-slug");

    let err = validate(
        &json!({"body": {"heading": {"text": "???"}, "blocks": []}}),
        &schema,
        &store,
        "entry[0]",
    )
    .await
    .unwrap_err();
    assert_eq!(
        kind_and_path(err),
        (
            ValidationErrorKind::MissingField,
            "entry[0].props[body].heading.slug".to_string()
        )
    );

    let err = validate(
        &json!({"body": {"heading": {"text": "A"}, "blocks": [{"value": 1}]}}),
        &schema,
        &store,
        "",
    )
    .await
    .unwrap_err();
    assert_eq!(
        kind_and_path(err),
        (
            ValidationErrorKind::MissingField,
            "props[body].blocks[0].type".to_string()
        )
    );
}

#[tokio::test]
async fn group_id_must_match_definition() {
    let store = MemoryStore::new();
    let group = Group::new("g", Schema::default());
    store.insert_group(group.clone());
    let schema = schemas::with_group("g", group.id, false);

    let err = validate(
        &json!({"g": group_value(Uuid::now_v7(), json!({}))}),
        &schema,
        &store,
        "",
    )
    .await
    .unwrap_err();
    assert_eq!(
        kind_and_path(err),
        (ValidationErrorKind::TypeMismatch, "props[g]._id".to_string())
    );
}
