#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Everything here runs the real engine over a [`MemoryStore`]. The flaky
//! store wrappers delegate to it and fail on demand, so the two-step write
//! rollbacks can be exercised.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use folio_kernel::config::Config;
use folio_kernel::content::{EntryService, RawContent};
use folio_kernel::models::{Entry, Group, Language, Template, TemplateType};
use folio_kernel::store::{EntryStore, MemoryStore, TemplateStore};
use folio_sdk::types::{EntryId, PropDefinition, PropType, Schema, TemplateId};
use folio_test_utils::schemas;
use serde_json::Value;

/// Store, service and fixtures shared by most tests.
pub struct TestEnv {
    pub store: MemoryStore,
    pub service: EntryService,
    /// RICH_CONTENT template named "blog" with the article schema.
    pub blog: Template,
    /// DATA_MODEL template named "products".
    pub products: Template,
    /// Group "seo" with `keywords: STRING[]` and `score: NUMBER`.
    pub seo: Group,
}

pub fn test_env() -> TestEnv {
    test_env_with(&Config::default())
}

pub fn test_env_with(config: &Config) -> TestEnv {
    let env = seeded();
    let service = EntryService::in_memory(&env.store, config);
    TestEnv { service, ..env }
}

/// Store with languages "en" and "de", templates "blog" and "products",
/// and group "seo". The service is a plain in-memory one.
fn seeded() -> TestEnv {
    let store = MemoryStore::new();
    store.insert_language(Language::new("en", "English").unwrap().default_language());
    store.insert_language(Language::new("de", "Deutsch").unwrap());

    let seo = Group::new(
        "seo",
        Schema::new(vec![
            PropDefinition::new("keywords", PropType::String).array(),
            PropDefinition::new("score", PropType::Number),
        ]),
    );
    store.insert_group(seo.clone());

    let mut article: Vec<PropDefinition> = schemas::article().iter().cloned().collect();
    article.push(PropDefinition::group("seo", seo.id));
    let blog = Template::new("blog", TemplateType::RichContent, Schema::new(article));
    store.insert_template(blog.clone());

    let products = Template::new("products", TemplateType::DataModel, schemas::product());
    store.insert_template(products.clone());

    let service = EntryService::in_memory(&store, &Config::default());
    TestEnv {
        store,
        service,
        blog,
        products,
        seo,
    }
}

/// A single English block.
pub fn english(props: Value) -> Vec<RawContent> {
    vec![RawContent::new("en", props)]
}

/// Template store that delegates to a [`MemoryStore`] but can fail updates.
pub struct FlakyTemplates {
    inner: MemoryStore,
    fail_updates: AtomicBool,
}

impl FlakyTemplates {
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TemplateStore for FlakyTemplates {
    async fn find_by_id(&self, id: TemplateId) -> Result<Option<Template>> {
        TemplateStore::find_by_id(&self.inner, id).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Template>> {
        self.inner.find_by_name(name).await
    }

    async fn update(&self, template: &Template) -> Result<()> {
        if self.fail_updates.load(Ordering::SeqCst) {
            bail!("injected template update failure");
        }
        TemplateStore::update(&self.inner, template).await
    }
}

/// Entry store that delegates to a [`MemoryStore`] but can fail writes.
pub struct FlakyEntries {
    inner: MemoryStore,
    fail_adds: AtomicBool,
    fail_deletes: AtomicBool,
}

impl FlakyEntries {
    pub fn fail_adds(&self, fail: bool) {
        self.fail_adds.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl EntryStore for FlakyEntries {
    async fn find_all(&self) -> Result<Vec<Entry>> {
        self.inner.find_all().await
    }

    async fn find_by_id(&self, id: EntryId) -> Result<Option<Entry>> {
        EntryStore::find_by_id(&self.inner, id).await
    }

    async fn find_all_by_ids(&self, ids: &[EntryId]) -> Result<Vec<Entry>> {
        self.inner.find_all_by_ids(ids).await
    }

    async fn find_by_template_and_slug(
        &self,
        template_id: TemplateId,
        slug: &str,
        exclude: Option<EntryId>,
    ) -> Result<Option<Entry>> {
        self.inner
            .find_by_template_and_slug(template_id, slug, exclude)
            .await
    }

    async fn count(&self) -> Result<u64> {
        self.inner.count().await
    }

    async fn add(&self, entry: &Entry) -> Result<()> {
        if self.fail_adds.load(Ordering::SeqCst) {
            bail!("injected entry add failure");
        }
        self.inner.add(entry).await
    }

    async fn update(&self, entry: &Entry) -> Result<()> {
        EntryStore::update(&self.inner, entry).await
    }

    async fn delete_by_id(&self, id: EntryId) -> Result<bool> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            bail!("injected entry delete failure");
        }
        self.inner.delete_by_id(id).await
    }
}

/// Test environment whose service writes through the flaky wrappers.
pub struct FlakyEnv {
    pub env: TestEnv,
    pub templates: Arc<FlakyTemplates>,
    pub entries: Arc<FlakyEntries>,
}

pub fn flaky_env() -> FlakyEnv {
    let env = seeded();
    let store = env.store.clone();
    let templates = Arc::new(FlakyTemplates {
        inner: store.clone(),
        fail_updates: AtomicBool::new(false),
    });
    let entries = Arc::new(FlakyEntries {
        inner: store.clone(),
        fail_adds: AtomicBool::new(false),
        fail_deletes: AtomicBool::new(false),
    });
    let shared = Arc::new(store.clone());
    let service = EntryService::new(
        templates.clone(),
        entries.clone(),
        shared.clone(),
        shared,
        Config::default().max_group_depth,
    );
    FlakyEnv {
        env: TestEnv { service, ..env },
        templates,
        entries,
    }
}

/// Entry ids a stored template currently lists.
pub fn listed_ids(store: &MemoryStore, template: TemplateId) -> Vec<EntryId> {
    store
        .template(template)
        .map(|t| t.entry_ids)
        .unwrap_or_default()
}
