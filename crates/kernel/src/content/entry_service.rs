//! Entry workflow.
//!
//! Creates, updates and deletes entries of a template. Every content block
//! runs through validation, structural comparison and slug deduplication
//! before anything is written. Mutations of one template are serialized
//! through a per-template lock; the two-step writes (entry, then the
//! template's entry list) roll back the first step when the second fails.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use dashmap::DashMap;
use folio_sdk::types::{EntryId, Prop, TemplateId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::compare::Comparator;
use super::compile::{CompiledDocument, Compiler};
use super::slug::deduplicate_slug;
use super::validate::Validator;
use crate::config::Config;
use crate::error::{ContentError, ContentResult};
use crate::models::{Entry, EntryContent, Template, TemplateRef};
use crate::store::{EntryStore, GroupResolver, LanguageStore, MemoryStore, TemplateStore};

/// One language block of a request, props still unvalidated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawContent {
    pub lng: String,
    pub props: Value,
}

impl RawContent {
    pub fn new(lng: impl Into<String>, props: Value) -> Self {
        Self {
            lng: lng.into(),
            props,
        }
    }
}

/// Input for updating an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEntry {
    #[serde(rename = "_id")]
    pub id: EntryId,

    /// Apply only the block for this language.
    #[serde(rename = "onlyLng", default, skip_serializing_if = "Option::is_none")]
    pub only_lng: Option<String>,

    #[serde(default)]
    pub content: Option<Vec<RawContent>>,
}

/// Service for entry CRUD over injected stores.
#[derive(Clone)]
pub struct EntryService {
    inner: Arc<EntryServiceInner>,
}

struct EntryServiceInner {
    templates: Arc<dyn TemplateStore>,
    entries: Arc<dyn EntryStore>,
    groups: Arc<dyn GroupResolver>,
    languages: Arc<dyn LanguageStore>,
    max_group_depth: usize,
    locks: DashMap<TemplateId, Arc<Mutex<()>>>,
}

impl EntryService {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        entries: Arc<dyn EntryStore>,
        groups: Arc<dyn GroupResolver>,
        languages: Arc<dyn LanguageStore>,
        max_group_depth: usize,
    ) -> Self {
        Self {
            inner: Arc::new(EntryServiceInner {
                templates,
                entries,
                groups,
                languages,
                max_group_depth,
                locks: DashMap::new(),
            }),
        }
    }

    /// Service backed entirely by one in-memory store.
    pub fn in_memory(store: &MemoryStore, config: &Config) -> Self {
        let store = Arc::new(store.clone());
        Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            config.max_group_depth,
        )
    }

    /// Every entry, oldest first.
    pub async fn list_all(&self) -> ContentResult<Vec<Entry>> {
        let entries = self
            .inner
            .entries
            .find_all()
            .await
            .context("failed to list entries")?;
        Ok(entries)
    }

    /// Entries listed by a template, in the template's order.
    pub async fn list_for_template(&self, template_ref: &str) -> ContentResult<Vec<Entry>> {
        let template = self.resolve_template(template_ref).await?;
        let entries = self
            .inner
            .entries
            .find_all_by_ids(&template.entry_ids)
            .await
            .context("failed to load template entries")?;
        Ok(entries)
    }

    /// Compiled documents of every entry a template lists.
    pub async fn list_compiled(
        &self,
        template_ref: &str,
    ) -> ContentResult<Vec<Vec<CompiledDocument>>> {
        let template = self.resolve_template(template_ref).await?;
        let entries = self
            .inner
            .entries
            .find_all_by_ids(&template.entry_ids)
            .await
            .context("failed to load template entries")?;

        let compiler = self.compiler();
        let mut compiled = Vec::with_capacity(entries.len());
        for entry in &entries {
            compiled.push(compiler.compile_entry(entry, &template.entry_schema).await?);
        }
        Ok(compiled)
    }

    pub async fn get(&self, template_ref: &str, entry_id: EntryId) -> ContentResult<Entry> {
        let template = self.resolve_template(template_ref).await?;
        if !template.contains_entry(entry_id) {
            return Err(not_in_template(entry_id, &template));
        }
        self.load_entry(entry_id).await
    }

    pub async fn get_compiled(
        &self,
        template_ref: &str,
        entry_id: EntryId,
    ) -> ContentResult<Vec<CompiledDocument>> {
        let template = self.resolve_template(template_ref).await?;
        if !template.contains_entry(entry_id) {
            return Err(not_in_template(entry_id, &template));
        }
        let entry = self.load_entry(entry_id).await?;
        self.compiler()
            .compile_entry(&entry, &template.entry_schema)
            .await
    }

    fn compiler(&self) -> Compiler<'_> {
        Compiler::new(self.inner.groups.as_ref(), self.inner.max_group_depth)
    }

    /// Create an entry with one block per language.
    pub async fn create(
        &self,
        template_ref: &str,
        user_id: &str,
        content: Vec<RawContent>,
    ) -> ContentResult<Entry> {
        if content.is_empty() {
            return Err(ContentError::InvalidRequest(
                "body.content must contain at least one language block".into(),
            ));
        }
        check_unique_languages(&content)?;

        let template_id = self.resolve_template(template_ref).await?.id;
        let lock = self.template_lock(template_id);
        let _guard = lock.lock().await;
        let mut template = self.load_template(template_id).await?;

        let mut entry = Entry::new(template.id, user_id);
        for (i, block) in content.iter().enumerate() {
            let lng_path = format!("body.content[{i}]");
            let props = self
                .prepare_block(&template, block, i, &lng_path, None)
                .await?;
            entry.content.push(EntryContent::new(block.lng.clone(), props));
        }

        self.inner
            .entries
            .add(&entry)
            .await
            .context("failed to store entry")?;

        template.add_entry_id(entry.id);
        if let Err(err) = self.inner.templates.update(&template).await {
            warn!(entry_id = %entry.id, template = %template.name, "template update failed, removing new entry");
            if let Err(rollback) = self.inner.entries.delete_by_id(entry.id).await {
                error!(entry_id = %entry.id, error = %rollback, "rollback failed, entry is orphaned");
            }
            return Err(ContentError::Persistence(
                err.context("failed to attach entry to template"),
            ));
        }

        info!(
            entry_id = %entry.id,
            template = %template.name,
            languages = entry.content.len(),
            "entry created"
        );
        Ok(entry)
    }

    /// Replace or add language blocks of an existing entry.
    pub async fn update(&self, template_ref: &str, input: UpdateEntry) -> ContentResult<Entry> {
        let template_id = self.resolve_template(template_ref).await?.id;
        let lock = self.template_lock(template_id);
        let _guard = lock.lock().await;
        let template = self.load_template(template_id).await?;

        let mut entry = self.load_entry(input.id).await?;
        if entry.template_id != template.id || !template.contains_entry(entry.id) {
            return Err(not_in_template(entry.id, &template));
        }

        let content = match input.content {
            Some(content) if !content.is_empty() => content,
            _ => return Err(ContentError::NothingToUpdate),
        };

        let selected: Vec<(usize, &RawContent, String)> = match &input.only_lng {
            Some(lng) => {
                let (i, block) = content
                    .iter()
                    .enumerate()
                    .find(|(_, block)| &block.lng == lng)
                    .ok_or_else(|| {
                        ContentError::InvalidRequest(format!(
                            "body.content has no block for language '{lng}'"
                        ))
                    })?;
                vec![(i, block, "body.onlyLng".to_string())]
            }
            None => {
                check_unique_languages(&content)?;
                content
                    .iter()
                    .enumerate()
                    .map(|(i, block)| (i, block, format!("body.content[{i}]")))
                    .collect()
            }
        };

        for (i, block, lng_path) in selected {
            let props = self
                .prepare_block(&template, block, i, &lng_path, Some(entry.id))
                .await?;
            entry.upsert_content(EntryContent::new(block.lng.clone(), props));
        }
        entry.touch();

        self.inner
            .entries
            .update(&entry)
            .await
            .context("failed to store entry")?;

        info!(entry_id = %entry.id, template = %template.name, "entry updated");
        Ok(entry)
    }

    pub async fn delete(&self, template_ref: &str, entry_id: EntryId) -> ContentResult<()> {
        let template_id = self.resolve_template(template_ref).await?.id;
        let lock = self.template_lock(template_id);
        let _guard = lock.lock().await;
        let mut template = self.load_template(template_id).await?;

        let entry = self.load_entry(entry_id).await?;
        if entry.template_id != template.id || !template.contains_entry(entry_id) {
            return Err(not_in_template(entry_id, &template));
        }

        let deleted = self
            .inner
            .entries
            .delete_by_id(entry_id)
            .await
            .context("failed to delete entry")?;
        if !deleted {
            return Err(ContentError::not_found("entry", entry_id));
        }

        template.remove_entry_id(entry_id);
        if let Err(err) = self.inner.templates.update(&template).await {
            warn!(entry_id = %entry_id, template = %template.name, "template update failed, restoring entry");
            if let Err(rollback) = self.inner.entries.add(&entry).await {
                error!(entry_id = %entry_id, error = %rollback, "rollback failed, entry is lost");
            }
            return Err(ContentError::Persistence(
                err.context("failed to detach entry from template"),
            ));
        }

        info!(entry_id = %entry_id, template = %template.name, "entry deleted");
        Ok(())
    }

    /// Validate, compare and deduplicate one block of a request.
    async fn prepare_block(
        &self,
        template: &Template,
        block: &RawContent,
        index: usize,
        lng_path: &str,
        exclude: Option<EntryId>,
    ) -> ContentResult<Vec<Prop>> {
        self.check_language(&block.lng, lng_path).await?;

        let prefix = format!("entry[{index}]");
        let groups = self.inner.groups.as_ref();
        let depth = self.inner.max_group_depth;
        let schema = &template.entry_schema;

        let mut props = Validator::new(groups, depth)
            .validate(&block.props, schema, &prefix)
            .await?;
        Comparator::new(groups, depth)
            .compare(&props, schema, &prefix)
            .await?;

        let props_path = format!("body.content[{index}].props");
        deduplicate_slug(
            &mut props,
            template,
            exclude,
            self.inner.entries.as_ref(),
            &props_path,
        )
        .await?;
        Ok(props)
    }

    async fn check_language(&self, code: &str, path: &str) -> ContentResult<()> {
        let language = self
            .inner
            .languages
            .find_by_code(code)
            .await
            .with_context(|| format!("failed to look up language '{code}'"))?;
        match language {
            Some(_) => Ok(()),
            None => Err(ContentError::UnknownLanguage {
                code: code.to_string(),
                path: path.to_string(),
            }),
        }
    }

    async fn resolve_template(&self, template_ref: &str) -> ContentResult<Template> {
        let found = match TemplateRef::parse(template_ref) {
            TemplateRef::Id(id) => self.inner.templates.find_by_id(id).await,
            TemplateRef::Name(name) => self.inner.templates.find_by_name(name).await,
        }
        .with_context(|| format!("failed to look up template '{template_ref}'"))?;
        found.ok_or_else(|| ContentError::not_found("template", template_ref))
    }

    async fn load_template(&self, id: TemplateId) -> ContentResult<Template> {
        self.inner
            .templates
            .find_by_id(id)
            .await
            .with_context(|| format!("failed to load template '{id}'"))?
            .ok_or_else(|| ContentError::not_found("template", id))
    }

    async fn load_entry(&self, id: EntryId) -> ContentResult<Entry> {
        self.inner
            .entries
            .find_by_id(id)
            .await
            .with_context(|| format!("failed to load entry '{id}'"))?
            .ok_or_else(|| ContentError::not_found("entry", id))
    }

    fn template_lock(&self, id: TemplateId) -> Arc<Mutex<()>> {
        self.inner.locks.entry(id).or_default().value().clone()
    }
}

fn check_unique_languages(content: &[RawContent]) -> ContentResult<()> {
    let mut seen = HashSet::with_capacity(content.len());
    for block in content {
        if !seen.insert(block.lng.as_str()) {
            return Err(ContentError::InvalidRequest(format!(
                "language '{}' appears more than once in body.content",
                block.lng
            )));
        }
    }
    Ok(())
}

fn not_in_template(entry_id: EntryId, template: &Template) -> ContentError {
    ContentError::EntryNotInTemplate {
        entry_id,
        template: template.name.clone(),
    }
}
