//! In-process store backed by concurrent maps.

use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use dashmap::DashMap;
use folio_sdk::types::{EntryId, GroupId, Schema, TemplateId};

use super::{EntryStore, GroupResolver, LanguageStore, TemplateStore};
use crate::models::{Entry, Group, Language, Template};

/// Store holding templates, entries, groups and languages in memory.
///
/// Cloning is cheap; clones share the same maps.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    templates: DashMap<TemplateId, Template>,
    entries: DashMap<EntryId, Entry>,
    groups: DashMap<GroupId, Group>,
    languages: DashMap<String, Language>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_template(&self, template: Template) {
        self.inner.templates.insert(template.id, template);
    }

    pub fn insert_group(&self, group: Group) {
        self.inner.groups.insert(group.id, group);
    }

    pub fn insert_language(&self, language: Language) {
        self.inner.languages.insert(language.code.clone(), language);
    }

    /// Snapshot of a template.
    pub fn template(&self, id: TemplateId) -> Option<Template> {
        self.inner.templates.get(&id).map(|t| t.clone())
    }

    /// Snapshot of an entry.
    pub fn entry(&self, id: EntryId) -> Option<Entry> {
        self.inner.entries.get(&id).map(|e| e.clone())
    }

    pub fn entry_count(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn template_count(&self) -> usize {
        self.inner.templates.len()
    }
}

#[async_trait]
impl GroupResolver for MemoryStore {
    async fn group_schema(&self, id: GroupId) -> Result<Option<Schema>> {
        Ok(self.inner.groups.get(&id).map(|g| g.schema.clone()))
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Entry>> {
        let mut entries: Vec<Entry> = self
            .inner
            .entries
            .iter()
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(entries)
    }

    async fn find_by_id(&self, id: EntryId) -> Result<Option<Entry>> {
        Ok(self.entry(id))
    }

    async fn find_all_by_ids(&self, ids: &[EntryId]) -> Result<Vec<Entry>> {
        Ok(ids.iter().filter_map(|id| self.entry(*id)).collect())
    }

    async fn find_by_template_and_slug(
        &self,
        template_id: TemplateId,
        slug: &str,
        exclude: Option<EntryId>,
    ) -> Result<Option<Entry>> {
        let found = self
            .inner
            .entries
            .iter()
            .filter(|e| e.template_id == template_id && Some(e.id) != exclude && e.uses_slug(slug))
            .map(|e| e.value().clone())
            .min_by_key(|e| (e.created_at, e.id));
        Ok(found)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.inner.entries.len() as u64)
    }

    async fn add(&self, entry: &Entry) -> Result<()> {
        if self.inner.entries.contains_key(&entry.id) {
            bail!("entry '{}' already exists", entry.id);
        }
        self.inner.entries.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn update(&self, entry: &Entry) -> Result<()> {
        match self.inner.entries.get_mut(&entry.id) {
            Some(mut existing) => {
                *existing = entry.clone();
                Ok(())
            }
            None => bail!("entry '{}' does not exist", entry.id),
        }
    }

    async fn delete_by_id(&self, id: EntryId) -> Result<bool> {
        Ok(self.inner.entries.remove(&id).is_some())
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn find_by_id(&self, id: TemplateId) -> Result<Option<Template>> {
        Ok(self.template(id))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Template>> {
        Ok(self
            .inner
            .templates
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.value().clone()))
    }

    async fn update(&self, template: &Template) -> Result<()> {
        match self.inner.templates.get_mut(&template.id) {
            Some(mut existing) => {
                *existing = template.clone();
                Ok(())
            }
            None => bail!("template '{}' does not exist", template.id),
        }
    }
}

#[async_trait]
impl LanguageStore for MemoryStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Language>> {
        Ok(self.inner.languages.get(code).map(|l| l.clone()))
    }
}
