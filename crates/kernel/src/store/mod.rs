//! Persistence interfaces.
//!
//! The content engine never talks to a database directly. It consumes these
//! traits, which a deployment implements over its storage of choice.
//! [`MemoryStore`] implements all of them in process.

mod memory;

use anyhow::Result;
use async_trait::async_trait;
use folio_sdk::types::{EntryId, GroupId, Schema, TemplateId};

use crate::models::{Entry, Language, Template};

pub use memory::MemoryStore;

/// Resolves group references to their schemas.
#[async_trait]
pub trait GroupResolver: Send + Sync {
    /// Schema of a group, or `None` if no such group exists.
    async fn group_schema(&self, id: GroupId) -> Result<Option<Schema>>;
}

/// Entry persistence.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Every entry, oldest first.
    async fn find_all(&self) -> Result<Vec<Entry>>;

    async fn find_by_id(&self, id: EntryId) -> Result<Option<Entry>>;

    /// Entries for the given ids, in the order of `ids`. Missing ids are skipped.
    async fn find_all_by_ids(&self, ids: &[EntryId]) -> Result<Vec<Entry>>;

    /// An entry of `template_id`, other than `exclude`, whose content uses
    /// `slug` as its QUILL heading slug.
    async fn find_by_template_and_slug(
        &self,
        template_id: TemplateId,
        slug: &str,
        exclude: Option<EntryId>,
    ) -> Result<Option<Entry>>;

    /// Number of entries across all templates.
    async fn count(&self) -> Result<u64>;

    async fn add(&self, entry: &Entry) -> Result<()>;

    /// Replace a stored entry as a whole.
    async fn update(&self, entry: &Entry) -> Result<()>;

    /// Returns whether an entry was deleted.
    async fn delete_by_id(&self, id: EntryId) -> Result<bool>;
}

/// Template persistence.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn find_by_id(&self, id: TemplateId) -> Result<Option<Template>>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Template>>;

    /// Replace a stored template as a whole.
    async fn update(&self, template: &Template) -> Result<()>;
}

/// Language lookup.
#[async_trait]
pub trait LanguageStore: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<Language>>;
}
