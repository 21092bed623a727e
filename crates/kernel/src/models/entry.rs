//! Entry model.
//!
//! Entries are content records belonging to a template. Each entry carries
//! one content block per language; every block's props conform to the
//! template's entry schema.

use chrono::Utc;
use folio_sdk::types::{EntryId, Prop, TemplateId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Props for one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryContent {
    /// Language code.
    pub lng: String,
    pub props: Vec<Prop>,
}

impl EntryContent {
    pub fn new(lng: impl Into<String>, props: Vec<Prop>) -> Self {
        Self {
            lng: lng.into(),
            props,
        }
    }

    /// Slug of the first QUILL prop, if any.
    pub fn quill_slug(&self) -> Option<&str> {
        self.props
            .iter()
            .find_map(|p| p.as_quill())
            .map(|q| q.heading.slug.as_str())
    }
}

/// Entry record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "_id")]
    pub id: EntryId,

    #[serde(rename = "templateId")]
    pub template_id: TemplateId,

    /// Owning user.
    #[serde(rename = "userId")]
    pub user_id: String,

    /// At most one block per language code.
    pub content: Vec<EntryContent>,

    /// Unix timestamp (ms) when created.
    #[serde(rename = "createdAt")]
    pub created_at: i64,

    /// Unix timestamp (ms) when last changed.
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

impl Entry {
    /// A new, empty entry for a template.
    pub fn new(template_id: TemplateId, user_id: impl Into<String>) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            id: Uuid::now_v7(),
            template_id,
            user_id: user_id.into(),
            content: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Content block for a language.
    pub fn content_for(&self, lng: &str) -> Option<&EntryContent> {
        self.content.iter().find(|c| c.lng == lng)
    }

    /// Replace the block with the same language, or append it.
    pub fn upsert_content(&mut self, block: EntryContent) {
        match self.content.iter_mut().find(|c| c.lng == block.lng) {
            Some(existing) => existing.props = block.props,
            None => self.content.push(block),
        }
    }

    /// Whether any block of this entry uses `slug` as its QUILL slug.
    pub fn uses_slug(&self, slug: &str) -> bool {
        self.content.iter().any(|c| c.quill_slug() == Some(slug))
    }

    /// Refresh the change timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().timestamp_millis().max(self.updated_at);
    }
}
