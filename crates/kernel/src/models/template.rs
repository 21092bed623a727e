//! Template model.
//!
//! A template owns the schema its entries must conform to and keeps the
//! ordered list of entry ids that belong to it.

use chrono::Utc;
use folio_sdk::types::{EntryId, Schema, TemplateId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of template. Rich content templates carry extra invariants on their
/// entries (exactly one QUILL prop with a unique slug).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateType {
    DataModel,
    RichContent,
}

/// Template record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "_id")]
    pub id: TemplateId,

    /// Unique, human-friendly name (e.g. "blog").
    pub name: String,

    #[serde(rename = "type")]
    pub template_type: TemplateType,

    #[serde(rename = "entrySchema")]
    pub entry_schema: Schema,

    #[serde(rename = "entryIds", default)]
    pub entry_ids: Vec<EntryId>,

    /// Unix timestamp (ms) when created.
    #[serde(rename = "createdAt")]
    pub created_at: i64,

    /// Unix timestamp (ms) when last changed.
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

impl Template {
    pub fn new(name: &str, template_type: TemplateType, entry_schema: Schema) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            template_type,
            entry_schema,
            entry_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_rich_content(&self) -> bool {
        self.template_type == TemplateType::RichContent
    }

    pub fn contains_entry(&self, entry_id: EntryId) -> bool {
        self.entry_ids.contains(&entry_id)
    }

    /// Append an entry id. Ids already present are not repeated.
    pub fn add_entry_id(&mut self, entry_id: EntryId) {
        if !self.contains_entry(entry_id) {
            self.entry_ids.push(entry_id);
        }
    }

    /// Remove an entry id. Returns whether it was present.
    pub fn remove_entry_id(&mut self, entry_id: EntryId) -> bool {
        let before = self.entry_ids.len();
        self.entry_ids.retain(|id| *id != entry_id);
        self.entry_ids.len() != before
    }
}

/// How a caller names a template: by id or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateRef<'a> {
    Id(TemplateId),
    Name(&'a str),
}

impl<'a> TemplateRef<'a> {
    /// Interpret a string as an id if it parses as one, otherwise as a name.
    pub fn parse(id_or_name: &'a str) -> Self {
        match Uuid::parse_str(id_or_name) {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Name(id_or_name),
        }
    }
}

impl std::fmt::Display for TemplateRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}
