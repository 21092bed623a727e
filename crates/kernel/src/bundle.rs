//! Content bundles.
//!
//! A bundle is a JSON file describing languages, groups, templates and a
//! list of entry creation requests. Loading a bundle seeds a
//! [`MemoryStore`]; running it submits each request through the
//! [`EntryService`] in order.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use folio_sdk::types::Schema;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::content::{EntryService, RawContent};
use crate::error::ContentResult;
use crate::models::language::validate_language_code;
use crate::models::{Entry, Group, Language, Template, TemplateType};
use crate::store::MemoryStore;

/// Owner recorded on entries whose request names no user.
pub const DEFAULT_USER: &str = "bundle";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Bundle {
    #[serde(default)]
    pub languages: Vec<Language>,

    #[serde(default)]
    pub groups: Vec<Group>,

    #[serde(default)]
    pub templates: Vec<TemplateDecl>,

    #[serde(default)]
    pub entries: Vec<BundleEntry>,
}

/// Template declaration. The id is generated when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateDecl {
    #[serde(rename = "_id", default)]
    pub id: Option<Uuid>,

    pub name: String,

    #[serde(rename = "type")]
    pub template_type: TemplateType,

    #[serde(rename = "entrySchema", default)]
    pub entry_schema: Schema,
}

/// Entry creation request.
#[derive(Debug, Clone, Deserialize)]
pub struct BundleEntry {
    /// Template id or name.
    pub template: String,

    #[serde(default = "default_user")]
    pub user: String,

    pub content: Vec<RawContent>,
}

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

/// Result of one entry request.
#[derive(Debug)]
pub struct Outcome {
    pub index: usize,
    pub template: String,
    pub result: ContentResult<Entry>,
}

/// A bundle after all requests have been submitted.
pub struct BundleRun {
    pub store: MemoryStore,
    pub service: EntryService,
    pub outcomes: Vec<Outcome>,
}

impl BundleRun {
    pub fn accepted(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|o| o.result.is_ok())
    }

    pub fn rejected(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

impl Bundle {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("failed to parse bundle")
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read bundle '{}'", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid bundle '{}'", path.display()))
    }

    /// Seed a store with the bundle's languages, groups and templates.
    ///
    /// When the bundle declares no languages, the configured default
    /// language is registered.
    pub fn seed(&self, config: &Config) -> Result<MemoryStore> {
        let store = MemoryStore::new();

        if self.languages.is_empty() {
            let code = &config.default_language;
            store.insert_language(Language::new(code, code)?.default_language());
        }
        for language in &self.languages {
            validate_language_code(&language.code)
                .with_context(|| format!("invalid language '{}'", language.code))?;
            store.insert_language(language.clone());
        }

        for group in &self.groups {
            store.insert_group(group.clone());
        }

        let mut names = HashSet::new();
        for decl in &self.templates {
            if !names.insert(decl.name.as_str()) {
                bail!("template name '{}' is declared more than once", decl.name);
            }
            let mut template =
                Template::new(&decl.name, decl.template_type, decl.entry_schema.clone());
            if let Some(id) = decl.id {
                template.id = id;
            }
            store.insert_template(template);
        }

        debug!(
            languages = self.languages.len(),
            groups = self.groups.len(),
            templates = self.templates.len(),
            "bundle seeded"
        );
        Ok(store)
    }

    /// Seed a store and submit every entry request in order.
    pub async fn run(self, config: &Config) -> Result<BundleRun> {
        let store = self.seed(config)?;
        let service = EntryService::in_memory(&store, config);

        let mut outcomes = Vec::with_capacity(self.entries.len());
        for (index, request) in self.entries.into_iter().enumerate() {
            let result = service
                .create(&request.template, &request.user, request.content)
                .await;
            if let Err(err) = &result {
                warn!(index, template = %request.template, error = %err, "entry rejected");
            }
            outcomes.push(Outcome {
                index,
                template: request.template,
                result,
            });
        }

        let run = BundleRun {
            store,
            service,
            outcomes,
        };
        info!(
            accepted = run.accepted().count(),
            rejected = run.rejected().count(),
            "bundle processed"
        );
        Ok(run)
    }
}
