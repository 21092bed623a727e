//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result, bail};

/// Group nesting bound used when none is configured.
pub const DEFAULT_MAX_GROUP_DEPTH: usize = 16;

/// Language code used when none is configured.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum nested group levels in a payload (default: 16).
    pub max_group_depth: usize,

    /// Language registered when a bundle declares none (default: "en").
    pub default_language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_group_depth: DEFAULT_MAX_GROUP_DEPTH,
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let max_group_depth = match var("FOLIO_MAX_GROUP_DEPTH") {
            Some(raw) => raw
                .trim()
                .parse()
                .context("FOLIO_MAX_GROUP_DEPTH must be a valid usize")?,
            None => DEFAULT_MAX_GROUP_DEPTH,
        };
        if max_group_depth == 0 {
            bail!("FOLIO_MAX_GROUP_DEPTH must be at least 1");
        }

        let default_language = var("FOLIO_DEFAULT_LANGUAGE")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        crate::models::language::validate_language_code(&default_language)
            .context("FOLIO_DEFAULT_LANGUAGE must be a valid language code")?;

        Ok(Self {
            max_group_depth,
            default_language,
        })
    }
}
