//! Language model.
//!
//! Every entry content block is keyed by a language code. A block may only
//! use a code that has been added to the selection of languages.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Language record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    /// Language code (e.g., "en", "fr", "pt-br").
    pub code: String,

    /// Human-readable name (e.g., "English").
    pub name: String,

    /// Whether this is the default language.
    #[serde(rename = "isDefault", default)]
    pub is_default: bool,
}

impl Language {
    /// Create a language after checking its code and name.
    pub fn new(code: &str, name: &str) -> Result<Self> {
        let code = code.trim().to_string();
        let name = name.trim().to_string();
        validate_language_code(&code)?;
        validate_name(&name)?;
        Ok(Self {
            code,
            name,
            is_default: false,
        })
    }

    /// Mark as the default language.
    pub fn default_language(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// Validate that a name is non-empty and at most 255 characters.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        anyhow::bail!("language name must not be empty");
    }
    if name.len() > 255 {
        anyhow::bail!(
            "language name must be at most 255 characters, got {}",
            name.len()
        );
    }
    Ok(())
}

/// Validate that a language code follows BCP 47 primary subtag format.
///
/// Accepts: lowercase alpha 2-3 chars, optionally followed by hyphen-separated
/// alphanumeric subtags (e.g., "en", "fr", "pt-br", "zh-hans").
pub fn validate_language_code(code: &str) -> Result<()> {
    if code.is_empty() || code.len() > 12 {
        anyhow::bail!("language code must be 1-12 characters, got '{code}'");
    }

    let mut parts = code.split('-');

    match parts.next() {
        Some(primary) if (2..=3).contains(&primary.len()) => {
            if !primary.bytes().all(|b| b.is_ascii_lowercase()) {
                anyhow::bail!("language code primary subtag must be lowercase letters, got '{code}'");
            }
        }
        _ => {
            anyhow::bail!("language code must start with a 2-3 letter primary subtag, got '{code}'");
        }
    }

    for subtag in parts {
        if subtag.is_empty()
            || subtag.len() > 8
            || !subtag.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            anyhow::bail!(
                "language code subtag must be 1-8 alphanumeric characters, got '{subtag}' in '{code}'"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn language_creation_trims() {
        let lang = Language::new(" en ", " English ").unwrap().default_language();
        assert_eq!(lang.code, "en");
        assert_eq!(lang.name, "English");
        assert!(lang.is_default);
    }

    #[test]
    fn default_flag_uses_camel_case() {
        let lang: Language =
            serde_json::from_str(r#"{"code": "de", "name": "Deutsch", "isDefault": true}"#)
                .unwrap();
        assert!(lang.is_default);
        let json = serde_json::to_value(&lang).unwrap();
        assert_eq!(json["isDefault"], true);
        assert!(json.get("is_default").is_none());
    }

    #[test]
    fn accepts_subtags() {
        assert!(validate_language_code("pt-br").is_ok());
        assert!(validate_language_code("zh-hans").is_ok());
        assert!(validate_language_code("deu").is_ok());
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(validate_language_code("").is_err());
        assert!(validate_language_code("EN").is_err());
        assert!(validate_language_code("e").is_err());
        assert!(validate_language_code("en-").is_err());
        assert!(validate_language_code("en-toolongsubtag").is_err());
    }

    #[test]
    fn rejects_empty_name() {
        let err = Language::new("en", "  ").unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }
}
