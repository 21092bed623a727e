//! Content slugs for rich content templates.
//!
//! Every entry of a RICH_CONTENT template carries exactly one QUILL prop
//! whose heading slug identifies the content. When a slug is already used
//! by another entry of the same template, it is rewritten to
//! `<slug>-<n>` where `n` is the total entry count at the moment of the
//! check. The count is global across templates, not per template.
//!
//! The rewritten slug is not looked up again. If another entry already
//! uses `<slug>-<n>`, for example because it was submitted with that slug
//! explicitly, both entries end up sharing it. Uniqueness therefore holds
//! for base slugs only.

use anyhow::Context;
use folio_sdk::types::{EntryId, Prop, PropType};
use tracing::debug;

use crate::error::{ContentError, ContentResult};
use crate::models::Template;
use crate::store::EntryStore;

/// Maximum slug length in bytes.
const MAX_SLUG_LEN: usize = 128;

/// Convert text into a URL-safe slug.
///
/// Transforms to lowercase, replaces non-alphanumeric characters with hyphens,
/// collapses consecutive hyphens, and trims leading/trailing hyphens.
pub fn slugify(text: &str) -> String {
    let slug: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();

    let mut result = String::with_capacity(slug.len());
    let mut prev_was_hyphen = true; // skips leading hyphens
    for c in slug.chars() {
        if c == '-' {
            if !prev_was_hyphen {
                result.push('-');
            }
            prev_was_hyphen = true;
        } else {
            result.push(c);
            prev_was_hyphen = false;
        }
    }

    while result.ends_with('-') {
        result.pop();
    }

    if result.len() > MAX_SLUG_LEN {
        // Pure ASCII at this point, so byte indexing is a char boundary.
        let truncated = &result[..MAX_SLUG_LEN];
        if let Some(last_hyphen) = truncated.rfind('-') {
            return truncated[..last_hyphen].to_string();
        }
        return truncated.to_string();
    }

    result
}

/// Whether `slug` is already in the form `slugify` produces.
pub fn is_url_safe(slug: &str) -> bool {
    !slug.is_empty() && slugify(slug) == slug
}

/// Make the QUILL slug of a content block unique within its template.
///
/// No-op for templates that are not RICH_CONTENT. `exclude` is the entry
/// being updated, whose own stored slug is not a collision. Returns the new
/// slug when a rewrite happened.
pub async fn deduplicate_slug(
    props: &mut [Prop],
    template: &Template,
    exclude: Option<EntryId>,
    entries: &dyn EntryStore,
    path: &str,
) -> ContentResult<Option<String>> {
    if !template.is_rich_content() {
        return Ok(None);
    }

    let count = props
        .iter()
        .filter(|p| p.prop_type() == PropType::Quill)
        .count();
    if count > 1 {
        return Err(ContentError::MultipleQuillProps {
            path: path.to_string(),
            count,
        });
    }
    let Some(quill) = props.iter_mut().find_map(|p| p.as_quill_mut()) else {
        return Err(ContentError::MissingRequiredQuillProp {
            path: path.to_string(),
        });
    };

    let slug = quill.heading.slug.clone();
    let existing = entries
        .find_by_template_and_slug(template.id, &slug, exclude)
        .await
        .context("failed to look up entry by slug")?;

    let Some(existing) = existing else {
        return Ok(None);
    };

    let n = entries.count().await.context("failed to count entries")?;
    let rewritten = format!("{slug}-{n}");
    debug!(
        template_id = %template.id,
        collides_with = %existing.id,
        slug = %slug,
        rewritten = %rewritten,
        "slug already in use, rewriting"
    );
    quill.heading.slug = rewritten.clone();
    Ok(Some(rewritten))
}
