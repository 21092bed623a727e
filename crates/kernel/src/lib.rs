//! Folio Kernel Library
//!
//! Content schema validation, structural comparison, slug policy and
//! compilation for templates, entries, groups and languages.
//! The `folio` binary drives it over JSON bundles.

pub mod bundle;
pub mod config;
pub mod content;
pub mod error;
pub mod models;
pub mod store;

pub use config::Config;
pub use error::{ContentError, ContentResult};
