//! Content engine.
//!
//! This module provides:
//! - Validator: parses untrusted prop payloads against a schema
//! - Comparator: checks typed props against a schema
//! - Slug deduplication for rich content templates
//! - Compiler: flattens entries into public documents
//! - EntryService: create/update/delete workflow over the stores

pub mod compare;
pub mod compile;
mod entry_service;
mod path;
pub mod slug;
pub mod validate;

use std::future::Future;
use std::pin::Pin;

pub use compare::{Comparator, compare};
pub use compile::{CompiledDocument, Compiler, EntryMeta, compile, compile_entry};
pub use entry_service::{EntryService, RawContent, UpdateEntry};
pub use slug::deduplicate_slug;
pub use validate::{Validator, validate};

/// Boxed future for the recursive walks over nested groups.
pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
