//! Content records.

pub mod entry;
pub mod group;
pub mod language;
pub mod template;

pub use entry::{Entry, EntryContent};
pub use group::Group;
pub use language::Language;
pub use template::{Template, TemplateRef, TemplateType};
