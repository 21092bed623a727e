//! Folio SDK
//!
//! Schema model shared by the kernel and by anything that builds or
//! consumes Folio content: prop types, prop definitions, schemas and
//! validated prop values.

pub mod types;

pub mod prelude {
    pub use crate::types::*;
}
