//! Content error types.
//!
//! Every failure carries enough context (prop path, identifier, language
//! code) for a caller to report exactly where an untrusted payload or a
//! stored record went wrong.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// What kind of validation failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    MissingField,
    TypeMismatch,
    UnknownType,
    UnknownGroup,
    RecursionLimit,
    UnknownProp,
    DuplicateProp,
}

impl ValidationErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing field",
            Self::TypeMismatch => "type mismatch",
            Self::UnknownType => "unknown type",
            Self::UnknownGroup => "unknown group",
            Self::RecursionLimit => "recursion limit",
            Self::UnknownProp => "unknown prop",
            Self::DuplicateProp => "duplicate prop",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Untrusted input did not conform to its schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at '{path}': {message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn missing_field(path: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::MissingField, path, "value is required")
    }

    pub fn type_mismatch(path: impl Into<String>, expected: &str, found: &str) -> Self {
        Self::new(
            ValidationErrorKind::TypeMismatch,
            path,
            format!("expected {expected}, found {found}"),
        )
    }

    pub fn unknown_type(path: impl Into<String>, name: &str) -> Self {
        Self::new(
            ValidationErrorKind::UnknownType,
            path,
            format!("'{name}' is not a prop type"),
        )
    }

    pub fn unknown_group(path: impl Into<String>, group_id: Uuid) -> Self {
        Self::new(
            ValidationErrorKind::UnknownGroup,
            path,
            format!("group '{group_id}' does not exist"),
        )
    }

    pub fn recursion_limit(path: impl Into<String>, max_depth: usize) -> Self {
        Self::new(
            ValidationErrorKind::RecursionLimit,
            path,
            format!("group nesting exceeds maximum depth of {max_depth}"),
        )
    }

    pub fn unknown_prop(path: impl Into<String>, name: &str, allowed: &str) -> Self {
        Self::new(
            ValidationErrorKind::UnknownProp,
            path,
            format!("'{name}' is not defined by the schema. Valid props: {allowed}"),
        )
    }

    pub fn duplicate_prop(path: impl Into<String>, name: &str) -> Self {
        Self::new(
            ValidationErrorKind::DuplicateProp,
            path,
            format!("'{name}' appears more than once"),
        )
    }
}

/// Structurally valid props that do not match a target schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema mismatch at '{path}': {description}")]
pub struct SchemaMismatchError {
    pub path: String,
    pub description: String,
}

impl SchemaMismatchError {
    pub fn new(path: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            description: description.into(),
        }
    }
}

/// Errors produced by the content engine and the entry workflow.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    SchemaMismatch(#[from] SchemaMismatchError),

    #[error("entry for a RICH_CONTENT template must have a prop of type QUILL (in '{path}')")]
    MissingRequiredQuillProp { path: String },

    #[error(
        "entry for a RICH_CONTENT template must have exactly one prop of type QUILL, found {count} (in '{path}')"
    )]
    MultipleQuillProps { path: String, count: usize },

    #[error("{kind} '{id}' does not exist")]
    NotFound { kind: &'static str, id: String },

    #[error("language '{code}' is not added to selection (in '{path}')")]
    UnknownLanguage { code: String, path: String },

    #[error("entry '{entry_id}' does not belong to template '{template}'")]
    EntryNotInTemplate { entry_id: Uuid, template: String },

    #[error("nothing to update")]
    NothingToUpdate,

    #[error("bad request: {0}")]
    InvalidRequest(String),

    #[error("persistence failure: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

/// Coarse classification a transport layer can map to a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    BadRequest,
    Forbidden,
    NotFound,
    Internal,
}

impl ContentError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// The validation kind, if this is a validation failure.
    pub fn validation_kind(&self) -> Option<ValidationErrorKind> {
        match self {
            Self::Validation(e) => Some(e.kind),
            _ => None,
        }
    }

    pub fn status_class(&self) -> StatusClass {
        match self {
            Self::Validation(_) | Self::SchemaMismatch(_) | Self::InvalidRequest(_) => {
                StatusClass::BadRequest
            }
            Self::MissingRequiredQuillProp { .. }
            | Self::MultipleQuillProps { .. }
            | Self::UnknownLanguage { .. }
            | Self::EntryNotInTemplate { .. }
            | Self::NothingToUpdate => StatusClass::Forbidden,
            Self::NotFound { .. } => StatusClass::NotFound,
            Self::Persistence(_) => StatusClass::Internal,
        }
    }
}

/// Result type alias using ContentError.
pub type ContentResult<T> = Result<T, ContentError>;
