//! Core types for Folio content schemas.
//!
//! These types describe the shape content must take (`Schema`,
//! `PropDefinition`, `PropType`) and the validated values stored against
//! it (`Prop`, `PropValue`). They carry no behavior beyond small accessors;
//! validation and compilation live in the kernel.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a reusable group schema.
pub type GroupId = Uuid;

/// Identifier of an entry.
pub type EntryId = Uuid;

/// Identifier of a template.
pub type TemplateId = Uuid;

/// The closed set of value kinds a prop may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropType {
    String,
    Number,
    Boolean,
    Date,
    /// Rich text: a heading with a URL-safe slug plus block content.
    Quill,
    /// Nested content conforming to a group's schema.
    GroupPointer,
    /// Reference to another entry.
    EntryPointer,
}

impl PropType {
    /// Every prop type, in declaration order.
    pub const ALL: [PropType; 7] = [
        PropType::String,
        PropType::Number,
        PropType::Boolean,
        PropType::Date,
        PropType::Quill,
        PropType::GroupPointer,
        PropType::EntryPointer,
    ];

    /// Wire name of the type (e.g. `GROUP_POINTER`).
    pub fn as_str(self) -> &'static str {
        match self {
            PropType::String => "STRING",
            PropType::Number => "NUMBER",
            PropType::Boolean => "BOOLEAN",
            PropType::Date => "DATE",
            PropType::Quill => "QUILL",
            PropType::GroupPointer => "GROUP_POINTER",
            PropType::EntryPointer => "ENTRY_POINTER",
        }
    }

    /// Parse a wire name. Matching is exact.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for PropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single prop definition within a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropDefinition {
    pub name: String,

    #[serde(rename = "type")]
    pub prop_type: PropType,

    #[serde(default)]
    pub required: bool,

    #[serde(default, rename = "isArray")]
    pub is_array: bool,

    /// Group whose schema nested content must follow (GROUP_POINTER only).
    #[serde(default, rename = "groupRef", skip_serializing_if = "Option::is_none")]
    pub group_ref: Option<GroupId>,
}

impl PropDefinition {
    pub fn new(name: &str, prop_type: PropType) -> Self {
        Self {
            name: name.into(),
            prop_type,
            required: false,
            is_array: false,
            group_ref: None,
        }
    }

    /// A GROUP_POINTER definition referencing `group_id`.
    pub fn group(name: &str, group_id: GroupId) -> Self {
        Self {
            group_ref: Some(group_id),
            ..Self::new(name, PropType::GroupPointer)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }
}

/// Ordered sequence of prop definitions.
///
/// Declaration order is significant: validated props and compiled documents
/// follow it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    props: Vec<PropDefinition>,
}

impl Schema {
    pub fn new(props: Vec<PropDefinition>) -> Self {
        Self { props }
    }

    /// Look up a definition by prop name.
    pub fn get(&self, name: &str) -> Option<&PropDefinition> {
        self.props.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PropDefinition> {
        self.props.iter()
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Comma-separated prop names, for messages.
    pub fn names(&self) -> String {
        self.props
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<PropDefinition> for Schema {
    fn from_iter<I: IntoIterator<Item = PropDefinition>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a PropDefinition;
    type IntoIter = std::slice::Iter<'a, PropDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.props.iter()
    }
}

/// A value that is either single or a list, mirroring `PropDefinition::is_array`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Multi<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Multi<T> {
    pub fn is_array(&self) -> bool {
        matches!(self, Multi::Many(_))
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            Multi::One(v) => std::slice::from_ref(v),
            Multi::Many(v) => v,
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match self {
            Multi::One(v) => std::slice::from_mut(v),
            Multi::Many(v) => v,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }
}

/// Heading of a QUILL prop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuillHeading {
    pub text: String,
    /// URL-safe slug identifying the content.
    pub slug: String,
}

/// One block of QUILL content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuillBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Rich text content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuillValue {
    pub heading: QuillHeading,
    pub blocks: Vec<QuillBlock>,
}

/// Nested content of a GROUP_POINTER prop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPointerValue {
    #[serde(rename = "groupId")]
    pub group_id: GroupId,
    /// One validated prop sequence, or one per array element.
    pub items: Multi<Vec<Prop>>,
}

/// Validated prop value, tagged by its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropValue {
    String(Multi<String>),
    Number(Multi<f64>),
    Boolean(Multi<bool>),
    /// Unix timestamp in milliseconds.
    Date(Multi<i64>),
    Quill(QuillValue),
    GroupPointer(GroupPointerValue),
    EntryPointer(Multi<EntryId>),
}

impl PropValue {
    pub fn prop_type(&self) -> PropType {
        match self {
            PropValue::String(_) => PropType::String,
            PropValue::Number(_) => PropType::Number,
            PropValue::Boolean(_) => PropType::Boolean,
            PropValue::Date(_) => PropType::Date,
            PropValue::Quill(_) => PropType::Quill,
            PropValue::GroupPointer(_) => PropType::GroupPointer,
            PropValue::EntryPointer(_) => PropType::EntryPointer,
        }
    }

    /// Whether the value holds a list rather than a single item.
    pub fn is_array(&self) -> bool {
        match self {
            PropValue::String(v) => v.is_array(),
            PropValue::Number(v) => v.is_array(),
            PropValue::Boolean(v) => v.is_array(),
            PropValue::Date(v) => v.is_array(),
            PropValue::Quill(_) => false,
            PropValue::GroupPointer(g) => g.items.is_array(),
            PropValue::EntryPointer(v) => v.is_array(),
        }
    }
}

/// A validated, named, typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prop {
    pub name: String,
    #[serde(flatten)]
    pub value: PropValue,
}

impl Prop {
    pub fn new(name: impl Into<String>, value: PropValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn prop_type(&self) -> PropType {
        self.value.prop_type()
    }

    pub fn as_quill(&self) -> Option<&QuillValue> {
        match &self.value {
            PropValue::Quill(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_quill_mut(&mut self) -> Option<&mut QuillValue> {
        match &mut self.value {
            PropValue::Quill(q) => Some(q),
            _ => None,
        }
    }
}
