//! Locations inside a content payload.
//!
//! A path starts at an optional prefix (e.g. `entry[2]`). Top-level props
//! read `entry[2].props[bio]`; anything below a prop continues with
//! `.field` and `[index]` segments: `entry[2].props[bio].heading.slug`,
//! `props[g].x`, `props[sections][0].title`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropPath {
    text: String,
    in_prop: bool,
}

impl PropPath {
    /// Path of a prop collection under `prefix` (may be empty).
    pub fn new(prefix: &str) -> Self {
        Self {
            text: prefix.to_string(),
            in_prop: false,
        }
    }

    /// Path of the named prop within the collection at this path.
    pub fn prop(&self, name: &str) -> Self {
        if self.in_prop {
            return self.field(name);
        }
        let text = if self.text.is_empty() {
            format!("props[{name}]")
        } else {
            format!("{}.props[{name}]", self.text)
        };
        Self {
            text,
            in_prop: true,
        }
    }

    /// The collection itself, for errors about its overall shape.
    pub fn collection(&self) -> Self {
        if self.in_prop {
            self.clone()
        } else {
            self.field("props")
        }
    }

    pub fn field(&self, name: &str) -> Self {
        let text = if self.text.is_empty() {
            name.to_string()
        } else {
            format!("{}.{name}", self.text)
        };
        Self {
            text,
            in_prop: self.in_prop,
        }
    }

    pub fn index(&self, i: usize) -> Self {
        Self {
            text: format!("{}[{i}]", self.text),
            in_prop: self.in_prop,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for PropPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<PropPath> for String {
    fn from(path: PropPath) -> Self {
        path.text
    }
}

impl From<&PropPath> for String {
    fn from(path: &PropPath) -> Self {
        path.text.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_props() {
        assert_eq!(PropPath::new("").prop("title").as_str(), "props[title]");
        assert_eq!(
            PropPath::new("entry[2]").prop("bio").field("heading").as_str(),
            "entry[2].props[bio].heading"
        );
    }

    #[test]
    fn nested_group_props_use_dots() {
        let group = PropPath::new("").prop("g");
        assert_eq!(group.prop("x").as_str(), "props[g].x");
        assert_eq!(
            group.index(0).prop("title").as_str(),
            "props[g][0].title"
        );
    }

    #[test]
    fn collection_paths() {
        assert_eq!(PropPath::new("").collection().as_str(), "props");
        assert_eq!(PropPath::new("entry[1]").collection().as_str(), "entry[1].props");
        let group = PropPath::new("").prop("g");
        assert_eq!(group.collection().as_str(), "props[g]");
    }
}
