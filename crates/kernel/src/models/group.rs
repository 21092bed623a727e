//! Group model.
//!
//! Groups are reusable schemas referenced by GROUP_POINTER props. They are
//! stored independently of any entry or template.

use folio_sdk::types::{GroupId, Schema};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Group record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "_id")]
    pub id: GroupId,

    pub name: String,

    pub schema: Schema,
}

impl Group {
    pub fn new(name: &str, schema: Schema) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            schema,
        }
    }

    /// Use a fixed id (fixtures and imports).
    pub fn with_id(mut self, id: GroupId) -> Self {
        self.id = id;
        self
    }
}
