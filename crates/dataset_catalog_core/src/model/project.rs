//! Project entity: a named grouping of datasets.

use crate::model::validation::{require_id, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProjectId = Uuid;

/// Named grouping of datasets. Names are unique across the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub uuid: ProjectId,
    pub name: String,
}

impl Project {
    /// Creates a project with a generated stable ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id("project", self.uuid)?;
        require_text("project", "name", &self.name)
    }
}
