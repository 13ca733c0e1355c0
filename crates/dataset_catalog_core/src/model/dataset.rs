//! Dataset entity: packaged training/test/validation data and its metadata.
//!
//! # Invariants
//! - A dataset belongs to exactly one project.
//! - Split counts are non-negative and stored as-is; they are not derived
//!   from the number of cataloged images.

use crate::model::project::ProjectId;
use crate::model::validation::{require_id, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type DatasetId = Uuid;

/// Catalog entry for one packaged dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub uuid: DatasetId,
    pub project_id: ProjectId,
    /// Unique lookup key.
    pub name: String,
    /// Packaging time in Unix epoch milliseconds.
    pub date: i64,
    pub num_training: u32,
    pub num_test: u32,
    pub num_validation: u32,
    /// Relative location of the packaged training split.
    pub training_data_path: String,
    /// Relative location of the packaged test split.
    pub test_data_path: String,
    /// Relative location of the packaged validation split.
    pub validation_data_path: String,
}

impl Dataset {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id("dataset", self.uuid)?;
        require_id("project", self.project_id)?;
        require_text("dataset", "name", &self.name)?;
        require_text("dataset", "training_data_path", &self.training_data_path)?;
        require_text("dataset", "test_data_path", &self.test_data_path)?;
        require_text("dataset", "validation_data_path", &self.validation_data_path)
    }
}
