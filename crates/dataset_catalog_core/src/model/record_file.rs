//! Record file entity: a generated serialized-record artifact of a dataset.

use crate::model::dataset::DatasetId;
use crate::model::validation::{require_id, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RecordFileId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFile {
    pub uuid: RecordFileId,
    pub dataset_id: DatasetId,
    pub name: String,
    /// Generation time in Unix epoch milliseconds.
    pub date: i64,
}

impl RecordFile {
    pub fn new(dataset_id: DatasetId, name: impl Into<String>, date: i64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            dataset_id,
            name: name.into(),
            date,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id("record_file", self.uuid)?;
        require_id("dataset", self.dataset_id)?;
        require_text("record_file", "name", &self.name)
    }
}
