//! Label entity: an annotation file attached to one image.
//!
//! # Invariants
//! - `rel_path` is unique across all labels.
//! - `dataset_id` is a denormalized copy of the image's dataset and must be
//!   equal to it at creation time. No code path moves images between
//!   datasets, so the copy cannot drift.

use crate::model::dataset::DatasetId;
use crate::model::image::ImageId;
use crate::model::validation::{require_id, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type LabelId = Uuid;

/// Catalog entry for one label file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub uuid: LabelId,
    pub image_id: ImageId,
    pub dataset_id: DatasetId,
    /// Path relative to the image mount root.
    pub rel_path: String,
    /// Free-form category such as `depth` or `surface_normals`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl Label {
    /// Creates a label with a generated ID. The type is stored as given.
    pub fn new(
        image_id: ImageId,
        dataset_id: DatasetId,
        rel_path: impl Into<String>,
        label_type: &str,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            image_id,
            dataset_id,
            rel_path: rel_path.into(),
            kind: label_type.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id("label", self.uuid)?;
        require_id("image", self.image_id)?;
        require_id("dataset", self.dataset_id)?;
        require_text("label", "rel_path", &self.rel_path)?;
        require_text("label", "type", &self.kind)
    }
}
