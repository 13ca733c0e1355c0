//! Image entity: one image file cataloged inside a dataset.

use crate::model::dataset::DatasetId;
use crate::model::validation::{require_id, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

pub type ImageId = Uuid;

/// Catalog entry for one image file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub uuid: ImageId,
    pub dataset_id: DatasetId,
    /// Path relative to the image mount root. Unique across the catalog.
    pub rel_path: String,
    pub height: u32,
    pub width: u32,
    pub channels: u32,
    /// File extension including the leading dot, empty when the path has none.
    pub extension: String,
}

impl Image {
    /// Creates an image entry with a generated ID and an extension derived
    /// from `rel_path`.
    pub fn new(
        dataset_id: DatasetId,
        rel_path: impl Into<String>,
        width: u32,
        height: u32,
        channels: u32,
    ) -> Self {
        let rel_path = rel_path.into();
        let extension = extension_of(&rel_path);
        Self {
            uuid: Uuid::new_v4(),
            dataset_id,
            rel_path,
            height,
            width,
            channels,
            extension,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id("image", self.uuid)?;
        require_id("dataset", self.dataset_id)?;
        require_text("image", "rel_path", &self.rel_path)?;
        for (field, value) in [
            ("height", self.height),
            ("width", self.width),
            ("channels", self.channels),
        ] {
            if value == 0 {
                return Err(ValidationError::NonPositive {
                    field,
                    rel_path: self.rel_path.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Returns the extension of the final path component with its leading dot.
pub fn extension_of(rel_path: &str) -> String {
    Path::new(rel_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}
