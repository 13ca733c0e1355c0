//! Catalog domain model.
//!
//! # Responsibility
//! - Define the entities stored by the catalog: projects, datasets, images,
//!   labels and generated record files.
//! - Provide write-side validation shared by every repository implementation.
//!
//! # Invariants
//! - Every entity is identified by a stable, non-nil UUID.
//! - Ownership edges ("belongs to") are stored as parent ids on the child.
//! - Dates are Unix epoch milliseconds.

pub mod dataset;
pub mod image;
pub mod label;
pub mod project;
pub mod record_file;
pub mod validation;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
