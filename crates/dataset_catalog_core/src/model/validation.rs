//! Write-side validation errors for catalog entities.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reason an entity was rejected before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Entity id is the nil UUID.
    NilId { entity: &'static str },
    /// A required text field is empty after trimming.
    BlankField {
        entity: &'static str,
        field: &'static str,
    },
    /// An image dimension or channel count is zero.
    NonPositive {
        field: &'static str,
        rel_path: String,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId { entity } => write!(f, "{entity} id must not be nil"),
            Self::BlankField { entity, field } => {
                write!(f, "{entity}.{field} must not be blank")
            }
            Self::NonPositive { field, rel_path } => {
                write!(f, "image `{rel_path}` has non-positive {field}")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_id(entity: &'static str, id: uuid::Uuid) -> Result<(), ValidationError> {
    if id.is_nil() {
        return Err(ValidationError::NilId { entity });
    }
    Ok(())
}

pub(crate) fn require_text(
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField { entity, field });
    }
    Ok(())
}
