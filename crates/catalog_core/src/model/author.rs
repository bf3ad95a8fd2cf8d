//! Author domain model.
//!
//! # Invariants
//! - `name` is non-blank and intended unique, but uniqueness is enforced by
//!   lookup-before-create rather than by the schema.
//! - `born` is the only field mutated after creation.

use crate::model::validation::{is_blank, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable author identifier held by books as their author reference.
pub type AuthorId = Uuid;

/// Stored author record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    /// Birth year, unset for implicitly created authors.
    pub born: Option<i32>,
}

impl Author {
    /// Creates an author with a generated id and no birth year.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Creates an author with a caller-provided id.
    pub fn with_id(id: AuthorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            born: None,
        }
    }

    /// Validates required fields before persistence.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if is_blank(&self.name) {
            return Err(ModelValidationError::BlankAuthorName);
        }
        Ok(())
    }
}
