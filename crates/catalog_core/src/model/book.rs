//! Book domain model.
//!
//! # Invariants
//! - `author_id` is the only link between a book and its author.
//! - `genres` keeps input order; duplicates are allowed.
//! - Books are immutable after creation.

use crate::model::author::AuthorId;
use crate::model::validation::{is_blank, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BookId = Uuid;

/// Stored book record with a raw author reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author_id: AuthorId,
    pub published: Option<i32>,
    pub genres: Vec<String>,
}

impl Book {
    /// Creates a book with a generated id.
    pub fn new(
        title: impl Into<String>,
        author_id: AuthorId,
        published: Option<i32>,
        genres: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            author_id,
            published,
            genres,
        }
    }

    /// Validates required fields before persistence.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if is_blank(&self.title) {
            return Err(ModelValidationError::BlankTitle);
        }
        if let Some(position) = self.genres.iter().position(|genre| is_blank(genre)) {
            return Err(ModelValidationError::BlankGenre { position });
        }
        Ok(())
    }
}
