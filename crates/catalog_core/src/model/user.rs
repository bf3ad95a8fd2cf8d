//! User domain model for request identity.

use crate::model::validation::{is_blank, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

/// Registered user; `username` is unique in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub favorite_genre: String,
}

impl User {
    pub fn new(username: impl Into<String>, favorite_genre: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            favorite_genre: favorite_genre.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if is_blank(&self.username) {
            return Err(ModelValidationError::BlankUsername);
        }
        if is_blank(&self.favorite_genre) {
            return Err(ModelValidationError::BlankFavoriteGenre);
        }
        Ok(())
    }
}
