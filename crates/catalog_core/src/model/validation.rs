//! Field validation errors for catalog records.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Required-field violations detected before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Author name is empty or whitespace only.
    BlankAuthorName,
    /// Book title is empty or whitespace only.
    BlankTitle,
    /// Genre entry at `position` is empty or whitespace only.
    BlankGenre { position: usize },
    /// Username is empty or whitespace only.
    BlankUsername,
    /// Favorite genre is empty or whitespace only.
    BlankFavoriteGenre,
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankAuthorName => write!(f, "author name is required"),
            Self::BlankTitle => write!(f, "book title is required"),
            Self::BlankGenre { position } => {
                write!(f, "genre at position {position} must not be blank")
            }
            Self::BlankUsername => write!(f, "username is required"),
            Self::BlankFavoriteGenre => write!(f, "favorite genre is required"),
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
