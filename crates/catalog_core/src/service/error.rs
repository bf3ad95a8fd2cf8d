//! Engine-level error taxonomy.
//!
//! # Invariants
//! - Every mutation failure is `ValidationFailed` and carries the rejected
//!   arguments so callers can point at the offending input.
//! - `NotFound` is reserved for broken referential integrity, never for a
//!   lookup miss on a query path.

use crate::model::author::AuthorId;
use crate::repo::RepoError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Arguments of an `add_book` mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddBookRequest {
    pub title: String,
    /// Author name; resolved to an existing author or created.
    pub author: String,
    pub published: Option<i32>,
    pub genres: Vec<String>,
}

/// Arguments of an `edit_author` mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditAuthorRequest {
    pub name: String,
    /// New birth year; `None` clears it.
    pub set_born_to: Option<i32>,
}

/// Arguments of a `create_user` mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub favorite_genre: String,
}

/// Input attached to a `ValidationFailed` error.
///
/// Login failures only record the username; passwords never leave the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum RejectedInput {
    AddBook(AddBookRequest),
    EditAuthor(EditAuthorRequest),
    CreateUser(CreateUserRequest),
    Login { username: String },
}

/// Referenced record that should exist but does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundTarget {
    Author(AuthorId),
}

#[derive(Debug)]
pub enum CatalogError {
    /// Mutation input was rejected or could not be persisted.
    ValidationFailed {
        message: String,
        invalid: RejectedInput,
    },
    /// A stored reference points at a missing record.
    NotFound(NotFoundTarget),
    /// The store call could not complete.
    StoreUnavailable(RepoError),
    /// The request layer refused an anonymous mutation.
    Unauthorized(&'static str),
}

impl CatalogError {
    pub(crate) fn rejected(message: impl Display, invalid: RejectedInput) -> Self {
        Self::ValidationFailed {
            message: message.to_string(),
            invalid,
        }
    }

    /// Short stable code for logs and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationFailed { .. } => "validation_failed",
            Self::NotFound(_) => "not_found",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Unauthorized(_) => "unauthorized",
        }
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ValidationFailed { message, .. } => write!(f, "{message}"),
            Self::NotFound(NotFoundTarget::Author(id)) => {
                write!(f, "referenced author not found: {id}")
            }
            Self::StoreUnavailable(err) => write!(f, "catalog store unavailable: {err}"),
            Self::Unauthorized(operation) => {
                write!(f, "`{operation}` requires an authenticated user")
            }
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        Self::StoreUnavailable(value)
    }
}
