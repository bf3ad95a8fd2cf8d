//! Find-or-create resolution of author names.
//!
//! # Responsibility
//! - Map an author name to a stored author, creating it on first use.
//! - Expose the lookup-only read path used by query filters.
//!
//! # Invariants
//! - A created author has only `name` set.
//! - A created author stays persisted whatever happens to the caller's
//!   follow-up writes.
//! - Under `CheckThenInsert`, two callers racing on the same unseen name can
//!   both create a record. `InsertIfAbsent` delegates to the store's atomic
//!   primitive and creates exactly one.

use crate::model::author::Author;
use crate::repo::author_repo::AuthorRepository;
use crate::repo::RepoResult;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// How an unseen author name is turned into a stored record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthorCreationPolicy {
    /// Lookup, then insert as a separate store call.
    #[default]
    CheckThenInsert,
    /// Lookup and insert as one atomic store call.
    InsertIfAbsent,
}

impl AuthorCreationPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckThenInsert => "check_then_insert",
            Self::InsertIfAbsent => "insert_if_absent",
        }
    }
}

impl Display for AuthorCreationPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthorCreationPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "check_then_insert" => Ok(Self::CheckThenInsert),
            "insert_if_absent" => Ok(Self::InsertIfAbsent),
            other => Err(format!(
                "unsupported author policy `{other}`; expected check_then_insert|insert_if_absent"
            )),
        }
    }
}

/// Outcome of [`find_or_create_author`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorResolution {
    Existing(Author),
    Created(Author),
}

impl AuthorResolution {
    pub fn into_author(self) -> Author {
        match self {
            Self::Existing(author) | Self::Created(author) => author,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Read path: returns the author named `name`, never creates one.
pub fn find_author_by_name<A>(authors: &A, name: &str) -> RepoResult<Option<Author>>
where
    A: AuthorRepository + ?Sized,
{
    authors.find_author_by_name(name)
}

/// Returns the author named `name`, creating it when absent.
pub fn find_or_create_author<A>(
    authors: &A,
    name: &str,
    policy: AuthorCreationPolicy,
) -> RepoResult<AuthorResolution>
where
    A: AuthorRepository + ?Sized,
{
    match policy {
        AuthorCreationPolicy::CheckThenInsert => {
            if let Some(existing) = find_author_by_name(authors, name)? {
                return Ok(AuthorResolution::Existing(existing));
            }
            let candidate = Author::new(name);
            authors.create_author(&candidate)?;
            Ok(AuthorResolution::Created(candidate))
        }
        AuthorCreationPolicy::InsertIfAbsent => {
            let candidate = Author::new(name);
            let stored = authors.insert_author_if_absent(&candidate)?;
            if stored.id == candidate.id {
                Ok(AuthorResolution::Created(stored))
            } else {
                Ok(AuthorResolution::Existing(stored))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AuthorCreationPolicy;

    #[test]
    fn policy_parses_known_values() {
        assert_eq!(
            " Insert_If_Absent ".parse::<AuthorCreationPolicy>(),
            Ok(AuthorCreationPolicy::InsertIfAbsent)
        );
        assert_eq!(
            AuthorCreationPolicy::default(),
            AuthorCreationPolicy::CheckThenInsert
        );
        assert!("always".parse::<AuthorCreationPolicy>().is_err());
    }
}
