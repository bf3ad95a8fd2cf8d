//! Composition of optional book filters into one store predicate.
//!
//! # Invariants
//! - An author filter naming no stored author matches nothing and never
//!   reaches the store as a null reference.
//! - Only missing or empty filter values are absent. Whitespace is a real
//!   value: as an author name it matches no author, as a genre no book.
//! - Author lookup here never creates an author.

use crate::repo::author_repo::AuthorRepository;
use crate::repo::book_repo::BookListQuery;
use crate::repo::RepoResult;
use crate::service::author_resolution::find_author_by_name;

/// Result of filter composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposedFilter {
    /// Provably empty; the book store does not need to be queried.
    Empty,
    /// Conjunction of the set fields.
    Books(BookListQuery),
}

/// Builds the book predicate for an optional author name and genre.
pub fn compose_book_filter<A>(
    authors: &A,
    author_name: Option<&str>,
    genre: Option<&str>,
) -> RepoResult<ComposedFilter>
where
    A: AuthorRepository + ?Sized,
{
    let mut query = BookListQuery {
        author_id: None,
        genre: present(genre).map(str::to_string),
    };

    if let Some(name) = present(author_name) {
        match find_author_by_name(authors, name)? {
            Some(author) => query.author_id = Some(author.id),
            None => return Ok(ComposedFilter::Empty),
        }
    }

    Ok(ComposedFilter::Books(query))
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::present;

    #[test]
    fn only_empty_values_are_absent() {
        assert_eq!(present(Some("")), None);
        assert_eq!(present(Some("   ")), Some("   "));
        assert_eq!(present(None), None);
        assert_eq!(present(Some(" crime ")), Some(" crime "));
    }
}
