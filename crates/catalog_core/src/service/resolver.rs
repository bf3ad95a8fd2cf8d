//! Reference resolution and per-author aggregates.
//!
//! # Invariants
//! - Book counts are computed from current store contents on every call and
//!   are always scoped to one author's id.
//! - A book whose author reference is dangling fails with `NotFound`; it is
//!   never rendered with a placeholder author.
//! - Author lookups are memoized within one `resolve_books` call only.

use crate::model::author::{Author, AuthorId};
use crate::model::book::{Book, BookId};
use crate::repo::author_repo::AuthorRepository;
use crate::repo::book_repo::BookRepository;
use crate::repo::RepoResult;
use crate::service::author_resolution::find_author_by_name;
use crate::service::error::{CatalogError, NotFoundTarget};
use serde::Serialize;
use std::collections::HashMap;

/// Book output record with its author reference replaced by the author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedBook {
    pub id: BookId,
    pub title: String,
    pub author: Author,
    pub published: Option<i32>,
    pub genres: Vec<String>,
}

impl ResolvedBook {
    pub(crate) fn from_parts(book: Book, author: Author) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author,
            published: book.published,
            genres: book.genres,
        }
    }
}

/// Author output record with its derived book count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    #[serde(flatten)]
    pub author: Author,
    pub book_count: u64,
}

/// Loads the author a stored book points at.
pub fn resolve_author<A>(authors: &A, author_id: AuthorId) -> Result<Author, CatalogError>
where
    A: AuthorRepository + ?Sized,
{
    authors
        .get_author(author_id)?
        .ok_or(CatalogError::NotFound(NotFoundTarget::Author(author_id)))
}

/// Number of books referencing the author named `author_name`; 0 when no
/// such author exists.
pub fn book_count<A, B>(authors: &A, books: &B, author_name: &str) -> RepoResult<u64>
where
    A: AuthorRepository + ?Sized,
    B: BookRepository + ?Sized,
{
    match find_author_by_name(authors, author_name)? {
        Some(author) => books.count_books_by_author(author.id),
        None => Ok(0),
    }
}

/// Attaches the live book count to `author`.
pub fn author_view<B>(books: &B, author: Author) -> RepoResult<AuthorView>
where
    B: BookRepository + ?Sized,
{
    let book_count = books.count_books_by_author(author.id)?;
    Ok(AuthorView { author, book_count })
}

/// Replaces every book's author reference with the stored author.
pub fn resolve_books<A>(authors: &A, books: Vec<Book>) -> Result<Vec<ResolvedBook>, CatalogError>
where
    A: AuthorRepository + ?Sized,
{
    let mut seen: HashMap<AuthorId, Author> = HashMap::new();
    let mut resolved = Vec::with_capacity(books.len());
    for book in books {
        let author = match seen.get(&book.author_id) {
            Some(author) => author.clone(),
            None => {
                let author = resolve_author(authors, book.author_id)?;
                seen.insert(author.id, author.clone());
                author
            }
        };
        resolved.push(ResolvedBook::from_parts(book, author));
    }
    Ok(resolved)
}
