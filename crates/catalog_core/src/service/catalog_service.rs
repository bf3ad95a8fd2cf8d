//! Catalog resolution engine.
//!
//! # Responsibility
//! - Answer book/author queries with resolved references and live counts.
//! - Run the `add_book` and `edit_author` mutations.
//!
//! # Invariants
//! - Holds no catalog state of its own; every answer comes from the store.
//! - In `add_book` the author is resolved (and committed when created)
//!   before the book insert is issued. A failed book insert does not roll
//!   the author back.
//! - `edit_author` on an unknown name returns `Ok(None)`.

use crate::model::book::Book;
use crate::model::user::User;
use crate::repo::author_repo::AuthorRepository;
use crate::repo::book_repo::{BookListQuery, BookRepository};
use crate::repo::RepoError;
use crate::service::author_resolution::{
    find_author_by_name, find_or_create_author, AuthorCreationPolicy,
};
use crate::service::error::{AddBookRequest, CatalogError, EditAuthorRequest, RejectedInput};
use crate::service::filter::{compose_book_filter, ComposedFilter};
use crate::service::resolver::{
    author_view, book_count, resolve_books, AuthorView, ResolvedBook,
};
use log::{info, warn};

/// Query/mutation facade over author and book repositories.
pub struct CatalogService<A: AuthorRepository, B: BookRepository> {
    authors: A,
    books: B,
    author_policy: AuthorCreationPolicy,
}

impl<A: AuthorRepository, B: BookRepository> CatalogService<A, B> {
    /// Creates a service using `CheckThenInsert` author creation.
    pub fn new(authors: A, books: B) -> Self {
        Self {
            authors,
            books,
            author_policy: AuthorCreationPolicy::default(),
        }
    }

    pub fn with_author_policy(mut self, policy: AuthorCreationPolicy) -> Self {
        self.author_policy = policy;
        self
    }

    pub fn author_policy(&self) -> AuthorCreationPolicy {
        self.author_policy
    }

    /// Lists books, optionally narrowed by author name and/or genre.
    ///
    /// An unknown author name yields an empty list.
    pub fn all_books(
        &self,
        author: Option<&str>,
        genre: Option<&str>,
    ) -> Result<Vec<ResolvedBook>, CatalogError> {
        let query = match compose_book_filter(&self.authors, author, genre)? {
            ComposedFilter::Empty => return Ok(Vec::new()),
            ComposedFilter::Books(query) => query,
        };
        let books = self.books.list_books(&query)?;
        resolve_books(&self.authors, books)
    }

    /// Books in the user's favorite genre.
    pub fn recommended_books(&self, user: &User) -> Result<Vec<ResolvedBook>, CatalogError> {
        self.all_books(None, Some(user.favorite_genre.as_str()))
    }

    /// Lists every author with a live book count, in insertion order.
    pub fn all_authors(&self) -> Result<Vec<AuthorView>, CatalogError> {
        let authors = self.authors.list_authors()?;
        let mut views = Vec::with_capacity(authors.len());
        for author in authors {
            views.push(author_view(&self.books, author)?);
        }
        Ok(views)
    }

    /// Number of books written by the author named `name` (0 if unknown).
    pub fn author_book_count(&self, name: &str) -> Result<u64, CatalogError> {
        Ok(book_count(&self.authors, &self.books, name)?)
    }

    /// Total number of stored books.
    pub fn book_count(&self) -> Result<u64, CatalogError> {
        Ok(self.books.count_books(&BookListQuery::default())?)
    }

    /// Total number of stored authors.
    pub fn author_count(&self) -> Result<u64, CatalogError> {
        Ok(self.authors.count_authors()?)
    }

    /// Distinct genres in order of first appearance.
    pub fn all_genres(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.books.list_genres()?)
    }

    /// Creates a book, resolving or creating its author by name.
    ///
    /// # Errors
    /// - `ValidationFailed` carrying `request` for any rejected field or
    ///   store failure.
    pub fn add_book(&self, request: AddBookRequest) -> Result<ResolvedBook, CatalogError> {
        let resolution =
            match find_or_create_author(&self.authors, &request.author, self.author_policy) {
                Ok(resolution) => resolution,
                Err(err) => {
                    warn!(
                        "event=add_book module=service status=error stage=author policy={} error={}",
                        self.author_policy, err
                    );
                    return Err(CatalogError::rejected(err, RejectedInput::AddBook(request)));
                }
            };
        let author_created = resolution.was_created();
        let author = resolution.into_author();

        let book = Book::new(
            request.title.clone(),
            author.id,
            request.published,
            request.genres.clone(),
        );
        if let Err(err) = self.books.create_book(&book) {
            warn!(
                "event=add_book module=service status=error stage=book author_id={} author_created={} error={}",
                author.id, author_created, err
            );
            return Err(CatalogError::rejected(err, RejectedInput::AddBook(request)));
        }

        info!(
            "event=add_book module=service status=ok book_id={} author_id={} author_created={} genres={}",
            book.id,
            author.id,
            author_created,
            book.genres.len()
        );
        Ok(ResolvedBook::from_parts(book, author))
    }

    /// Sets (or clears) the birth year of the author named `request.name`.
    ///
    /// Returns `Ok(None)` when no such author exists.
    pub fn edit_author(
        &self,
        request: EditAuthorRequest,
    ) -> Result<Option<AuthorView>, CatalogError> {
        let reject = |err: RepoError, request: &EditAuthorRequest| -> CatalogError {
            warn!("event=edit_author module=service status=error error={err}");
            CatalogError::rejected(err, RejectedInput::EditAuthor(request.clone()))
        };

        let mut author = match find_author_by_name(&self.authors, &request.name) {
            Ok(Some(author)) => author,
            Ok(None) => {
                info!("event=edit_author module=service status=miss");
                return Ok(None);
            }
            Err(err) => return Err(reject(err, &request)),
        };

        if let Err(err) = self
            .authors
            .update_author_born(author.id, request.set_born_to)
        {
            return Err(reject(err, &request));
        }
        author.born = request.set_born_to;

        let view = author_view(&self.books, author).map_err(|err| reject(err, &request))?;
        info!(
            "event=edit_author module=service status=ok author_id={} born_set={}",
            view.author.id,
            view.author.born.is_some()
        );
        Ok(Some(view))
    }
}
