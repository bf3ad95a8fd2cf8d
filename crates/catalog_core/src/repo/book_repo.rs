//! Book repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist books together with their ordered genre list.
//! - Evaluate composed filters (author equality, genre membership) in SQL.
//!
//! # Invariants
//! - A book row and its genre rows are written in one transaction.
//! - Genre order is preserved through `book_genres.position`.
//! - Genre matching is exact and case-sensitive.
//! - Listing is deterministic: insertion order (`rowid ASC`).

use crate::model::author::AuthorId;
use crate::model::book::{Book, BookId};
use crate::repo::schema::{ensure_table_ready, parse_uuid};
use crate::repo::RepoResult;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Transaction, TransactionBehavior,
};
use std::collections::HashSet;

/// Store-level book predicate. Absent fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookListQuery {
    /// Books whose author reference equals this id.
    pub author_id: Option<AuthorId>,
    /// Books whose genre list contains this value.
    pub genre: Option<String>,
}

impl BookListQuery {
    pub fn by_author(author_id: AuthorId) -> Self {
        Self {
            author_id: Some(author_id),
            genre: None,
        }
    }
}

/// Repository interface for book records.
pub trait BookRepository {
    fn create_book(&self, book: &Book) -> RepoResult<BookId>;
    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>>;
    /// Lists books matching every set field of `query`, in insertion order.
    fn list_books(&self, query: &BookListQuery) -> RepoResult<Vec<Book>>;
    /// Counts books matching every set field of `query`.
    fn count_books(&self, query: &BookListQuery) -> RepoResult<u64>;
    /// Distinct genres in order of first appearance.
    fn list_genres(&self) -> RepoResult<Vec<String>>;

    fn count_books_by_author(&self, author_id: AuthorId) -> RepoResult<u64> {
        self.count_books(&BookListQuery::by_author(author_id))
    }
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "books",
            &["uuid", "title", "author_uuid", "published"],
        )?;
        ensure_table_ready(conn, "book_genres", &["book_uuid", "position", "genre"])?;
        Ok(Self { conn })
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn create_book(&self, book: &Book) -> RepoResult<BookId> {
        book.validate()?;

        let book_uuid = book.id.to_string();
        // Write lock is taken at BEGIN; competing writers wait on busy_timeout.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO books (uuid, title, author_uuid, published)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                book_uuid.as_str(),
                book.title.as_str(),
                book.author_id.to_string(),
                book.published,
            ],
        )?;
        for (position, genre) in book.genres.iter().enumerate() {
            tx.execute(
                "INSERT INTO book_genres (book_uuid, position, genre) VALUES (?1, ?2, ?3);",
                params![book_uuid.as_str(), position as i64, genre.as_str()],
            )?;
        }
        tx.commit()?;

        Ok(book.id)
    }

    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        let row = self
            .conn
            .query_row(
                "SELECT uuid, title, author_uuid, published FROM books WHERE uuid = ?1;",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>("uuid")?,
                        row.get::<_, String>("title")?,
                        row.get::<_, String>("author_uuid")?,
                        row.get::<_, Option<i32>>("published")?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some(columns) => Ok(Some(assemble_book(self.conn, columns)?)),
            None => Ok(None),
        }
    }

    fn list_books(&self, query: &BookListQuery) -> RepoResult<Vec<Book>> {
        let (where_sql, bind_values) = build_where_clause(query);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT uuid, title, author_uuid, published
             FROM books{where_sql}
             ORDER BY rowid ASC;"
        ))?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;

        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            columns.push((
                row.get::<_, String>("uuid")?,
                row.get::<_, String>("title")?,
                row.get::<_, String>("author_uuid")?,
                row.get::<_, Option<i32>>("published")?,
            ));
        }

        columns
            .into_iter()
            .map(|columns| assemble_book(self.conn, columns))
            .collect()
    }

    fn count_books(&self, query: &BookListQuery) -> RepoResult<u64> {
        let (where_sql, bind_values) = build_where_clause(query);
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM books{where_sql};"),
            params_from_iter(bind_values),
            |row| row.get(0),
        )?;
        Ok(count.unsigned_abs())
    }

    fn list_genres(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT g.genre
             FROM book_genres g
             INNER JOIN books b ON b.uuid = g.book_uuid
             ORDER BY b.rowid ASC, g.position ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut seen = HashSet::new();
        let mut genres = Vec::new();
        while let Some(row) = rows.next()? {
            let genre: String = row.get(0)?;
            if seen.insert(genre.clone()) {
                genres.push(genre);
            }
        }
        Ok(genres)
    }
}

type BookColumns = (String, String, String, Option<i32>);

fn build_where_clause(query: &BookListQuery) -> (String, Vec<Value>) {
    let mut sql = String::from(" WHERE 1 = 1");
    let mut bind_values: Vec<Value> = Vec::new();

    if let Some(author_id) = query.author_id {
        sql.push_str(" AND author_uuid = ?");
        bind_values.push(Value::Text(author_id.to_string()));
    }

    if let Some(genre) = query.genre.as_ref() {
        sql.push_str(
            " AND EXISTS (
                SELECT 1
                FROM book_genres g
                WHERE g.book_uuid = books.uuid
                  AND g.genre = ?
            )",
        );
        bind_values.push(Value::Text(genre.clone()));
    }

    (sql, bind_values)
}

fn assemble_book(conn: &Connection, columns: BookColumns) -> RepoResult<Book> {
    let (uuid_text, title, author_text, published) = columns;
    let genres = load_genres(conn, &uuid_text)?;
    Ok(Book {
        id: parse_uuid(&uuid_text, "books.uuid")?,
        title,
        author_id: parse_uuid(&author_text, "books.author_uuid")?,
        published,
        genres,
    })
}

fn load_genres(conn: &Connection, book_uuid: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT genre
         FROM book_genres
         WHERE book_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([book_uuid])?;
    let mut genres = Vec::new();
    while let Some(row) = rows.next()? {
        genres.push(row.get(0)?);
    }
    Ok(genres)
}
