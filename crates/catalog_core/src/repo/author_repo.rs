//! Author repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide lookup/insert/update APIs over the `authors` table.
//! - Offer an atomic insert-if-absent primitive for callers that need to
//!   close the find-or-create race.
//!
//! # Invariants
//! - Name lookups are exact and case-sensitive; with duplicate names the
//!   earliest inserted author wins.
//! - `born` is the only column rewritten after insert.

use crate::model::author::{Author, AuthorId};
use crate::repo::schema::{ensure_table_ready, parse_uuid};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const AUTHOR_SELECT_SQL: &str = "SELECT uuid, name, born FROM authors";

/// Repository interface for author records.
pub trait AuthorRepository {
    /// Inserts one author unconditionally.
    fn create_author(&self, author: &Author) -> RepoResult<AuthorId>;
    /// Returns the stored author named `author.name`, inserting `author` first
    /// when none exists. Lookup and insert are one atomic store step.
    fn insert_author_if_absent(&self, author: &Author) -> RepoResult<Author>;
    fn get_author(&self, id: AuthorId) -> RepoResult<Option<Author>>;
    fn find_author_by_name(&self, name: &str) -> RepoResult<Option<Author>>;
    /// Lists all authors in insertion order.
    fn list_authors(&self) -> RepoResult<Vec<Author>>;
    /// Replaces `born`; `None` clears it.
    fn update_author_born(&self, id: AuthorId, born: Option<i32>) -> RepoResult<()>;
    fn count_authors(&self) -> RepoResult<u64>;
}

/// SQLite-backed author repository.
pub struct SqliteAuthorRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAuthorRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "authors", &["uuid", "name", "born", "updated_at"])?;
        Ok(Self { conn })
    }
}

impl AuthorRepository for SqliteAuthorRepository<'_> {
    fn create_author(&self, author: &Author) -> RepoResult<AuthorId> {
        author.validate()?;
        insert_author(self.conn, author)?;
        Ok(author.id)
    }

    fn insert_author_if_absent(&self, author: &Author) -> RepoResult<Author> {
        author.validate()?;

        // IMMEDIATE takes the write lock up front, so a competing connection
        // cannot slip its insert between our lookup and our insert.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if let Some(existing) = find_by_name(&tx, &author.name)? {
            tx.commit()?;
            return Ok(existing);
        }
        insert_author(&tx, author)?;
        tx.commit()?;
        Ok(author.clone())
    }

    fn get_author(&self, id: AuthorId) -> RepoResult<Option<Author>> {
        self.conn
            .query_row(
                &format!("{AUTHOR_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| Ok(parse_author_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn find_author_by_name(&self, name: &str) -> RepoResult<Option<Author>> {
        find_by_name(self.conn, name)
    }

    fn list_authors(&self) -> RepoResult<Vec<Author>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{AUTHOR_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut authors = Vec::new();
        while let Some(row) = rows.next()? {
            authors.push(parse_author_row(row)?);
        }
        Ok(authors)
    }

    fn update_author_born(&self, id: AuthorId, born: Option<i32>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE authors
             SET
                born = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?2;",
            params![born, id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                table: "authors",
                id,
            });
        }

        Ok(())
    }

    fn count_authors(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM authors;", [], |row| row.get(0))?;
        Ok(count.unsigned_abs())
    }
}

fn insert_author(conn: &Connection, author: &Author) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO authors (uuid, name, born) VALUES (?1, ?2, ?3);",
        params![author.id.to_string(), author.name.as_str(), author.born],
    )?;
    Ok(())
}

fn find_by_name(conn: &Connection, name: &str) -> RepoResult<Option<Author>> {
    conn.query_row(
        &format!("{AUTHOR_SELECT_SQL} WHERE name = ?1 ORDER BY rowid ASC LIMIT 1;"),
        [name],
        |row| Ok(parse_author_row(row)),
    )
    .optional()?
    .transpose()
}

fn parse_author_row(row: &Row<'_>) -> RepoResult<Author> {
    let uuid_text: String = row.get("uuid")?;
    let author = Author {
        id: parse_uuid(&uuid_text, "authors.uuid")?,
        name: row.get("name")?,
        born: row.get("born")?,
    };
    author
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("author {uuid_text}: {err}")))?;
    Ok(author)
}
