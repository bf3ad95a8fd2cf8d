//! Entity store contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the store operations the resolution engine depends on.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes run model validation before SQL mutations.
//! - List queries return rows in insertion order.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod author_repo;
pub mod book_repo;
mod error;
mod schema;
pub mod user_repo;

pub use error::{RepoError, RepoResult};
