//! Catalog domain model.
//!
//! # Responsibility
//! - Define the stored records for authors, books and users.
//! - Own field-level validation rules shared by every write path.
//!
//! # Invariants
//! - Every record is identified by a stable UUID assigned at creation.
//! - Books reference authors by id; authors never list their books.

pub mod author;
pub mod book;
pub mod user;
pub mod validation;
