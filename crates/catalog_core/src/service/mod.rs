//! Catalog use-case services.
//!
//! # Responsibility
//! - Compose filters, resolve references and run find-or-create on top of
//!   the repository contracts.
//! - Keep transports decoupled from storage details.

pub mod author_resolution;
pub mod catalog_service;
pub mod error;
pub mod filter;
pub mod resolver;
pub mod user_service;
