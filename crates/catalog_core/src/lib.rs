//! Core domain logic for the library catalog.
//! This crate is the single source of truth for catalog invariants.

pub mod config;
pub mod db;
pub mod identity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod request;
pub mod service;

pub use config::{CatalogConfig, ConfigError};
pub use identity::{IdentityContextProvider, IdentityError, Token, TokenClaims, TokenSigner};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::author::{Author, AuthorId};
pub use model::book::{Book, BookId};
pub use model::user::{User, UserId};
pub use model::validation::ModelValidationError;
pub use repo::author_repo::{AuthorRepository, SqliteAuthorRepository};
pub use repo::book_repo::{BookListQuery, BookRepository, SqliteBookRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use request::{MutationPolicy, RequestContext};
pub use service::author_resolution::{AuthorCreationPolicy, AuthorResolution};
pub use service::catalog_service::CatalogService;
pub use service::error::{
    AddBookRequest, CatalogError, CreateUserRequest, EditAuthorRequest, NotFoundTarget,
    RejectedInput,
};
pub use service::filter::ComposedFilter;
pub use service::resolver::{AuthorView, ResolvedBook};
pub use service::user_service::UserService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
