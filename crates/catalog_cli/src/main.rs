//! `catalog` command-line front end.
//!
//! # Responsibility
//! - Run one catalog query or mutation per invocation against the shared
//!   SQLite store.
//! - Build the request context from `--token` and apply the configured
//!   mutation policy before any mutation.
//! - Print results as JSON on stdout and failures as JSON on stderr.

use anyhow::{anyhow, Context, Result};
use catalog_core::db::open_db;
use catalog_core::{
    init_logging, AddBookRequest, CatalogConfig, CatalogError, CatalogService, CreateUserRequest,
    EditAuthorRequest, IdentityContextProvider, RejectedInput, RequestContext,
    SqliteAuthorRepository, SqliteBookRepository, SqliteUserRepository, TokenSigner, UserService,
};
use clap::{Parser, Subcommand};
use log::info;
use rusqlite::Connection;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Library catalog: authors, books and their resolved links", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database file (overrides CATALOG_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Bearer token identifying the caller
    #[arg(long, global = true)]
    token: Option<String>,

    /// Log at debug level (needs CATALOG_LOG_DIR)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List books, optionally filtered by author name and/or genre
    Books {
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        genre: Option<String>,
    },
    /// List authors with their book counts
    Authors,
    /// List distinct genres in order of first appearance
    Genres,
    /// Show total book and author counts
    Counts {
        /// Also count books by this author
        #[arg(long)]
        author: Option<String>,
    },
    /// Add a book, creating its author when the name is new
    AddBook {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        published: Option<i32>,
        /// Repeat for several genres; order is kept
        #[arg(long = "genre")]
        genres: Vec<String>,
    },
    /// Set or clear an author's birth year
    EditAuthor {
        #[arg(long)]
        name: String,
        /// Omit to clear the birth year
        #[arg(long)]
        born: Option<i32>,
    },
    /// Register a user
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        favorite_genre: String,
    },
    /// Exchange credentials for a bearer token
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Show the user behind --token
    Me,
    /// List books in the current user's favorite genre
    Recommend,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Counts {
    book_count: u64,
    author_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_book_count: Option<u64>,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    invalid: Option<&'a RejectedInput>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = CatalogConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if cli.verbose {
        config.log_level = "debug".to_string();
    }
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir).map_err(|err| anyhow!(err))?;
    }

    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open `{}`", config.db_path.display()))?;
    let catalog = CatalogService::new(
        SqliteAuthorRepository::try_new(&conn)?,
        SqliteBookRepository::try_new(&conn)?,
    )
    .with_author_policy(config.author_policy);

    let signer = match config.token_secret() {
        Ok(secret) => Some(TokenSigner::new(secret)?),
        Err(_) => None,
    };
    let ctx = request_context(&conn, signer.as_ref(), cli.token.as_deref())?;

    match cli.command {
        Commands::Books { author, genre } => {
            print_json(&catalog.all_books(author.as_deref(), genre.as_deref())?)
        }
        Commands::Authors => print_json(&catalog.all_authors()?),
        Commands::Genres => print_json(&catalog.all_genres()?),
        Commands::Counts { author } => {
            let author_book_count = match author.as_deref() {
                Some(name) => Some(catalog.author_book_count(name)?),
                None => None,
            };
            print_json(&Counts {
                book_count: catalog.book_count()?,
                author_count: catalog.author_count()?,
                author_book_count,
            })
        }
        Commands::AddBook {
            title,
            author,
            published,
            genres,
        } => {
            ctx.authorize_mutation(config.mutation_policy, "add_book")?;
            print_json(&catalog.add_book(AddBookRequest {
                title,
                author,
                published,
                genres,
            })?)
        }
        Commands::EditAuthor { name, born } => {
            ctx.authorize_mutation(config.mutation_policy, "edit_author")?;
            print_json(&catalog.edit_author(EditAuthorRequest {
                name,
                set_born_to: born,
            })?)
        }
        Commands::CreateUser {
            username,
            favorite_genre,
        } => {
            let users = user_service(&conn, signer.as_ref(), &config)?;
            print_json(&users.create_user(CreateUserRequest {
                username,
                favorite_genre,
            })?)
        }
        Commands::Login { username, password } => {
            let users = user_service(&conn, signer.as_ref(), &config)?;
            print_json(&users.login(&username, &password)?)
        }
        Commands::Me => print_json(&ctx.current_user()),
        Commands::Recommend => {
            let user = ctx
                .current_user()
                .ok_or_else(|| anyhow!("`recommend` needs --token for a signed-in user"))?;
            print_json(&catalog.recommended_books(user)?)
        }
    }
}

fn request_context(
    conn: &Connection,
    signer: Option<&TokenSigner>,
    token: Option<&str>,
) -> Result<RequestContext> {
    let Some(token) = token else {
        return Ok(RequestContext::anonymous());
    };
    let signer = signer.ok_or_else(|| anyhow!("--token needs CATALOG_SECRET to be set"))?;
    let provider = IdentityContextProvider::new(signer, SqliteUserRepository::try_new(conn)?);
    let user = provider.current_user(Some(&format!("Bearer {token}")))?;
    info!(
        "event=request_context module=cli status=ok authenticated={}",
        user.is_some()
    );
    Ok(RequestContext::from_user(user))
}

fn user_service<'a>(
    conn: &'a Connection,
    signer: Option<&'a TokenSigner>,
    config: &CatalogConfig,
) -> Result<UserService<'a, SqliteUserRepository<'a>>> {
    let signer = signer.ok_or_else(|| anyhow!("user commands need CATALOG_SECRET to be set"))?;
    Ok(UserService::new(
        SqliteUserRepository::try_new(conn)?,
        signer,
        config.login_password.clone(),
    ))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report(err: &anyhow::Error) {
    let envelope = match err.downcast_ref::<CatalogError>() {
        Some(catalog_err) => ErrorEnvelope {
            code: catalog_err.code(),
            message: catalog_err.to_string(),
            invalid: match catalog_err {
                CatalogError::ValidationFailed { invalid, .. } => Some(invalid),
                _ => None,
            },
        },
        None => ErrorEnvelope {
            code: "error",
            message: format!("{err:#}"),
            invalid: None,
        },
    };
    match serde_json::to_string_pretty(&envelope) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!("error: {err:#}"),
    }
}
