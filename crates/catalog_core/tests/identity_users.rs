use catalog_core::db::open_db_in_memory;
use catalog_core::{
    CatalogError, CreateUserRequest, IdentityContextProvider, IdentityError, RejectedInput,
    RequestContext, SqliteUserRepository, TokenSigner, UserService,
};
use rusqlite::params;

const SECRET: &str = "catalog-test-secret";
const PASSWORD: &str = "secret";

fn create_request(username: &str, favorite_genre: &str) -> CreateUserRequest {
    CreateUserRequest {
        username: username.to_string(),
        favorite_genre: favorite_genre.to_string(),
    }
}

#[test]
fn create_user_then_login_issues_verifiable_token() {
    let conn = open_db_in_memory().unwrap();
    let signer = TokenSigner::new(SECRET).unwrap();
    let users = UserService::new(SqliteUserRepository::try_new(&conn).unwrap(), &signer, PASSWORD);

    let user = users
        .create_user(create_request("mluukkai", "refactoring"))
        .unwrap();
    let token = users.login("mluukkai", PASSWORD).unwrap();

    let claims = signer.verify(&token.value).unwrap();
    assert_eq!(claims.id, user.id);
    assert_eq!(claims.username, "mluukkai");
}

#[test]
fn duplicate_username_is_rejected_with_input() {
    let conn = open_db_in_memory().unwrap();
    let signer = TokenSigner::new(SECRET).unwrap();
    let users = UserService::new(SqliteUserRepository::try_new(&conn).unwrap(), &signer, PASSWORD);

    users
        .create_user(create_request("mluukkai", "refactoring"))
        .unwrap();
    let err = users
        .create_user(create_request("mluukkai", "crime"))
        .unwrap_err();

    match err {
        CatalogError::ValidationFailed { invalid, .. } => assert_eq!(
            invalid,
            RejectedInput::CreateUser(create_request("mluukkai", "crime"))
        ),
        other => panic!("expected ValidationFailed, got {other:?}"),
    }
}

#[test]
fn blank_favorite_genre_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let signer = TokenSigner::new(SECRET).unwrap();
    let users = UserService::new(SqliteUserRepository::try_new(&conn).unwrap(), &signer, PASSWORD);

    let err = users.create_user(create_request("reader", " ")).unwrap_err();
    assert_eq!(err.code(), "validation_failed");
    assert!(err.to_string().contains("favorite genre"));
}

#[test]
fn login_failures_look_the_same() {
    let conn = open_db_in_memory().unwrap();
    let signer = TokenSigner::new(SECRET).unwrap();
    let users = UserService::new(SqliteUserRepository::try_new(&conn).unwrap(), &signer, PASSWORD);
    users
        .create_user(create_request("mluukkai", "refactoring"))
        .unwrap();

    let wrong_password = users.login("mluukkai", "hunter2").unwrap_err();
    let unknown_user = users.login("nobody", PASSWORD).unwrap_err();

    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    match wrong_password {
        CatalogError::ValidationFailed { invalid, .. } => assert_eq!(
            invalid,
            RejectedInput::Login {
                username: "mluukkai".to_string()
            }
        ),
        other => panic!("expected ValidationFailed, got {other:?}"),
    }
}

#[test]
fn provider_resolves_current_user_from_bearer_header() {
    let conn = open_db_in_memory().unwrap();
    let signer = TokenSigner::new(SECRET).unwrap();
    let users = UserService::new(SqliteUserRepository::try_new(&conn).unwrap(), &signer, PASSWORD);
    let user = users
        .create_user(create_request("mluukkai", "refactoring"))
        .unwrap();
    let token = users.login("mluukkai", PASSWORD).unwrap();

    let provider = IdentityContextProvider::new(&signer, SqliteUserRepository::try_new(&conn).unwrap());
    let header = format!("Bearer {}", token.value);
    let current = provider.current_user(Some(&header)).unwrap();
    assert_eq!(current, Some(user.clone()));

    let ctx = RequestContext::from_user(current);
    assert_eq!(ctx.current_user(), Some(&user));
}

#[test]
fn provider_treats_missing_or_foreign_headers_as_anonymous() {
    let conn = open_db_in_memory().unwrap();
    let signer = TokenSigner::new(SECRET).unwrap();
    let provider = IdentityContextProvider::new(&signer, SqliteUserRepository::try_new(&conn).unwrap());

    assert_eq!(provider.current_user(None).unwrap(), None);
    assert_eq!(provider.current_user(Some("Basic dXNlcjpwYXNz")).unwrap(), None);
}

#[test]
fn provider_rejects_tokens_signed_with_another_secret() {
    let conn = open_db_in_memory().unwrap();
    let signer = TokenSigner::new(SECRET).unwrap();
    let other = TokenSigner::new("another-secret").unwrap();
    let users = UserService::new(SqliteUserRepository::try_new(&conn).unwrap(), &other, PASSWORD);
    users
        .create_user(create_request("mluukkai", "refactoring"))
        .unwrap();
    let forged = users.login("mluukkai", PASSWORD).unwrap();

    let provider = IdentityContextProvider::new(&signer, SqliteUserRepository::try_new(&conn).unwrap());
    let header = format!("Bearer {}", forged.value);
    assert!(matches!(
        provider.current_user(Some(&header)),
        Err(IdentityError::InvalidSignature)
    ));
    assert!(matches!(
        provider.current_user(Some("Bearer not-a-token")),
        Err(IdentityError::MalformedToken(_))
    ));
}

#[test]
fn token_for_deleted_user_is_anonymous() {
    let conn = open_db_in_memory().unwrap();
    let signer = TokenSigner::new(SECRET).unwrap();
    let users = UserService::new(SqliteUserRepository::try_new(&conn).unwrap(), &signer, PASSWORD);
    let user = users
        .create_user(create_request("mluukkai", "refactoring"))
        .unwrap();
    let token = users.login("mluukkai", PASSWORD).unwrap();

    conn.execute(
        "DELETE FROM users WHERE uuid = ?1;",
        params![user.id.to_string()],
    )
    .unwrap();

    let provider = IdentityContextProvider::new(&signer, SqliteUserRepository::try_new(&conn).unwrap());
    let header = format!("Bearer {}", token.value);
    assert_eq!(provider.current_user(Some(&header)).unwrap(), None);
}
