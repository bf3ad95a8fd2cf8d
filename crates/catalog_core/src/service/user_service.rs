//! User registration and login.
//!
//! # Invariants
//! - Every login uses one shared password from configuration; there are no
//!   per-user credentials.
//! - Failures are `ValidationFailed`; login failures never reveal whether
//!   the username or the password was wrong.

use crate::identity::{Token, TokenSigner};
use crate::model::user::User;
use crate::repo::user_repo::UserRepository;
use crate::service::error::{CatalogError, CreateUserRequest, RejectedInput};
use log::{info, warn};

const INCORRECT_CREDENTIALS: &str = "incorrect credentials";

pub struct UserService<'a, U: UserRepository> {
    users: U,
    signer: &'a TokenSigner,
    login_password: String,
}

impl<'a, U: UserRepository> UserService<'a, U> {
    pub fn new(users: U, signer: &'a TokenSigner, login_password: impl Into<String>) -> Self {
        Self {
            users,
            signer,
            login_password: login_password.into(),
        }
    }

    /// Registers a user with a unique username.
    pub fn create_user(&self, request: CreateUserRequest) -> Result<User, CatalogError> {
        let user = User::new(request.username.clone(), request.favorite_genre.clone());
        match self.users.create_user(&user) {
            Ok(_) => {
                info!("event=create_user module=service status=ok user_id={}", user.id);
                Ok(user)
            }
            Err(err) => {
                warn!("event=create_user module=service status=error error={err}");
                Err(CatalogError::rejected(err, RejectedInput::CreateUser(request)))
            }
        }
    }

    /// Issues a bearer token for `username` when `password` matches.
    pub fn login(&self, username: &str, password: &str) -> Result<Token, CatalogError> {
        let rejected = || {
            CatalogError::rejected(
                INCORRECT_CREDENTIALS,
                RejectedInput::Login {
                    username: username.to_string(),
                },
            )
        };

        let user = match self.users.find_user_by_username(username) {
            Ok(Some(user)) => user,
            Ok(None) => {
                info!("event=login module=service status=denied");
                return Err(rejected());
            }
            Err(err) => {
                warn!("event=login module=service status=error error={err}");
                return Err(rejected());
            }
        };
        if password != self.login_password {
            info!("event=login module=service status=denied");
            return Err(rejected());
        }

        let token = self.signer.issue(&user).map_err(|err| {
            warn!("event=login module=service status=error error={err}");
            rejected()
        })?;
        info!("event=login module=service status=ok user_id={}", user.id);
        Ok(token)
    }
}
