//! Bearer-token identity for request contexts.
//!
//! # Responsibility
//! - Issue and verify compact HMAC-SHA256 signed tokens
//!   (`header.payload.signature`, base64url without padding).
//! - Turn an `Authorization` header into the current user, if any.
//!
//! # Invariants
//! - Signatures are checked in constant time before claims are decoded.
//! - A missing or non-bearer header is anonymous, not an error.
//! - A bearer header with a bad token is an error.
//! - Tokens are never logged.

use crate::model::user::{User, UserId};
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::error::Error;
use std::fmt::{Display, Formatter};

type HmacSha256 = Hmac<Sha256>;

const TOKEN_ALGORITHM: &str = "HS256";
const TOKEN_TYPE: &str = "JWT";
const MAX_TOKEN_LEN: usize = 4096;

static BEARER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*bearer\s+(\S+)\s*$").expect("valid bearer regex"));
static BEARER_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*bearer\b").expect("valid bearer prefix regex"));

#[derive(Debug)]
pub enum IdentityError {
    /// Signing secret is empty.
    EmptySecret,
    /// Token is not three base64url segments of valid JSON.
    MalformedToken(String),
    /// Header names an algorithm other than HS256.
    UnsupportedAlgorithm(String),
    /// Signature does not match the payload.
    InvalidSignature,
    /// User lookup for a verified token failed.
    Store(RepoError),
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySecret => write!(f, "token secret must not be empty"),
            Self::MalformedToken(details) => write!(f, "malformed token: {details}"),
            Self::UnsupportedAlgorithm(alg) => write!(f, "unsupported token algorithm `{alg}`"),
            Self::InvalidSignature => write!(f, "token signature mismatch"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for IdentityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for IdentityError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

/// Signed claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub username: String,
    pub id: UserId,
}

/// Login result handed back to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub value: String,
}

/// Issues and verifies bearer tokens with one shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, IdentityError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(IdentityError::EmptySecret);
        }
        Ok(Self {
            secret: secret.to_vec(),
        })
    }

    /// Signs a token naming `user`.
    pub fn issue(&self, user: &User) -> Result<Token, IdentityError> {
        let header = TokenHeader {
            alg: TOKEN_ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
        };
        let claims = TokenClaims {
            username: user.username.clone(),
            id: user.id,
        };
        let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(&claims)?);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&signing_input)?.finalize().into_bytes());
        Ok(Token {
            value: format!("{signing_input}.{signature}"),
        })
    }

    /// Verifies `token` and returns its claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, IdentityError> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(IdentityError::MalformedToken(
                "token exceeds max length".to_string(),
            ));
        }
        let mut parts = token.split('.');
        let (Some(header_part), Some(claims_part), Some(signature_part), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(IdentityError::MalformedToken(
                "expected three dot-separated segments".to_string(),
            ));
        };

        let header: TokenHeader = decode_segment(header_part)?;
        if header.alg != TOKEN_ALGORITHM {
            return Err(IdentityError::UnsupportedAlgorithm(header.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_part)
            .map_err(|err| IdentityError::MalformedToken(err.to_string()))?;
        self.mac(&format!("{header_part}.{claims_part}"))?
            .verify_slice(&signature)
            .map_err(|_| IdentityError::InvalidSignature)?;

        decode_segment(claims_part)
    }

    fn mac(&self, signing_input: &str) -> Result<HmacSha256, IdentityError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| IdentityError::EmptySecret)?;
        mac.update(signing_input.as_bytes());
        Ok(mac)
    }
}

/// Extracts the token from a bearer `Authorization` header value.
///
/// Returns `Ok(None)` for headers that are not bearer credentials.
pub fn bearer_token(authorization: &str) -> Result<Option<&str>, IdentityError> {
    if let Some(caps) = BEARER_RE.captures(authorization) {
        return Ok(caps.get(1).map(|m| m.as_str()));
    }
    if BEARER_PREFIX_RE.is_match(authorization) {
        return Err(IdentityError::MalformedToken(
            "bearer header without token".to_string(),
        ));
    }
    Ok(None)
}

/// Resolves the user behind a request's `Authorization` header.
pub struct IdentityContextProvider<'a, U: UserRepository> {
    signer: &'a TokenSigner,
    users: U,
}

impl<'a, U: UserRepository> IdentityContextProvider<'a, U> {
    pub fn new(signer: &'a TokenSigner, users: U) -> Self {
        Self { signer, users }
    }

    /// Returns the verified current user, or `None` for anonymous requests.
    ///
    /// A valid token whose user no longer exists is anonymous.
    pub fn current_user(&self, authorization: Option<&str>) -> Result<Option<User>, IdentityError> {
        let Some(header) = authorization else {
            return Ok(None);
        };
        let Some(token) = bearer_token(header)? else {
            return Ok(None);
        };

        let claims = match self.signer.verify(token) {
            Ok(claims) => claims,
            Err(err) => {
                warn!("event=identity_verify module=identity status=error error={err}");
                return Err(err);
            }
        };
        let user = self.users.get_user(claims.id)?;
        info!(
            "event=identity_verify module=identity status=ok user_found={}",
            user.is_some()
        );
        Ok(user)
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, IdentityError> {
    let bytes =
        serde_json::to_vec(value).map_err(|err| IdentityError::MalformedToken(err.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, IdentityError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|err| IdentityError::MalformedToken(err.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|err| IdentityError::MalformedToken(err.to_string()))
}
