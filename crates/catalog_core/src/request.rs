//! Per-request context and mutation authorization.
//!
//! The engine itself never checks identity. A transport builds a
//! `RequestContext` from the bearer header and asks it to authorize each
//! mutation under the configured `MutationPolicy`.

use crate::model::user::User;
use crate::service::error::CatalogError;
use log::info;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Whether mutations require a verified user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MutationPolicy {
    /// Anyone may mutate.
    #[default]
    Open,
    /// Mutations need a verified current user.
    RequireIdentity,
}

impl MutationPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::RequireIdentity => "require_identity",
        }
    }
}

impl Display for MutationPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MutationPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "require_identity" => Ok(Self::RequireIdentity),
            other => Err(format!(
                "unsupported mutation policy `{other}`; expected open|require_identity"
            )),
        }
    }
}

/// Identity of the caller for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    current_user: Option<User>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: User) -> Self {
        Self {
            current_user: Some(user),
        }
    }

    pub fn from_user(user: Option<User>) -> Self {
        Self { current_user: user }
    }

    /// The `me` query: the verified user, if any.
    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    /// Fails with `Unauthorized` when `policy` requires an identity this
    /// request does not have.
    pub fn authorize_mutation(
        &self,
        policy: MutationPolicy,
        operation: &'static str,
    ) -> Result<(), CatalogError> {
        match (policy, self.current_user.as_ref()) {
            (MutationPolicy::RequireIdentity, None) => {
                info!("event=authorize module=request status=denied operation={operation}");
                Err(CatalogError::Unauthorized(operation))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MutationPolicy, RequestContext};
    use crate::model::user::User;
    use crate::service::error::CatalogError;

    #[test]
    fn open_policy_accepts_anonymous_mutations() {
        let ctx = RequestContext::anonymous();
        assert!(ctx.authorize_mutation(MutationPolicy::Open, "add_book").is_ok());
    }

    #[test]
    fn require_identity_rejects_anonymous_and_accepts_users() {
        let anonymous = RequestContext::anonymous();
        let err = anonymous
            .authorize_mutation(MutationPolicy::RequireIdentity, "edit_author")
            .unwrap_err();
        assert!(matches!(err, CatalogError::Unauthorized("edit_author")));

        let signed_in = RequestContext::authenticated(User::new("root", "crime"));
        assert!(signed_in
            .authorize_mutation(MutationPolicy::RequireIdentity, "edit_author")
            .is_ok());
    }

    #[test]
    fn policy_parses_known_values() {
        assert_eq!(
            "REQUIRE_IDENTITY".parse::<MutationPolicy>(),
            Ok(MutationPolicy::RequireIdentity)
        );
        assert!("closed".parse::<MutationPolicy>().is_err());
    }
}
