//! Nonce and role gates evaluated after a route matched and before its
//! middleware run.

use crate::config::NonceConfig;
use crate::handler::{BoxError, Payload};
use crate::request::RequestContext;
use crate::response::Response;

use tracing::warn;

/// Verifies CSRF tokens. Token generation and storage belong to the integrator.
pub trait NonceVerifier: Send + Sync {
    /// Returns `true` when `token` is valid for `action`.
    fn verify(&self, token: &str, action: &str) -> bool;
}

impl<F> NonceVerifier for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn verify(&self, token: &str, action: &str) -> bool {
        (self)(token, action)
    }
}

/// Turns a JSON web token into its claims. Signature checks and key handling
/// belong to the implementation.
pub trait JwtDecoder: Send + Sync {
    /// The error message is sent back to the caller.
    fn decode(&self, token: &str) -> Result<Payload, BoxError>;
}

impl<F> JwtDecoder for F
where
    F: Fn(&str) -> Result<Payload, BoxError> + Send + Sync,
{
    fn decode(&self, token: &str) -> Result<Payload, BoxError> {
        (self)(token)
    }
}

/// The logged-in caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    roles: Vec<String>,
}

impl Identity {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Built-in roles with a dedicated registration helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Administrator,
    Editor,
    Author,
    Contributor,
    Subscriber,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::Editor => "editor",
            Self::Author => "author",
            Self::Contributor => "contributor",
            Self::Subscriber => "subscriber",
        }
    }
}

/// Access policy of a route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Access {
    nonce: bool,
    roles: Vec<String>,
}

impl Access {
    /// No checks.
    pub fn public() -> Self {
        Self::default()
    }

    /// Requires a valid nonce.
    pub fn nonce() -> Self {
        Self {
            nonce: true,
            roles: Vec::new(),
        }
    }

    /// Requires a valid nonce and any of `roles`.
    pub fn roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::nonce().with_roles(roles)
    }

    /// Replaces the required role set. Roles are compared lowercase.
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.roles = roles
            .into_iter()
            .map(|r| r.as_ref().to_lowercase())
            .collect();
        self
    }

    pub fn with_nonce(mut self, nonce: bool) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn requires_nonce(&self) -> bool {
        self.nonce
    }

    pub fn required_roles(&self) -> &[String] {
        &self.roles
    }

    /// Evaluates the policy. `Err` carries the response to send instead of
    /// running the route: 401 without an identity, 403 with one.
    pub fn check(
        &self,
        ctx: &RequestContext,
        nonce: Option<&NonceConfig>,
        verifier: Option<&dyn NonceVerifier>,
    ) -> Result<(), Response> {
        let deny = || match ctx.identity() {
            Some(_) => Response::forbidden(),
            None => Response::unauthorized(),
        };

        if self.nonce {
            let valid = match (nonce, verifier) {
                (Some(cfg), Some(v)) => ctx
                    .field(&cfg.key)
                    .map_or(false, |token| v.verify(token, &cfg.name)),
                _ => false,
            };
            if !valid {
                warn!(uri = ctx.uri(), "nonce verification failed");
                return Err(deny());
            }
        }

        if !self.roles.is_empty() {
            let allowed = ctx
                .identity()
                .map_or(false, |id| self.roles.iter().any(|r| id.has_role(r)));
            if !allowed {
                warn!(uri = ctx.uri(), roles = ?self.roles, "role check failed");
                return Err(deny());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    fn nonce_cfg() -> NonceConfig {
        NonceConfig::new("_nonce", "save-settings")
    }

    fn verifier(token: &str, action: &str) -> bool {
        token == "good" && action == "save-settings"
    }

    #[test]
    fn public_passes() {
        let ctx = RequestContext::new("/");
        assert!(Access::public().check(&ctx, None, None).is_ok());
    }

    #[test]
    fn nonce_required() {
        let cfg = nonce_cfg();
        let v: &dyn NonceVerifier = &verifier;

        let ok = RequestContext::new("/").with_field("_nonce", "good");
        assert!(Access::nonce().check(&ok, Some(&cfg), Some(v)).is_ok());

        let bad = RequestContext::new("/").with_field("_nonce", "bad");
        let res = Access::nonce().check(&bad, Some(&cfg), Some(v)).unwrap_err();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let missing = RequestContext::new("/").with_identity(Identity::new(vec!["editor"]));
        let res = Access::nonce()
            .check(&missing, Some(&cfg), Some(v))
            .unwrap_err();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        assert!(Access::nonce().check(&ok, None, Some(v)).is_err());
        assert!(Access::nonce().check(&ok, Some(&cfg), None).is_err());
    }

    #[test]
    fn any_role_matches() {
        let access = Access::public().with_roles(vec!["Editor", "administrator"]);
        assert_eq!(access.required_roles(), ["editor", "administrator"]);

        let editor = RequestContext::new("/").with_identity(Identity::new(vec!["editor"]));
        assert!(access.check(&editor, None, None).is_ok());

        let author = RequestContext::new("/").with_identity(Identity::new(vec!["author"]));
        let res = access.check(&author, None, None).unwrap_err();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let anon = RequestContext::new("/");
        let res = access.check(&anon, None, None).unwrap_err();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
