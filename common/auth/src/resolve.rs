use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use tracing::debug;

use crate::claims::Identity;
use crate::error::{AuthError, AuthResult};
use crate::verifier::TokenVerifier;

/// One way of pulling a session token out of a request. Sources are tried
/// in registration order; the first token that verifies wins.
pub trait TokenSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, parts: &Parts) -> Option<String>;
}

/// Reads the token from a named session cookie.
pub struct SessionCookie {
    cookie_name: String,
}

impl SessionCookie {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }
}

impl TokenSource for SessionCookie {
    fn name(&self) -> &'static str {
        "session_cookie"
    }

    fn extract(&self, parts: &Parts) -> Option<String> {
        let header = parts.headers.get(COOKIE)?.to_str().ok()?;
        header.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == self.cookie_name && !value.is_empty()).then(|| value.to_string())
        })
    }
}

/// Reads the token from an `Authorization: Bearer` header.
pub struct BearerToken;

impl TokenSource for BearerToken {
    fn name(&self) -> &'static str {
        "bearer"
    }

    fn extract(&self, parts: &Parts) -> Option<String> {
        let raw = parts.headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
        let token = raw.strip_prefix("Bearer ")?.trim();
        (!token.is_empty()).then(|| token.to_string())
    }
}

/// Ordered chain of token sources in front of one verifier.
pub struct IdentityResolver {
    verifier: TokenVerifier,
    sources: Vec<Box<dyn TokenSource>>,
}

impl IdentityResolver {
    /// Default chain: session cookie first, then bearer token.
    pub fn new(verifier: TokenVerifier, session_cookie_name: impl Into<String>) -> Self {
        Self {
            verifier,
            sources: vec![
                Box::new(SessionCookie::new(session_cookie_name)),
                Box::new(BearerToken),
            ],
        }
    }

    pub fn with_source(mut self, source: Box<dyn TokenSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn resolve(&self, parts: &Parts) -> AuthResult<Identity> {
        let mut last_err = None;
        for source in &self.sources {
            let Some(token) = source.extract(parts) else {
                continue;
            };
            match self.verifier.verify(&token) {
                Ok(claims) => {
                    debug!(source = source.name(), subject = %claims.subject, "resolved identity");
                    return Ok(claims.into());
                }
                Err(err) => {
                    debug!(source = source.name(), error = %err, "token rejected, trying next source");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or(AuthError::MissingCredentials))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    Arc<IdentityResolver>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let resolver = Arc::<IdentityResolver>::from_ref(state);
        resolver.resolve(parts)
    }
}
