use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no session cookie or bearer token present")]
    MissingCredentials,
    #[error("authorization header malformed")]
    InvalidAuthorization,
    #[error("token verification failed: {0}")]
    Verification(String),
    #[error("invalid claim '{0}' with value '{1}'")]
    InvalidClaim(&'static str, String),
    #[error("malformed claim payload: {0}")]
    InvalidJson(String),
    #[error("failed to parse verification key: {0}")]
    KeyParse(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        Self::Verification(value.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthError::KeyParse(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "auth_key",
                "authentication backend misconfigured",
            ),
            // Every other failure means the caller is not authenticated.
            _ => (StatusCode::UNAUTHORIZED, "auth_required", "authentication required"),
        };

        let body = ErrorBody {
            error: message.to_string(),
        };
        let mut resp = (status, Json(body)).into_response();
        if let Ok(val) = HeaderValue::from_str(code) {
            resp.headers_mut().insert("X-Error-Code", val);
        }
        resp
    }
}
