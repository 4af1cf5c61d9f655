use axum::{http::{StatusCode, HeaderValue}, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use uuid::Uuid;

/// Uniform error body: every failing endpoint answers `{ "error": ... }`.
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")] pub trace_id: Option<Uuid>,
}

#[derive(Debug)]
pub enum ApiError {
    /// No identity could be resolved from the request.
    AuthRequired { trace_id: Option<Uuid> },
    BadRequest { code: &'static str, trace_id: Option<Uuid>, message: Option<String> },
    NotFound { code: &'static str, trace_id: Option<Uuid> },
    /// The payment gateway rejected a call or was unreachable; its message is surfaced verbatim.
    Gateway { trace_id: Option<Uuid>, message: String },
    Internal { trace_id: Option<Uuid>, message: Option<String> },
}

impl ApiError {
    pub fn auth_required() -> Self { Self::AuthRequired { trace_id: None } }
    pub fn invalid_amount() -> Self {
        Self::BadRequest {
            code: "invalid_amount",
            trace_id: None,
            message: Some("amount must be greater than zero".into()),
        }
    }
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest { code, trace_id: None, message: Some(message.into()) }
    }
    pub fn not_found(code: &'static str) -> Self { Self::NotFound { code, trace_id: None } }
    pub fn gateway<E: std::fmt::Display>(e: E) -> Self {
        Self::Gateway { trace_id: None, message: e.to_string() }
    }
    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal { trace_id: None, message: Some(e.to_string()) }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body, error_code) = match self {
            ApiError::AuthRequired { trace_id } => (
                StatusCode::UNAUTHORIZED,
                ErrorBody { error: "authentication required".into(), trace_id },
                "auth_required",
            ),
            ApiError::BadRequest { code, trace_id, message } => (
                StatusCode::BAD_REQUEST,
                ErrorBody { error: message.unwrap_or_else(|| code.into()), trace_id },
                code,
            ),
            ApiError::NotFound { code, trace_id } => (
                StatusCode::NOT_FOUND,
                ErrorBody { error: code.into(), trace_id },
                code,
            ),
            ApiError::Gateway { trace_id, message } => (
                StatusCode::BAD_GATEWAY,
                ErrorBody { error: message, trace_id },
                "gateway_error",
            ),
            ApiError::Internal { trace_id, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody { error: message.unwrap_or_else(|| "internal error".into()), trace_id },
                "internal_error",
            ),
        };
        let mut resp = (status, Json(body)).into_response();
        if let Ok(val) = HeaderValue::from_str(error_code) {
            resp.headers_mut().insert("X-Error-Code", val);
        }
        resp
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
