use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common_http_errors::ApiError;

#[tokio::test]
async fn auth_required_variant() {
    let resp = ApiError::auth_required().into_response();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "auth_required");
    let bytes = to_bytes(resp.into_body(), 1024 * 8).await.unwrap();
    let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["error"], "authentication required");
}

#[tokio::test]
async fn invalid_amount_variant() {
    let resp = ApiError::invalid_amount().into_response();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "invalid_amount");
    let bytes = to_bytes(resp.into_body(), 1024 * 8).await.unwrap();
    let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["error"], "amount must be greater than zero");
}

#[test]
fn not_found_variant() {
    let resp = ApiError::not_found("transaction_not_found").into_response();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        resp.headers().get("X-Error-Code").unwrap(),
        "transaction_not_found"
    );
}

#[tokio::test]
async fn gateway_variant_carries_upstream_message() {
    let resp = ApiError::gateway("Invalid key").into_response();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "gateway_error");
    let bytes = to_bytes(resp.into_body(), 1024 * 8).await.unwrap();
    let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["error"], "Invalid key");
}

#[test]
fn internal_variant() {
    let resp = ApiError::internal("boom").into_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "internal_error");
}
