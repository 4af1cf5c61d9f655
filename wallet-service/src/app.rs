use std::sync::Arc;

use axum::extract::{FromRef, State};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Router};
use common_auth::IdentityResolver;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::gateway::PaymentGateway;
use crate::metrics::WalletMetrics;
use crate::payment_handlers::{
    get_transaction, get_wallet, initialize_funding, verify_funding,
};
use crate::store::WalletStore;
use crate::webhook::paystack_webhook;

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<IdentityResolver>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub store: Arc<dyn WalletStore>,
    pub metrics: WalletMetrics,
    pub currency: String,
    /// Browser return URL handed to the gateway on initialize.
    pub callback_url: Option<String>,
    /// Gateway secret; also the HMAC key for webhook signatures.
    pub webhook_secret: String,
}

impl FromRef<AppState> for Arc<IdentityResolver> {
    fn from_ref(state: &AppState) -> Self {
        state.resolver.clone()
    }
}

pub async fn health() -> &'static str {
    "ok"
}

async fn metrics_route(State(state): State<AppState>) -> Response {
    state.metrics.render().unwrap_or_else(|err| {
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {err}"),
        )
            .into_response()
    })
}

async fn http_error_metrics(
    State(state): State<AppState>,
    req: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> Response {
    let resp = next.run(req).await;
    let status = resp.status();
    if status.as_u16() >= 400 {
        let code = resp
            .headers()
            .get("X-Error-Code")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        state.metrics.http_error(code, status.as_str());
    }
    resp
}

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        ))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static("authorization"),
        ]);

    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics_route))
        .route("/api/payment", post(initialize_funding).get(verify_funding))
        .route("/api/payment/webhook", post(paystack_webhook))
        .route("/api/payment/transactions/:reference", get(get_transaction))
        .route("/api/wallet", get(get_wallet))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            http_error_metrics,
        ))
        .with_state(state)
        .layer(cors)
}
