#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use chrono::Utc;
use common_auth::{IdentityResolver, JwtConfig, TokenVerifier};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use uuid::Uuid;
use wallet_service::app::{build_router, AppState};
use wallet_service::gateway::{
    CheckoutSession, GatewayError, InitializeRequest, PaymentGateway, VerifiedTransaction,
};
use wallet_service::metrics::WalletMetrics;
use wallet_service::store::WalletStore;

pub const JWT_SECRET: &[u8] = b"wallet-test-jwt-secret";
pub const GATEWAY_SECRET: &str = "sk_test_secret";
pub const COOKIE_NAME: &str = "swiftship_session";
pub const ISSUER: &str = "swiftship";
pub const AUDIENCE: &str = "swiftship-app";

#[derive(Serialize)]
struct TokenClaims {
    sub: String,
    email: String,
    iss: String,
    aud: String,
    exp: i64,
    iat: i64,
}

pub fn issue_token(user_id: Uuid, email: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        iss: ISSUER.to_string(),
        aud: AUDIENCE.to_string(),
        exp: now + 600,
        iat: now,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET),
    )
    .expect("sign token")
}

pub fn test_state(gateway: Arc<dyn PaymentGateway>, store: Arc<dyn WalletStore>) -> AppState {
    let verifier = TokenVerifier::hs256(JwtConfig::new(ISSUER, AUDIENCE), JWT_SECRET);
    AppState {
        resolver: Arc::new(IdentityResolver::new(verifier, COOKIE_NAME)),
        gateway,
        store,
        metrics: WalletMetrics::new().expect("metrics"),
        currency: "NGN".to_string(),
        callback_url: Some("https://app.swiftship.test/wallet/confirm".to_string()),
        webhook_secret: GATEWAY_SECRET.to_string(),
    }
}

pub fn app_with(gateway: Arc<dyn PaymentGateway>, store: Arc<dyn WalletStore>) -> Router {
    build_router(
        test_state(gateway, store),
        &["http://localhost:3000".to_string()],
    )
}

pub async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 64)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// In-process gateway double: answers every initialize with one checkout
/// session and every verify with one canned verification.
pub struct StubGateway {
    pub checkout: CheckoutSession,
    pub verification: VerifiedTransaction,
}

impl StubGateway {
    pub fn succeeding(reference: &str, amount_minor: i64) -> Self {
        Self {
            checkout: CheckoutSession {
                authorization_url: "https://checkout.paystack.com/stub".to_string(),
                access_code: "stub".to_string(),
                reference: reference.to_string(),
            },
            verification: VerifiedTransaction {
                status: "success".to_string(),
                reference: reference.to_string(),
                amount: amount_minor,
                currency: "NGN".to_string(),
                channel: Some("card".to_string()),
                paid_at: Some("2026-08-05T10:00:00.000Z".to_string()),
            },
        }
    }
}

#[async_trait::async_trait]
impl PaymentGateway for StubGateway {
    async fn initialize(
        &self,
        _request: &InitializeRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        Ok(self.checkout.clone())
    }

    async fn verify(&self, _reference: &str) -> Result<VerifiedTransaction, GatewayError> {
        Ok(self.verification.clone())
    }
}
