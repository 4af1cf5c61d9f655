use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use common_http_errors::{ApiError, ApiResult};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha512;
use subtle::ConstantTimeEq;
use tracing::{info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::store::{CreditOutcome, NewFundingTransaction};

const SIGNATURE_HEADER: &str = "x-paystack-signature";

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    event: String,
    data: WebhookCharge,
}

#[derive(Debug, Deserialize)]
struct WebhookCharge {
    reference: String,
    amount: i64,
    status: String,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    customer: Option<WebhookCustomer>,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct WebhookCustomer {
    #[serde(default)]
    email: Option<String>,
}

/// Server-to-server notification from the gateway. Signature is an
/// HMAC-SHA512 of the raw body under the gateway secret; anything that does
/// not verify is rejected before the body is parsed.
pub async fn paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if provided.is_empty() {
        state.metrics.webhook_event("sig_missing");
        warn!("webhook delivery without signature");
        return Err(ApiError::auth_required());
    }

    let mut mac = Hmac::<Sha512>::new_from_slice(state.webhook_secret.as_bytes())
        .map_err(ApiError::internal)?;
    mac.update(&body);
    let expected = hex::encode(mac.finalize().into_bytes());
    if ConstantTimeEq::ct_eq(expected.as_bytes(), provided.as_bytes()).unwrap_u8() != 1 {
        state.metrics.webhook_event("sig_mismatch");
        warn!("webhook signature mismatch");
        return Err(ApiError::auth_required());
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|err| ApiError::bad_request("malformed_event", err.to_string()))?;

    if event.event != "charge.success" || event.data.status != "success" {
        state.metrics.webhook_event("ignored");
        info!(event = %event.event, "webhook event acknowledged, no action");
        return Ok(StatusCode::OK);
    }

    // The initialize path stamps the user id into transaction metadata;
    // it comes back here on the charge event.
    let user_id = event
        .data
        .metadata
        .as_ref()
        .and_then(|m| m.get("user_id"))
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok());
    let Some(user_id) = user_id else {
        state.metrics.webhook_event("missing_user");
        warn!(reference = %event.data.reference, "charge.success without user_id metadata, acknowledged unprocessed");
        return Ok(StatusCode::OK);
    };

    let credit = NewFundingTransaction {
        reference: event.data.reference.clone(),
        user_id,
        email: event
            .data
            .customer
            .and_then(|c| c.email)
            .unwrap_or_default(),
        amount_minor: event.data.amount,
        currency: event
            .data
            .currency
            .unwrap_or_else(|| state.currency.clone()),
        metadata: event.data.metadata,
    };

    match state.store.credit_once(&credit).await {
        Ok(CreditOutcome::Credited) => {
            state.metrics.webhook_event("credited");
            info!(reference = %credit.reference, user_id = %user_id, amount_minor = credit.amount_minor, "wallet credited via webhook");
        }
        Ok(CreditOutcome::AlreadyCredited) => {
            state.metrics.webhook_event("duplicate");
            info!(reference = %credit.reference, "webhook replay, wallet untouched");
        }
        Err(err) => {
            state.metrics.webhook_event("store_error");
            warn!(reference = %credit.reference, error = %err, "webhook credit failed");
            // Non-2xx makes the gateway redeliver; the conditional credit
            // absorbs the retry.
            return Err(ApiError::internal(err));
        }
    }

    Ok(StatusCode::OK)
}
