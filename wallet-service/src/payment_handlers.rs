use axum::extract::{Path, Query, State};
use axum::Json;
use bigdecimal::{BigDecimal, Zero};
use common_auth::Identity;
use common_http_errors::{ApiError, ApiResult};
use common_money::{from_minor_units, to_minor_units};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::app::AppState;
use crate::gateway::{GatewayError, InitializeRequest};
use crate::reference::funding_reference;
use crate::store::{CreditOutcome, NewFundingTransaction};

#[derive(Deserialize)]
pub struct InitializeFundingRequest {
    pub amount: BigDecimal,
    /// Optional override; the resolved identity's email is used otherwise.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct VerifyParams {
    pub reference: String,
}

fn gateway_api_error(err: GatewayError) -> ApiError {
    match err {
        GatewayError::Config => ApiError::internal(err),
        GatewayError::Amount(inner) => ApiError::bad_request("invalid_amount", inner.to_string()),
        GatewayError::Api { .. } | GatewayError::Transport(_) => ApiError::gateway(err),
    }
}

pub async fn initialize_funding(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<InitializeFundingRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    if req.amount <= BigDecimal::zero() {
        state.metrics.initialization("invalid_amount");
        return Err(ApiError::invalid_amount());
    }
    // Reject sub-kobo precision here, before the gateway sees the request.
    let amount_minor = to_minor_units(&req.amount).map_err(|err| {
        state.metrics.initialization("invalid_amount");
        ApiError::bad_request("invalid_amount", err.to_string())
    })?;

    let email = req
        .email
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| identity.email.clone());
    let reference = funding_reference();
    let metadata = json!({ "user_id": identity.user_id });

    let request = InitializeRequest {
        email: email.clone(),
        amount: req.amount.clone(),
        reference: reference.clone(),
        callback_url: state.callback_url.clone(),
        metadata: metadata.clone(),
    };
    let session = state.gateway.initialize(&request).await.map_err(|err| {
        state.metrics.initialization("gateway_error");
        warn!(reference = %reference, error = %err, "gateway initialize failed");
        gateway_api_error(err)
    })?;

    // Bookkeeping only: crediting is keyed by the store's own conditional
    // transition, so a failed pending write must not abort the funding.
    let pending = NewFundingTransaction {
        reference: session.reference.clone(),
        user_id: identity.user_id,
        email,
        amount_minor,
        currency: state.currency.clone(),
        metadata: Some(metadata),
    };
    if let Err(err) = state.store.record_pending(&pending).await {
        warn!(reference = %pending.reference, error = %err, "failed to record pending transaction");
    }

    state.metrics.initialization("success");
    info!(reference = %session.reference, user_id = %identity.user_id, "funding initialized");

    Ok(Json(json!({
        "data": {
            "authorization_url": session.authorization_url,
            "access_code": session.access_code,
            "reference": session.reference,
        }
    })))
}

pub async fn verify_funding(
    State(state): State<AppState>,
    identity: Identity,
    Query(params): Query<VerifyParams>,
) -> ApiResult<Json<serde_json::Value>> {
    if params.reference.trim().is_empty() {
        return Err(ApiError::bad_request(
            "invalid_reference",
            "reference must not be empty",
        ));
    }

    let verified = state
        .gateway
        .verify(params.reference.trim())
        .await
        .map_err(|err| {
            state.metrics.verification("gateway_error");
            warn!(reference = %params.reference, error = %err, "gateway verify failed");
            gateway_api_error(err)
        })?;

    if verified.is_success() {
        let credit = NewFundingTransaction {
            reference: verified.reference.clone(),
            user_id: identity.user_id,
            email: identity.email.clone(),
            amount_minor: verified.amount,
            currency: verified.currency.clone(),
            metadata: None,
        };
        let outcome = state
            .store
            .credit_once(&credit)
            .await
            .map_err(ApiError::internal)?;
        match outcome {
            CreditOutcome::Credited => {
                state.metrics.verification("credited");
                info!(reference = %credit.reference, user_id = %identity.user_id, amount_minor = credit.amount_minor, "wallet credited");
            }
            CreditOutcome::AlreadyCredited => {
                state.metrics.verification("duplicate");
                info!(reference = %credit.reference, "verification replay, wallet untouched");
            }
        }
        Ok(Json(json!({
            "data": {
                "status": "success",
                "transaction": {
                    "reference": verified.reference,
                    "amount": from_minor_units(verified.amount),
                    "currency": verified.currency,
                    "channel": verified.channel,
                    "paid_at": verified.paid_at,
                }
            }
        })))
    } else {
        if let Err(err) = state.store.mark_failed(params.reference.trim()).await {
            warn!(reference = %params.reference, error = %err, "failed to record failed verification");
        }
        state.metrics.verification("failed");
        info!(reference = %verified.reference, gateway_status = %verified.status, "funding verification failed");
        Ok(Json(json!({
            "data": {
                "status": "failed",
                "transaction": {
                    "reference": verified.reference,
                    "amount": from_minor_units(verified.amount),
                    "currency": verified.currency,
                    "gateway_status": verified.status,
                }
            }
        })))
    }
}

pub async fn get_transaction(
    State(state): State<AppState>,
    identity: Identity,
    Path(reference): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let found = state
        .store
        .find(&reference)
        .await
        .map_err(ApiError::internal)?;
    // Callers only ever see their own transactions.
    let Some(tx) = found.filter(|tx| tx.user_id == identity.user_id) else {
        return Err(ApiError::not_found("transaction_not_found"));
    };
    Ok(Json(json!({
        "data": {
            "reference": tx.reference,
            "status": tx.status,
            "amount": from_minor_units(tx.amount_minor),
            "currency": tx.currency,
            "created_at": tx.created_at,
            "updated_at": tx.updated_at,
        }
    })))
}

pub async fn get_wallet(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<serde_json::Value>> {
    let balance_minor = state
        .store
        .balance_minor(identity.user_id)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(json!({
        "data": {
            "balance": from_minor_units(balance_minor),
            "currency": state.currency,
        }
    })))
}
