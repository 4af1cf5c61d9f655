use async_trait::async_trait;
use bigdecimal::BigDecimal;
use common_money::{to_minor_units, MoneyError};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::config::PaystackConfig;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment gateway secret key is not configured")]
    Config,
    /// The gateway answered but rejected the call; its message is surfaced
    /// to the caller verbatim.
    #[error("{message}")]
    Api { message: String },
    #[error("amount not representable in minor units: {0}")]
    Amount(#[from] MoneyError),
    #[error("payment gateway unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// One funding attempt, in major units. The minor-unit conversion happens
/// inside the gateway implementation, at the wire boundary, and nowhere
/// else on the way out.
#[derive(Debug, Clone)]
pub struct InitializeRequest {
    pub email: String,
    pub amount: BigDecimal,
    pub reference: String,
    pub callback_url: Option<String>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// The gateway's authoritative view of a transaction. Amount is in minor
/// units, as transmitted on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedTransaction {
    pub status: String,
    pub reference: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub paid_at: Option<String>,
}

impl VerifiedTransaction {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize(&self, request: &InitializeRequest)
        -> Result<CheckoutSession, GatewayError>;
    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, GatewayError>;
}

pub struct PaystackGateway {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl PaystackGateway {
    pub fn new(config: &PaystackConfig) -> Result<Self, GatewayError> {
        if config.secret_key.trim().is_empty() {
            return Err(GatewayError::Config);
        }
        Ok(Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }
}

/// Every Paystack response wraps its payload in this envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn initialize(
        &self,
        request: &InitializeRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let amount_minor = to_minor_units(&request.amount)?;
        let url = format!("{}/transaction/initialize", self.base_url);

        let mut body = serde_json::json!({
            "email": request.email,
            "amount": amount_minor,
            "reference": request.reference,
            "metadata": request.metadata,
        });
        if let Some(callback) = &request.callback_url {
            body["callback_url"] = serde_json::Value::String(callback.clone());
        }

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await?;
        read_envelope(response).await
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, GatewayError> {
        let url = format!("{}/transaction/verify/{}", self.base_url, reference);
        let response = self
            .client
            .get(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.secret_key)
            .send()
            .await?;
        read_envelope(response).await
    }
}

async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        // Error responses still carry the envelope; surface its message.
        let message = match response.json::<Envelope<serde_json::Value>>().await {
            Ok(envelope) => envelope.message,
            Err(_) => format!("gateway returned HTTP {status}"),
        };
        return Err(GatewayError::Api { message });
    }

    let envelope = response.json::<Envelope<T>>().await?;
    if !envelope.status {
        return Err(GatewayError::Api {
            message: envelope.message,
        });
    }
    envelope.data.ok_or(GatewayError::Api {
        message: envelope.message,
    })
}
