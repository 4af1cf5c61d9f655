use anyhow::{Context, Result};
use std::env;

/// Gateway credentials and endpoints. The secret key stays server-side;
/// the public key is safe to hand to the browser checkout bootstrap.
#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub secret_key: String,
    pub public_key: Option<String>,
    pub base_url: String,
    /// Where the gateway redirects the browser after checkout; points at
    /// the application's confirmation page.
    pub callback_url: Option<String>,
}

impl PaystackConfig {
    pub fn from_env() -> Result<Self> {
        let secret_key =
            env::var("PAYSTACK_SECRET_KEY").context("PAYSTACK_SECRET_KEY must be set")?;
        let public_key = env::var("PAYSTACK_PUBLIC_KEY")
            .ok()
            .and_then(|value| normalize_optional(&value));
        let base_url = env::var("PAYSTACK_BASE_URL")
            .ok()
            .and_then(|value| normalize_optional(&value))
            .unwrap_or_else(|| "https://api.paystack.co".to_string());
        let callback_url = env::var("PAYMENT_CALLBACK_URL")
            .ok()
            .and_then(|value| normalize_optional(&value));

        Ok(Self {
            secret_key,
            public_key,
            base_url,
            callback_url,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub session_cookie_name: String,
    /// Postgres connection string; when absent the service falls back to
    /// the in-memory store (local development only).
    pub database_url: Option<String>,
    pub allowed_origins: Vec<String>,
    pub currency: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8088);
        let session_cookie_name = env::var("SESSION_COOKIE_NAME")
            .ok()
            .and_then(|value| normalize_optional(&value))
            .unwrap_or_else(|| "swiftship_session".to_string());
        let database_url = env::var("DATABASE_URL")
            .ok()
            .and_then(|value| normalize_optional(&value));
        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|value| parse_origins(&value))
            .unwrap_or_else(default_origins);
        let currency = env::var("WALLET_CURRENCY").unwrap_or_else(|_| "NGN".to_string());

        Ok(Self {
            host,
            port,
            session_cookie_name,
            database_url,
            allowed_origins,
            currency,
        })
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(|c| c == ',' || c == ';' || c == ' ')
        .filter_map(|item| {
            let origin = item.trim();
            if origin.is_empty() {
                None
            } else {
                Some(origin.to_string())
            }
        })
        .collect()
}

fn default_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

pub(crate) fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_optional_drops_blank() {
        assert_eq!(normalize_optional("   "), None);
        assert_eq!(normalize_optional(" x "), Some("x".to_string()));
    }

    #[test]
    fn parse_origins_splits_and_trims() {
        let origins = parse_origins("http://a.test, http://b.test;http://c.test");
        assert_eq!(
            origins,
            vec!["http://a.test", "http://b.test", "http://c.test"]
        );
    }
}
