use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};

/// Application-focused representation of verified session-token claims.
#[derive(Debug, Clone, Serialize)]
pub struct Claims {
    pub subject: Uuid,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub issued_at: Option<DateTime<Utc>>,
    pub issuer: String,
    pub audience: Vec<String>,
    pub raw: serde_json::Value,
}

/// The identity the funding endpoints stamp onto transactions.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.subject,
            email: claims.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClaimsRepr {
    sub: String,
    email: String,
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
    iss: String,
    #[serde(default)]
    aud: Option<AudienceRepr>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AudienceRepr {
    Single(String),
    Many(Vec<String>),
}

impl TryFrom<ClaimsRepr> for Claims {
    type Error = AuthError;

    fn try_from(value: ClaimsRepr) -> AuthResult<Self> {
        let subject = Uuid::parse_str(&value.sub)
            .map_err(|_| AuthError::InvalidClaim("sub", value.sub.clone()))?;

        if value.email.trim().is_empty() {
            return Err(AuthError::InvalidClaim("email", value.email));
        }

        let expires_at = Utc
            .timestamp_opt(value.exp, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidClaim("exp", value.exp.to_string()))?;

        let issued_at = match value.iat {
            Some(iat) => Some(
                Utc.timestamp_opt(iat, 0)
                    .single()
                    .ok_or_else(|| AuthError::InvalidClaim("iat", iat.to_string()))?,
            ),
            None => None,
        };

        let audience = match value.aud {
            Some(AudienceRepr::Single(item)) => vec![item],
            Some(AudienceRepr::Many(items)) => items,
            None => Vec::new(),
        };

        Ok(Self {
            subject,
            email: value.email,
            expires_at,
            issued_at,
            issuer: value.iss,
            audience,
            raw: serde_json::Value::Null,
        })
    }
}

impl TryFrom<serde_json::Value> for Claims {
    type Error = AuthError;

    fn try_from(value: serde_json::Value) -> AuthResult<Self> {
        let repr: ClaimsRepr = serde_json::from_value(value.clone())
            .map_err(|err| AuthError::InvalidJson(err.to_string()))?;
        let mut claims = Claims::try_from(repr)?;
        claims.raw = value;
        Ok(claims)
    }
}
