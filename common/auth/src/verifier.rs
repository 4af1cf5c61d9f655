use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use tracing::debug;

use crate::claims::Claims;
use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};

/// Verifies session tokens against a single configured key.
///
/// The identity provider signs with either a shared secret (HS256) or an
/// RSA key pair (RS256); which one is in play is fixed at startup.
#[derive(Clone)]
pub struct TokenVerifier {
    config: JwtConfig,
    key: DecodingKey,
    algorithm: Algorithm,
}

impl TokenVerifier {
    pub fn hs256(config: JwtConfig, secret: &[u8]) -> Self {
        Self {
            config,
            key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        }
    }

    pub fn rs256_pem(config: JwtConfig, pem: &[u8]) -> AuthResult<Self> {
        let key =
            DecodingKey::from_rsa_pem(pem).map_err(|err| AuthError::KeyParse(err.to_string()))?;
        Ok(Self {
            config,
            key,
            algorithm: Algorithm::RS256,
        })
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[self.config.issuer.clone()]);
        validation.set_audience(&[self.config.audience.clone()]);
        validation.leeway = self.config.leeway_seconds.into();

        let token_data = decode::<Value>(token, &self.key, &validation)?;
        let claims = Claims::try_from(token_data.claims)?;
        debug!(subject = %claims.subject, "verified session token");
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;
    use uuid::Uuid;

    const SECRET: &[u8] = b"test-signing-secret";

    #[derive(Serialize)]
    struct TokenClaims<'a> {
        sub: String,
        email: &'a str,
        iss: &'a str,
        aud: &'a str,
        exp: i64,
        iat: i64,
    }

    fn issue_token(issuer: &str, audience: &str, exp_offset: i64) -> (String, Uuid) {
        let subject = Uuid::new_v4();
        let issued_at = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: subject.to_string(),
            email: "a@b.com",
            iss: issuer,
            aud: audience,
            exp: issued_at + exp_offset,
            iat: issued_at,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .expect("sign token");
        (token, subject)
    }

    fn verifier() -> TokenVerifier {
        TokenVerifier::hs256(JwtConfig::new("issuer", "aud"), SECRET)
    }

    #[test]
    fn accepts_valid_token() {
        let (token, subject) = issue_token("issuer", "aud", 600);
        let claims = verifier().verify(&token).expect("verification succeeds");
        assert_eq!(claims.subject, subject);
        assert_eq!(claims.email, "a@b.com");
    }

    #[test]
    fn rejects_wrong_issuer() {
        let (token, _) = issue_token("someone-else", "aud", 600);
        let err = verifier().verify(&token).expect_err("should reject");
        assert!(matches!(err, AuthError::Verification(_)));
    }

    #[test]
    fn rejects_expired_token() {
        let (token, _) = issue_token("issuer", "aud", -600);
        let err = verifier().verify(&token).expect_err("should reject");
        assert!(matches!(err, AuthError::Verification(_)));
    }

    #[test]
    fn rejects_wrong_secret() {
        let (token, _) = issue_token("issuer", "aud", 600);
        let other = TokenVerifier::hs256(JwtConfig::new("issuer", "aud"), b"other-secret");
        assert!(other.verify(&token).is_err());
    }
}
