//! Bearer credential with a decoded expiration.
//!
//! The token is a JWT. Only its `exp` claim is read; the signature is not
//! verified.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Deserialize)]
struct Claims {
    /// Seconds since the epoch; some issuers write a fraction.
    exp: f64,
}

/// Opaque bearer token plus its expiration. Never refreshed.
#[derive(Clone)]
pub struct Credential {
    token: String,
    expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Credential {
    /// Decode a JWT bearer token.
    ///
    /// An expired token is accepted here; every operation using it fails.
    pub fn parse(token: impl Into<String>) -> ClientResult<Self> {
        let token = token.into();
        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(ClientError::invalid_credential("token is empty"));
        }

        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(&token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| ClientError::invalid_credential(format!("couldn't decode token: {}", e)))?;

        let exp = data.claims.exp;
        let expires_at = Some(exp)
            .filter(|e| e.is_finite())
            .and_then(|e| DateTime::from_timestamp(e.trunc() as i64, 0))
            .ok_or_else(|| ClientError::invalid_credential(format!("exp {} out of range", exp)))?;

        Ok(Self { token, expires_at })
    }

    /// Build a credential from a raw token and a known expiration.
    pub fn from_parts(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Fail with `CredentialExpired` once the expiration has passed.
    pub fn ensure_valid(&self) -> ClientResult<()> {
        if self.is_expired() {
            return Err(ClientError::CredentialExpired(self.expires_at));
        }
        Ok(())
    }
}
