//! HS256 bearer token issue/verify.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::claims::{validate_claims, JwtClaims, TokenValidationError};

#[derive(Debug, Error)]
pub enum TokenError {
    /// Malformed token, wrong algorithm, or bad signature.
    #[error("invalid token")]
    Invalid,

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Issue/verify capability, injected where tokens are minted or checked.
pub trait TokenAuthority: Send + Sync {
    fn issue(&self, claims: &JwtClaims) -> Result<String, TokenError>;
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;
}

/// Symmetric HS256 implementation.
pub struct Hs256TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl Hs256TokenAuthority {
    pub fn new(secret: &[u8]) -> Self {
        // Time-window validation is done deterministically against the caller's
        // clock in `validate_claims`, not by the JWT library.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl TokenAuthority for Hs256TokenAuthority {
    fn issue(&self, claims: &JwtClaims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|_| TokenError::Invalid)
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &self.validation)
            .map_err(|_| TokenError::Invalid)?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use trackle_core::UserId;

    use super::*;

    fn claims(ttl_minutes: i64) -> JwtClaims {
        let now = Utc::now();
        JwtClaims {
            sub: UserId::new(),
            email: "a@x.com".into(),
            issued_at: now,
            expires_at: now + Duration::minutes(ttl_minutes),
        }
    }

    #[test]
    fn issue_then_verify_round_trips() {
        let authority = Hs256TokenAuthority::new(b"test-secret");
        let claims = claims(15);

        let token = authority.issue(&claims).unwrap();
        let verified = authority.verify(&token, Utc::now()).unwrap();

        assert_eq!(verified.sub, claims.sub);
        assert_eq!(verified.email, claims.email);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issuer = Hs256TokenAuthority::new(b"secret-a");
        let verifier = Hs256TokenAuthority::new(b"secret-b");

        let token = issuer.issue(&claims(15)).unwrap();
        assert!(matches!(
            verifier.verify(&token, Utc::now()),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let authority = Hs256TokenAuthority::new(b"test-secret");
        let token = authority.issue(&claims(15)).unwrap();

        let later = Utc::now() + Duration::minutes(16);
        assert!(matches!(
            authority.verify(&token, later),
            Err(TokenError::Claims(TokenValidationError::Expired))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        let authority = Hs256TokenAuthority::new(b"test-secret");
        assert!(matches!(
            authority.verify("not.a.jwt", Utc::now()),
            Err(TokenError::Invalid)
        ));
    }
}
