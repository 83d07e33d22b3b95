//! JWT token handling
//!
//! Access tokens carry the tenant the staff member signed into, so every
//! authenticated request is scoped without a database round trip.

use bizdesk_shared::constants::TOKEN_TYPE_ACCESS;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token creation failed: {0}")]
    CreationError(String),
    #[error("Token validation failed: {0}")]
    ValidationError(String),
    #[error("Token expired")]
    TokenExpired,
    #[error("Unexpected token type: {0}")]
    WrongTokenType(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Staff id
    pub sub: Uuid,
    pub tenant_id: Uuid,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
    pub token_type: String,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry: i64,
}

impl JwtService {
    pub fn new(secret: &str, access_expiry: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expiry: access_expiry,
        }
    }

    pub fn generate_access_token(
        &self,
        staff_id: Uuid,
        tenant_id: Uuid,
        role: &str,
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: staff_id,
            tenant_id,
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
            token_type: TOKEN_TYPE_ACCESS.to_string(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::CreationError(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::ValidationError(e.to_string()),
            })?;

        if claims.token_type != TOKEN_TYPE_ACCESS {
            return Err(JwtError::WrongTokenType(claims.token_type));
        }
        Ok(claims)
    }

    pub fn access_token_expiry(&self) -> i64 {
        self.access_token_expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_token_carries_tenant() {
        let svc = JwtService::new(SECRET, 600);
        let staff = Uuid::new_v4();
        let tenant = Uuid::new_v4();
        let token = svc.generate_access_token(staff, tenant, "admin").unwrap();

        let claims = svc.validate_token(&token).unwrap();
        assert_eq!(claims.sub, staff);
        assert_eq!(claims.tenant_id, tenant);
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn test_expired_token() {
        // Beyond the default 60s leeway.
        let svc = JwtService::new(SECRET, -120);
        let token = svc
            .generate_access_token(Uuid::new_v4(), Uuid::new_v4(), "employee")
            .unwrap();
        assert!(matches!(svc.validate_token(&token), Err(JwtError::TokenExpired)));
    }

    #[test]
    fn test_other_secret_rejected() {
        let issuer = JwtService::new(SECRET, 600);
        let verifier = JwtService::new("ffffffffffffffffffffffffffffffff", 600);
        let token = issuer
            .generate_access_token(Uuid::new_v4(), Uuid::new_v4(), "employee")
            .unwrap();
        assert!(matches!(
            verifier.validate_token(&token),
            Err(JwtError::ValidationError(_))
        ));
    }
}
