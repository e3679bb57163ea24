//! Access and refresh tokens
//!
//! Access tokens are HS256 JWTs that always carry an expiry. Refresh tokens
//! are random strings; only their SHA-256 hash is stored.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use core_kernel::ShopId;
use domain_shop::{Caller, RefreshTokenRecord, Role, Shop};

use crate::config::ApiConfig;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Shop id
    pub sub: String,
    pub username: String,
    pub role: Role,
    /// Token id, the revocation key
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    pub fn caller(&self) -> Result<Caller, AuthError> {
        let shop_id: ShopId = self.sub.parse().map_err(|_| AuthError::InvalidToken)?;
        Ok(Caller::new(shop_id, self.username.clone(), self.role))
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token revoked")]
    TokenRevoked,
    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// A freshly signed access token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies access tokens and mints refresh tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    admin_ttl: Duration,
    master_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, admin_ttl: Duration, master_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            admin_ttl,
            master_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            seconds(config.admin_token_ttl_secs),
            seconds(config.master_token_ttl_secs),
            seconds(config.refresh_token_ttl_secs),
        )
    }

    /// Access-token lifetime for `role`
    pub fn ttl_for(&self, role: Role) -> Duration {
        match role {
            Role::Admin => self.admin_ttl,
            Role::Master => self.master_ttl,
        }
    }

    pub fn issue_access(&self, shop: &Shop, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let expires_at = now + self.ttl_for(shop.role);
        let jti = Uuid::new_v4().to_string();
        let claims = TokenClaims {
            sub: shop.id.as_uuid().to_string(),
            username: shop.username.clone(),
            role: shop.role,
            jti: jti.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        Ok(IssuedToken {
            token,
            jti,
            expires_at,
        })
    }

    /// Verifies signature and expiry
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<TokenClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }

    /// Mints a refresh token; returns the plaintext and the record to store
    pub fn mint_refresh(&self, shop_id: ShopId, now: DateTime<Utc>) -> (String, RefreshTokenRecord) {
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let record = RefreshTokenRecord {
            token_hash: hash_token(&token),
            shop_id,
            expires_at: now + self.refresh_ttl,
            created_at: now,
        };
        (token, record)
    }
}

/// Hex SHA-256 of a refresh token
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Lifetimes are capped at a century
fn seconds(secs: u64) -> Duration {
    const CAP: u64 = 100 * 365 * 24 * 3600;
    Duration::seconds(secs.min(CAP) as i64)
}

/// Extracts the token from an `Authorization: Bearer ...` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)
}
