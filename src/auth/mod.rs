pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::{DatabaseError, Store, User};

pub use password::{hash_password, verify_password};

/// Identity of the caller, established by the JWT middleware
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_id: i64,
    pub username: String,
    pub token_type: TokenType,
    pub jti: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Token is invalid or expired: {0}")]
    InvalidToken(String),

    #[error("Token has wrong type")]
    WrongTokenType,

    #[error("Token is blacklisted")]
    Revoked,

    #[error("No active account found with the given credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Storage(#[from] DatabaseError),
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Storage(DatabaseError::Sqlx(err))
    }
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Issues, verifies and revokes JWTs
#[derive(Clone)]
pub struct TokenService {
    store: Store,
    secret: Arc<str>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(store: Store, security: &SecurityConfig) -> Self {
        Self {
            store,
            secret: Arc::from(security.jwt_secret.as_str()),
            access_ttl: Duration::minutes(security.access_token_minutes),
            refresh_ttl: Duration::hours(security.refresh_token_hours),
        }
    }

    pub fn issue_pair(&self, user: &AuthUser) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issue(user, TokenType::Access)?,
            refresh: self.issue(user, TokenType::Refresh)?,
        })
    }

    pub fn issue(&self, user: &AuthUser, token_type: TokenType) -> Result<String, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }

        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user.user_id.to_string(),
            user_id: user.user_id,
            username: user.username.clone(),
            token_type,
            jti: Uuid::new_v4().simple().to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Verify signature and expiry, and that the token is of the expected type.
    pub fn decode(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?
        .claims;

        if claims.token_type != expected {
            return Err(AuthError::WrongTokenType);
        }
        Ok(claims)
    }

    /// Exchange a live refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.decode(refresh_token, TokenType::Refresh)?;
        if self.is_revoked(&claims.jti).await? {
            return Err(AuthError::Revoked);
        }

        let user = AuthUser {
            user_id: claims.user_id,
            username: claims.username,
        };
        self.issue(&user, TokenType::Access)
    }

    /// Blacklist a refresh token so it can no longer be refreshed.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self.decode(refresh_token, TokenType::Refresh)?;

        sqlx::query(
            "INSERT OR IGNORE INTO revoked_tokens (jti, user_id, expires_at, revoked_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&claims.jti)
        .bind(claims.user_id)
        .bind(claims.exp)
        .bind(Utc::now())
        .execute(self.store.pool())
        .await?;

        tracing::info!(user_id = claims.user_id, "Revoked refresh token");

        let purged = self.purge_expired().await?;
        if purged > 0 {
            tracing::debug!(purged, "Purged expired blacklist entries");
        }
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, AuthError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM revoked_tokens WHERE jti = ?")
            .bind(jti)
            .fetch_one(self.store.pool())
            .await?;
        Ok(count > 0)
    }

    /// Drop blacklist entries whose tokens have expired anyway. Runs after
    /// every revoke and from `kitten tokens purge`.
    pub async fn purge_expired(&self) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < ?")
            .bind(Utc::now().timestamp())
            .execute(self.store.pool())
            .await?;
        Ok(result.rows_affected())
    }
}
