//! JWT token issuer for the identity service
//!
//! This module creates and validates JWT tokens using the HS256 algorithm.
//! Access and refresh tokens are signed with distinct secrets and carry
//! independent expiry policies, so a leaked access token never validates as
//! a refresh token and either secret can be rotated on its own schedule.

use anyhow::Result;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::models::User;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret for signing and verifying access tokens
    pub access_token_secret: String,
    /// Secret for signing and verifying refresh tokens
    pub refresh_token_secret: String,
    /// Access token expiration time in seconds (default: 15 minutes)
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 7 days)
    pub refresh_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `ACCESS_TOKEN_SECRET`: Secret for access token signatures
    /// - `REFRESH_TOKEN_SECRET`: Secret for refresh token signatures
    /// - `ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 900)
    /// - `REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let access_token_secret = std::env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("ACCESS_TOKEN_SECRET environment variable not set"))?;

        let refresh_token_secret = std::env::var("REFRESH_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("REFRESH_TOKEN_SECRET environment variable not set"))?;

        let access_token_expiry = std::env::var("ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "900".to_string()) // 15 minutes
            .parse()
            .unwrap_or(900);

        let refresh_token_expiry = std::env::var("REFRESH_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "604800".to_string()) // 7 days
            .parse()
            .unwrap_or(604800);

        Ok(JwtConfig {
            access_token_secret,
            refresh_token_secret,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

/// Claims carried by an access token
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User ID
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Claims carried by a refresh token
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// User ID
    pub sub: Uuid,
    /// Unique token id. Timestamps only have second precision, so without
    /// this two tokens minted in the same second would be byte-identical
    /// and rotation could not tell them apart.
    pub jti: Uuid,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Token issuer service
#[derive(Clone)]
pub struct TokenIssuer {
    access_encoding_key: EncodingKey,
    access_decoding_key: DecodingKey,
    refresh_encoding_key: EncodingKey,
    refresh_decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl TokenIssuer {
    /// Initialize a new token issuer
    pub fn new(config: JwtConfig) -> Result<Self> {
        if config.access_token_secret.is_empty() || config.refresh_token_secret.is_empty() {
            anyhow::bail!("JWT secrets must not be empty");
        }

        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;

        Ok(TokenIssuer {
            access_encoding_key: EncodingKey::from_secret(config.access_token_secret.as_bytes()),
            access_decoding_key: DecodingKey::from_secret(config.access_token_secret.as_bytes()),
            refresh_encoding_key: EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            refresh_decoding_key: DecodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            validation,
            config,
        })
    }

    fn now() -> Result<u64> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();
        Ok(now)
    }

    /// Generate an access token for a user
    pub fn issue_access_token(&self, user: &User) -> Result<String> {
        let now = Self::now()?;

        let claims = AccessClaims {
            sub: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            iat: now,
            exp: now + self.config.access_token_expiry,
        };

        let token = encode(
            &Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &self.access_encoding_key,
        )?;
        Ok(token)
    }

    /// Generate a refresh token for a user
    pub fn issue_refresh_token(&self, user: &User) -> Result<String> {
        let now = Self::now()?;

        let claims = RefreshClaims {
            sub: user.id,
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + self.config.refresh_token_expiry,
        };

        let token = encode(
            &Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &self.refresh_encoding_key,
        )?;
        Ok(token)
    }

    /// Validate an access token and return its claims
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims> {
        let token_data = decode::<AccessClaims>(token, &self.access_decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Validate a refresh token and return the user id it was issued for
    pub fn verify_refresh_token(&self, token: &str) -> Result<Uuid> {
        let token_data =
            decode::<RefreshClaims>(token, &self.refresh_decoding_key, &self.validation)?;
        Ok(token_data.claims.sub)
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.config.access_token_expiry
    }

    /// Get the refresh token expiry time
    pub fn refresh_token_expiry(&self) -> u64 {
        self.config.refresh_token_expiry
    }
}
