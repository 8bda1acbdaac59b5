//! Collaborator seams for the identity service
//!
//! The session manager, registration flow, and channel aggregator talk to
//! their backing services through these traits so each can be exercised
//! against in-memory fakes. Production wiring binds them to the Postgres
//! repositories and the S3 uploader.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewUser, User};

/// Error type shared by the store traits
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique constraint (username or email) was violated
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    /// Any other backend failure
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Type alias for store results
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable record of users and their credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create a user. The implementation hashes the plaintext password from
    /// `NewUser` before persisting it.
    async fn create(&self, new_user: NewUser) -> StoreResult<User>;

    /// Find a user by id
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Find a user by username (lower-cased compare) or email; either
    /// identifier matching is a hit
    async fn find_by_identifier(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> StoreResult<Option<User>>;

    /// Overwrite the refresh-token field unconditionally. `None` clears it.
    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> StoreResult<()>;

    /// Atomically replace the refresh token, but only if the stored value
    /// still equals `expected`. Returns false when the compare fails, which
    /// means the presented token was already superseded.
    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        replacement: &str,
    ) -> StoreResult<bool>;

    /// Replace the stored password hash
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<()>;
}

/// Read-only view over the directed subscriber -> channel edge collection
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Count of edges whose channel is `channel_id` (fan-in)
    async fn count_subscribers(&self, channel_id: Uuid) -> StoreResult<i64>;

    /// Count of edges whose subscriber is `subscriber_id` (fan-out)
    async fn count_subscriptions(&self, subscriber_id: Uuid) -> StoreResult<i64>;

    /// Membership test for a single edge
    async fn is_subscribed(&self, subscriber_id: Uuid, channel_id: Uuid) -> StoreResult<bool>;
}

/// A media asset handed to the uploader
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// External media-hosting service
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload an asset and return its public URL
    async fn upload(&self, asset: MediaAsset) -> anyhow::Result<String>;
}
