//! Registration flow: validation, uniqueness check, media provisioning, and
//! user creation

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::errors::{IdentityError, IdentityResult};
use crate::models::{NewUser, PublicUser};
use crate::store::{CredentialStore, MediaAsset, MediaStore};
use crate::validation::{require_non_empty, validate_email, validate_password, validate_username};

/// Registration input as received from the boundary
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub avatar: Option<MediaAsset>,
    pub cover_image: Option<MediaAsset>,
}

/// Registration service
#[derive(Clone)]
pub struct RegistrationFlow {
    store: Arc<dyn CredentialStore>,
    media: Arc<dyn MediaStore>,
    upload_timeout: Duration,
}

impl RegistrationFlow {
    /// Create a new registration flow
    pub fn new(
        store: Arc<dyn CredentialStore>,
        media: Arc<dyn MediaStore>,
        upload_timeout: Duration,
    ) -> Self {
        Self {
            store,
            media,
            upload_timeout,
        }
    }

    /// Register a new user and return the public projection
    pub async fn register(&self, request: RegisterRequest) -> IdentityResult<PublicUser> {
        require_non_empty(&request.full_name, "full_name")?;
        validate_email(request.email.trim())?;
        validate_username(request.username.trim())?;
        validate_password(&request.password)?;

        let username = request.username.trim().to_lowercase();
        let email = request.email.trim().to_string();

        if self
            .store
            .find_by_identifier(Some(&username), Some(&email))
            .await?
            .is_some()
        {
            return Err(IdentityError::Conflict);
        }

        let avatar = request
            .avatar
            .ok_or_else(|| IdentityError::Validation("avatar file is required".to_string()))?;

        let avatar_url = match self.upload(avatar).await? {
            Some(url) => url,
            None => {
                return Err(IdentityError::UploadFailed(
                    "avatar upload did not yield a URL".to_string(),
                ));
            }
        };

        // A failed cover upload degrades to an empty cover instead of
        // failing the registration
        let cover_image_url = match request.cover_image {
            Some(asset) => match self.upload(asset).await {
                Ok(url) => url,
                Err(e) => {
                    warn!("cover image upload failed, continuing without: {}", e);
                    None
                }
            },
            None => None,
        };

        let created = self
            .store
            .create(NewUser {
                username: username.clone(),
                email,
                full_name: request.full_name.trim().to_string(),
                password: request.password,
                avatar_url,
                cover_image_url,
            })
            .await?;

        // Re-read through the store so the caller sees exactly what was
        // persisted; an empty read here is an invariant violation
        let persisted = self
            .store
            .find_by_id(created.id)
            .await?
            .ok_or_else(|| {
                IdentityError::Internal(anyhow::anyhow!(
                    "user {} missing immediately after creation",
                    created.id
                ))
            })?;

        info!("registered user {}", username);
        Ok(persisted.to_public())
    }

    /// Upload one asset with the configured timeout. A timeout surfaces as
    /// `Unavailable` (retryable), any other uploader failure as `UploadFailed`.
    async fn upload(&self, asset: MediaAsset) -> IdentityResult<Option<String>> {
        let uploaded = tokio::time::timeout(self.upload_timeout, self.media.upload(asset))
            .await
            .map_err(|_| IdentityError::Unavailable)?
            .map_err(|e| IdentityError::UploadFailed(e.to_string()))?;

        if uploaded.is_empty() {
            return Ok(None);
        }
        Ok(Some(uploaded))
    }
}
