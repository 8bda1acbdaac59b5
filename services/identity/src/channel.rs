//! Channel aggregator: subscriber-graph counts and viewer membership
//!
//! Read-only view that joins a user to the subscription edges twice, once as
//! channel (fan-in) and once as subscriber (fan-out). The counts are two
//! independent aggregate queries plus one membership test, so cost stays
//! proportional to the relevant edge count.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::errors::{IdentityError, IdentityResult};
use crate::models::ChannelProfile;
use crate::store::{CredentialStore, SubscriptionStore};

/// Channel profile query service
#[derive(Clone)]
pub struct ChannelAggregator {
    users: Arc<dyn CredentialStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
}

impl ChannelAggregator {
    /// Create a new channel aggregator
    pub fn new(users: Arc<dyn CredentialStore>, subscriptions: Arc<dyn SubscriptionStore>) -> Self {
        Self {
            users,
            subscriptions,
        }
    }

    /// Build the viewer-relative profile for a channel
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer: Option<Uuid>,
    ) -> IdentityResult<ChannelProfile> {
        let username = username.trim().to_lowercase();
        if username.is_empty() {
            return Err(IdentityError::Validation("username is missing".to_string()));
        }

        let user = self
            .users
            .find_by_identifier(Some(&username), None)
            .await?
            .ok_or(IdentityError::NotFound("channel"))?;

        let subscribers_count = self.subscriptions.count_subscribers(user.id).await?;
        let subscribed_to_count = self.subscriptions.count_subscriptions(user.id).await?;

        let is_subscribed = match viewer {
            Some(viewer_id) => self.subscriptions.is_subscribed(viewer_id, user.id).await?,
            None => false,
        };

        info!(
            "channel profile for {}: {} subscribers, {} subscriptions",
            username, subscribers_count, subscribed_to_count
        );

        Ok(ChannelProfile {
            id: user.id,
            full_name: user.full_name,
            username: user.username,
            email: user.email,
            avatar_url: user.avatar_url,
            cover_image_url: user.cover_image_url.unwrap_or_default(),
            subscribers_count,
            subscribed_to_count,
            is_subscribed,
        })
    }
}
