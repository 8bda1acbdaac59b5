//! Channel profile projection returned by the channel aggregator

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Viewer-relative channel profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelProfile {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub avatar_url: String,
    pub cover_image_url: String,
    /// Count of subscription edges pointing at this channel
    pub subscribers_count: i64,
    /// Count of subscription edges originating from this user
    pub subscribed_to_count: i64,
    /// True iff the viewer subscribes to this channel; false when unauthenticated
    pub is_subscribed: bool,
}
