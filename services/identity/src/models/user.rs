//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User entity as stored in the credential store
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    /// Currently active refresh token. `None` means no active session.
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Outward projection of this user. The password hash and refresh token
    /// do not exist on the projected type.
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            avatar_url: self.avatar_url.clone(),
            cover_image_url: self.cover_image_url.clone().unwrap_or_default(),
            created_at: self.created_at,
        }
    }
}

/// User representation safe to return to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: String,
    pub created_at: DateTime<Utc>,
}

/// New user creation payload
///
/// The password is plaintext here; the credential store hashes it on insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
}

/// User login credentials; at least one identifier must be supplied
#[derive(Debug, Clone, Deserialize)]
pub struct LoginCredentials {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_projection_carries_no_secrets() {
        let user = User {
            id: Uuid::new_v4(),
            username: "chai".to_string(),
            email: "chai@example.com".to_string(),
            full_name: "Chai Aur Code".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            avatar_url: "https://cdn.example.com/avatar.png".to_string(),
            cover_image_url: None,
            refresh_token: Some("some-refresh-token".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(user.to_public()).unwrap();
        let rendered = json.to_string();
        assert!(!rendered.contains("password"));
        assert!(!rendered.contains("refresh"));
        assert_eq!(json["username"], "chai");
        assert_eq!(json["cover_image_url"], "");
    }
}
