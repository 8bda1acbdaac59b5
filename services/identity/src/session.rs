//! Session management: login, logout, and refresh-token rotation
//!
//! A user has at most one active refresh token, stored as a single field on
//! the user record. Login overwrites it, logout clears it, and refresh
//! replaces it through an atomic compare-and-swap so a superseded token can
//! never be replayed.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{IdentityError, IdentityResult};
use crate::jwt::TokenIssuer;
use crate::models::{LoginCredentials, PublicUser};
use crate::password::{hash_password, verify_password};
use crate::store::CredentialStore;
use crate::validation::{require_non_empty, validate_password};

/// Freshly minted access/refresh token pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Session manager orchestrating the credential store and token issuer
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    issuer: TokenIssuer,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(store: Arc<dyn CredentialStore>, issuer: TokenIssuer) -> Self {
        Self { store, issuer }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Verify credentials and open a session.
    ///
    /// A fresh login also overwrites any previously stored refresh token, so
    /// there is never more than one session slot per user. Missing user and
    /// wrong password are reported distinctly (404 vs 401 at the boundary);
    /// we accept the enumeration trade-off to match the documented surface.
    pub async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> IdentityResult<(TokenPair, PublicUser)> {
        if credentials.username.as_deref().map_or(true, str::is_empty)
            && credentials.email.as_deref().map_or(true, str::is_empty)
        {
            return Err(IdentityError::Validation(
                "username or email is required".to_string(),
            ));
        }
        require_non_empty(&credentials.password, "password")?;

        let user = self
            .store
            .find_by_identifier(credentials.username.as_deref(), credentials.email.as_deref())
            .await?
            .ok_or(IdentityError::NotFound("user"))?;

        if !verify_password(&user.password_hash, &credentials.password)? {
            warn!("failed login attempt for user {}", user.username);
            return Err(IdentityError::InvalidCredentials);
        }

        let tokens = self.mint_pair(&user).await?;
        info!("user {} logged in", user.username);

        Ok((tokens, user.to_public()))
    }

    /// Close the session for a user by clearing the stored refresh token.
    /// Idempotent: logging out an already-logged-out user succeeds.
    pub async fn logout(&self, user_id: Uuid) -> IdentityResult<()> {
        self.store.set_refresh_token(user_id, None).await?;
        info!("user {} logged out", user_id);
        Ok(())
    }

    /// Exchange a refresh token for a fresh token pair, rotating the stored
    /// value. The presented token must equal the stored one; the swap is a
    /// compare-and-set, so of two concurrent refreshes with the same token
    /// exactly one wins and the other observes reuse.
    pub async fn refresh(&self, presented: Option<&str>) -> IdentityResult<TokenPair> {
        let presented = match presented {
            Some(token) if !token.is_empty() => token,
            _ => return Err(IdentityError::Unauthorized),
        };

        let user_id = self
            .issuer
            .verify_refresh_token(presented)
            .map_err(|_| IdentityError::InvalidToken)?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(IdentityError::InvalidToken)?;

        let access_token = self.issuer.issue_access_token(&user)?;
        let refresh_token = self.issuer.issue_refresh_token(&user)?;

        let rotated = self
            .store
            .swap_refresh_token(user.id, presented, &refresh_token)
            .await?;
        if !rotated {
            warn!("refresh token reuse detected for user {}", user.id);
            return Err(IdentityError::TokenReuse);
        }

        info!("rotated refresh token for user {}", user.id);
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Replace the password after checking the old one
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> IdentityResult<()> {
        validate_password(new_password)?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(IdentityError::NotFound("user"))?;

        if !verify_password(&user.password_hash, old_password)? {
            return Err(IdentityError::Validation(
                "invalid old password".to_string(),
            ));
        }

        let new_hash = hash_password(new_password)?;
        self.store.update_password_hash(user_id, &new_hash).await?;
        info!("password changed for user {}", user_id);
        Ok(())
    }

    async fn mint_pair(&self, user: &crate::models::User) -> IdentityResult<TokenPair> {
        let access_token = self.issuer.issue_access_token(user)?;
        let refresh_token = self.issuer.issue_refresh_token(user)?;

        self.store
            .set_refresh_token(user.id, Some(&refresh_token))
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtConfig;
    use crate::models::NewUser;
    use crate::store::memory::InMemoryCredentialStore;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(JwtConfig {
            access_token_secret: "access-test-secret".to_string(),
            refresh_token_secret: "refresh-test-secret".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
        })
        .unwrap()
    }

    async fn seeded() -> (Arc<InMemoryCredentialStore>, SessionManager, Uuid) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let user = store
            .create(NewUser {
                username: "hitesh".to_string(),
                email: "hitesh@example.com".to_string(),
                full_name: "Hitesh C".to_string(),
                password: "chai-aur-code".to_string(),
                avatar_url: "https://cdn.test.local/avatar.png".to_string(),
                cover_image_url: None,
            })
            .await
            .unwrap();
        let sessions = SessionManager::new(store.clone(), issuer());
        (store, sessions, user.id)
    }

    fn creds(password: &str) -> LoginCredentials {
        LoginCredentials {
            username: Some("hitesh".to_string()),
            email: None,
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_persists_the_returned_refresh_token() {
        let (store, sessions, user_id) = seeded().await;

        let (tokens, public) = sessions.login(&creds("chai-aur-code")).await.unwrap();

        assert_eq!(public.username, "hitesh");
        assert_eq!(
            store.stored_refresh_token(user_id),
            Some(tokens.refresh_token.clone())
        );
        // Access token names the same user
        let claims = sessions.issuer().verify_access_token(&tokens.access_token).unwrap();
        assert_eq!(claims.sub, user_id);
    }

    #[tokio::test]
    async fn test_login_by_email_works() {
        let (_store, sessions, _) = seeded().await;

        let result = sessions
            .login(&LoginCredentials {
                username: None,
                email: Some("hitesh@example.com".to_string()),
                password: "chai-aur-code".to_string(),
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_login_requires_an_identifier() {
        let (_store, sessions, _) = seeded().await;

        let err = sessions
            .login(&LoginCredentials {
                username: None,
                email: None,
                password: "chai-aur-code".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::Validation(_)));
    }

    #[tokio::test]
    async fn test_wrong_password_issues_no_tokens() {
        let (store, sessions, user_id) = seeded().await;

        let err = sessions.login(&creds("wrong-password")).await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredentials));
        assert_eq!(store.stored_refresh_token(user_id), None);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let (_store, sessions, _) = seeded().await;

        let err = sessions
            .login(&LoginCredentials {
                username: Some("nobody".to_string()),
                email: None,
                password: "whatever".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_refresh_rotates_the_stored_token() {
        let (store, sessions, user_id) = seeded().await;
        let (tokens, _) = sessions.login(&creds("chai-aur-code")).await.unwrap();

        let rotated = sessions.refresh(Some(&tokens.refresh_token)).await.unwrap();

        assert_ne!(rotated.refresh_token, tokens.refresh_token);
        assert_eq!(
            store.stored_refresh_token(user_id),
            Some(rotated.refresh_token.clone())
        );
    }

    #[tokio::test]
    async fn test_superseded_token_fails_with_reuse() {
        let (_store, sessions, _) = seeded().await;
        let (tokens, _) = sessions.login(&creds("chai-aur-code")).await.unwrap();

        // First rotation supersedes the original token
        sessions.refresh(Some(&tokens.refresh_token)).await.unwrap();

        // The original token has TTL left but must be dead
        let err = sessions
            .refresh(Some(&tokens.refresh_token))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::TokenReuse));
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_one_wins() {
        let (_store, sessions, _) = seeded().await;
        let (tokens, _) = sessions.login(&creds("chai-aur-code")).await.unwrap();

        let (a, b) = tokio::join!(
            sessions.refresh(Some(&tokens.refresh_token)),
            sessions.refresh(Some(&tokens.refresh_token)),
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one concurrent refresh must win");
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser.unwrap_err(), IdentityError::TokenReuse));
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (_store, sessions, _) = seeded().await;

        assert!(matches!(
            sessions.refresh(None).await.unwrap_err(),
            IdentityError::Unauthorized
        ));
        assert!(matches!(
            sessions.refresh(Some("")).await.unwrap_err(),
            IdentityError::Unauthorized
        ));
    }

    #[tokio::test]
    async fn test_garbage_token_is_invalid() {
        let (_store, sessions, _) = seeded().await;

        let err = sessions.refresh(Some("not.a.jwt")).await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidToken));
    }

    #[tokio::test]
    async fn test_logout_clears_the_slot_and_kills_refresh() {
        let (store, sessions, user_id) = seeded().await;
        let (tokens, _) = sessions.login(&creds("chai-aur-code")).await.unwrap();

        sessions.logout(user_id).await.unwrap();
        assert_eq!(store.stored_refresh_token(user_id), None);

        let err = sessions
            .refresh(Some(&tokens.refresh_token))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::TokenReuse));

        // Idempotent
        sessions.logout(user_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_change_password() {
        let (_store, sessions, user_id) = seeded().await;

        let err = sessions
            .change_password(user_id, "wrong-old", "new-password-1")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::Validation(_)));

        sessions
            .change_password(user_id, "chai-aur-code", "new-password-1")
            .await
            .unwrap();

        // Old password no longer works, new one does
        assert!(matches!(
            sessions.login(&creds("chai-aur-code")).await.unwrap_err(),
            IdentityError::InvalidCredentials
        ));
        assert!(sessions.login(&creds("new-password-1")).await.is_ok());
    }
}
