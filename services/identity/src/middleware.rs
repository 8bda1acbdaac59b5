//! Middleware for access-token validation

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;
use uuid::Uuid;

use crate::{AppState, errors::IdentityError};

/// Identity of the authenticated caller, inserted into request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

/// Pull the access token from the `Authorization: Bearer` header or the
/// `access_token` cookie; browser clients rely on the cookie
pub fn access_token_from(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|token| token.to_string());

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get("access_token")
            .map(|cookie| cookie.value().to_string())
    })
}

/// Require a valid access token and expose the caller's user id to handlers
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, IdentityError> {
    let token = access_token_from(req.headers()).ok_or(IdentityError::Unauthorized)?;

    let claims = state
        .sessions
        .issuer()
        .verify_access_token(&token)
        .map_err(|e| {
            warn!("access token rejected: {}", e);
            IdentityError::InvalidToken
        })?;

    req.extensions_mut().insert(AuthUser(claims.sub));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{AUTHORIZATION, COOKIE};

    #[test]
    fn test_bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer header-token".parse().unwrap());
        headers.insert(COOKIE, "access_token=cookie-token".parse().unwrap());

        assert_eq!(access_token_from(&headers).as_deref(), Some("header-token"));
    }

    #[test]
    fn test_cookie_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            "other=1; access_token=cookie-token".parse().unwrap(),
        );

        assert_eq!(access_token_from(&headers).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn test_no_credentials() {
        assert_eq!(access_token_from(&HeaderMap::new()), None);
    }
}
