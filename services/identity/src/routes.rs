//! Identity service routes

use axum::{
    Extension, Json, Router,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{
    AppState,
    errors::{IdentityError, IdentityResult},
    middleware::{AuthUser, access_token_from, auth_middleware},
    models::PublicUser,
    registration::RegisterRequest,
    session::TokenPair,
    store::MediaAsset,
};

/// Response for login and refresh
#[derive(Serialize)]
pub struct TokenResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicUser>,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Request for token refresh when the token comes in the body
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Request for password change
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Create the router for the identity service
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/v1/users/logout", post(logout))
        .route("/api/v1/users/change-password", post(change_password))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/users/register", post(register))
        .route("/api/v1/users/login", post(login))
        .route("/api/v1/users/refresh-token", post(refresh_token))
        .route("/api/v1/users/channel/:username", get(channel_profile))
        .merge(protected)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "identity-service"
    }))
}

/// User registration endpoint (multipart: text fields plus avatar and
/// optional cover image)
pub async fn register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> IdentityResult<impl IntoResponse> {
    let mut request = RegisterRequest {
        full_name: String::new(),
        email: String::new(),
        username: String::new(),
        password: String::new(),
        avatar: None,
        cover_image: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| IdentityError::Validation(format!("malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "fullName" => request.full_name = read_text(field).await?,
            "email" => request.email = read_text(field).await?,
            "username" => request.username = read_text(field).await?,
            "password" => request.password = read_text(field).await?,
            "avatar" => request.avatar = Some(read_asset(field).await?),
            "coverImage" => request.cover_image = Some(read_asset(field).await?),
            other => {
                info!("ignoring unknown multipart field {}", other);
            }
        }
    }

    let user = state.registration.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> IdentityResult<String> {
    field
        .text()
        .await
        .map_err(|e| IdentityError::Validation(format!("unreadable field: {}", e)))
}

async fn read_asset(field: axum::extract::multipart::Field<'_>) -> IdentityResult<MediaAsset> {
    let file_name = field.file_name().unwrap_or("upload.bin").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| IdentityError::Validation(format!("unreadable file field: {}", e)))?;

    Ok(MediaAsset {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    })
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<crate::models::LoginCredentials>,
) -> IdentityResult<impl IntoResponse> {
    let (tokens, user) = state.sessions.login(&payload).await?;

    let jar = set_token_cookies(jar, &tokens);
    let response = TokenResponse {
        user: Some(user),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.sessions.issuer().access_token_expiry(),
    };

    Ok((StatusCode::OK, jar, Json(response)))
}

/// Logout endpoint; clears the stored refresh token and the cookies
pub async fn logout(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    jar: CookieJar,
) -> IdentityResult<impl IntoResponse> {
    state.sessions.logout(user_id).await?;

    let jar = clear_token_cookies(jar);
    Ok((StatusCode::OK, jar, Json(json!({}))))
}

/// Refresh token endpoint; the token arrives as a cookie or in the body
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshTokenRequest>>,
) -> IdentityResult<impl IntoResponse> {
    let presented = jar
        .get("refresh_token")
        .map(|cookie| cookie.value().to_string())
        .or(body.map(|Json(req)| req.refresh_token));

    let tokens = state.sessions.refresh(presented.as_deref()).await?;

    let jar = set_token_cookies(jar, &tokens);
    let response = TokenResponse {
        user: None,
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.sessions.issuer().access_token_expiry(),
    };

    Ok((StatusCode::OK, jar, Json(response)))
}

/// Password change endpoint
pub async fn change_password(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> IdentityResult<impl IntoResponse> {
    state
        .sessions
        .change_password(user_id, &payload.old_password, &payload.new_password)
        .await?;

    Ok((StatusCode::OK, Json(json!({"message": "password changed"}))))
}

/// Channel profile endpoint; the viewer is taken from the access token when
/// one is presented, otherwise the profile is unauthenticated
pub async fn channel_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> IdentityResult<impl IntoResponse> {
    let viewer = access_token_from(&headers)
        .and_then(|token| state.sessions.issuer().verify_access_token(&token).ok())
        .map(|claims| claims.sub);

    let profile = state.channels.channel_profile(&username, viewer).await?;
    Ok((StatusCode::OK, Json(profile)))
}

/// Tokens travel as same-site, HTTP-only, secure cookies in addition to the
/// response body, so browser clients never handle them manually
fn set_token_cookies(jar: CookieJar, tokens: &TokenPair) -> CookieJar {
    jar.add(token_cookie("access_token", tokens.access_token.clone()))
        .add(token_cookie("refresh_token", tokens.refresh_token.clone()))
}

fn clear_token_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(token_cookie("access_token", String::new()))
        .remove(token_cookie("refresh_token", String::new()))
}

fn token_cookie(name: &'static str, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    cookie
}
