//! Authentication service routes

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use common::{
    models::PublicUser,
    token::{Claims, TokenType},
};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::{
    AppState,
    repositories::{hash_password, verify_password},
};

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Response for user login
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// Request carrying a refresh token
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Response for token refresh
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    pub success: bool,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/login", post(login).fallback(method_not_allowed))
        .route("/api/refresh", post(refresh_token).fallback(method_not_allowed))
        .route("/api/logout", post(logout).fallback(method_not_allowed))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy answering preflight requests for the browser client
pub fn cors_layer(allowed_origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let origin = match allowed_origin {
        Some(origin) => AllowOrigin::exact(HeaderValue::from_str(origin)?),
        None => AllowOrigin::any(),
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

async fn method_not_allowed() -> AuthError {
    AuthError::MethodNotAllowed
}

/// Hash compared against when the email is unknown, so that both failure
/// paths cost one Argon2 verification
fn dummy_hash() -> &'static str {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();
    DUMMY_HASH.get_or_init(|| hash_password("taxora-unknown-account").unwrap_or_default())
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, AuthError>,
) -> Result<impl IntoResponse, AuthError> {
    let (email, password) = match (payload.email, payload.password) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            (email, password)
        }
        _ => {
            return Err(AuthError::BadRequest(
                "Email and password are required".to_string(),
            ));
        }
    };

    info!("Login attempt for user: {}", email);

    if !state.rate_limiter.is_allowed(&email).await {
        warn!("Login rate limit exceeded for {}", email);
        return Err(AuthError::TooManyRequests);
    }

    let user = state.users.find_by_email(&email).await.map_err(|e| {
        error!("Failed to look up user: {}", e);
        AuthError::InternalServerError
    })?;

    let user = match user {
        Some(user) if verify_password(&user.password_hash, &password) => user,
        Some(_) => {
            warn!("Invalid password for {}", email);
            return Err(AuthError::Unauthorized);
        }
        None => {
            verify_password(dummy_hash(), &password);
            warn!("Login for unknown account {}", email);
            return Err(AuthError::Unauthorized);
        }
    };

    state.rate_limiter.reset(&email).await;

    let access_token = state
        .jwt_service
        .generate_access_token(&user)
        .map_err(|e| {
            error!("Failed to generate access token: {}", e);
            AuthError::InternalServerError
        })?;

    let refresh_token = state
        .jwt_service
        .generate_refresh_token(&user)
        .map_err(|e| {
            error!("Failed to generate refresh token: {}", e);
            AuthError::InternalServerError
        })?;

    state
        .sessions
        .create_session(&user.id, &refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to store session: {}", e);
            AuthError::InternalServerError
        })?;

    let response = LoginResponse {
        success: true,
        user: PublicUser::from(&user),
        access_token,
        refresh_token,
        token_type: "Bearer",
        expires_in: state.jwt_service.access_token_expiry(),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Validate a refresh token that has not been revoked
async fn check_refresh_token(state: &AppState, token: &str) -> Result<Claims, AuthError> {
    let claims = state
        .jwt_service
        .validate_token(token, TokenType::Refresh)
        .map_err(|_| AuthError::Unauthorized)?;

    let revoked = state
        .sessions
        .is_token_revoked(&claims.jti)
        .await
        .map_err(|e| {
            error!("Failed to check token revocation: {}", e);
            AuthError::InternalServerError
        })?;

    if revoked {
        return Err(AuthError::Unauthorized);
    }

    Ok(claims)
}

async fn revoke(state: &AppState, claims: &Claims) -> Result<(), AuthError> {
    let ttl = state.jwt_service.remaining_lifetime(claims).map_err(|e| {
        error!("Failed to compute token lifetime: {}", e);
        AuthError::InternalServerError
    })?;

    state
        .sessions
        .revoke_token(&claims.jti, ttl)
        .await
        .map_err(|e| {
            error!("Failed to revoke token: {}", e);
            AuthError::InternalServerError
        })
}

/// Refresh token endpoint; rotates the refresh token
pub async fn refresh_token(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<RefreshTokenRequest>, AuthError>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Token refresh request");

    let claims = check_refresh_token(&state, &payload.refresh_token).await?;

    let current = state
        .sessions
        .is_session_valid(&claims.sub, &payload.refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to load session: {}", e);
            AuthError::InternalServerError
        })?;

    if !current {
        warn!("Refresh with a superseded token for user {}", claims.sub);
        return Err(AuthError::Unauthorized);
    }

    // Name and role are re-read so tokens follow the stored account
    let user = state
        .users
        .find_by_id(&claims.sub)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            AuthError::InternalServerError
        })?
        .ok_or(AuthError::Unauthorized)?;

    revoke(&state, &claims).await?;

    let access_token = state
        .jwt_service
        .generate_access_token(&user)
        .map_err(|e| {
            error!("Failed to generate access token: {}", e);
            AuthError::InternalServerError
        })?;

    let new_refresh_token = state
        .jwt_service
        .generate_refresh_token(&user)
        .map_err(|e| {
            error!("Failed to generate refresh token: {}", e);
            AuthError::InternalServerError
        })?;

    state
        .sessions
        .create_session(&user.id, &new_refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to update session: {}", e);
            AuthError::InternalServerError
        })?;

    let response = RefreshTokenResponse {
        success: true,
        access_token,
        refresh_token: new_refresh_token,
        token_type: "Bearer",
        expires_in: state.jwt_service.access_token_expiry(),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Logout endpoint
pub async fn logout(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<RefreshTokenRequest>, AuthError>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Logout request");

    let claims = check_refresh_token(&state, &payload.refresh_token).await?;
    revoke(&state, &claims).await?;

    state
        .sessions
        .delete_session(&claims.sub)
        .await
        .map_err(|e| {
            error!("Failed to remove session: {}", e);
            AuthError::InternalServerError
        })?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"success": true, "message": "Logged out successfully"})),
    ))
}

/// Custom error type for authentication errors
#[derive(Debug)]
pub enum AuthError {
    BadRequest(String),
    Unauthorized,
    TooManyRequests,
    MethodNotAllowed,
    InternalServerError,
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            AuthError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many login attempts, try again later".to_string(),
            ),
            AuthError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed".to_string())
            }
            AuthError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(serde_json::json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}
