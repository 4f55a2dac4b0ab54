// =====================================================================================
// AUTH CELL HANDLERS - LOGIN / SESSION / PASSWORD ENDPOINTS
// =====================================================================================

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::instrument;

use crate::models::{
    AuthError, ChangePasswordRequest, CsrfTokenResponse, LoginRequest, LoginResponse,
    SessionResponse,
};
use crate::services::SessionManager;
use shared_models::net;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Fixed, non-enumerable messages. Remaining-attempt counts are the one
        // deliberate exception, returned so clients can warn the user.
        let (status, message, remaining) = match &self {
            AuthError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many login attempts, please try again later",
                None,
            ),
            AuthError::AccountLocked => (
                StatusCode::UNAUTHORIZED,
                "Account temporarily locked due to repeated failed attempts",
                None,
            ),
            AuthError::InvalidCredentials { remaining_attempts } => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password",
                Some(*remaining_attempts),
            ),
            AuthError::NoSession => (StatusCode::UNAUTHORIZED, "Authentication required", None),
            AuthError::SessionExpired => (StatusCode::UNAUTHORIZED, "Session expired", None),
            AuthError::InvalidSession => (StatusCode::UNAUTHORIZED, "Invalid session", None),
            AuthError::Validation(_) => (StatusCode::BAD_REQUEST, "Invalid request", None),
            AuthError::Backend(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service error",
                None,
            ),
        };

        tracing::debug!("auth error: {}", self);

        let mut body = json!({
            "success": false,
            "error": message,
            "timestamp": chrono::Utc::now(),
        });
        if let Some(remaining) = remaining {
            body["remaining_attempts"] = json!(remaining);
        }

        (status, Json(body)).into_response()
    }
}

#[instrument(skip(sessions, request), fields(username = %request.username))]
pub async fn login(
    State(sessions): State<Arc<SessionManager>>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let ip = net::client_ip(&headers);
    let user_agent = net::user_agent(&headers);

    let session = sessions
        .secure_login(
            &request.username,
            &request.password,
            Some(&ip),
            user_agent.as_deref(),
        )
        .await?;

    let expires_at = session.created_at
        + chrono::Duration::from_std(sessions.policy().session_duration).unwrap();

    Ok(Json(LoginResponse {
        session_id: session.session_id,
        csrf_token: session.csrf_token,
        user_id: session.user_id,
        role: session.role,
        expires_at,
    }))
}

#[instrument(skip(sessions))]
pub async fn logout(
    State(sessions): State<Arc<SessionManager>>,
    headers: HeaderMap,
) -> Result<StatusCode, AuthError> {
    let session_id = net::session_id(&headers).ok_or(AuthError::NoSession)?;
    sessions.logout(&session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(sessions))]
pub async fn get_session(
    State(sessions): State<Arc<SessionManager>>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, AuthError> {
    let session_id = net::session_id(&headers).ok_or(AuthError::NoSession)?;
    let session = sessions.validate_session(&session_id).await?;

    let expires_at = session.created_at
        + chrono::Duration::from_std(sessions.policy().session_duration).unwrap();

    Ok(Json(SessionResponse {
        user_id: session.user_id,
        role: session.role,
        created_at: session.created_at,
        last_activity: session.last_activity,
        expires_at,
    }))
}

#[instrument(skip(sessions))]
pub async fn refresh_csrf_token(
    State(sessions): State<Arc<SessionManager>>,
    headers: HeaderMap,
) -> Result<Json<CsrfTokenResponse>, AuthError> {
    let session_id = net::session_id(&headers).ok_or(AuthError::NoSession)?;
    sessions.validate_session(&session_id).await?;
    let csrf_token = sessions.refresh_csrf_token(&session_id).await?;
    Ok(Json(CsrfTokenResponse { csrf_token }))
}

#[instrument(skip(sessions, request))]
pub async fn change_password(
    State(sessions): State<Arc<SessionManager>>,
    headers: HeaderMap,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AuthError> {
    let session_id = net::session_id(&headers).ok_or(AuthError::NoSession)?;
    let session = sessions.validate_session(&session_id).await?;

    sessions
        .change_password(
            &session_id,
            &session.user_id,
            &request.current_password,
            &request.new_password,
            &request.confirm_password,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
