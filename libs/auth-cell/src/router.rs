// =====================================================================================
// AUTH CELL ROUTER
// =====================================================================================

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{change_password, get_session, login, logout, refresh_csrf_token};
use crate::services::SessionManager;

pub fn create_auth_router(sessions: Arc<SessionManager>) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(get_session))
        .route("/csrf/refresh", post(refresh_csrf_token))
        .route("/password/change", post(change_password))
        .with_state(sessions)
}
