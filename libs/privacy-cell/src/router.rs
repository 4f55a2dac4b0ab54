// =====================================================================================
// PRIVACY CELL ROUTER
// =====================================================================================

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{
    consent_status, export_user_data, process_personal_data, record_consent, revoke_consent,
    right_to_erasure, PrivacyHandlers,
};

pub fn create_privacy_router(handlers: PrivacyHandlers) -> Router {
    Router::new()
        .route("/consent", post(record_consent))
        .route("/consent/revoke", post(revoke_consent))
        .route("/consent/status", get(consent_status))
        .route("/process", post(process_personal_data))
        .route("/erasure", post(right_to_erasure))
        .route("/export", get(export_user_data))
        .with_state(handlers)
}
