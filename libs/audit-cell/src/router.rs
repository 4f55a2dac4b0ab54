// =====================================================================================
// AUDIT CELL ROUTER
// =====================================================================================

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers::{get_audit_stats, get_recent_events, get_user_audit_log};
use crate::services::AuditService;

pub fn create_audit_router(audit: Arc<AuditService>) -> Router {
    Router::new()
        .route("/stats", get(get_audit_stats))
        .route("/recent", get(get_recent_events))
        .route("/user", get(get_user_audit_log))
        .with_state(audit)
}
