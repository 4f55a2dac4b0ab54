// =====================================================================================
// AUDIT CELL HANDLERS
// =====================================================================================

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use tracing::instrument;

use crate::models::{AuditStatsResponse, SecurityEvent, Severity};
use crate::services::AuditService;
use shared_models::{AppError, AuthenticatedUser};

#[instrument(skip(audit))]
pub async fn get_recent_events(
    State(audit): State<Arc<AuditService>>,
    user: Option<Extension<AuthenticatedUser>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<SecurityEvent>>, AppError> {
    let Extension(user) = user.ok_or_else(|| AppError::Authentication("no session".to_string()))?;
    if !user.is_admin() {
        return Err(AppError::Forbidden("admin role required".to_string()));
    }

    let hours = params
        .get("hours")
        .and_then(|h| h.parse::<u32>().ok())
        .unwrap_or(24);

    Ok(Json(audit.recent_events(hours).await))
}

#[instrument(skip(audit))]
pub async fn get_user_audit_log(
    State(audit): State<Arc<AuditService>>,
    user: Option<Extension<AuthenticatedUser>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<SecurityEvent>>, AppError> {
    let Extension(user) = user.ok_or_else(|| AppError::Authentication("no session".to_string()))?;

    // Users may read their own trail; only admins may read someone else's.
    let target = params.get("user_id").cloned().unwrap_or_else(|| user.user_id.clone());
    if target != user.user_id && !user.is_admin() {
        return Err(AppError::Forbidden("cannot read another user's audit log".to_string()));
    }

    let limit = params.get("limit").and_then(|l| l.parse::<u32>().ok());
    Ok(Json(audit.events_for_user(&target, limit).await))
}

#[instrument(skip(audit))]
pub async fn get_audit_stats(
    State(audit): State<Arc<AuditService>>,
) -> Result<Json<AuditStatsResponse>, AppError> {
    let last_24h = audit.recent_events(24).await;
    let high = last_24h
        .iter()
        .filter(|e| e.severity >= Severity::High)
        .count();

    Ok(Json(AuditStatsResponse {
        buffered_events: audit.buffered_count().await,
        events_last_24h: last_24h.len(),
        high_severity_last_24h: high,
    }))
}
