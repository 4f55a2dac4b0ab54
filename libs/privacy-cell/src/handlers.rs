// =====================================================================================
// PRIVACY CELL HANDLERS
// =====================================================================================

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use tracing::instrument;

use crate::models::{
    ConsentStatusResponse, ErasureRequest, ExportBundle, PersonalRecord, PrivacyError,
    ProcessDataRequest, RecordConsentRequest, RevokeConsentRequest,
};
use crate::services::{ConsentLedgerService, DataProtectionService};
use shared_models::{net, AppError, AuthenticatedUser};

#[derive(Clone)]
pub struct PrivacyHandlers {
    pub consent: Arc<ConsentLedgerService>,
    pub protection: Arc<DataProtectionService>,
}

impl From<PrivacyError> for AppError {
    fn from(err: PrivacyError) -> Self {
        match err {
            PrivacyError::ConsentMissing => AppError::Forbidden(err.to_string()),
            PrivacyError::RetentionHold | PrivacyError::RetentionPeriodActive => {
                AppError::Forbidden(err.to_string())
            }
            PrivacyError::NotFound => AppError::NotFound(err.to_string()),
            PrivacyError::Crypto(msg) | PrivacyError::Backend(msg) => AppError::Internal(msg),
        }
    }
}

/// The subject themselves, or an admin.
fn require_self_or_admin(
    user: Option<Extension<AuthenticatedUser>>,
    target_user_id: &str,
) -> Result<AuthenticatedUser, AppError> {
    let Extension(user) = user.ok_or_else(|| AppError::Authentication("no session".to_string()))?;
    if user.user_id != target_user_id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "cannot act on another user's data".to_string(),
        ));
    }
    Ok(user)
}

#[instrument(skip(handlers, request, headers))]
pub async fn record_consent(
    State(handlers): State<PrivacyHandlers>,
    headers: HeaderMap,
    user: Option<Extension<AuthenticatedUser>>,
    Json(request): Json<RecordConsentRequest>,
) -> Result<StatusCode, AppError> {
    require_self_or_admin(user, &request.user_id)?;
    let ip = net::client_ip(&headers);
    let user_agent = net::user_agent(&headers);

    handlers
        .consent
        .record_consent(
            &request.user_id,
            request.consent_type,
            &request.purpose,
            request.legal_basis,
            Some(&ip),
            user_agent.as_deref(),
        )
        .await?;
    Ok(StatusCode::CREATED)
}

#[instrument(skip(handlers, request, headers))]
pub async fn revoke_consent(
    State(handlers): State<PrivacyHandlers>,
    headers: HeaderMap,
    user: Option<Extension<AuthenticatedUser>>,
    Json(request): Json<RevokeConsentRequest>,
) -> Result<StatusCode, AppError> {
    require_self_or_admin(user, &request.user_id)?;
    let ip = net::client_ip(&headers);
    let user_agent = net::user_agent(&headers);

    handlers
        .consent
        .revoke_consent(
            &request.user_id,
            request.consent_type,
            Some(&ip),
            user_agent.as_deref(),
        )
        .await?;
    Ok(StatusCode::OK)
}

#[instrument(skip(handlers))]
pub async fn consent_status(
    State(handlers): State<PrivacyHandlers>,
    user: Option<Extension<AuthenticatedUser>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ConsentStatusResponse>, AppError> {
    let user_id = params
        .get("user_id")
        .ok_or_else(|| AppError::Validation("user_id parameter required".to_string()))?
        .clone();
    require_self_or_admin(user, &user_id)?;

    let consent_type = params
        .get("consent_type")
        .and_then(|v| serde_json::from_value(serde_json::Value::String(v.clone())).ok())
        .ok_or_else(|| AppError::Validation("valid consent_type parameter required".to_string()))?;

    let granted = handlers.consent.has_consent(&user_id, consent_type).await?;
    Ok(Json(ConsentStatusResponse {
        user_id,
        consent_type,
        granted,
    }))
}

#[instrument(skip(handlers, request))]
pub async fn process_personal_data(
    State(handlers): State<PrivacyHandlers>,
    user: Option<Extension<AuthenticatedUser>>,
    Json(request): Json<ProcessDataRequest>,
) -> Result<Json<PersonalRecord>, AppError> {
    require_self_or_admin(user, &request.record.user_id)?;
    let processed = handlers
        .protection
        .process_personal_data(request.record, request.consent_type, request.legal_basis)
        .await?;
    Ok(Json(processed))
}

#[instrument(skip(handlers, request))]
pub async fn right_to_erasure(
    State(handlers): State<PrivacyHandlers>,
    user: Option<Extension<AuthenticatedUser>>,
    Json(request): Json<ErasureRequest>,
) -> Result<StatusCode, AppError> {
    require_self_or_admin(user, &request.user_id)?;
    handlers
        .protection
        .implement_right_to_erasure(&request.user_id, request.legal_retention_hold)
        .await?;
    Ok(StatusCode::OK)
}

#[instrument(skip(handlers))]
pub async fn export_user_data(
    State(handlers): State<PrivacyHandlers>,
    user: Option<Extension<AuthenticatedUser>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ExportBundle>, AppError> {
    let user_id = params
        .get("user_id")
        .ok_or_else(|| AppError::Validation("user_id parameter required".to_string()))?
        .clone();
    require_self_or_admin(user, &user_id)?;

    let bundle = handlers.protection.export_user_data(&user_id).await?;
    Ok(Json(bundle))
}
