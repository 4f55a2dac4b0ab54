// =====================================================================================
// UPLOAD CELL HANDLERS
// =====================================================================================

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use base64::{engine::general_purpose, Engine as _};
use tracing::{info, instrument};

use crate::models::{
    BlockHashRequest, ScreenUploadRequest, ScreenUploadResponse, ScreenedFilePayload,
    UploadedFile,
};
use crate::services::UploadGuardService;
use shared_models::{net, AppError, AuthenticatedUser};

fn require_admin(user: Option<Extension<AuthenticatedUser>>) -> Result<AuthenticatedUser, AppError> {
    let Extension(user) = user.ok_or_else(|| AppError::Authentication("no session".to_string()))?;
    if !user.is_admin() {
        return Err(AppError::Forbidden("admin role required".to_string()));
    }
    Ok(user)
}

#[instrument(skip(guard, request, headers))]
pub async fn screen_upload(
    State(guard): State<Arc<UploadGuardService>>,
    headers: HeaderMap,
    Json(request): Json<ScreenUploadRequest>,
) -> Result<Json<ScreenUploadResponse>, AppError> {
    let ip = net::client_ip(&headers);
    let user_agent = net::user_agent(&headers);

    let mut files = Vec::with_capacity(request.files.len());
    for payload in request.files {
        let data = general_purpose::STANDARD
            .decode(&payload.data_base64)
            .map_err(|_| AppError::Validation(format!("file {} is not valid base64", payload.filename)))?;
        files.push(UploadedFile {
            filename: payload.filename,
            content_type: payload.content_type,
            data,
        });
    }

    let result = guard
        .validate_upload(files, &ip, user_agent.as_deref())
        .await;

    let files = result
        .files
        .into_iter()
        .map(|f| ScreenedFilePayload {
            data_base64: if f.valid {
                Some(general_purpose::STANDARD.encode(&f.data))
            } else {
                None
            },
            filename: f.filename,
            content_type: f.content_type,
            valid: f.valid,
            sanitized: f.sanitized,
            errors: f.errors,
        })
        .collect();

    Ok(Json(ScreenUploadResponse {
        valid: result.valid,
        errors: result.errors,
        files,
    }))
}

#[instrument(skip(guard, request))]
pub async fn block_file_hash(
    State(guard): State<Arc<UploadGuardService>>,
    user: Option<Extension<AuthenticatedUser>>,
    Json(request): Json<BlockHashRequest>,
) -> Result<StatusCode, AppError> {
    let admin = require_admin(user)?;
    let reason = request.reason.as_deref().unwrap_or("manual admin block");
    guard.block_file_hash(&request.hash, reason).await;
    info!("admin {} blocked file hash {}", admin.user_id, request.hash);
    Ok(StatusCode::OK)
}

#[instrument(skip(guard))]
pub async fn get_blocked_hashes(
    State(guard): State<Arc<UploadGuardService>>,
    user: Option<Extension<AuthenticatedUser>>,
) -> Result<Json<Vec<String>>, AppError> {
    require_admin(user)?;
    let hashes = guard
        .blocked_hashes()
        .members()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(hashes))
}
