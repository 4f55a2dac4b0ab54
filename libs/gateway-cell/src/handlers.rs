// =====================================================================================
// GATEWAY CELL HANDLERS - PUBLIC VALIDATION ENDPOINTS
// =====================================================================================

use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::instrument;

use crate::models::{
    PasswordValidationRequest, PasswordValidationResponse, ValidateInputRequest,
    ValidateInputResponse,
};
use crate::services::{InputValidator, PasswordStrengthService};
use shared_models::AppError;

#[instrument(skip(validator, request))]
pub async fn validate_input(
    State(validator): State<Arc<InputValidator>>,
    Json(request): Json<ValidateInputRequest>,
) -> Result<Json<ValidateInputResponse>, AppError> {
    let issues = validator.scan_str(&request.field_name, &request.value);

    Ok(Json(ValidateInputResponse {
        is_valid: issues.is_empty(),
        sanitized_value: validator.sanitize_text(&request.value),
        issues: issues.iter().map(|i| i.describe()).collect(),
    }))
}

#[instrument(skip(request))]
pub async fn validate_password(
    Json(request): Json<PasswordValidationRequest>,
) -> Result<Json<PasswordValidationResponse>, AppError> {
    let result = PasswordStrengthService::validate_password_strength(&request.password);
    let requirements_met = result.score >= 60;

    Ok(Json(PasswordValidationResponse {
        strength: result.strength,
        score: result.score,
        requirements_met,
        suggestions: result.issues,
    }))
}
