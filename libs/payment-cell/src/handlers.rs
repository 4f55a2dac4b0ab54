// =====================================================================================
// PAYMENT CELL HANDLERS
// =====================================================================================

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use tracing::{info, instrument};

use crate::models::{
    BlockIpRequest, FraudAssessmentResponse, PaymentAttempt, PaymentValidationResponse,
};
use crate::services::{CardValidationService, PaymentFraudService};
use shared_models::{AppError, AuthenticatedUser};

#[derive(Clone)]
pub struct PaymentHandlers {
    pub cards: Arc<CardValidationService>,
    pub fraud: Arc<PaymentFraudService>,
}

fn require_admin(user: Option<Extension<AuthenticatedUser>>) -> Result<AuthenticatedUser, AppError> {
    let Extension(user) = user.ok_or_else(|| AppError::Authentication("no session".to_string()))?;
    if !user.is_admin() {
        return Err(AppError::Forbidden("admin role required".to_string()));
    }
    Ok(user)
}

#[instrument(skip(handlers, attempt))]
pub async fn validate_payment(
    State(handlers): State<PaymentHandlers>,
    Json(attempt): Json<PaymentAttempt>,
) -> Result<Json<PaymentValidationResponse>, AppError> {
    let mut errors = handlers
        .cards
        .validate_payment_amount(attempt.amount, &attempt.currency);
    errors.extend(handlers.cards.validate_card_details(&attempt.card));

    Ok(Json(PaymentValidationResponse {
        valid: errors.is_empty(),
        errors,
    }))
}

#[instrument(skip(handlers, attempt))]
pub async fn assess_fraud(
    State(handlers): State<PaymentHandlers>,
    Json(attempt): Json<PaymentAttempt>,
) -> Result<Json<FraudAssessmentResponse>, AppError> {
    let assessment = handlers.fraud.assess_fraud(&attempt).await;

    Ok(Json(FraudAssessmentResponse {
        fraudulent: assessment.fraudulent,
        score: assessment.score,
        signals: assessment.signals,
        transaction_id: handlers.fraud.generate_transaction_id(),
    }))
}

#[instrument(skip(handlers))]
pub async fn get_blocked_ips(
    State(handlers): State<PaymentHandlers>,
    user: Option<Extension<AuthenticatedUser>>,
) -> Result<Json<Vec<String>>, AppError> {
    require_admin(user)?;
    let members = handlers
        .fraud
        .blocked_ips()
        .members()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(members))
}

#[instrument(skip(handlers, request))]
pub async fn block_ip(
    State(handlers): State<PaymentHandlers>,
    user: Option<Extension<AuthenticatedUser>>,
    Json(request): Json<BlockIpRequest>,
) -> Result<StatusCode, AppError> {
    let admin = require_admin(user)?;
    let reason = request.reason.as_deref().unwrap_or("manual admin block");
    handlers.fraud.block_ip(&request.ip_address, reason).await;
    info!("admin {} blocked ip {}", admin.user_id, request.ip_address);
    Ok(StatusCode::OK)
}

#[instrument(skip(handlers, request))]
pub async fn unblock_ip(
    State(handlers): State<PaymentHandlers>,
    user: Option<Extension<AuthenticatedUser>>,
    Json(request): Json<BlockIpRequest>,
) -> Result<StatusCode, AppError> {
    let admin = require_admin(user)?;
    handlers.fraud.unblock_ip(&request.ip_address).await;
    info!("admin {} unblocked ip {}", admin.user_id, request.ip_address);
    Ok(StatusCode::OK)
}
