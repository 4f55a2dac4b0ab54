// =====================================================================================
// BOOKING CELL HANDLERS
// =====================================================================================

use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::instrument;

use crate::models::{
    BookingAssessment, PermissionCheckRequest, PermissionCheckResponse, ScreenBookingRequest,
};
use crate::services::{BookingScreeningService, RolePermissionService};
use shared_models::AppError;

#[derive(Clone)]
pub struct BookingHandlers {
    pub screening: Arc<BookingScreeningService>,
    pub permissions: Arc<RolePermissionService>,
}

#[instrument(skip(handlers, request))]
pub async fn screen_booking(
    State(handlers): State<BookingHandlers>,
    Json(request): Json<ScreenBookingRequest>,
) -> Result<Json<BookingAssessment>, AppError> {
    let assessment = handlers
        .screening
        .screen_booking(&request.booking, &request.existing_bookings)
        .await;
    Ok(Json(assessment))
}

#[instrument(skip(handlers))]
pub async fn check_permissions(
    State(handlers): State<BookingHandlers>,
    Json(request): Json<PermissionCheckRequest>,
) -> Result<Json<PermissionCheckResponse>, AppError> {
    let allowed = handlers
        .permissions
        .validate_role_permissions(&request.role, &request.action);
    Ok(Json(PermissionCheckResponse { allowed }))
}
