// =====================================================================================
// BOOKING CELL ROUTER
// =====================================================================================

use axum::{routing::post, Router};

use crate::handlers::{check_permissions, screen_booking, BookingHandlers};

pub fn create_booking_router(handlers: BookingHandlers) -> Router {
    Router::new()
        .route("/screen", post(screen_booking))
        .route("/permissions/check", post(check_permissions))
        .with_state(handlers)
}
