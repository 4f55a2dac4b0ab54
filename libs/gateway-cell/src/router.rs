// =====================================================================================
// GATEWAY CELL ROUTER
// =====================================================================================

use std::sync::Arc;

use axum::{routing::post, Router};

use crate::handlers::{validate_input, validate_password};
use crate::services::InputValidator;

pub fn create_gateway_router(validator: Arc<InputValidator>) -> Router {
    Router::new()
        .route("/validate", post(validate_input))
        .route("/password/validate", post(validate_password))
        .with_state(validator)
}
