// =====================================================================================
// PAYMENT CELL ROUTER
// =====================================================================================

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{
    assess_fraud, block_ip, get_blocked_ips, unblock_ip, validate_payment, PaymentHandlers,
};

pub fn create_payment_router(handlers: PaymentHandlers) -> Router {
    Router::new()
        .route("/validate", post(validate_payment))
        .route("/assess", post(assess_fraud))
        .route("/blocked-ips", get(get_blocked_ips))
        .route("/block-ip", post(block_ip))
        .route("/unblock-ip", post(unblock_ip))
        .with_state(handlers)
}
