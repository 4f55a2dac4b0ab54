// =====================================================================================
// UPLOAD CELL ROUTER
// =====================================================================================

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{block_file_hash, get_blocked_hashes, screen_upload};
use crate::services::UploadGuardService;

pub fn create_upload_router(guard: Arc<UploadGuardService>) -> Router {
    Router::new()
        .route("/screen", post(screen_upload))
        .route("/block-hash", post(block_file_hash))
        .route("/blocked-hashes", get(get_blocked_hashes))
        .with_state(guard)
}
