// =====================================================================================
// UPLOAD CELL - FILE UPLOAD CONTENT VALIDATION AND SANITIZATION
// =====================================================================================
//
// Per-batch and per-file admission for user uploads:
// - Rolling-hour per-IP upload rate limiting
// - Size, MIME and extension allow-lists plus an executable blocklist
// - Filename threat patterns and directory-traversal detection
// - Image magic-number verification and polyglot payload scanning
// - Raster re-encode sanitization and a content-hash denylist
//
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    ScreenedFile, UploadBatchResult, UploadError, UploadPolicy, UploadedFile,
};
pub use router::create_upload_router;
pub use services::{ImageSanitizer, UploadGuardService};
