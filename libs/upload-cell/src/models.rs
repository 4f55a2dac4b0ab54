// =====================================================================================
// UPLOAD CELL MODELS
// =====================================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =====================================================================================
// POLICY
// =====================================================================================

#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_file_size: usize,
    pub max_files_per_upload: usize,
    pub allowed_mime_types: Vec<String>,
    pub allowed_extensions: Vec<String>,
    /// Checked independently of the allow-list; both must pass.
    pub blocked_extensions: Vec<String>,
    pub max_uploads_per_hour: u32,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            max_files_per_upload: 5,
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
                "application/pdf".to_string(),
            ],
            allowed_extensions: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "gif".to_string(),
                "webp".to_string(),
                "pdf".to_string(),
            ],
            blocked_extensions: vec![
                "exe".to_string(),
                "bat".to_string(),
                "cmd".to_string(),
                "com".to_string(),
                "scr".to_string(),
                "sh".to_string(),
                "php".to_string(),
                "js".to_string(),
                "jar".to_string(),
                "vbs".to_string(),
                "ps1".to_string(),
                "msi".to_string(),
                "dll".to_string(),
            ],
            max_uploads_per_hour: 10,
        }
    }
}

// =====================================================================================
// FILE MODELS
// =====================================================================================

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Per-file screening outcome. `data` holds the bytes to persist, re-encoded
/// when sanitization ran.
#[derive(Debug, Clone)]
pub struct ScreenedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub valid: bool,
    pub sanitized: bool,
    pub errors: Vec<String>,
}

#[derive(Debug)]
pub struct UploadBatchResult {
    /// True when the batch was admitted and every file passed.
    pub valid: bool,
    /// Batch-level rejections (rate limit, too many files).
    pub errors: Vec<String>,
    pub files: Vec<ScreenedFile>,
}

/// Rolling-hour upload counter per client IP. The count resets whenever the
/// gap since the previous attempt exceeds one hour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRateRecord {
    pub count: u32,
    pub last_attempt: DateTime<Utc>,
}

// =====================================================================================
// REQUEST/RESPONSE MODELS
// =====================================================================================

#[derive(Debug, Deserialize)]
pub struct ScreenUploadRequest {
    pub files: Vec<UploadFilePayload>,
}

#[derive(Debug, Deserialize)]
pub struct UploadFilePayload {
    pub filename: String,
    pub content_type: String,
    pub data_base64: String,
}

#[derive(Debug, Serialize)]
pub struct ScreenUploadResponse {
    pub valid: bool,
    pub errors: Vec<String>,
    pub files: Vec<ScreenedFilePayload>,
}

#[derive(Debug, Serialize)]
pub struct ScreenedFilePayload {
    pub filename: String,
    pub content_type: String,
    pub valid: bool,
    pub sanitized: bool,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_base64: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlockHashRequest {
    pub hash: String,
    pub reason: Option<String>,
}

// =====================================================================================
// ERROR MODELS
// =====================================================================================

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("file could not be decoded: {0}")]
    Decode(String),
    #[error("sanitization failed: {0}")]
    Sanitization(String),
    #[error("upload store error: {0}")]
    Backend(String),
}
