// =====================================================================================
// AUTH CELL MODELS
// =====================================================================================

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared_models::Role;

// =====================================================================================
// RATE LIMITING MODELS
// =====================================================================================

/// Fixed-window counter. Never read past `window_reset_at` without resetting
/// to a fresh window of count 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitCounter {
    pub count: u32,
    pub window_reset_at: DateTime<Utc>,
}

// =====================================================================================
// SESSION MODELS
// =====================================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecureSession {
    pub session_id: String,
    pub user_id: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every validation, for display/forensics only. Expiry is
    /// absolute from `created_at`; this field never extends a session.
    pub last_activity: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub csrf_token: String,
}

/// Persistent lockout record, keyed by username and independent of the
/// login rate-limit window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginAttemptRecord {
    pub attempts: u32,
    pub last_attempt: Option<DateTime<Utc>>,
    pub locked_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub max_failed_attempts: u32,
    pub lockout_duration: Duration,
    pub login_window: Duration,
    pub login_window_max: u32,
    pub session_duration: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lockout_duration: Duration::from_secs(15 * 60),
            login_window: Duration::from_secs(15 * 60),
            // Looser than the lockout threshold: the window limiter absorbs
            // brute-force bursts while the lockout record below it handles
            // slow, targeted guessing.
            login_window_max: 10,
            session_duration: Duration::from_secs(24 * 3600),
        }
    }
}

// =====================================================================================
// CREDENTIAL AUTHORITY MODELS
// =====================================================================================

/// Identity returned by the external credential authority on a successful
/// verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub user_id: String,
    pub role: Role,
}

// =====================================================================================
// REQUEST/RESPONSE MODELS
// =====================================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub session_id: String,
    pub csrf_token: String,
    pub user_id: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

// =====================================================================================
// ERROR MODELS
// =====================================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("too many login attempts")]
    RateLimited,
    #[error("account temporarily locked")]
    AccountLocked,
    #[error("invalid credentials")]
    InvalidCredentials { remaining_attempts: u32 },
    #[error("no active session")]
    NoSession,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid session")]
    InvalidSession,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("authentication backend unavailable: {0}")]
    Backend(String),
}
