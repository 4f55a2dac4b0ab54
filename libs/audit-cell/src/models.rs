// =====================================================================================
// AUDIT CELL MODELS
// =====================================================================================

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityEventKind {
    // Authentication lifecycle
    LoginSuccess,
    LoginFailed,
    AccountLocked,
    LogoutEvent,
    InvalidSessionId,
    SessionExpired,
    PasswordChanged,
    PasswordChangeFailed,
    CsrfTokenIssued,

    // Gateway admission
    InvalidMethod,
    ApiRateLimited,
    ApiAuthFailed,
    CsrfValidationFailed,
    InputValidationFailed,
    ApiRequest,
    ApiResponse,
    ApiError,

    // Payment fraud
    PaymentRejected,
    FraudDetected,
    IpBlocked,
    IpUnblocked,

    // Booking integrity
    BookingRejected,
    SuspiciousBooking,
    PriceManipulation,

    // Uploads
    UploadRateLimited,
    UploadRejected,
    FileSanitized,
    FileHashBlocked,

    // Data protection
    ConsentRecorded,
    ConsentRevoked,
    ConsentMissing,
    DataProcessed,
    DataErased,
    ErasureRefused,
    DataExported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: SecurityEventKind,
    pub severity: Severity,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub details: HashMap<String, serde_json::Value>,
}

impl SecurityEvent {
    pub fn new(kind: SecurityEventKind, severity: Severity) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind,
            severity,
            user_id: None,
            session_id: None,
            ip_address: None,
            user_agent: None,
            details: HashMap::new(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn detail<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(serialized) = serde_json::to_value(value) {
            self.details.insert(key.to_string(), serialized);
        }
        self
    }

    pub fn is_security_relevant(&self) -> bool {
        !matches!(
            self.kind,
            SecurityEventKind::ApiRequest | SecurityEventKind::ApiResponse
        )
    }
}

#[derive(Debug, Serialize)]
pub struct AuditStatsResponse {
    pub buffered_events: usize,
    pub events_last_24h: usize,
    pub high_severity_last_24h: usize,
}
