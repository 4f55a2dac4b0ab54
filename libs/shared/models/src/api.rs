use chrono::{DateTime, Utc};
use serde::Serialize;

/// Standard response envelope for every endpoint behind the gateway.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            details: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error_with_details(message: impl Into<String>, details: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            details: Some(details),
            timestamp: Utc::now(),
        }
    }
}
