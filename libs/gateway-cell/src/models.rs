// =====================================================================================
// GATEWAY CELL MODELS
// =====================================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};

// =====================================================================================
// ADMISSION POLICY
// =====================================================================================

/// Per-route admission policy evaluated by the security gateway, in order:
/// method allow-list, rate limit, authentication, CSRF, body validation.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    pub allowed_methods: Vec<String>,
    pub require_auth: bool,
    pub require_csrf: bool,
    pub validate_input: bool,
    pub max_requests: u32,
    pub window: Duration,
    pub log_requests: bool,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "DELETE".to_string(),
                "PATCH".to_string(),
            ],
            require_auth: false,
            require_csrf: false,
            validate_input: true,
            max_requests: 100,
            window: Duration::from_secs(60),
            log_requests: true,
        }
    }
}

impl RoutePolicy {
    /// Unauthenticated surface (marketing/search style endpoints).
    pub fn public() -> Self {
        Self::default()
    }

    /// Authenticated, CSRF-protected, state-changing surface.
    pub fn authenticated() -> Self {
        Self {
            require_auth: true,
            require_csrf: true,
            ..Self::default()
        }
    }

    pub fn with_methods(mut self, methods: &[&str]) -> Self {
        self.allowed_methods = methods.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn with_rate_limit(mut self, max_requests: u32, window: Duration) -> Self {
        self.max_requests = max_requests;
        self.window = window;
        self
    }
}

// =====================================================================================
// INPUT VALIDATION MODELS
// =====================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatKind {
    Xss,
    SqlInjection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub kind: ThreatKind,
    pub message: String,
}

impl FieldIssue {
    pub fn describe(&self) -> String {
        format!("{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateInputRequest {
    pub field_name: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateInputResponse {
    pub is_valid: bool,
    pub sanitized_value: String,
    pub issues: Vec<String>,
}

// =====================================================================================
// PASSWORD STRENGTH MODELS
// =====================================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordStrength {
    Weak,
    Fair,
    Good,
    Strong,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordStrengthResult {
    pub strength: PasswordStrength,
    pub score: u8,
    pub issues: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PasswordValidationRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct PasswordValidationResponse {
    pub strength: PasswordStrength,
    pub score: u8,
    pub requirements_met: bool,
    pub suggestions: Vec<String>,
}
