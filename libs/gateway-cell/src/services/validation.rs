// =====================================================================================
// INPUT VALIDATOR - FORMAT CHECKS AND THREAT PATTERN SCANNING
// =====================================================================================

use regex::Regex;
use serde_json::Value;
use tracing::instrument;

use crate::models::{FieldIssue, ThreatKind};

/// Stateless validators shared by the gateway's body scan and the public
/// validation endpoints.
pub struct InputValidator {
    xss_patterns: Vec<Regex>,
    sql_patterns: Vec<Regex>,
    email_pattern: Regex,
    phone_pattern: Regex,
}

impl InputValidator {
    pub fn new() -> Self {
        let xss_patterns = [r"(?i)<script", r"(?i)javascript:"]
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();

        // SQL keywords followed by whitespace, the shape of injected clauses.
        let sql_patterns = [
            r"(?i)\b(select|insert|update|delete|drop|union|create|alter|exec|execute)\s",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect();

        Self {
            xss_patterns,
            sql_patterns,
            email_pattern: Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
                .unwrap(),
            phone_pattern: Regex::new(r"^\+?[1-9]\d{1,14}$|^\+?\d{1,4}[\s\-\.\(\)]*\d{1,14}$")
                .unwrap(),
        }
    }

    pub fn validate_email(&self, email: &str) -> bool {
        self.email_pattern.is_match(email) && email.len() <= 254
    }

    pub fn validate_phone(&self, phone: &str) -> bool {
        self.phone_pattern.is_match(phone)
    }

    /// HTML entity encoding for text destined for storage or display.
    pub fn sanitize_text(&self, input: &str) -> String {
        input
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#x27;")
            .replace('/', "&#x2F;")
    }

    pub fn scan_str(&self, field: &str, value: &str) -> Vec<FieldIssue> {
        let mut issues = Vec::new();

        for pattern in &self.xss_patterns {
            if pattern.is_match(value) {
                issues.push(FieldIssue {
                    field: field.to_string(),
                    kind: ThreatKind::Xss,
                    message: "potential XSS content detected".to_string(),
                });
                break;
            }
        }

        for pattern in &self.sql_patterns {
            if pattern.is_match(value) {
                issues.push(FieldIssue {
                    field: field.to_string(),
                    kind: ThreatKind::SqlInjection,
                    message: "potential SQL injection pattern detected".to_string(),
                });
                break;
            }
        }

        issues
    }

    /// Walks a JSON document and scans every string leaf, reporting issues
    /// with their dotted field path.
    #[instrument(skip(self, value))]
    pub fn scan_json(&self, value: &Value) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        self.scan_json_inner(value, "", &mut issues);
        issues
    }

    fn scan_json_inner(&self, value: &Value, path: &str, issues: &mut Vec<FieldIssue>) {
        match value {
            Value::String(s) => {
                let field = if path.is_empty() { "body" } else { path };
                issues.extend(self.scan_str(field, s));
            }
            Value::Object(map) => {
                for (key, child) in map {
                    let child_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };
                    self.scan_json_inner(child, &child_path, issues);
                }
            }
            Value::Array(items) => {
                for (idx, child) in items.iter().enumerate() {
                    self.scan_json_inner(child, &format!("{}[{}]", path, idx), issues);
                }
            }
            _ => {}
        }
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new()
    }
}
