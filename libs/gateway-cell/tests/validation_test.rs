// =====================================================================================
// GATEWAY CELL VALIDATOR TESTS
// =====================================================================================

use serde_json::json;

use gateway_cell::services::PasswordStrengthService;
use gateway_cell::{InputValidator, ThreatKind};

#[test]
fn email_validation() {
    let validator = InputValidator::new();
    assert!(validator.validate_email("guest@example.com"));
    assert!(validator.validate_email("host+tag@solmara-stays.co.uk"));
    assert!(!validator.validate_email("not-an-email"));
    assert!(!validator.validate_email("missing@tld"));
}

#[test]
fn phone_validation() {
    let validator = InputValidator::new();
    assert!(validator.validate_phone("+34600111222"));
    assert!(validator.validate_phone("+1 (555) 0100"));
    assert!(!validator.validate_phone("abc123"));
}

#[test]
fn sanitize_encodes_html_entities() {
    let validator = InputValidator::new();
    assert_eq!(
        validator.sanitize_text("<b>\"hi\" & 'bye'</b>"),
        "&lt;b&gt;&quot;hi&quot; &amp; &#x27;bye&#x27;&lt;&#x2F;b&gt;"
    );
}

#[test]
fn scan_flags_xss_and_sql_patterns() {
    let validator = InputValidator::new();

    let issues = validator.scan_str("comment", "<script>alert(1)</script>");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, ThreatKind::Xss);

    let issues = validator.scan_str("link", "javascript:void(0)");
    assert_eq!(issues[0].kind, ThreatKind::Xss);

    let issues = validator.scan_str("q", "UNION SELECT * FROM users");
    assert!(issues.iter().any(|i| i.kind == ThreatKind::SqlInjection));

    assert!(validator.scan_str("note", "a perfectly normal review").is_empty());
}

#[test]
fn scan_json_reports_nested_field_paths() {
    let validator = InputValidator::new();
    let value = json!({
        "guest": { "name": "Alice" },
        "reviews": [
            { "text": "great pool" },
            { "text": "<script>steal()</script>" }
        ]
    });

    let issues = validator.scan_json(&value);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].field, "reviews[1].text");
}

#[test]
fn password_strength_scoring() {
    let weak = PasswordStrengthService::validate_password_strength("123");
    assert!(weak.score <= 25);
    assert!(!weak.issues.is_empty());

    let strong = PasswordStrengthService::validate_password_strength("Tr4verse!Quartz#9wind");
    assert!(strong.score >= 60);

    // Platform vocabulary is penalized.
    let themed = PasswordStrengthService::validate_password_strength("MyVilla2024!x");
    assert!(themed
        .issues
        .iter()
        .any(|i| i.contains("travel-related")));

    // Sequential and repeated runs are penalized.
    let sequential = PasswordStrengthService::validate_password_strength("Abcdef!234x");
    assert!(sequential.issues.iter().any(|i| i.contains("sequential")));
    let repeated = PasswordStrengthService::validate_password_strength("Xaaa!92Zkqw");
    assert!(repeated.issues.iter().any(|i| i.contains("repeated")));
}
