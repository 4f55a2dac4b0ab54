// =====================================================================================
// AUDIT CELL INTEGRATION TESTS
// =====================================================================================

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use audit_cell::{
    create_audit_router, AuditService, SecurityEvent, SecurityEventKind, Severity,
};

fn event(kind: SecurityEventKind, severity: Severity) -> SecurityEvent {
    SecurityEvent::new(kind, severity)
}

#[tokio::test]
async fn events_are_buffered_and_queryable() {
    let audit = AuditService::new(100);

    audit
        .log_security_event(
            event(SecurityEventKind::LoginSuccess, Severity::Low).with_user("user-alice"),
        )
        .await;
    audit
        .log_security_event(
            event(SecurityEventKind::LoginFailed, Severity::Medium).with_user("user-bob"),
        )
        .await;
    audit
        .log_security_event(
            event(SecurityEventKind::FraudDetected, Severity::Critical).with_user("user-bob"),
        )
        .await;

    assert_eq!(audit.buffered_count().await, 3);
    assert_eq!(audit.recent_events(1).await.len(), 3);
    assert_eq!(audit.events_for_user("user-bob", None).await.len(), 2);
    assert_eq!(
        audit
            .events_of_kind(&SecurityEventKind::LoginFailed, 1)
            .await
            .len(),
        1
    );
}

#[tokio::test]
async fn security_events_filter_by_severity_and_relevance() {
    let audit = AuditService::new(100);

    // Request/response chatter is never security-relevant.
    audit
        .log_security_event(event(SecurityEventKind::ApiRequest, Severity::Low))
        .await;
    audit
        .log_security_event(event(SecurityEventKind::ApiResponse, Severity::Low))
        .await;
    // Relevant but low severity.
    audit
        .log_security_event(event(SecurityEventKind::LoginSuccess, Severity::Low))
        .await;
    // Elevated.
    audit
        .log_security_event(event(SecurityEventKind::CsrfValidationFailed, Severity::High))
        .await;
    audit
        .log_security_event(event(SecurityEventKind::FraudDetected, Severity::Critical))
        .await;

    let elevated = audit.security_events(1).await;
    assert_eq!(elevated.len(), 2);
}

#[tokio::test]
async fn buffer_flushes_at_threshold() {
    let audit = AuditService::new(3);

    for _ in 0..2 {
        audit
            .log_security_event(event(SecurityEventKind::ApiRequest, Severity::Low))
            .await;
    }
    assert_eq!(audit.buffered_count().await, 2);

    // Third event reaches the threshold and flushes the batch.
    audit
        .log_security_event(event(SecurityEventKind::ApiRequest, Severity::Low))
        .await;
    assert_eq!(audit.buffered_count().await, 0);
}

#[tokio::test]
async fn explicit_flush_empties_the_buffer() {
    let audit = AuditService::new(100);
    audit
        .log_security_event(event(SecurityEventKind::LoginSuccess, Severity::Low))
        .await;

    audit.flush_buffer().await.unwrap();
    assert_eq!(audit.buffered_count().await, 0);

    // Flushing an empty buffer is fine.
    audit.flush_buffer().await.unwrap();
}

#[tokio::test]
async fn event_builder_attaches_context() {
    let event = SecurityEvent::new(SecurityEventKind::UploadRejected, Severity::Medium)
        .with_user("user-alice")
        .with_session("a".repeat(64))
        .with_ip("10.8.8.8")
        .with_user_agent("Mozilla/5.0")
        .detail("filename", "evil.png")
        .detail("size", 1234);

    assert_eq!(event.user_id.as_deref(), Some("user-alice"));
    assert_eq!(event.ip_address.as_deref(), Some("10.8.8.8"));
    assert_eq!(event.details.len(), 2);
    assert!(!event.event_id.is_empty());
}

#[tokio::test]
async fn stats_endpoint_reports_counts() {
    let audit = Arc::new(AuditService::new(100));
    audit
        .log_security_event(event(SecurityEventKind::CsrfValidationFailed, Severity::High))
        .await;

    let app = create_audit_router(audit);
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["buffered_events"], 1);
    assert_eq!(json["high_severity_last_24h"], 1);
}

#[tokio::test]
async fn audit_queries_without_session_are_unauthorized() {
    let audit = Arc::new(AuditService::new(100));
    let app = create_audit_router(audit);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/recent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
