// =====================================================================================
// GATEWAY CELL INTEGRATION TESTS - ADMISSION PIPELINE
// =====================================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower::ServiceExt;

use audit_cell::AuditService;
use auth_cell::services::credentials::CredentialError;
use auth_cell::{
    CredentialVerifier, RateLimiter, SecureSession, SessionManager, SessionPolicy,
    VerifiedIdentity,
};
use gateway_cell::{
    security_gateway_middleware, GatewayContext, InputValidator, RoutePolicy, SecurityGateway,
};
use shared_crypto::CryptoService;
use shared_models::Role;
use shared_store::Store;

struct FakeVerifier;

#[async_trait]
impl CredentialVerifier for FakeVerifier {
    async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<VerifiedIdentity>, CredentialError> {
        if username == "alice" && password == "pw" {
            Ok(Some(VerifiedIdentity {
                user_id: "user-alice".to_string(),
                role: Role::Guest,
            }))
        } else {
            Ok(None)
        }
    }

    async fn change_password(&self, _: &str, _: &str) -> Result<bool, CredentialError> {
        Ok(true)
    }
}

fn test_app(policy: RoutePolicy) -> (Router, Arc<SessionManager>) {
    let store = Store::memory();
    let sessions = Arc::new(SessionManager::new(
        store.clone(),
        Arc::new(CryptoService::new(&CryptoService::generate_master_key())),
        Arc::new(FakeVerifier),
        Arc::new(AuditService::new(100)),
        SessionPolicy::default(),
    ));
    let gateway = Arc::new(SecurityGateway::new(
        sessions.clone(),
        RateLimiter::new(store),
        Arc::new(InputValidator::new()),
        Arc::new(AuditService::new(100)),
    ));

    let app = Router::new()
        .route("/echo", post(|| async { "ok" }))
        .route("/info", get(|| async { "info" }))
        .layer(middleware::from_fn_with_state(
            GatewayContext::new(gateway, policy),
            security_gateway_middleware,
        ));
    (app, sessions)
}

async fn login(sessions: &SessionManager) -> SecureSession {
    sessions
        .secure_login("alice", "pw", Some("10.1.1.1"), None)
        .await
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&bytes).to_string()
}

#[tokio::test]
async fn disallowed_method_returns_405() {
    let (app, _) = test_app(RoutePolicy::default().with_methods(&["POST"]));

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/info")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn rate_limit_returns_429_after_window_is_exhausted() {
    let (app, _) = test_app(
        RoutePolicy::default().with_rate_limit(2, Duration::from_secs(60)),
    );

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/info")
                    .header("x-real-ip", "9.9.9.9")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/info")
                .header("x-real-ip", "9.9.9.9")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn missing_session_returns_401() {
    let (app, _) = test_app(RoutePolicy::authenticated());

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/info")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn csrf_token_required_for_state_changing_methods() {
    let (app, sessions) = test_app(RoutePolicy::authenticated());
    let session = login(&sessions).await;

    // Authenticated but without the CSRF header.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header("authorization", format!("Bearer {}", session.session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // With the token issued at login.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header("authorization", format!("Bearer {}", session.session_id))
                .header("x-csrf-token", &session.csrf_token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // GET is exempt from the CSRF requirement.
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/info")
                .header("authorization", format!("Bearer {}", session.session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn xss_in_json_body_returns_400_with_field_error() {
    let (app, _) = test_app(RoutePolicy::default());

    let payload = json!({
        "listing": {
            "title": "Seaside villa",
            "comment": "<script>alert(1)</script>"
        }
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_string(response).await;
    assert!(body.contains("listing.comment"));
    assert!(body.contains("XSS"));
}

#[tokio::test]
async fn sql_keyword_in_json_body_returns_400() {
    let (app, _) = test_app(RoutePolicy::default());

    let payload = json!({ "search": "1; DROP TABLE bookings" });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_string(response).await;
    assert!(body.contains("search"));
    assert!(body.contains("SQL"));
}

#[tokio::test]
async fn clean_json_body_reaches_the_handler() {
    let (app, _) = test_app(RoutePolicy::default());

    let payload = json!({ "comment": "lovely stay, would book again" });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn security_headers_are_attached_to_every_response() {
    let (app, _) = test_app(RoutePolicy::default());

    // Success path.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/info")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    assert!(response.headers().contains_key("content-security-policy"));
    assert!(response.headers().contains_key("strict-transport-security"));

    // Rejection path carries them too.
    let (app, _) = test_app(RoutePolicy::default().with_methods(&["POST"]));
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/info")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}
