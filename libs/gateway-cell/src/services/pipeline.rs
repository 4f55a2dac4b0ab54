// =====================================================================================
// SECURITY GATEWAY - ORDERED PER-REQUEST ADMISSION PIPELINE
// =====================================================================================

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use futures::FutureExt;
use tracing::instrument;

use crate::models::{FieldIssue, RoutePolicy};
use crate::services::validation::InputValidator;
use audit_cell::{AuditService, SecurityEvent, SecurityEventKind, Severity};
use auth_cell::{RateLimiter, SessionManager};
use shared_models::{net, ApiResponse, AuthenticatedUser};

const BODY_SCAN_LIMIT: usize = 1024 * 1024;

const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    (
        "content-security-policy",
        "default-src 'self'; frame-ancestors 'none'",
    ),
    (
        "strict-transport-security",
        "max-age=31536000; includeSubDomains",
    ),
];

/// State handed to the middleware layer: the shared gateway plus the policy
/// for the wrapped route group.
#[derive(Clone)]
pub struct GatewayContext {
    pub gateway: Arc<SecurityGateway>,
    pub policy: Arc<RoutePolicy>,
}

impl GatewayContext {
    pub fn new(gateway: Arc<SecurityGateway>, policy: RoutePolicy) -> Self {
        Self {
            gateway,
            policy: Arc::new(policy),
        }
    }
}

/// Axum middleware entry point. Wrap route groups with
/// `middleware::from_fn_with_state(ctx, security_gateway_middleware)`.
pub async fn security_gateway_middleware(
    State(ctx): State<GatewayContext>,
    request: Request,
    next: Next,
) -> Response {
    ctx.gateway.handle(&ctx.policy, request, next).await
}

enum Rejection {
    Status(StatusCode, &'static str),
    FieldErrors(Vec<FieldIssue>),
}

pub struct SecurityGateway {
    sessions: Arc<SessionManager>,
    rate_limiter: RateLimiter,
    validator: Arc<InputValidator>,
    audit: Arc<AuditService>,
}

impl SecurityGateway {
    pub fn new(
        sessions: Arc<SessionManager>,
        rate_limiter: RateLimiter,
        validator: Arc<InputValidator>,
        audit: Arc<AuditService>,
    ) -> Self {
        Self {
            sessions,
            rate_limiter,
            validator,
            audit,
        }
    }

    /// Runs the ordered admission checks, the wrapped handler, and the
    /// response post-processing. Checks short-circuit on first failure, each
    /// with its own status code and audit event.
    #[instrument(skip(self, policy, request, next), fields(path))]
    pub async fn handle(&self, policy: &RoutePolicy, request: Request, next: Next) -> Response {
        let started = Instant::now();
        let method = request.method().as_str().to_string();
        let path = request.uri().path().to_string();
        let ip = net::client_ip(request.headers());
        let user_agent = net::user_agent(request.headers());
        tracing::Span::current().record("path", path.as_str());

        if policy.log_requests {
            self.audit
                .log_security_event(
                    SecurityEvent::new(SecurityEventKind::ApiRequest, Severity::Low)
                        .with_ip(&ip)
                        .detail("method", &method)
                        .detail("path", &path),
                )
                .await;
        }

        let mut response = match self.admit(policy, request, &method, &path, &ip).await {
            Ok(request) => {
                // A panicking handler must surface as a generic 500; internal
                // detail never reaches the response body.
                match AssertUnwindSafe(next.run(request)).catch_unwind().await {
                    Ok(response) => response,
                    Err(_) => {
                        self.audit
                            .log_security_event(
                                SecurityEvent::new(SecurityEventKind::ApiError, Severity::High)
                                    .with_ip(&ip)
                                    .detail("method", &method)
                                    .detail("path", &path)
                                    .detail("user_agent", user_agent.as_deref().unwrap_or(""))
                                    .detail("reason", "handler panicked"),
                            )
                            .await;
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            Json(ApiResponse::<()>::error("Internal server error")),
                        )
                            .into_response()
                    }
                }
            }
            Err(rejection) => Self::rejection_response(rejection),
        };

        Self::apply_security_headers(&mut response);

        if policy.log_requests {
            self.audit
                .log_security_event(
                    SecurityEvent::new(SecurityEventKind::ApiResponse, Severity::Low)
                        .with_ip(&ip)
                        .detail("method", &method)
                        .detail("path", &path)
                        .detail("status", response.status().as_u16())
                        .detail("duration_ms", started.elapsed().as_millis() as u64),
                )
                .await;
        }

        response
    }

    async fn admit(
        &self,
        policy: &RoutePolicy,
        mut request: Request,
        method: &str,
        path: &str,
        ip: &str,
    ) -> Result<Request, Rejection> {
        // 1. Method allow-list.
        if !policy.allowed_methods.iter().any(|m| m == method) {
            self.audit
                .log_security_event(
                    SecurityEvent::new(SecurityEventKind::InvalidMethod, Severity::Medium)
                        .with_ip(ip)
                        .detail("method", method)
                        .detail("path", path),
                )
                .await;
            return Err(Rejection::Status(
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed",
            ));
        }

        // 2. Rate limit per client ip + path.
        let rate_key = format!("api:{}:{}", ip, path);
        if self
            .rate_limiter
            .is_rate_limited(&rate_key, policy.max_requests, policy.window)
            .await
        {
            self.audit
                .log_security_event(
                    SecurityEvent::new(SecurityEventKind::ApiRateLimited, Severity::Medium)
                        .with_ip(ip)
                        .detail("path", path),
                )
                .await;
            return Err(Rejection::Status(
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests",
            ));
        }

        // 3. Authentication.
        let mut session_id = net::session_id(request.headers());
        if policy.require_auth {
            let validated = match session_id.as_deref() {
                Some(sid) => self.sessions.validate_session(sid).await.ok(),
                None => None,
            };

            let session = match validated {
                Some(session) => session,
                None => {
                    self.audit
                        .log_security_event(
                            SecurityEvent::new(SecurityEventKind::ApiAuthFailed, Severity::Medium)
                                .with_ip(ip)
                                .detail("path", path),
                        )
                        .await;
                    return Err(Rejection::Status(
                        StatusCode::UNAUTHORIZED,
                        "Authentication required",
                    ));
                }
            };

            session_id = Some(session.session_id.clone());
            request.extensions_mut().insert(AuthenticatedUser {
                user_id: session.user_id,
                role: session.role,
                session_id: session.session_id,
            });
        }

        // 4. CSRF for state-changing methods.
        if policy.require_csrf && matches!(method, "POST" | "PUT" | "DELETE" | "PATCH") {
            let token = net::csrf_token(request.headers());
            let valid = match (session_id.as_deref(), token.as_deref()) {
                (Some(sid), Some(token)) => {
                    self.sessions.csrf_store().validate_token(sid, token).await
                }
                _ => false,
            };

            if !valid {
                self.audit
                    .log_security_event(
                        SecurityEvent::new(
                            SecurityEventKind::CsrfValidationFailed,
                            Severity::High,
                        )
                        .with_ip(ip)
                        .detail("path", path)
                        .detail("token_present", token.is_some()),
                    )
                    .await;
                return Err(Rejection::Status(
                    StatusCode::FORBIDDEN,
                    "Invalid or missing CSRF token",
                ));
            }
        }

        // 5. Shallow threat scan of JSON bodies.
        if policy.validate_input && matches!(method, "POST" | "PUT" | "PATCH") {
            let is_json = request
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.starts_with("application/json"))
                .unwrap_or(false);

            if is_json {
                let (parts, body) = request.into_parts();
                let bytes = match axum::body::to_bytes(body, BODY_SCAN_LIMIT).await {
                    Ok(bytes) => bytes,
                    Err(_) => {
                        return Err(Rejection::Status(
                            StatusCode::BAD_REQUEST,
                            "Request body too large or unreadable",
                        ));
                    }
                };

                if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&bytes) {
                    let issues = self.validator.scan_json(&value);
                    if !issues.is_empty() {
                        self.audit
                            .log_security_event(
                                SecurityEvent::new(
                                    SecurityEventKind::InputValidationFailed,
                                    Severity::High,
                                )
                                .with_ip(ip)
                                .detail("path", path)
                                .detail("issues", &issues),
                            )
                            .await;
                        return Err(Rejection::FieldErrors(issues));
                    }
                }

                request = Request::from_parts(parts, Body::from(bytes));
            }
        }

        Ok(request)
    }

    fn rejection_response(rejection: Rejection) -> Response {
        match rejection {
            Rejection::Status(status, message) => {
                (status, Json(ApiResponse::<()>::error(message))).into_response()
            }
            Rejection::FieldErrors(issues) => {
                let details = issues.iter().map(|i| i.describe()).collect();
                (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::<()>::error_with_details(
                        "Request body failed validation",
                        details,
                    )),
                )
                    .into_response()
            }
        }
    }

    fn apply_security_headers(response: &mut Response) {
        let headers = response.headers_mut();
        for (name, value) in SECURITY_HEADERS {
            headers.insert(*name, HeaderValue::from_static(value));
        }
    }
}
