// =====================================================================================
// GATEWAY CELL - API SECURITY ADMISSION PIPELINE
// =====================================================================================
//
// Ordered, short-circuiting per-request checks in front of every handler:
// - Method allow-list and per-ip/path rate limiting
// - Session authentication and CSRF verification
// - Shallow XSS / SQL-injection scan over JSON bodies
// - Security response headers and request/response audit logging
//
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{FieldIssue, RoutePolicy, ThreatKind};
pub use router::create_gateway_router;
pub use services::{
    security_gateway_middleware, GatewayContext, InputValidator, PasswordStrengthService,
    SecurityGateway,
};
