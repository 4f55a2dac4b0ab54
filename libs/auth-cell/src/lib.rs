// =====================================================================================
// AUTH CELL - LOGIN THROTTLING, SESSIONS, CSRF
// =====================================================================================
//
// Session and CSRF lifecycle for the booking platform:
// - Fixed-window login rate limiting layered with persistent account lockout
// - Opaque server-side sessions (64-hex ids, absolute lifetime)
// - One CSRF token per session, rotated on demand
// - Password change through the external credential authority
//
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{AuthError, LoginAttemptRecord, SecureSession, SessionPolicy, VerifiedIdentity};
pub use router::create_auth_router;
pub use services::{
    CredentialVerifier, CsrfStore, HttpCredentialVerifier, RateLimiter, SessionManager,
};
