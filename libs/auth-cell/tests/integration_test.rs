// =====================================================================================
// AUTH CELL INTEGRATION TESTS - THROTTLING, LOCKOUT, SESSION LIFECYCLE
// =====================================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::Utc;

use audit_cell::AuditService;
use auth_cell::services::credentials::CredentialError;
use auth_cell::services::csrf::CsrfStore;
use auth_cell::services::rate_limit::RateLimiter;
use auth_cell::{AuthError, CredentialVerifier, SessionManager, SessionPolicy, VerifiedIdentity};
use shared_crypto::CryptoService;
use shared_models::Role;
use shared_store::Store;

struct FakeVerifier {
    username: String,
    password: String,
    calls: AtomicUsize,
}

impl FakeVerifier {
    fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialVerifier for FakeVerifier {
    async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<VerifiedIdentity>, CredentialError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if username == self.username && password == self.password {
            Ok(Some(VerifiedIdentity {
                user_id: "user-alice".to_string(),
                role: Role::Guest,
            }))
        } else {
            Ok(None)
        }
    }

    async fn change_password(
        &self,
        _username: &str,
        _new_password: &str,
    ) -> Result<bool, CredentialError> {
        Ok(true)
    }
}

fn setup() -> (Arc<SessionManager>, Arc<FakeVerifier>) {
    let verifier = Arc::new(FakeVerifier::new("alice", "s3cret-pass"));
    let manager = Arc::new(SessionManager::new(
        Store::memory(),
        Arc::new(CryptoService::new(&CryptoService::generate_master_key())),
        verifier.clone(),
        Arc::new(AuditService::new(100)),
        SessionPolicy::default(),
    ));
    (manager, verifier)
}

// =====================================================================================
// RATE LIMITER
// =====================================================================================

#[tokio::test]
async fn rate_limiter_boundary_at_max_attempts() {
    let limiter = RateLimiter::new(Store::memory());
    let now = Utc::now();
    let window = Duration::from_secs(60);

    for _ in 0..5 {
        assert!(!limiter.is_rate_limited_at("k", 5, window, now).await);
    }
    // The call that crosses the limit is itself recorded and reported.
    assert!(limiter.is_rate_limited_at("k", 5, window, now).await);
}

#[tokio::test]
async fn rate_limiter_window_rollover_resets_count() {
    let limiter = RateLimiter::new(Store::memory());
    let now = Utc::now();
    let window = Duration::from_secs(60);

    for _ in 0..6 {
        limiter.is_rate_limited_at("k", 5, window, now).await;
    }
    assert!(limiter.is_rate_limited_at("k", 5, window, now).await);

    let later = now + chrono::Duration::seconds(61);
    assert!(!limiter.is_rate_limited_at("k", 5, window, later).await);
}

#[tokio::test]
async fn rate_limiter_reset_clears_record() {
    let limiter = RateLimiter::new(Store::memory());
    let now = Utc::now();
    let window = Duration::from_secs(60);

    for _ in 0..6 {
        limiter.is_rate_limited_at("k", 5, window, now).await;
    }
    assert!(limiter.is_rate_limited_at("k", 5, window, now).await);

    limiter.reset_attempts("k").await;
    assert!(!limiter.is_rate_limited_at("k", 5, window, now).await);
    assert_eq!(limiter.remaining_attempts("k", 5).await, 4);
}

#[tokio::test]
async fn remaining_attempts_floor_at_zero() {
    let limiter = RateLimiter::new(Store::memory());
    let now = Utc::now();
    let window = Duration::from_secs(60);

    assert_eq!(limiter.remaining_attempts("k", 3).await, 3);
    for _ in 0..5 {
        limiter.is_rate_limited_at("k", 3, window, now).await;
    }
    assert_eq!(limiter.remaining_attempts("k", 3).await, 0);
}

// =====================================================================================
// CSRF STORE
// =====================================================================================

#[tokio::test]
async fn csrf_single_token_per_session() {
    let crypto = Arc::new(CryptoService::new(&CryptoService::generate_master_key()));
    let csrf = CsrfStore::new(Store::memory(), crypto, Duration::from_secs(3600));

    let first = csrf.generate_token("sess-1").await.unwrap();
    assert!(csrf.validate_token("sess-1", &first).await);

    // Regeneration invalidates the previously issued token.
    let second = csrf.generate_token("sess-1").await.unwrap();
    assert_ne!(first, second);
    assert!(!csrf.validate_token("sess-1", &first).await);
    assert!(csrf.validate_token("sess-1", &second).await);

    csrf.revoke_token("sess-1").await;
    assert!(!csrf.validate_token("sess-1", &second).await);
    // Revoking again is a no-op.
    csrf.revoke_token("sess-1").await;
}

#[tokio::test]
async fn csrf_unknown_session_fails_validation() {
    let crypto = Arc::new(CryptoService::new(&CryptoService::generate_master_key()));
    let csrf = CsrfStore::new(Store::memory(), crypto, Duration::from_secs(3600));
    assert!(!csrf.validate_token("sess-none", "whatever").await);
}

// =====================================================================================
// LOGIN THROTTLING & LOCKOUT
// =====================================================================================

#[tokio::test]
async fn five_failures_lock_the_account_credential_blind() {
    let (manager, verifier) = setup();
    let now = Utc::now();

    for i in 0..4u32 {
        let err = manager
            .secure_login_at("alice", "wrongpass", Some("10.0.0.1"), None, now)
            .await
            .unwrap_err();
        assert_matches!(err, AuthError::InvalidCredentials { remaining_attempts } if remaining_attempts == 4 - i);
    }

    // Fifth failure trips the lockout.
    let err = manager
        .secure_login_at("alice", "wrongpass", Some("10.0.0.1"), None, now)
        .await
        .unwrap_err();
    assert_matches!(err, AuthError::AccountLocked);
    assert_eq!(verifier.call_count(), 5);

    // Sixth attempt with the CORRECT password: still refused, and the
    // credential authority is not consulted.
    let err = manager
        .secure_login_at("alice", "s3cret-pass", Some("10.0.0.1"), None, now)
        .await
        .unwrap_err();
    assert_matches!(err, AuthError::AccountLocked);
    assert_eq!(verifier.call_count(), 5);
}

#[tokio::test]
async fn lockout_expiry_then_success_clears_the_record() {
    let (manager, _verifier) = setup();
    let now = Utc::now();

    for _ in 0..5 {
        let _ = manager
            .secure_login_at("alice", "wrongpass", Some("10.0.0.1"), None, now)
            .await;
    }

    // Past the lockout window the correct password succeeds.
    let later = now + chrono::Duration::minutes(16);
    let session = manager
        .secure_login_at("alice", "s3cret-pass", Some("10.0.0.1"), None, later)
        .await
        .unwrap();
    assert_eq!(session.session_id.len(), 64);
    assert!(session
        .session_id
        .chars()
        .all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));
    assert!(!session.csrf_token.is_empty());

    // The record was cleared: a fresh round of five failures is required to
    // re-lock.
    let err = manager
        .secure_login_at("alice", "wrongpass", Some("10.0.0.1"), None, later)
        .await
        .unwrap_err();
    assert_matches!(err, AuthError::InvalidCredentials { remaining_attempts: 4 });
}

#[tokio::test]
async fn login_window_limiter_rejects_before_credentials() {
    let (manager, verifier) = setup();
    let now = Utc::now();

    // Exhaust the per-ip window limiter (10 per window by default).
    for _ in 0..10 {
        let _ = manager
            .secure_login_at("bob", "nope", Some("10.0.0.9"), None, now)
            .await;
    }
    let calls_before = verifier.call_count();
    let err = manager
        .secure_login_at("bob", "nope", Some("10.0.0.9"), None, now)
        .await
        .unwrap_err();
    assert_matches!(err, AuthError::RateLimited);
    assert_eq!(verifier.call_count(), calls_before);
}

// =====================================================================================
// SESSION LIFECYCLE
// =====================================================================================

#[tokio::test]
async fn session_validation_and_absolute_expiry() {
    let (manager, _) = setup();
    let now = Utc::now();

    let session = manager
        .secure_login_at(
            "alice",
            "s3cret-pass",
            Some("10.0.0.1"),
            Some("Mozilla/5.0"),
            now,
        )
        .await
        .unwrap();

    // Within lifetime: validation succeeds and refreshes last_activity.
    let mid = now + chrono::Duration::hours(12);
    let validated = manager
        .validate_session_at(&session.session_id, mid)
        .await
        .unwrap();
    assert_eq!(validated.user_id, "user-alice");
    assert_eq!(validated.last_activity, mid);
    assert_eq!(validated.created_at, now);

    // Expiry is absolute from created_at; the recent validation did not
    // extend it.
    let expired = now + chrono::Duration::hours(25);
    let err = manager
        .validate_session_at(&session.session_id, expired)
        .await
        .unwrap_err();
    assert_matches!(err, AuthError::SessionExpired);

    // Expiry cleaned the session up.
    let err = manager
        .validate_session_at(&session.session_id, expired)
        .await
        .unwrap_err();
    assert_matches!(err, AuthError::NoSession);
}

#[tokio::test]
async fn malformed_session_id_is_rejected() {
    let (manager, _) = setup();
    let err = manager
        .validate_session_at("not-a-session-id", Utc::now())
        .await
        .unwrap_err();
    assert_matches!(err, AuthError::InvalidSession);
}

#[tokio::test]
async fn logout_destroys_session_and_csrf_token() {
    let (manager, _) = setup();
    let now = Utc::now();

    let session = manager
        .secure_login_at("alice", "s3cret-pass", None, None, now)
        .await
        .unwrap();
    assert!(manager
        .csrf_store()
        .validate_token(&session.session_id, &session.csrf_token)
        .await);

    manager.logout(&session.session_id).await.unwrap();

    let err = manager
        .validate_session_at(&session.session_id, now)
        .await
        .unwrap_err();
    assert_matches!(err, AuthError::NoSession);
    assert!(!manager
        .csrf_store()
        .validate_token(&session.session_id, &session.csrf_token)
        .await);
}

// =====================================================================================
// PASSWORD CHANGE
// =====================================================================================

#[tokio::test]
async fn change_password_requires_fresh_distinct_confirmed_password() {
    let (manager, _) = setup();
    let now = Utc::now();
    let session = manager
        .secure_login_at("alice", "s3cret-pass", None, None, now)
        .await
        .unwrap();

    let err = manager
        .change_password(
            &session.session_id,
            "alice",
            "s3cret-pass",
            "s3cret-pass",
            "s3cret-pass",
        )
        .await
        .unwrap_err();
    assert_matches!(err, AuthError::Validation(_));

    let err = manager
        .change_password(
            &session.session_id,
            "alice",
            "s3cret-pass",
            "NewPass!234",
            "Different!234",
        )
        .await
        .unwrap_err();
    assert_matches!(err, AuthError::Validation(_));

    let err = manager
        .change_password(
            &session.session_id,
            "alice",
            "guessed-wrong",
            "NewPass!234",
            "NewPass!234",
        )
        .await
        .unwrap_err();
    assert_matches!(err, AuthError::InvalidCredentials { .. });

    manager
        .change_password(
            &session.session_id,
            "alice",
            "s3cret-pass",
            "NewPass!234",
            "NewPass!234",
        )
        .await
        .unwrap();
}
