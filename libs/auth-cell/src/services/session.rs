// =====================================================================================
// SESSION MANAGER - LOGIN THROTTLING, LOCKOUT, SESSION LIFECYCLE
// =====================================================================================

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{instrument, warn};

use crate::models::{AuthError, LoginAttemptRecord, SecureSession, SessionPolicy};
use crate::services::credentials::CredentialVerifier;
use crate::services::csrf::CsrfStore;
use crate::services::rate_limit::RateLimiter;
use audit_cell::{AuditService, SecurityEvent, SecurityEventKind, Severity};
use shared_crypto::CryptoService;
use shared_store::Store;

/// Two independent throttles guard the login path: a fixed-window limiter
/// keyed by `login:{username}:{ip}` and a persistent lockout record keyed by
/// username alone. Both must pass before credentials are ever consulted.
pub struct SessionManager {
    store: Store,
    rate_limiter: RateLimiter,
    csrf: CsrfStore,
    crypto: Arc<CryptoService>,
    verifier: Arc<dyn CredentialVerifier>,
    audit: Arc<AuditService>,
    policy: SessionPolicy,
}

fn is_valid_session_id(session_id: &str) -> bool {
    session_id.len() == 64
        && session_id
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

impl SessionManager {
    pub fn new(
        store: Store,
        crypto: Arc<CryptoService>,
        verifier: Arc<dyn CredentialVerifier>,
        audit: Arc<AuditService>,
        policy: SessionPolicy,
    ) -> Self {
        let rate_limiter = RateLimiter::new(store.clone());
        let csrf = CsrfStore::new(store.clone(), crypto.clone(), policy.session_duration);
        Self {
            store,
            rate_limiter,
            csrf,
            crypto,
            verifier,
            audit,
            policy,
        }
    }

    pub fn csrf_store(&self) -> &CsrfStore {
        &self.csrf
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    fn session_key(session_id: &str) -> String {
        format!("session:{}", session_id)
    }

    fn lockout_key(username: &str) -> String {
        format!("lockout:{}", username)
    }

    fn login_rate_key(username: &str, ip: Option<&str>) -> String {
        format!("login:{}:{}", username, ip.unwrap_or("unknown"))
    }

    // ---------------------------------------------------------------------------------
    // Login
    // ---------------------------------------------------------------------------------

    pub async fn secure_login(
        &self,
        username: &str,
        password: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<SecureSession, AuthError> {
        self.secure_login_at(username, password, ip, user_agent, Utc::now())
            .await
    }

    #[instrument(skip(self, password))]
    pub async fn secure_login_at(
        &self,
        username: &str,
        password: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SecureSession, AuthError> {
        let rate_key = Self::login_rate_key(username, ip);

        // Throttle 1: fixed-window limiter per username+ip.
        if self
            .rate_limiter
            .is_rate_limited_at(
                &rate_key,
                self.policy.login_window_max,
                self.policy.login_window,
                now,
            )
            .await
        {
            self.audit
                .log_security_event(
                    SecurityEvent::new(SecurityEventKind::LoginFailed, Severity::Medium)
                        .with_ip(ip.unwrap_or("unknown"))
                        .detail("username", username)
                        .detail("reason", "rate_limited"),
                )
                .await;
            return Err(AuthError::RateLimited);
        }

        // Throttle 2: persistent lockout record. While locked, the refusal is
        // credential-blind; the verifier is never consulted.
        let lockout_key = Self::lockout_key(username);
        let record = self
            .store
            .get_json::<LoginAttemptRecord>(&lockout_key)
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?
            .unwrap_or_default();

        if let Some(locked_until) = record.locked_until {
            if now < locked_until {
                self.audit
                    .log_security_event(
                        SecurityEvent::new(SecurityEventKind::AccountLocked, Severity::High)
                            .with_ip(ip.unwrap_or("unknown"))
                            .detail("username", username)
                            .detail("locked_until", locked_until),
                    )
                    .await;
                return Err(AuthError::AccountLocked);
            }
        }

        let identity = self
            .verifier
            .verify_credentials(username, password)
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        let identity = match identity {
            Some(identity) => identity,
            None => return Err(self.record_failed_attempt(username, ip, record, now).await),
        };

        // Success: drop both throttles, then mint the session.
        self.store
            .delete(&lockout_key)
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;
        self.rate_limiter.reset_attempts(&rate_key).await;

        let session_id = self
            .crypto
            .generate_session_id()
            .map_err(|e| AuthError::Backend(e.to_string()))?;
        let csrf_token = self.csrf.generate_token(&session_id).await?;

        let session = SecureSession {
            session_id: session_id.clone(),
            user_id: identity.user_id.clone(),
            role: identity.role,
            created_at: now,
            last_activity: now,
            ip_address: ip.map(|s| s.to_string()),
            user_agent: user_agent.map(|s| s.to_string()),
            csrf_token,
        };

        self.store
            .set_json(
                &Self::session_key(&session_id),
                &session,
                Some(self.policy.session_duration),
            )
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        self.audit
            .log_security_event(
                SecurityEvent::new(SecurityEventKind::LoginSuccess, Severity::Low)
                    .with_user(&identity.user_id)
                    .with_session(&session_id)
                    .with_ip(ip.unwrap_or("unknown")),
            )
            .await;

        Ok(session)
    }

    async fn record_failed_attempt(
        &self,
        username: &str,
        ip: Option<&str>,
        mut record: LoginAttemptRecord,
        now: DateTime<Utc>,
    ) -> AuthError {
        record.attempts += 1;
        record.last_attempt = Some(now);

        let locked = record.attempts >= self.policy.max_failed_attempts;
        if locked {
            record.locked_until = Some(
                now + chrono::Duration::from_std(self.policy.lockout_duration).unwrap(),
            );
        }

        // Records expire a day after the last failure so abandoned usernames
        // do not accumulate.
        if let Err(e) = self
            .store
            .set_json(
                &Self::lockout_key(username),
                &record,
                Some(Duration::from_secs(24 * 3600)),
            )
            .await
        {
            warn!(username, error = %e, "failed-attempt record write failed");
        }

        let (kind, severity) = if locked {
            (SecurityEventKind::AccountLocked, Severity::High)
        } else {
            (SecurityEventKind::LoginFailed, Severity::Medium)
        };
        self.audit
            .log_security_event(
                SecurityEvent::new(kind, severity)
                    .with_ip(ip.unwrap_or("unknown"))
                    .detail("username", username)
                    .detail("attempts", record.attempts),
            )
            .await;

        if locked {
            AuthError::AccountLocked
        } else {
            AuthError::InvalidCredentials {
                remaining_attempts: self
                    .policy
                    .max_failed_attempts
                    .saturating_sub(record.attempts),
            }
        }
    }

    // ---------------------------------------------------------------------------------
    // Session validation & logout
    // ---------------------------------------------------------------------------------

    pub async fn validate_session(&self, session_id: &str) -> Result<SecureSession, AuthError> {
        self.validate_session_at(session_id, Utc::now()).await
    }

    #[instrument(skip(self))]
    pub async fn validate_session_at(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<SecureSession, AuthError> {
        if !is_valid_session_id(session_id) {
            self.audit
                .log_security_event(
                    SecurityEvent::new(SecurityEventKind::InvalidSessionId, Severity::High)
                        .detail("session_id_length", session_id.len()),
                )
                .await;
            return Err(AuthError::InvalidSession);
        }

        let key = Self::session_key(session_id);
        let mut session = self
            .store
            .get_json::<SecureSession>(&key)
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?
            .ok_or(AuthError::NoSession)?;

        let age = now - session.created_at;
        let max_age = chrono::Duration::from_std(self.policy.session_duration).unwrap();
        if age > max_age {
            self.audit
                .log_security_event(
                    SecurityEvent::new(SecurityEventKind::SessionExpired, Severity::Medium)
                        .with_user(&session.user_id)
                        .with_session(session_id),
                )
                .await;
            self.destroy_session(session_id).await;
            return Err(AuthError::SessionExpired);
        }

        // Bookkeeping only; expiry stays anchored to created_at.
        session.last_activity = now;
        let remaining = (max_age - age)
            .to_std()
            .unwrap_or(self.policy.session_duration);
        self.store
            .set_json(&key, &session, Some(remaining))
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        Ok(session)
    }

    pub async fn logout(&self, session_id: &str) -> Result<(), AuthError> {
        let session = self
            .store
            .get_json::<SecureSession>(&Self::session_key(session_id))
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        self.destroy_session(session_id).await;

        if let Some(session) = session {
            self.audit
                .log_security_event(
                    SecurityEvent::new(SecurityEventKind::LogoutEvent, Severity::Low)
                        .with_user(&session.user_id)
                        .with_session(session_id),
                )
                .await;
        }
        Ok(())
    }

    async fn destroy_session(&self, session_id: &str) {
        if let Err(e) = self.store.delete(&Self::session_key(session_id)).await {
            warn!(session_id, error = %e, "session deletion failed");
        }
        self.csrf.revoke_token(session_id).await;
    }

    /// Regenerates the CSRF token for an already-validated session,
    /// invalidating the previous token.
    pub async fn refresh_csrf_token(&self, session_id: &str) -> Result<String, AuthError> {
        let key = Self::session_key(session_id);
        let mut session = self
            .store
            .get_json::<SecureSession>(&key)
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?
            .ok_or(AuthError::NoSession)?;

        let token = self.csrf.generate_token(session_id).await?;
        session.csrf_token = token.clone();
        self.store
            .set_json(&key, &session, Some(self.policy.session_duration))
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        self.audit
            .log_security_event(
                SecurityEvent::new(SecurityEventKind::CsrfTokenIssued, Severity::Low)
                    .with_user(&session.user_id)
                    .with_session(session_id),
            )
            .await;

        Ok(token)
    }

    // ---------------------------------------------------------------------------------
    // Password change
    // ---------------------------------------------------------------------------------

    #[instrument(skip(self, current_password, new_password, confirm_password))]
    pub async fn change_password(
        &self,
        session_id: &str,
        username: &str,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        let session = self.validate_session(session_id).await?;

        if new_password == current_password {
            self.audit_password_change_failed(&session.user_id, "new password equals current")
                .await;
            return Err(AuthError::Validation(
                "new password must differ from the current password".to_string(),
            ));
        }
        if new_password != confirm_password {
            self.audit_password_change_failed(&session.user_id, "confirmation mismatch")
                .await;
            return Err(AuthError::Validation(
                "password confirmation does not match".to_string(),
            ));
        }

        // The current password must re-verify through the same credential path
        // as login.
        let verified = self
            .verifier
            .verify_credentials(username, current_password)
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        if verified.is_none() {
            self.audit_password_change_failed(&session.user_id, "current password incorrect")
                .await;
            return Err(AuthError::InvalidCredentials {
                remaining_attempts: self.policy.max_failed_attempts,
            });
        }

        let updated = self
            .verifier
            .change_password(username, new_password)
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        if !updated {
            self.audit_password_change_failed(&session.user_id, "provider refused update")
                .await;
            return Err(AuthError::Backend(
                "password update was not applied".to_string(),
            ));
        }

        self.audit
            .log_security_event(
                SecurityEvent::new(SecurityEventKind::PasswordChanged, Severity::Medium)
                    .with_user(&session.user_id)
                    .with_session(session_id),
            )
            .await;
        Ok(())
    }

    async fn audit_password_change_failed(&self, user_id: &str, reason: &str) {
        self.audit
            .log_security_event(
                SecurityEvent::new(SecurityEventKind::PasswordChangeFailed, Severity::Medium)
                    .with_user(user_id)
                    .detail("reason", reason),
            )
            .await;
    }
}
