// =====================================================================================
// CONSENT LEDGER - APPEND-ONLY CONSENT LOG
// =====================================================================================

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use crate::models::{ConsentRecord, ConsentType, LegalBasis, PrivacyError};
use audit_cell::{AuditService, SecurityEvent, SecurityEventKind, Severity};
use shared_store::Store;

pub struct ConsentLedgerService {
    store: Store,
    audit: Arc<AuditService>,
}

impl ConsentLedgerService {
    pub fn new(store: Store, audit: Arc<AuditService>) -> Self {
        Self { store, audit }
    }

    fn ledger_key(user_id: &str) -> String {
        format!("consent:{}", user_id)
    }

    #[instrument(skip(self))]
    pub async fn record_consent(
        &self,
        user_id: &str,
        consent_type: ConsentType,
        purpose: &str,
        legal_basis: LegalBasis,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(), PrivacyError> {
        let record = ConsentRecord {
            user_id: user_id.to_string(),
            consent_type,
            granted: true,
            timestamp: Utc::now(),
            ip_address: ip.map(|s| s.to_string()),
            user_agent: user_agent.map(|s| s.to_string()),
            purpose: purpose.to_string(),
            legal_basis,
        };

        self.store
            .push_json(&Self::ledger_key(user_id), &record, None)
            .await
            .map_err(|e| PrivacyError::Backend(e.to_string()))?;

        self.audit
            .log_security_event(
                SecurityEvent::new(SecurityEventKind::ConsentRecorded, Severity::Low)
                    .with_user(user_id)
                    .detail("consent_type", consent_type)
                    .detail("legal_basis", legal_basis),
            )
            .await;
        Ok(())
    }

    /// Revocation appends; the granted record it supersedes stays in the log.
    #[instrument(skip(self))]
    pub async fn revoke_consent(
        &self,
        user_id: &str,
        consent_type: ConsentType,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(), PrivacyError> {
        let record = ConsentRecord {
            user_id: user_id.to_string(),
            consent_type,
            granted: false,
            timestamp: Utc::now(),
            ip_address: ip.map(|s| s.to_string()),
            user_agent: user_agent.map(|s| s.to_string()),
            purpose: "consent revoked".to_string(),
            legal_basis: LegalBasis::Consent,
        };

        self.store
            .push_json(&Self::ledger_key(user_id), &record, None)
            .await
            .map_err(|e| PrivacyError::Backend(e.to_string()))?;

        self.audit
            .log_security_event(
                SecurityEvent::new(SecurityEventKind::ConsentRevoked, Severity::Medium)
                    .with_user(user_id)
                    .detail("consent_type", consent_type),
            )
            .await;
        Ok(())
    }

    /// Folds the append-only log: the most recent record for the consent type
    /// decides. No granted record, or a later revocation, means no consent.
    pub async fn has_consent(
        &self,
        user_id: &str,
        consent_type: ConsentType,
    ) -> Result<bool, PrivacyError> {
        let history = self.consent_history(user_id).await?;
        let current = history
            .iter()
            .filter(|record| record.consent_type == consent_type)
            .fold(false, |_, record| record.granted);
        Ok(current)
    }

    pub async fn consent_history(&self, user_id: &str) -> Result<Vec<ConsentRecord>, PrivacyError> {
        self.store
            .list_json::<ConsentRecord>(&Self::ledger_key(user_id))
            .await
            .map_err(|e| PrivacyError::Backend(e.to_string()))
    }
}
