// =====================================================================================
// DATA PROTECTION SERVICE - PURPOSE-GATED PROCESSING, MINIMIZATION, ERASURE
// =====================================================================================

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{
    ConsentType, ExportBundle, LegalBasis, PersonalRecord, PrivacyError, ProcessingLogEntry,
    RetentionPolicy,
};
use crate::services::consent::ConsentLedgerService;
use audit_cell::{AuditService, SecurityEvent, SecurityEventKind, Severity};
use shared_crypto::CryptoService;
use shared_store::Store;

pub struct DataProtectionService {
    consent: Arc<ConsentLedgerService>,
    crypto: Arc<CryptoService>,
    store: Store,
    audit: Arc<AuditService>,
    retention: RetentionPolicy,
}

impl DataProtectionService {
    pub fn new(
        consent: Arc<ConsentLedgerService>,
        crypto: Arc<CryptoService>,
        store: Store,
        audit: Arc<AuditService>,
        retention: RetentionPolicy,
    ) -> Self {
        Self {
            consent,
            crypto,
            store,
            audit,
            retention,
        }
    }

    fn record_key(user_id: &str) -> String {
        format!("personal:{}", user_id)
    }

    fn log_key(user_id: &str) -> String {
        format!("processing-log:{}", user_id)
    }

    // ---------------------------------------------------------------------------------
    // Processing
    // ---------------------------------------------------------------------------------

    /// Requires current granted consent for the purpose, minimizes the record
    /// to what the purpose needs, encrypts the sensitive fields that remain,
    /// persists the result and appends a processing-log entry.
    #[instrument(skip(self, record), fields(user_id = %record.user_id))]
    pub async fn process_personal_data(
        &self,
        record: PersonalRecord,
        consent_type: ConsentType,
        legal_basis: LegalBasis,
    ) -> Result<PersonalRecord, PrivacyError> {
        if !self.consent.has_consent(&record.user_id, consent_type).await? {
            self.audit
                .log_security_event(
                    SecurityEvent::new(SecurityEventKind::ConsentMissing, Severity::Medium)
                        .with_user(&record.user_id)
                        .detail("consent_type", consent_type),
                )
                .await;
            return Err(PrivacyError::ConsentMissing);
        }

        let user_id = record.user_id.clone();
        let mut minimized = self.minimize(record, consent_type);
        let fields_processed = Self::present_fields(&minimized);
        self.encrypt_sensitive_fields(&mut minimized)?;

        self.store
            .set_json(&Self::record_key(&user_id), &minimized, None)
            .await
            .map_err(|e| PrivacyError::Backend(e.to_string()))?;

        let entry = ProcessingLogEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.clone(),
            consent_type,
            legal_basis,
            fields_processed,
            timestamp: Utc::now(),
        };
        self.store
            .push_json(&Self::log_key(&user_id), &entry, None)
            .await
            .map_err(|e| PrivacyError::Backend(e.to_string()))?;

        self.audit
            .log_security_event(
                SecurityEvent::new(SecurityEventKind::DataProcessed, Severity::Low)
                    .with_user(&user_id)
                    .detail("consent_type", consent_type)
                    .detail("legal_basis", legal_basis),
            )
            .await;

        Ok(minimized)
    }

    /// Purpose-specific minimization: marketing never sees identity
    /// documents, analytics only sees pseudonymized contact data.
    fn minimize(&self, mut record: PersonalRecord, consent_type: ConsentType) -> PersonalRecord {
        match consent_type {
            ConsentType::Marketing => {
                record.passport_number = None;
                record.date_of_birth = None;
            }
            ConsentType::Analytics => {
                record.email = record.email.map(|e| self.crypto.pseudonymize(&e));
                record.phone = record.phone.map(|p| self.crypto.pseudonymize(&p));
            }
            ConsentType::BookingFulfillment | ConsentType::Support => {}
        }
        record
    }

    fn encrypt_sensitive_fields(&self, record: &mut PersonalRecord) -> Result<(), PrivacyError> {
        for field in [&mut record.passport_number, &mut record.date_of_birth] {
            if let Some(plain) = field.take() {
                let encrypted = self
                    .crypto
                    .encrypt(&plain)
                    .map_err(|e| PrivacyError::Crypto(e.to_string()))?;
                let serialized = serde_json::to_string(&encrypted)
                    .map_err(|e| PrivacyError::Crypto(e.to_string()))?;
                *field = Some(serialized);
            }
        }
        Ok(())
    }

    fn present_fields(record: &PersonalRecord) -> Vec<String> {
        let mut fields = Vec::new();
        if record.email.is_some() {
            fields.push("email".to_string());
        }
        if record.phone.is_some() {
            fields.push("phone".to_string());
        }
        if record.full_name.is_some() {
            fields.push("full_name".to_string());
        }
        if record.date_of_birth.is_some() {
            fields.push("date_of_birth".to_string());
        }
        if record.passport_number.is_some() {
            fields.push("passport_number".to_string());
        }
        if record.address.is_some() {
            fields.push("address".to_string());
        }
        fields
    }

    // ---------------------------------------------------------------------------------
    // Right to erasure (anonymization-in-place)
    // ---------------------------------------------------------------------------------

    /// Erasure-by-anonymization: the row survives with placeholders so that
    /// referential integrity holds, but nothing personal remains.
    #[instrument(skip(self))]
    pub async fn implement_right_to_erasure(
        &self,
        user_id: &str,
        legal_retention_hold: bool,
    ) -> Result<(), PrivacyError> {
        if legal_retention_hold {
            self.audit_erasure_refused(user_id, "legal retention hold").await;
            return Err(PrivacyError::RetentionHold);
        }

        let record = self
            .store
            .get_json::<PersonalRecord>(&Self::record_key(user_id))
            .await
            .map_err(|e| PrivacyError::Backend(e.to_string()))?
            .ok_or(PrivacyError::NotFound)?;

        let age_days = (Utc::now() - record.created_at).num_days();
        if age_days < self.retention.min_age_days {
            self.audit_erasure_refused(user_id, "record younger than retention period")
                .await;
            return Err(PrivacyError::RetentionPeriodActive);
        }

        let anonymized = PersonalRecord {
            user_id: user_id.to_string(),
            email: None,
            phone: None,
            full_name: Some("[erased]".to_string()),
            date_of_birth: None,
            passport_number: None,
            address: None,
            created_at: record.created_at,
            anonymized: true,
        };

        self.store
            .set_json(&Self::record_key(user_id), &anonymized, None)
            .await
            .map_err(|e| PrivacyError::Backend(e.to_string()))?;

        self.audit
            .log_security_event(
                SecurityEvent::new(SecurityEventKind::DataErased, Severity::Medium)
                    .with_user(user_id),
            )
            .await;
        Ok(())
    }

    async fn audit_erasure_refused(&self, user_id: &str, reason: &str) {
        self.audit
            .log_security_event(
                SecurityEvent::new(SecurityEventKind::ErasureRefused, Severity::Medium)
                    .with_user(user_id)
                    .detail("reason", reason),
            )
            .await;
    }

    // ---------------------------------------------------------------------------------
    // Data portability
    // ---------------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn export_user_data(&self, user_id: &str) -> Result<ExportBundle, PrivacyError> {
        let record = self
            .store
            .get_json::<PersonalRecord>(&Self::record_key(user_id))
            .await
            .map_err(|e| PrivacyError::Backend(e.to_string()))?;

        let consents = self.consent.consent_history(user_id).await?;

        let processing_log = self
            .store
            .list_json::<ProcessingLogEntry>(&Self::log_key(user_id))
            .await
            .map_err(|e| PrivacyError::Backend(e.to_string()))?;

        self.audit
            .log_security_event(
                SecurityEvent::new(SecurityEventKind::DataExported, Severity::Low)
                    .with_user(user_id),
            )
            .await;

        Ok(ExportBundle {
            user_id: user_id.to_string(),
            record,
            consents,
            processing_log,
            exported_at: Utc::now(),
        })
    }
}
