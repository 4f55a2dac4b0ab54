// =====================================================================================
// PRIVACY CELL INTEGRATION TESTS - CONSENT LEDGER AND DATA PROTECTION
// =====================================================================================

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Utc;

use audit_cell::AuditService;
use privacy_cell::{
    ConsentLedgerService, ConsentType, DataProtectionService, LegalBasis, PersonalRecord,
    PrivacyError, RetentionPolicy,
};
use shared_crypto::{CryptoService, EncryptedData};
use shared_store::Store;

fn setup() -> (Arc<ConsentLedgerService>, DataProtectionService, Arc<CryptoService>) {
    let store = Store::memory();
    let audit = Arc::new(AuditService::new(100));
    let crypto = Arc::new(CryptoService::new(&CryptoService::generate_master_key()));
    let consent = Arc::new(ConsentLedgerService::new(store.clone(), audit.clone()));
    let protection = DataProtectionService::new(
        consent.clone(),
        crypto.clone(),
        store,
        audit,
        RetentionPolicy::default(),
    );
    (consent, protection, crypto)
}

fn record(user_id: &str) -> PersonalRecord {
    PersonalRecord {
        user_id: user_id.to_string(),
        email: Some("alice@example.com".to_string()),
        phone: Some("+34600111222".to_string()),
        full_name: Some("Alice Martin".to_string()),
        date_of_birth: Some("1990-04-12".to_string()),
        passport_number: Some("X1234567".to_string()),
        address: Some("12 Calle del Mar".to_string()),
        created_at: Utc::now(),
        anonymized: false,
    }
}

// =====================================================================================
// CONSENT LEDGER
// =====================================================================================

#[tokio::test]
async fn consent_is_append_only_and_folds_to_latest() {
    let (consent, _, _) = setup();

    assert!(!consent
        .has_consent("user-alice", ConsentType::Marketing)
        .await
        .unwrap());

    consent
        .record_consent(
            "user-alice",
            ConsentType::Marketing,
            "newsletter",
            LegalBasis::Consent,
            Some("10.7.7.7"),
            None,
        )
        .await
        .unwrap();
    assert!(consent
        .has_consent("user-alice", ConsentType::Marketing)
        .await
        .unwrap());

    consent
        .revoke_consent("user-alice", ConsentType::Marketing, Some("10.7.7.7"), None)
        .await
        .unwrap();
    assert!(!consent
        .has_consent("user-alice", ConsentType::Marketing)
        .await
        .unwrap());

    // Re-granting appends again; nothing was mutated.
    consent
        .record_consent(
            "user-alice",
            ConsentType::Marketing,
            "newsletter",
            LegalBasis::Consent,
            None,
            None,
        )
        .await
        .unwrap();
    assert!(consent
        .has_consent("user-alice", ConsentType::Marketing)
        .await
        .unwrap());

    let history = consent.consent_history("user-alice").await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history[0].granted);
    assert!(!history[1].granted);
    assert!(history[2].granted);
}

#[tokio::test]
async fn consent_types_are_independent() {
    let (consent, _, _) = setup();

    consent
        .record_consent(
            "user-alice",
            ConsentType::Analytics,
            "usage statistics",
            LegalBasis::Consent,
            None,
            None,
        )
        .await
        .unwrap();

    assert!(consent
        .has_consent("user-alice", ConsentType::Analytics)
        .await
        .unwrap());
    assert!(!consent
        .has_consent("user-alice", ConsentType::Marketing)
        .await
        .unwrap());
}

// =====================================================================================
// PURPOSE-GATED PROCESSING
// =====================================================================================

#[tokio::test]
async fn processing_without_consent_is_refused() {
    let (_, protection, _) = setup();

    let err = protection
        .process_personal_data(record("user-alice"), ConsentType::Marketing, LegalBasis::Consent)
        .await
        .unwrap_err();
    assert_matches!(err, PrivacyError::ConsentMissing);
}

#[tokio::test]
async fn marketing_minimization_drops_identity_documents() {
    let (consent, protection, _) = setup();
    consent
        .record_consent(
            "user-alice",
            ConsentType::Marketing,
            "newsletter",
            LegalBasis::Consent,
            None,
            None,
        )
        .await
        .unwrap();

    let processed = protection
        .process_personal_data(record("user-alice"), ConsentType::Marketing, LegalBasis::Consent)
        .await
        .unwrap();

    assert!(processed.passport_number.is_none());
    assert!(processed.date_of_birth.is_none());
    assert_eq!(processed.email.as_deref(), Some("alice@example.com"));
}

#[tokio::test]
async fn analytics_minimization_pseudonymizes_contact_data() {
    let (consent, protection, crypto) = setup();
    consent
        .record_consent(
            "user-alice",
            ConsentType::Analytics,
            "usage statistics",
            LegalBasis::Consent,
            None,
            None,
        )
        .await
        .unwrap();

    let processed = protection
        .process_personal_data(record("user-alice"), ConsentType::Analytics, LegalBasis::Consent)
        .await
        .unwrap();

    assert_eq!(
        processed.email.as_deref(),
        Some(crypto.pseudonymize("alice@example.com").as_str())
    );
    assert_ne!(processed.phone.as_deref(), Some("+34600111222"));
}

#[tokio::test]
async fn identity_documents_are_encrypted_at_rest() {
    let (consent, protection, crypto) = setup();
    consent
        .record_consent(
            "user-alice",
            ConsentType::BookingFulfillment,
            "reservation handling",
            LegalBasis::Contract,
            None,
            None,
        )
        .await
        .unwrap();

    let processed = protection
        .process_personal_data(
            record("user-alice"),
            ConsentType::BookingFulfillment,
            LegalBasis::Contract,
        )
        .await
        .unwrap();

    // The stored field is an encryption envelope, not the plaintext, and it
    // round-trips through the crypto service.
    let envelope: EncryptedData =
        serde_json::from_str(processed.passport_number.as_deref().unwrap()).unwrap();
    assert_eq!(crypto.decrypt(&envelope).unwrap(), "X1234567");
}

// =====================================================================================
// RIGHT TO ERASURE & PORTABILITY
// =====================================================================================

#[tokio::test]
async fn erasure_is_anonymization_in_place() {
    let (consent, protection, _) = setup();
    consent
        .record_consent(
            "user-alice",
            ConsentType::BookingFulfillment,
            "reservation handling",
            LegalBasis::Contract,
            None,
            None,
        )
        .await
        .unwrap();

    let mut old_record = record("user-alice");
    old_record.created_at = Utc::now() - chrono::Duration::days(90);
    protection
        .process_personal_data(old_record, ConsentType::BookingFulfillment, LegalBasis::Contract)
        .await
        .unwrap();

    protection
        .implement_right_to_erasure("user-alice", false)
        .await
        .unwrap();

    let bundle = protection.export_user_data("user-alice").await.unwrap();
    let stored = bundle.record.unwrap();
    assert!(stored.anonymized);
    assert!(stored.email.is_none());
    assert!(stored.passport_number.is_none());
    assert_eq!(stored.full_name.as_deref(), Some("[erased]"));
}

#[tokio::test]
async fn erasure_refused_under_retention_rules() {
    let (consent, protection, _) = setup();

    // Legal hold wins regardless of record state.
    let err = protection
        .implement_right_to_erasure("user-alice", true)
        .await
        .unwrap_err();
    assert_matches!(err, PrivacyError::RetentionHold);

    // A record younger than the retention period cannot be erased yet.
    consent
        .record_consent(
            "user-alice",
            ConsentType::BookingFulfillment,
            "reservation handling",
            LegalBasis::Contract,
            None,
            None,
        )
        .await
        .unwrap();
    protection
        .process_personal_data(
            record("user-alice"),
            ConsentType::BookingFulfillment,
            LegalBasis::Contract,
        )
        .await
        .unwrap();

    let err = protection
        .implement_right_to_erasure("user-alice", false)
        .await
        .unwrap_err();
    assert_matches!(err, PrivacyError::RetentionPeriodActive);
}

#[tokio::test]
async fn erasure_without_a_record_is_not_found() {
    let (_, protection, _) = setup();
    let err = protection
        .implement_right_to_erasure("user-ghost", false)
        .await
        .unwrap_err();
    assert_matches!(err, PrivacyError::NotFound);
}

#[tokio::test]
async fn export_bundles_record_consents_and_log() {
    let (consent, protection, _) = setup();
    consent
        .record_consent(
            "user-alice",
            ConsentType::BookingFulfillment,
            "reservation handling",
            LegalBasis::Contract,
            None,
            None,
        )
        .await
        .unwrap();
    protection
        .process_personal_data(
            record("user-alice"),
            ConsentType::BookingFulfillment,
            LegalBasis::Contract,
        )
        .await
        .unwrap();

    let bundle = protection.export_user_data("user-alice").await.unwrap();
    assert!(bundle.record.is_some());
    assert_eq!(bundle.consents.len(), 1);
    assert_eq!(bundle.processing_log.len(), 1);
    assert_eq!(
        bundle.processing_log[0].consent_type,
        ConsentType::BookingFulfillment
    );
    assert!(!bundle.processing_log[0].fields_processed.is_empty());
}
