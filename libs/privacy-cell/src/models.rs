// =====================================================================================
// PRIVACY CELL MODELS
// =====================================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =====================================================================================
// CONSENT MODELS
// =====================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentType {
    Marketing,
    Analytics,
    BookingFulfillment,
    Support,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalBasis {
    Consent,
    Contract,
    LegitimateInterest,
    LegalObligation,
}

/// Append-only: revocation appends a `granted: false` record rather than
/// mutating history. Current consent is computed by folding the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub user_id: String,
    pub consent_type: ConsentType,
    pub granted: bool,
    pub timestamp: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub purpose: String,
    pub legal_basis: LegalBasis,
}

// =====================================================================================
// PERSONAL DATA MODELS
// =====================================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalRecord {
    pub user_id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub full_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub passport_number: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub anonymized: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingLogEntry {
    pub id: String,
    pub user_id: String,
    pub consent_type: ConsentType,
    pub legal_basis: LegalBasis,
    pub fields_processed: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    /// Erasure is refused while the record is younger than this.
    pub min_age_days: i64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { min_age_days: 30 }
    }
}

// =====================================================================================
// REQUEST/RESPONSE MODELS
// =====================================================================================

#[derive(Debug, Deserialize)]
pub struct RecordConsentRequest {
    pub user_id: String,
    pub consent_type: ConsentType,
    pub purpose: String,
    pub legal_basis: LegalBasis,
}

#[derive(Debug, Deserialize)]
pub struct RevokeConsentRequest {
    pub user_id: String,
    pub consent_type: ConsentType,
}

#[derive(Debug, Deserialize)]
pub struct ProcessDataRequest {
    pub record: PersonalRecord,
    pub consent_type: ConsentType,
    pub legal_basis: LegalBasis,
}

#[derive(Debug, Deserialize)]
pub struct ErasureRequest {
    pub user_id: String,
    /// Externally determined legal hold; erasure is refused while set.
    #[serde(default)]
    pub legal_retention_hold: bool,
}

#[derive(Debug, Serialize)]
pub struct ConsentStatusResponse {
    pub user_id: String,
    pub consent_type: ConsentType,
    pub granted: bool,
}

/// Data-portability bundle.
#[derive(Debug, Serialize)]
pub struct ExportBundle {
    pub user_id: String,
    pub record: Option<PersonalRecord>,
    pub consents: Vec<ConsentRecord>,
    pub processing_log: Vec<ProcessingLogEntry>,
    pub exported_at: DateTime<Utc>,
}

// =====================================================================================
// ERROR MODELS
// =====================================================================================

#[derive(Debug, thiserror::Error)]
pub enum PrivacyError {
    #[error("no granted consent for this purpose")]
    ConsentMissing,
    #[error("record is under a legal retention hold")]
    RetentionHold,
    #[error("record is younger than the retention period")]
    RetentionPeriodActive,
    #[error("record not found")]
    NotFound,
    #[error("encryption error: {0}")]
    Crypto(String),
    #[error("privacy store error: {0}")]
    Backend(String),
}
