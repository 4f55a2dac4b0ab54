// =====================================================================================
// PRIVACY CELL - CONSENT LEDGER AND DATA PROTECTION
// =====================================================================================
//
// GDPR-shaped data handling for the booking platform:
// - Append-only consent ledger; current consent computed by folding the log
// - Purpose-gated processing with minimization and pseudonymization
// - Field encryption for identity documents
// - Right to erasure via anonymization-in-place, with retention guards
// - Data-portability export
//
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use handlers::PrivacyHandlers;
pub use models::{
    ConsentRecord, ConsentType, LegalBasis, PersonalRecord, PrivacyError, ProcessingLogEntry,
    RetentionPolicy,
};
pub use router::create_privacy_router;
pub use services::{ConsentLedgerService, DataProtectionService};
