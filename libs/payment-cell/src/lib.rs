// =====================================================================================
// PAYMENT CELL - CARD VALIDATION AND FRAUD SCORING
// =====================================================================================
//
// Structural card checks (Luhn, expiry, test-card rejection) and additive
// fraud scoring over blocked IPs, amount bounds, attempt velocity and
// user-agent heuristics. Positive determinations are audited at critical
// severity with the PAN masked.
//
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use handlers::PaymentHandlers;
pub use models::{CardDetails, FraudAssessment, FraudSignal, PaymentAttempt, PaymentPolicy};
pub use router::create_payment_router;
pub use services::{CardValidationService, PaymentFraudService};
