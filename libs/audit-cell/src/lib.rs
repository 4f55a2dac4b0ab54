// =====================================================================================
// AUDIT CELL - SHARED SECURITY EVENT SINK
// =====================================================================================
//
// Central fire-and-forget audit log consumed by every other cell:
// - Structured security events with severity levels
// - Buffered batch flush to the external log store
// - Critical-severity alerting hook
// - Query surface for operations and per-user audit trails
//
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{SecurityEvent, SecurityEventKind, Severity};
pub use router::create_audit_router;
pub use services::AuditService;
