// =====================================================================================
// BOOKING CELL - BOOKING REQUEST SCREENING AND PRICE INTEGRITY
// =====================================================================================
//
// Date/duration/advance-window validation, duplicate detection, per-property
// price-history integrity and suspicion scoring for booking attempts, plus
// role-based permission checks with an admin wildcard.
//
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use handlers::BookingHandlers;
pub use models::{
    BookingAssessment, BookingPolicy, BookingRequest, ExistingBooking, PriceCheck,
    PriceHistoryEntry, SuspicionLevel,
};
pub use router::create_booking_router;
pub use services::{
    BookingFraudService, BookingScreeningService, BookingValidationService,
    PriceIntegrityService, RolePermissionService,
};
