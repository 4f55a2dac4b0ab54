// =====================================================================================
// BOOKING CELL MODELS
// =====================================================================================

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =====================================================================================
// POLICY
// =====================================================================================

#[derive(Debug, Clone)]
pub struct BookingPolicy {
    pub min_guests: u32,
    pub max_guests: u32,
    /// Guest counts above this raise suspicion without failing validation.
    pub suspicious_guest_count: u32,
    pub max_duration_days: i64,
    pub min_advance_days: i64,
    pub max_advance_days: i64,
    /// Price changes above this percentage are rejected outright.
    pub price_change_threshold_pct: f64,
    pub velocity_window: Duration,
    /// Cumulative attempts above this resolve to high suspicion.
    pub high_attempt_threshold: u32,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            min_guests: 1,
            max_guests: 20,
            suspicious_guest_count: 15,
            max_duration_days: 30,
            min_advance_days: 1,
            max_advance_days: 365,
            price_change_threshold_pct: 50.0,
            velocity_window: Duration::from_secs(60),
            high_attempt_threshold: 5,
        }
    }
}

// =====================================================================================
// BOOKING REQUEST MODELS
// =====================================================================================

/// Dates arrive as strings so that malformed input surfaces as a validation
/// error rather than a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub user_id: String,
    pub property_id: String,
    pub check_in: String,
    pub check_out: String,
    pub guests: u32,
    pub total_price: f64,
    pub ip_address: String,
    pub user_agent: Option<String>,
}

/// Already-accepted booking, supplied by the caller for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingBooking {
    pub user_id: String,
    pub property_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuspicionLevel {
    Low,
    Medium,
    High,
}

/// Screening verdict. A request is rejected only when `errors` is non-empty
/// or suspicion resolves to high; medium and low suspicion surface as
/// non-blocking warnings.
#[derive(Debug, Clone, Serialize)]
pub struct BookingAssessment {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suspicion: SuspicionLevel,
}

// =====================================================================================
// PRICE HISTORY MODELS
// =====================================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceCheck {
    pub accepted: bool,
    pub previous_price: Option<f64>,
    pub change_pct: Option<f64>,
}

/// Booking velocity per `(user, ip)` key, independent of the payment
/// tracker. Incremented on every screened attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub count: u32,
    pub last_activity: DateTime<Utc>,
    pub activities: Vec<DateTime<Utc>>,
}

// =====================================================================================
// REQUEST/RESPONSE MODELS
// =====================================================================================

#[derive(Debug, Deserialize)]
pub struct ScreenBookingRequest {
    #[serde(flatten)]
    pub booking: BookingRequest,
    #[serde(default)]
    pub existing_bookings: Vec<ExistingBooking>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PermissionCheckRequest {
    pub role: String,
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct PermissionCheckResponse {
    pub allowed: bool,
}
