// =====================================================================================
// BOOKING VALIDATION SERVICE - DATES, GUESTS, DURATION, ADVANCE WINDOW
// =====================================================================================

use chrono::{NaiveDate, Utc};

use crate::models::{BookingPolicy, BookingRequest, ExistingBooking};

pub struct BookingValidationService {
    policy: BookingPolicy,
}

impl BookingValidationService {
    pub fn new(policy: BookingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    pub fn validate_booking_request(
        &self,
        request: &BookingRequest,
        existing: &[ExistingBooking],
    ) -> Vec<String> {
        self.validate_booking_request_at(request, existing, Utc::now().date_naive())
    }

    pub fn validate_booking_request_at(
        &self,
        request: &BookingRequest,
        existing: &[ExistingBooking],
        today: NaiveDate,
    ) -> Vec<String> {
        let mut errors = Vec::new();

        let check_in = match request.check_in.parse::<NaiveDate>() {
            Ok(date) => Some(date),
            Err(_) => {
                errors.push("check-in date is not a valid date".to_string());
                None
            }
        };
        let check_out = match request.check_out.parse::<NaiveDate>() {
            Ok(date) => Some(date),
            Err(_) => {
                errors.push("check-out date is not a valid date".to_string());
                None
            }
        };

        if let Some(check_in) = check_in {
            if check_in < today {
                errors.push("check-in cannot be in the past".to_string());
            }

            let advance_days = (check_in - today).num_days();
            if advance_days < self.policy.min_advance_days {
                errors.push(format!(
                    "bookings require at least {} day(s) notice",
                    self.policy.min_advance_days
                ));
            }
            if advance_days > self.policy.max_advance_days {
                errors.push(format!(
                    "bookings cannot be made more than {} days in advance",
                    self.policy.max_advance_days
                ));
            }
        }

        if let (Some(check_in), Some(check_out)) = (check_in, check_out) {
            let duration_days = (check_out - check_in).num_days();
            if duration_days <= 0 {
                errors.push("check-out must be after check-in".to_string());
            } else if duration_days > self.policy.max_duration_days {
                errors.push(format!(
                    "stays are limited to {} days",
                    self.policy.max_duration_days
                ));
            }

            // Duplicate = same user, property and exact date pair.
            let duplicate = existing.iter().any(|booking| {
                booking.user_id == request.user_id
                    && booking.property_id == request.property_id
                    && booking.check_in == check_in
                    && booking.check_out == check_out
            });
            if duplicate {
                errors.push("an identical booking already exists".to_string());
            }
        }

        if request.guests < self.policy.min_guests || request.guests > self.policy.max_guests {
            errors.push(format!(
                "guest count must be between {} and {}",
                self.policy.min_guests, self.policy.max_guests
            ));
        }

        errors
    }
}
