// =====================================================================================
// BOOKING SCREENING SERVICE - COMPOSED ACCEPT/REJECT DECISION
// =====================================================================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::models::{BookingAssessment, BookingPolicy, BookingRequest, ExistingBooking, SuspicionLevel};
use crate::services::fraud::BookingFraudService;
use crate::services::pricing::PriceIntegrityService;
use crate::services::validation::BookingValidationService;
use audit_cell::{AuditService, SecurityEvent, SecurityEventKind, Severity};
use shared_store::Store;

/// Single entry point for booking endpoints: structural validation, price
/// integrity, then suspicion scoring. Only validation errors or high
/// suspicion reject the request; everything else is surfaced as warnings.
pub struct BookingScreeningService {
    validation: BookingValidationService,
    pricing: PriceIntegrityService,
    fraud: BookingFraudService,
    audit: Arc<AuditService>,
}

impl BookingScreeningService {
    pub fn new(store: Store, audit: Arc<AuditService>, policy: BookingPolicy) -> Self {
        let validation = BookingValidationService::new(policy.clone());
        let pricing = PriceIntegrityService::new(
            store.clone(),
            audit.clone(),
            policy.price_change_threshold_pct,
        );
        let fraud = BookingFraudService::new(store, audit.clone(), policy);
        Self {
            validation,
            pricing,
            fraud,
            audit,
        }
    }

    pub async fn screen_booking(
        &self,
        request: &BookingRequest,
        existing: &[ExistingBooking],
    ) -> BookingAssessment {
        self.screen_booking_at(request, existing, Utc::now()).await
    }

    #[instrument(skip(self, request, existing), fields(user_id = %request.user_id, property_id = %request.property_id))]
    pub async fn screen_booking_at(
        &self,
        request: &BookingRequest,
        existing: &[ExistingBooking],
        now: DateTime<Utc>,
    ) -> BookingAssessment {
        let errors =
            self.validation
                .validate_booking_request_at(request, existing, now.date_naive());

        let price_check = self
            .pricing
            .check_and_record(&request.property_id, request.total_price, &request.user_id)
            .await;

        let (suspicion, warnings) = self
            .fraud
            .assess_at(request, !price_check.accepted, now)
            .await;

        let valid = errors.is_empty() && suspicion < SuspicionLevel::High;

        if !valid {
            self.audit
                .log_security_event(
                    SecurityEvent::new(SecurityEventKind::BookingRejected, Severity::Medium)
                        .with_user(&request.user_id)
                        .with_ip(&request.ip_address)
                        .detail("property_id", &request.property_id)
                        .detail("errors", &errors)
                        .detail("suspicion", suspicion),
                )
                .await;
        }

        BookingAssessment {
            valid,
            errors,
            warnings,
            suspicion,
        }
    }
}
