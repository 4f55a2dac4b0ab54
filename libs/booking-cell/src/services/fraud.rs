// =====================================================================================
// BOOKING FRAUD SERVICE - SUSPICION SCORING AND VELOCITY TRACKING
// =====================================================================================

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{instrument, warn};

use crate::models::{ActivityRecord, BookingPolicy, BookingRequest, SuspicionLevel};
use audit_cell::{AuditService, SecurityEvent, SecurityEventKind, Severity};
use shared_store::Store;

const ACTIVITY_HISTORY_CAP: usize = 20;

pub struct BookingFraudService {
    store: Store,
    audit: Arc<AuditService>,
    policy: BookingPolicy,
    bot_pattern: Regex,
}

impl BookingFraudService {
    pub fn new(store: Store, audit: Arc<AuditService>, policy: BookingPolicy) -> Self {
        Self {
            store,
            audit,
            policy,
            bot_pattern: Regex::new(r"(?i)(bot|crawler|spider|scraper|curl|wget|python|java|php)")
                .unwrap(),
        }
    }

    pub async fn assess(
        &self,
        request: &BookingRequest,
        price_violation: bool,
    ) -> (SuspicionLevel, Vec<String>) {
        self.assess_at(request, price_violation, Utc::now()).await
    }

    /// Scores the attempt and raises the suspicion level signal by signal.
    /// The `(user, ip)` activity record is updated on every call, suspicious
    /// or not.
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn assess_at(
        &self,
        request: &BookingRequest,
        price_violation: bool,
        now: DateTime<Utc>,
    ) -> (SuspicionLevel, Vec<String>) {
        let mut suspicion = SuspicionLevel::Low;
        let mut warnings = Vec::new();

        let (rapid, cumulative) = self.record_activity(request, now).await;

        if rapid {
            suspicion = suspicion.max(SuspicionLevel::Medium);
            warnings.push("rapid repeat booking attempts detected".to_string());
        }

        if cumulative > self.policy.high_attempt_threshold {
            suspicion = suspicion.max(SuspicionLevel::High);
            warnings.push("unusually many booking attempts from this user".to_string());
        }

        if request.guests > self.policy.suspicious_guest_count {
            suspicion = suspicion.max(SuspicionLevel::Medium);
            warnings.push("unusually large guest count".to_string());
        }

        if let Some(user_agent) = request.user_agent.as_deref() {
            if self.bot_pattern.is_match(user_agent) {
                suspicion = suspicion.max(SuspicionLevel::Medium);
                warnings.push("automated client detected".to_string());
            }
        }

        if price_violation {
            suspicion = suspicion.max(SuspicionLevel::High);
            warnings.push("price differs sharply from the recorded property price".to_string());
        }

        if suspicion >= SuspicionLevel::Medium {
            let severity = if suspicion == SuspicionLevel::High {
                Severity::High
            } else {
                Severity::Medium
            };
            self.audit
                .log_security_event(
                    SecurityEvent::new(SecurityEventKind::SuspiciousBooking, severity)
                        .with_user(&request.user_id)
                        .with_ip(&request.ip_address)
                        .detail("property_id", &request.property_id)
                        .detail("warnings", &warnings),
                )
                .await;
        }

        (suspicion, warnings)
    }

    /// Returns (rapid_retry, cumulative_count) for this `(user, ip)` key.
    async fn record_activity(&self, request: &BookingRequest, now: DateTime<Utc>) -> (bool, u32) {
        let key = format!("bookvel:{}:{}", request.user_id, request.ip_address);

        let mut record = match self.store.get_json::<ActivityRecord>(&key).await {
            Ok(Some(record)) => record,
            Ok(None) => ActivityRecord {
                count: 0,
                last_activity: now,
                activities: Vec::new(),
            },
            Err(e) => {
                warn!(error = %e, "booking velocity read failed");
                return (false, 0);
            }
        };

        let window = chrono::Duration::from_std(self.policy.velocity_window).unwrap();
        let rapid = record.count > 0 && now - record.last_activity < window;

        record.count += 1;
        record.last_activity = now;
        record.activities.push(now);
        if record.activities.len() > ACTIVITY_HISTORY_CAP {
            let excess = record.activities.len() - ACTIVITY_HISTORY_CAP;
            record.activities.drain(0..excess);
        }
        let cumulative = record.count;

        if let Err(e) = self
            .store
            .set_json(&key, &record, Some(Duration::from_secs(24 * 3600)))
            .await
        {
            warn!(error = %e, "booking velocity write failed");
        }

        (rapid, cumulative)
    }
}
