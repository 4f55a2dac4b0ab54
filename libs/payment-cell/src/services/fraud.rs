// =====================================================================================
// PAYMENT FRAUD SERVICE - ADDITIVE RISK SCORING WITH VELOCITY TRACKING
// =====================================================================================

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use regex::Regex;
use tracing::{instrument, warn};

use crate::models::{FraudAssessment, FraudSignal, PaymentAttempt, PaymentPolicy, VelocityRecord};
use crate::services::card::CardValidationService;
use audit_cell::{AuditService, SecurityEvent, SecurityEventKind, Severity};
use shared_crypto::CryptoService;
use shared_store::{BlockList, Store};

const VELOCITY_HISTORY_CAP: usize = 20;

pub struct PaymentFraudService {
    store: Store,
    blocked_ips: BlockList,
    cards: Arc<CardValidationService>,
    crypto: Arc<CryptoService>,
    audit: Arc<AuditService>,
    policy: PaymentPolicy,
    email_pattern: Regex,
    bot_pattern: Regex,
}

impl PaymentFraudService {
    pub fn new(
        store: Store,
        cards: Arc<CardValidationService>,
        crypto: Arc<CryptoService>,
        audit: Arc<AuditService>,
        policy: PaymentPolicy,
    ) -> Self {
        let blocked_ips = BlockList::new(store.clone(), "ip");
        Self {
            store,
            blocked_ips,
            cards,
            crypto,
            audit,
            policy,
            email_pattern: Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
                .unwrap(),
            bot_pattern: Regex::new(r"(?i)(bot|crawler|spider|scraper|curl|wget|python|java|php)")
                .unwrap(),
        }
    }

    pub fn blocked_ips(&self) -> &BlockList {
        &self.blocked_ips
    }

    /// First four and last four digits only; the middle is starred out. The
    /// raw PAN must never appear in any log or audit event.
    pub fn mask_pan(card_number: &str) -> String {
        let digits = CardValidationService::normalize_card_number(card_number);
        if digits.len() < 13 {
            return "*".repeat(digits.len());
        }
        format!(
            "{}{}{}",
            &digits[..4],
            "*".repeat(digits.len() - 8),
            &digits[digits.len() - 4..]
        )
    }

    /// Best-effort unique id: millisecond timestamp plus random suffix.
    pub fn generate_transaction_id(&self) -> String {
        let suffix: u32 = rand::thread_rng().gen();
        format!("txn_{}_{:08x}", Utc::now().timestamp_millis(), suffix)
    }

    pub async fn assess_fraud(&self, attempt: &PaymentAttempt) -> FraudAssessment {
        self.assess_fraud_at(attempt, Utc::now()).await
    }

    /// Scores an attempt. The velocity record for the `(ip, card)` key is
    /// updated on every evaluation, including clean ones.
    #[instrument(skip(self, attempt), fields(ip = %attempt.ip_address))]
    pub async fn assess_fraud_at(
        &self,
        attempt: &PaymentAttempt,
        now: DateTime<Utc>,
    ) -> FraudAssessment {
        let mut signals = Vec::new();

        if self.blocked_ips.contains(&attempt.ip_address).await {
            signals.push(FraudSignal::BlockedIp);
        }

        if attempt.amount > self.policy.max_amount * 0.8 {
            signals.push(FraudSignal::HighAmount);
        }

        if self.record_velocity(attempt, now).await {
            signals.push(FraudSignal::RapidRetry);
        }

        if self.cards.is_test_card(&attempt.card.card_number) {
            signals.push(FraudSignal::TestCard);
        }

        if let Some(email) = attempt.email.as_deref() {
            if !self.email_pattern.is_match(email) {
                signals.push(FraudSignal::MalformedEmail);
            }
        }

        if let Some(user_agent) = attempt.user_agent.as_deref() {
            if self.bot_pattern.is_match(user_agent) {
                signals.push(FraudSignal::BotUserAgent);
            }
        }

        let score: u32 = signals.iter().map(|s| s.weight()).sum();
        let fraudulent = score > self.policy.fraud_threshold;

        if fraudulent {
            let mut event = SecurityEvent::new(SecurityEventKind::FraudDetected, Severity::Critical)
                .with_ip(&attempt.ip_address)
                .detail("masked_card", Self::mask_pan(&attempt.card.card_number))
                .detail("score", score)
                .detail("signals", &signals)
                .detail("amount", attempt.amount)
                .detail("currency", &attempt.currency);
            if let Some(user_id) = attempt.user_id.as_deref() {
                event = event.with_user(user_id);
            }
            self.audit.log_security_event(event).await;
        }

        FraudAssessment {
            score,
            signals,
            fraudulent,
        }
    }

    /// Returns true when this attempt follows another from the same
    /// `(ip, card)` key within the velocity window.
    async fn record_velocity(&self, attempt: &PaymentAttempt, now: DateTime<Utc>) -> bool {
        // The PAN is hashed before it becomes part of a store key.
        let card_hash = self
            .crypto
            .sha256_hex(attempt.card.card_number.as_bytes());
        let key = format!("payvel:{}:{}", attempt.ip_address, card_hash);

        let mut record = match self.store.get_json::<VelocityRecord>(&key).await {
            Ok(Some(record)) => record,
            Ok(None) => VelocityRecord {
                count: 0,
                last_activity: now,
                activities: Vec::new(),
            },
            Err(e) => {
                warn!(error = %e, "payment velocity read failed");
                return false;
            }
        };

        let window = chrono::Duration::from_std(self.policy.velocity_window).unwrap();
        let rapid = record.count > 0 && now - record.last_activity < window;

        record.count += 1;
        record.last_activity = now;
        record.activities.push(now);
        if record.activities.len() > VELOCITY_HISTORY_CAP {
            let excess = record.activities.len() - VELOCITY_HISTORY_CAP;
            record.activities.drain(0..excess);
        }

        if let Err(e) = self
            .store
            .set_json(&key, &record, Some(Duration::from_secs(24 * 3600)))
            .await
        {
            warn!(error = %e, "payment velocity write failed");
        }

        rapid
    }

    pub async fn block_ip(&self, ip: &str, reason: &str) {
        if let Err(e) = self.blocked_ips.block(ip).await {
            warn!(ip, error = %e, "ip block failed");
            return;
        }
        self.audit
            .log_security_event(
                SecurityEvent::new(SecurityEventKind::IpBlocked, Severity::High)
                    .with_ip(ip)
                    .detail("reason", reason),
            )
            .await;
    }

    pub async fn unblock_ip(&self, ip: &str) {
        if let Err(e) = self.blocked_ips.unblock(ip).await {
            warn!(ip, error = %e, "ip unblock failed");
            return;
        }
        self.audit
            .log_security_event(
                SecurityEvent::new(SecurityEventKind::IpUnblocked, Severity::Medium).with_ip(ip),
            )
            .await;
    }
}
