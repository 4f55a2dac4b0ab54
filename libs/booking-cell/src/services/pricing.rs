// =====================================================================================
// PRICE INTEGRITY SERVICE - PER-PROPERTY PRICE HISTORY
// =====================================================================================

use std::sync::Arc;

use chrono::Utc;
use tracing::{instrument, warn};

use crate::models::{PriceCheck, PriceHistoryEntry};
use audit_cell::{AuditService, SecurityEvent, SecurityEventKind, Severity};
use shared_store::Store;

/// History only ever records accepted prices: a change beyond the threshold
/// is rejected and left out, so the recorded sequence stays authoritative.
pub struct PriceIntegrityService {
    store: Store,
    audit: Arc<AuditService>,
    threshold_pct: f64,
}

impl PriceIntegrityService {
    pub fn new(store: Store, audit: Arc<AuditService>, threshold_pct: f64) -> Self {
        Self {
            store,
            audit,
            threshold_pct,
        }
    }

    fn history_key(property_id: &str) -> String {
        format!("price:{}", property_id)
    }

    #[instrument(skip(self))]
    pub async fn check_and_record(
        &self,
        property_id: &str,
        price: f64,
        user_id: &str,
    ) -> PriceCheck {
        let key = Self::history_key(property_id);

        let history = match self.store.list_json::<PriceHistoryEntry>(&key).await {
            Ok(history) => history,
            Err(e) => {
                warn!(property_id, error = %e, "price history read failed");
                Vec::new()
            }
        };

        let previous = history.last().map(|entry| entry.price);

        if let Some(previous_price) = previous {
            let change_pct = ((price - previous_price).abs() / previous_price) * 100.0;
            if change_pct > self.threshold_pct {
                self.audit
                    .log_security_event(
                        SecurityEvent::new(SecurityEventKind::PriceManipulation, Severity::High)
                            .with_user(user_id)
                            .detail("property_id", property_id)
                            .detail("previous_price", previous_price)
                            .detail("proposed_price", price)
                            .detail("change_pct", change_pct),
                    )
                    .await;
                return PriceCheck {
                    accepted: false,
                    previous_price: Some(previous_price),
                    change_pct: Some(change_pct),
                };
            }

            self.append(&key, price, user_id).await;
            return PriceCheck {
                accepted: true,
                previous_price: Some(previous_price),
                change_pct: Some(change_pct),
            };
        }

        self.append(&key, price, user_id).await;
        PriceCheck {
            accepted: true,
            previous_price: None,
            change_pct: None,
        }
    }

    async fn append(&self, key: &str, price: f64, user_id: &str) {
        let entry = PriceHistoryEntry {
            price,
            timestamp: Utc::now(),
            user_id: user_id.to_string(),
        };
        if let Err(e) = self.store.push_json(key, &entry, None).await {
            warn!(key, error = %e, "price history write failed");
        }
    }

    pub async fn last_price(&self, property_id: &str) -> Option<f64> {
        match self
            .store
            .list_json::<PriceHistoryEntry>(&Self::history_key(property_id))
            .await
        {
            Ok(history) => history.last().map(|entry| entry.price),
            Err(e) => {
                warn!(property_id, error = %e, "price history read failed");
                None
            }
        }
    }
}
