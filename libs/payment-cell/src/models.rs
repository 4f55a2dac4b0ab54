// =====================================================================================
// PAYMENT CELL MODELS
// =====================================================================================

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =====================================================================================
// POLICY
// =====================================================================================

#[derive(Debug, Clone)]
pub struct PaymentPolicy {
    pub min_amount: f64,
    pub max_amount: f64,
    pub allowed_currencies: Vec<String>,
    pub require_cvv: bool,
    /// Additive risk score above which an attempt is ruled fraudulent.
    pub fraud_threshold: u32,
    pub velocity_window: Duration,
}

impl Default for PaymentPolicy {
    fn default() -> Self {
        Self {
            min_amount: 1.0,
            max_amount: 10_000.0,
            allowed_currencies: vec![
                "USD".to_string(),
                "EUR".to_string(),
                "GBP".to_string(),
            ],
            require_cvv: true,
            fraud_threshold: 70,
            velocity_window: Duration::from_secs(60),
        }
    }
}

// =====================================================================================
// PAYMENT ATTEMPT MODELS
// =====================================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDetails {
    pub card_number: String,
    pub holder_name: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub cvv: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAttempt {
    pub amount: f64,
    pub currency: String,
    pub card: CardDetails,
    pub email: Option<String>,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub user_id: Option<String>,
}

// =====================================================================================
// FRAUD SCORING MODELS
// =====================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudSignal {
    BlockedIp,
    HighAmount,
    RapidRetry,
    TestCard,
    MalformedEmail,
    BotUserAgent,
}

impl FraudSignal {
    pub fn weight(&self) -> u32 {
        match self {
            FraudSignal::BlockedIp => 100,
            FraudSignal::HighAmount => 30,
            FraudSignal::RapidRetry => 50,
            FraudSignal::TestCard => 80,
            FraudSignal::MalformedEmail => 20,
            FraudSignal::BotUserAgent => 25,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FraudAssessment {
    pub score: u32,
    pub signals: Vec<FraudSignal>,
    pub fraudulent: bool,
}

/// Velocity tracker per `(ip, card)` key. Updated on every evaluated attempt
/// regardless of the verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VelocityRecord {
    pub count: u32,
    pub last_activity: DateTime<Utc>,
    pub activities: Vec<DateTime<Utc>>,
}

// =====================================================================================
// REQUEST/RESPONSE MODELS
// =====================================================================================

#[derive(Debug, Serialize)]
pub struct PaymentValidationResponse {
    pub valid: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FraudAssessmentResponse {
    pub fraudulent: bool,
    pub score: u32,
    pub signals: Vec<FraudSignal>,
    pub transaction_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlockIpRequest {
    pub ip_address: String,
    pub reason: Option<String>,
}
