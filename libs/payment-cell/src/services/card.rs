// =====================================================================================
// CARD VALIDATION SERVICE - STRUCTURAL CHECKS, NOT ISSUER CHECKS
// =====================================================================================

use chrono::{DateTime, Datelike, Utc};
use regex::Regex;

use crate::models::{CardDetails, PaymentPolicy};

/// Published test-card numbers of the major schemes; they must never reach a
/// production charge path.
const TEST_CARD_PATTERNS: &[&str] = &[
    r"^4111111111111111$",
    r"^4012888888881881$",
    r"^4242424242424242$",
    r"^5555555555554444$",
    r"^5105105105105100$",
    r"^378282246310005$",
    r"^371449635398431$",
    r"^6011111111111117$",
    r"^30569309025904$",
];

pub struct CardValidationService {
    policy: PaymentPolicy,
    test_card_patterns: Vec<Regex>,
}

impl CardValidationService {
    pub fn new(policy: PaymentPolicy) -> Self {
        let test_card_patterns = TEST_CARD_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();
        Self {
            policy,
            test_card_patterns,
        }
    }

    pub fn policy(&self) -> &PaymentPolicy {
        &self.policy
    }

    /// Strips the separators users type into card fields.
    pub fn normalize_card_number(card_number: &str) -> String {
        card_number
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect()
    }

    /// Luhn checksum over the digit string. Validates structure only.
    pub fn luhn_valid(card_number: &str) -> bool {
        let digits: Vec<u32> = card_number.chars().filter_map(|c| c.to_digit(10)).collect();
        if digits.len() != card_number.len() || digits.is_empty() {
            return false;
        }

        let mut sum = 0u32;
        for (i, digit) in digits.iter().rev().enumerate() {
            let mut d = *digit;
            if i % 2 == 1 {
                d *= 2;
                if d > 9 {
                    d -= 9;
                }
            }
            sum += d;
        }
        sum % 10 == 0
    }

    pub fn is_test_card(&self, card_number: &str) -> bool {
        let normalized = Self::normalize_card_number(card_number);
        self.test_card_patterns
            .iter()
            .any(|p| p.is_match(&normalized))
    }

    pub fn validate_payment_amount(&self, amount: f64, currency: &str) -> Vec<String> {
        let mut errors = Vec::new();

        if amount < self.policy.min_amount {
            errors.push(format!(
                "amount is below the minimum of {:.2}",
                self.policy.min_amount
            ));
        }
        if amount > self.policy.max_amount {
            errors.push(format!(
                "amount exceeds the maximum of {:.2}",
                self.policy.max_amount
            ));
        }
        if !self
            .policy
            .allowed_currencies
            .iter()
            .any(|c| c.eq_ignore_ascii_case(currency))
        {
            errors.push(format!("currency {} is not supported", currency));
        }

        errors
    }

    pub fn validate_card_details(&self, card: &CardDetails) -> Vec<String> {
        self.validate_card_details_at(card, Utc::now())
    }

    pub fn validate_card_details_at(&self, card: &CardDetails, now: DateTime<Utc>) -> Vec<String> {
        let mut errors = Vec::new();
        let number = Self::normalize_card_number(&card.card_number);

        if number.len() < 13 || number.len() > 19 || !Self::luhn_valid(&number) {
            errors.push("card number failed structural validation".to_string());
        }

        if self.is_test_card(&number) {
            errors.push("test card numbers are not accepted".to_string());
        }

        if card.holder_name.trim().len() < 2 {
            errors.push("cardholder name is too short".to_string());
        }

        // Calendar-month granularity: a card is valid through the end of its
        // expiry month.
        if !(1..=12).contains(&card.expiry_month) {
            errors.push("expiry month is invalid".to_string());
        } else {
            let card_months = card.expiry_year * 12 + card.expiry_month as i32;
            let now_months = now.year() * 12 + now.month() as i32;
            if card_months < now_months {
                errors.push("card has expired".to_string());
            }
        }

        if self.policy.require_cvv {
            match card.cvv.as_deref() {
                Some(cvv) if (3..=4).contains(&cvv.len()) && cvv.chars().all(|c| c.is_ascii_digit()) => {}
                _ => errors.push("security code is invalid".to_string()),
            }
        }

        errors
    }
}
