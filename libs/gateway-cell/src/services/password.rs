// =====================================================================================
// PASSWORD STRENGTH SERVICE
// =====================================================================================

use crate::models::{PasswordStrength, PasswordStrengthResult};

pub struct PasswordStrengthService;

impl PasswordStrengthService {
    pub fn validate_password_strength(password: &str) -> PasswordStrengthResult {
        let mut score = 0u8;
        let mut issues = Vec::new();

        if password.len() >= 12 {
            score += 25;
        } else if password.len() >= 8 {
            score += 15;
            issues.push("Password should be at least 12 characters long".to_string());
        } else {
            issues.push("Password must be at least 8 characters long".to_string());
        }

        if password.chars().any(|c| c.is_lowercase()) {
            score += 15;
        } else {
            issues.push("Password should contain lowercase letters".to_string());
        }

        if password.chars().any(|c| c.is_uppercase()) {
            score += 15;
        } else {
            issues.push("Password should contain uppercase letters".to_string());
        }

        if password.chars().any(|c| c.is_numeric()) {
            score += 15;
        } else {
            issues.push("Password should contain numbers".to_string());
        }

        if password
            .chars()
            .any(|c| "!@#$%^&*()_+-=[]{}|;:,.<>?".contains(c))
        {
            score += 15;
        } else {
            issues.push("Password should contain special characters".to_string());
        }

        if Self::has_sequential_chars(password) {
            score = score.saturating_sub(20);
            issues.push("Avoid sequential characters (abc, 123)".to_string());
        }

        if Self::has_repeated_chars(password) {
            score = score.saturating_sub(15);
            issues.push("Avoid repeated characters (aaa, 111)".to_string());
        }

        let common_passwords = [
            "password", "123456", "password123", "admin", "qwerty",
            "letmein", "welcome", "monkey", "dragon", "123456789",
            "password1", "abc123", "111111", "123123", "admin123",
        ];
        if common_passwords
            .iter()
            .any(|&common| password.to_lowercase().contains(common))
        {
            score = score.saturating_sub(50);
            issues.push("Password contains common patterns".to_string());
        }

        // Guessable platform vocabulary.
        let travel_terms = [
            "villa", "beach", "holiday", "summer", "vacation", "booking", "solmara",
        ];
        if travel_terms
            .iter()
            .any(|&term| password.to_lowercase().contains(term))
        {
            score = score.saturating_sub(10);
            issues.push("Avoid travel-related words in passwords".to_string());
        }

        let strength = match score {
            0..=25 => PasswordStrength::Weak,
            26..=50 => PasswordStrength::Fair,
            51..=75 => PasswordStrength::Good,
            _ => PasswordStrength::Strong,
        };

        PasswordStrengthResult {
            strength,
            score,
            issues,
        }
    }

    fn has_sequential_chars(password: &str) -> bool {
        let chars: Vec<char> = password.chars().collect();
        for window in chars.windows(3) {
            if let [a, b, c] = window {
                if (*b as u8).saturating_sub(*a as u8) == 1
                    && (*c as u8).saturating_sub(*b as u8) == 1
                {
                    return true;
                }
                if (*a as u8).saturating_sub(*b as u8) == 1
                    && (*b as u8).saturating_sub(*c as u8) == 1
                {
                    return true;
                }
            }
        }
        false
    }

    fn has_repeated_chars(password: &str) -> bool {
        let chars: Vec<char> = password.chars().collect();
        for window in chars.windows(3) {
            if let [a, b, c] = window {
                if a == b && b == c {
                    return true;
                }
            }
        }
        false
    }
}
