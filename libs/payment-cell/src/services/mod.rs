pub mod card;
pub mod fraud;

pub use card::CardValidationService;
pub use fraud::PaymentFraudService;
