pub mod fraud;
pub mod permissions;
pub mod pricing;
pub mod screening;
pub mod validation;

pub use fraud::BookingFraudService;
pub use permissions::RolePermissionService;
pub use pricing::PriceIntegrityService;
pub use screening::BookingScreeningService;
pub use validation::BookingValidationService;
