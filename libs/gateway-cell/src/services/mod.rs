pub mod password;
pub mod pipeline;
pub mod validation;

pub use password::PasswordStrengthService;
pub use pipeline::{security_gateway_middleware, GatewayContext, SecurityGateway};
pub use validation::InputValidator;
