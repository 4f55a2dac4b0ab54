pub mod credentials;
pub mod csrf;
pub mod rate_limit;
pub mod session;

pub use credentials::{CredentialError, CredentialVerifier, HttpCredentialVerifier};
pub use csrf::CsrfStore;
pub use rate_limit::RateLimiter;
pub use session::SessionManager;
