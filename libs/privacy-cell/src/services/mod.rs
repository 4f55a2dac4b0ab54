pub mod consent;
pub mod protection;

pub use consent::ConsentLedgerService;
pub use protection::DataProtectionService;
