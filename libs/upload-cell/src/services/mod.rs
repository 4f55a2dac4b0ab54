pub mod guard;
pub mod sanitize;

pub use guard::UploadGuardService;
pub use sanitize::ImageSanitizer;
