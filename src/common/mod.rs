pub mod config;
pub mod errors;
pub mod format;

pub use config::AppConfig;
pub use errors::ClientError;
