pub mod common;
pub mod engine;
pub mod output;
pub mod remote;

pub use common::config::{load_config, AppConfig};
pub use common::errors::ClientError;
