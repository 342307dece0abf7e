//! Configuration, error types and logging setup for the B1 cleanup handler.

mod config;
mod error;
mod logging;

pub use config::{
    Config, DEFAULT_PAGE_SIZE, DEFAULT_PRIMARY_BASE_URL, DEFAULT_SECONDARY_BASE_URL,
    DEFAULT_TARGET_GROUP_NAME,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
