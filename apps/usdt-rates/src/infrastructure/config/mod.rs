//! Configuration Module
//!
//! Configuration loading for the rate service: environment variables first,
//! then command-line flags on top.

mod cli;
mod settings;

pub use cli::CliArgs;
pub use settings::{
    ConfigError, DEFAULT_APP_NAME, DatabaseSettings, ServerSettings, ServiceConfig,
};
