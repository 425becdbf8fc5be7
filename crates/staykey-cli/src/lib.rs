//! Operator CLI for staykey.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::{Cli, Command};
pub use config::{ApartmentConfig, CliConfig};
pub use error::{CliError, CliResult};
