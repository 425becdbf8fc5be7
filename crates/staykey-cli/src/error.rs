//! CLI error type.

use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file problems.
    #[error("configuration error: {0}")]
    Config(String),

    /// Engine operation failures.
    #[error(transparent)]
    Engine(#[from] staykey_engine::EngineError),

    /// Store failures outside an engine operation.
    #[error(transparent)]
    Store(#[from] staykey_engine::StoreError),

    /// Provider failures outside an engine operation.
    #[error(transparent)]
    Provider(#[from] staykey_providers::ProviderError),

    /// Filesystem problems.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Output serialization problems.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;
