//! CLI error types.

use quire_config::ConfigError;
use quire_storage::StorageError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Versions(#[from] quire_versions::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
