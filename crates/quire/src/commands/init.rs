//! `quire init` command implementation.

use quire_storage::SqliteStorage;

use super::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Create the configured database and apply the schema.
pub(crate) async fn execute(global: &GlobalArgs) -> Result<(), CliError> {
    let output = Output::new();
    let config = global.load_config()?;

    if let Some(path) = &config.config_path {
        output.info(&format!("Config: {}", path.display()));
    }
    let database = &config.database_resolved;
    let storage = SqliteStorage::open(&database.path, database.max_connections).await?;
    storage.close().await;

    output.success(&format!("Database ready at {}", database.path.display()));
    Ok(())
}
