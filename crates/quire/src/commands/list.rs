//! `quire list` command implementation.

use clap::Args;

use super::{GlobalArgs, connect};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the list command.
#[derive(Args)]
pub(crate) struct ListArgs {
    /// Only list root versions.
    #[arg(long)]
    roots: bool,
}

impl ListArgs {
    pub(crate) async fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let service = connect(global).await?;

        let documentations = service.get_documentations().await?;
        if documentations.is_empty() {
            output.info("No documentations yet. Create one with `quire create`.");
            return Ok(());
        }

        let shown = documentations
            .iter()
            .filter(|documentation| !self.roots || documentation.is_root());
        for documentation in shown {
            let version = if documentation.version.is_empty() {
                "-"
            } else {
                documentation.version.as_str()
            };
            let source = documentation
                .cloned_from
                .map(|id| output.detail(&format!("  (forked from {id})")))
                .unwrap_or_default();
            output.data(&format!(
                "{:>5}  {}  {version}{source}",
                documentation.id, documentation.name
            ));
        }
        Ok(())
    }
}
