//! `quire ancestry` command implementation.

use clap::Args;
use quire_storage::DocumentationId;

use super::{GlobalArgs, connect};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the ancestry command.
#[derive(Args)]
pub(crate) struct AncestryArgs {
    /// Documentation ID.
    id: i64,
}

impl AncestryArgs {
    pub(crate) async fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let service = connect(global).await?;
        let id = DocumentationId(self.id);

        // Fail on unknown ids instead of printing an empty chain.
        let documentation = service.get_documentation(id).await?;
        let ancestors = service.ancestors(id).await?;

        output.highlight(&format!(
            "{} {} (documentation {id})",
            documentation.name, documentation.version
        ));
        if ancestors.is_empty() {
            output.info("Root version: no ancestors.");
        }
        for (depth, ancestor) in ancestors.iter().enumerate() {
            output.data(&format!(
                "{}<- {} {} (documentation {})",
                "  ".repeat(depth),
                ancestor.name,
                ancestor.version,
                ancestor.id
            ));
        }

        let forks = service.children_of_documentation(id).await?;
        if !forks.is_empty() {
            let forks: Vec<String> = forks.iter().map(ToString::to_string).collect();
            output.info(&format!("Forked into: {}", forks.join(", ")));
        }
        Ok(())
    }
}
