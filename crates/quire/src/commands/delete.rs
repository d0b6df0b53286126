//! `quire delete` command implementation.

use clap::Args;
use quire_storage::DocumentationId;

use super::{GlobalArgs, connect};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the delete command.
#[derive(Args)]
pub(crate) struct DeleteArgs {
    /// Documentation ID.
    id: i64,
}

impl DeleteArgs {
    pub(crate) async fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let service = connect(global).await?;
        let id = DocumentationId(self.id);

        let forks = service.children_of_documentation(id).await?;
        service.delete_documentation(id).await?;

        output.success(&format!("Deleted documentation {id}"));
        if !forks.is_empty() {
            let forks: Vec<String> = forks.iter().map(ToString::to_string).collect();
            output.warning(&format!(
                "Forks {} still name {id} as their source and are now root-less.",
                forks.join(", ")
            ));
        }
        Ok(())
    }
}
