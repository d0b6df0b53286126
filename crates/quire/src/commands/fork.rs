//! `quire fork` command implementation.

use clap::Args;
use quire_storage::DocumentationId;
use quire_versions::ParentLink;

use super::{GlobalArgs, connect};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the fork command.
#[derive(Args)]
pub(crate) struct ForkArgs {
    /// ID of the documentation to fork.
    id: i64,

    /// Version label of the new documentation.
    #[arg(long)]
    version: String,
}

impl ForkArgs {
    pub(crate) async fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let service = connect(global).await?;

        let tree = service
            .create_documentation_version(DocumentationId(self.id), &self.version)
            .await?;

        output.success(&format!(
            "Created version {} as documentation {}",
            self.version, tree.documentation_id
        ));
        output.info(&format!(
            "Copied {} page group(s) and {} page(s)",
            tree.page_groups.len(),
            tree.pages
        ));
        for (group, link) in &tree.parent_links {
            let detail = match link {
                ParentLink::Detached => "detached from its parent".to_owned(),
                ParentLink::RemappedTo(parent) => format!("nested under copied group {parent}"),
                ParentLink::LinkedToAncestor(parent) => {
                    format!("still nested under ancestor group {parent}")
                }
            };
            output.info(&output.detail(&format!("  group {group}: {detail}")));
        }
        Ok(())
    }
}
