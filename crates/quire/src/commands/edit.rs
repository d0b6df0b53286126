//! `quire edit` command implementation.

use clap::Args;
use quire_storage::{DocumentationId, UserId};
use quire_versions::EditDocumentation;

use super::{DisplayArgs, GlobalArgs, connect};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the edit command.
///
/// Omitted fields keep their current value.
#[derive(Args)]
pub(crate) struct EditArgs {
    /// Documentation ID.
    id: i64,

    /// ID of the editing user.
    #[arg(long)]
    editor: i64,

    /// New name.
    #[arg(long)]
    name: Option<String>,

    /// New description.
    #[arg(long)]
    description: Option<String>,

    /// New version label (applies to this documentation only).
    #[arg(long)]
    version: Option<String>,

    #[command(flatten)]
    display: DisplayArgs,
}

impl EditArgs {
    pub(crate) async fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let service = connect(global).await?;
        let id = DocumentationId(self.id);

        let current = service.get_documentation(id).await?;
        let edit = EditDocumentation {
            name: self.name.unwrap_or(current.name),
            description: self.description.unwrap_or(current.description),
            version: self.version.unwrap_or_default(),
            display: self.display.apply_to(&current.display),
        };
        service
            .edit_documentation(UserId(self.editor), id, &edit)
            .await?;

        output.success(&format!("Updated documentation {id}"));
        Ok(())
    }
}
