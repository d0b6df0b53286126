//! `quire create` command implementation.

use clap::Args;
use quire_storage::{DisplayMetadata, UserId};
use quire_versions::CreateDocumentation;

use super::{DisplayArgs, GlobalArgs, connect};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the create command.
#[derive(Args)]
pub(crate) struct CreateArgs {
    /// Documentation name (unique among root versions).
    #[arg(long)]
    name: String,

    /// Short description.
    #[arg(long, default_value = "")]
    description: String,

    /// Version label.
    #[arg(long, default_value = "")]
    version: String,

    /// ID of the creating user.
    #[arg(long)]
    author: i64,

    #[command(flatten)]
    display: DisplayArgs,
}

impl CreateArgs {
    pub(crate) async fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let service = connect(global).await?;

        let documentation = CreateDocumentation {
            name: self.name,
            description: self.description,
            version: self.version,
            display: self.display.apply_to(&DisplayMetadata::default()),
        };
        let id = service
            .create_documentation(&documentation, UserId(self.author))
            .await?;

        output.success(&format!(
            "Created documentation {id} ({})",
            documentation.name
        ));
        Ok(())
    }
}
