//! `quire user` subcommand group.

use clap::{Args, Subcommand};
use quire_storage::{NewUser, Storage};

use super::{GlobalArgs, connect};
use crate::error::CliError;
use crate::output::Output;

/// User commands.
#[derive(Subcommand)]
pub(crate) enum UserCommand {
    /// Register a user.
    Add(AddArgs),
}

impl UserCommand {
    /// Execute the user subcommand.
    pub(crate) async fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        match self {
            Self::Add(args) => args.execute(global).await,
        }
    }
}

/// Arguments for the user add command.
#[derive(Args)]
pub(crate) struct AddArgs {
    /// Unique username.
    #[arg(long)]
    username: String,

    /// Email address.
    #[arg(long)]
    email: String,

    /// Avatar URL.
    #[arg(long, default_value = "")]
    photo: String,
}

impl AddArgs {
    async fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let service = connect(global).await?;

        let id = service
            .storage()
            .create_user(&NewUser {
                username: self.username,
                email: self.email,
                photo: self.photo,
            })
            .await?;

        output.success(&format!("Created user {id}"));
        Ok(())
    }
}
