//! Quire CLI - versioned documentation trees.
//!
//! Provides commands for:
//! - `init`: Create the database
//! - `list`, `show`, `ancestry`: Inspect documentations
//! - `create`, `edit`, `delete`: Manage documentations
//! - `fork`: Fork a documentation into a new version
//! - `user add`: Register a user that can author and edit

mod commands;
mod error;
mod output;
mod site;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{
    AncestryArgs, CreateArgs, DeleteArgs, EditArgs, ForkArgs, GlobalArgs, ListArgs,
    ShowArgs, UserCommand,
};
use error::CliError;
use output::Output;

/// Quire - versioned documentation trees.
#[derive(Parser)]
#[command(name = "quire", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and apply the schema.
    Init,
    /// List documentations.
    List(ListArgs),
    /// Show one documentation with its page groups and pages.
    Show(ShowArgs),
    /// Show the versions a documentation was forked from.
    Ancestry(AncestryArgs),
    /// Create a root documentation.
    Create(CreateArgs),
    /// Edit a documentation and the versions next to it.
    Edit(EditArgs),
    /// Delete a documentation.
    Delete(DeleteArgs),
    /// Fork a documentation into a new version.
    Fork(ForkArgs),
    /// User commands.
    #[command(subcommand)]
    User(UserCommand),
}

impl Commands {
    async fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        match self {
            Self::Init => commands::init::execute(global).await,
            Self::List(args) => args.execute(global).await,
            Self::Show(args) => args.execute(global).await,
            Self::Ancestry(args) => args.execute(global).await,
            Self::Create(args) => args.execute(global).await,
            Self::Edit(args) => args.execute(global).await,
            Self::Delete(args) => args.execute(global).await,
            Self::Fork(args) => args.execute(global).await,
            Self::User(cmd) => cmd.execute(global).await,
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(cli.command.execute(&cli.global))
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.global.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
