//! CLI command implementations.

mod ancestry;
mod create;
mod delete;
mod edit;
mod fork;
pub(crate) mod init;
mod list;
mod show;
mod user;

use std::path::PathBuf;

use clap::Args;
use quire_config::{CliSettings, Config};
use quire_storage::{DisplayMetadata, SqliteStorage};
use quire_versions::{AncestryLimits, DocumentationService};

use crate::error::CliError;
use crate::site::CommandSiteHook;

pub(crate) use ancestry::AncestryArgs;
pub(crate) use create::CreateArgs;
pub(crate) use delete::DeleteArgs;
pub(crate) use edit::EditArgs;
pub(crate) use fork::ForkArgs;
pub(crate) use list::ListArgs;
pub(crate) use show::ShowArgs;
pub(crate) use user::UserCommand;

/// Options shared by every command.
#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides config).
    #[arg(long, global = true, env = "QUIRE_DATABASE")]
    database: Option<PathBuf>,

    /// Maximum number of ancestors followed when forking (overrides config).
    #[arg(long, global = true, env = "QUIRE_MAX_ANCESTRY_DEPTH")]
    max_ancestry_depth: Option<usize>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    /// Load the configuration with command-line overrides applied.
    fn load_config(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            database_path: self.database.clone(),
            max_ancestry_depth: self.max_ancestry_depth,
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}

type Service = DocumentationService<SqliteStorage, CommandSiteHook>;

/// Open the configured database and build the documentation service.
async fn connect(global: &GlobalArgs) -> Result<Service, CliError> {
    let config = global.load_config()?;
    let database = &config.database_resolved;
    let storage = SqliteStorage::open(&database.path, database.max_connections).await?;

    Ok(DocumentationService::new(storage)
        .with_site_hook(CommandSiteHook::from_config(&config.site))
        .with_limits(AncestryLimits {
            max_depth: config.versions.max_ancestry_depth,
        }))
}

/// Display metadata flags shared by `create` and `edit`.
#[derive(Args, Default)]
pub(crate) struct DisplayArgs {
    /// Favicon URL.
    #[arg(long)]
    favicon: Option<String>,

    /// Social preview image URL.
    #[arg(long)]
    meta_image: Option<String>,

    /// Navigation bar logo URL.
    #[arg(long)]
    nav_image: Option<String>,

    /// Custom CSS.
    #[arg(long)]
    custom_css: Option<String>,

    /// Footer links (JSON).
    #[arg(long)]
    footer_label_links: Option<String>,

    /// "More" menu links (JSON).
    #[arg(long)]
    more_label_links: Option<String>,

    /// Copyright notice.
    #[arg(long)]
    copyright_text: Option<String>,
}

impl DisplayArgs {
    /// Overlay the given flags on `base`.
    fn apply_to(self, base: &DisplayMetadata) -> DisplayMetadata {
        DisplayMetadata {
            favicon: self.favicon.unwrap_or_else(|| base.favicon.clone()),
            meta_image: self.meta_image.unwrap_or_else(|| base.meta_image.clone()),
            nav_image: self.nav_image.unwrap_or_else(|| base.nav_image.clone()),
            custom_css: self.custom_css.unwrap_or_else(|| base.custom_css.clone()),
            footer_label_links: self
                .footer_label_links
                .unwrap_or_else(|| base.footer_label_links.clone()),
            more_label_links: self
                .more_label_links
                .unwrap_or_else(|| base.more_label_links.clone()),
            copyright_text: self
                .copyright_text
                .unwrap_or_else(|| base.copyright_text.clone()),
        }
    }
}
