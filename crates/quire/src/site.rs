//! Site hook that runs the configured `site.init_command`.

use quire_config::SiteConfig;
use quire_storage::DocumentationId;
use quire_versions::{SiteHook, SiteHookError};
use tokio::process::Command;

/// Placeholder replaced with the documentation id in every argument.
const ID_PLACEHOLDER: &str = "{id}";

/// Runs an external command after a documentation is created.
///
/// Without a configured command the hook succeeds immediately.
#[derive(Debug, Clone, Default)]
pub(crate) struct CommandSiteHook {
    argv: Option<Vec<String>>,
}

impl CommandSiteHook {
    pub(crate) fn from_config(site: &SiteConfig) -> Self {
        Self {
            argv: site.init_command.clone(),
        }
    }

    fn command_line(&self, id: DocumentationId) -> Option<Vec<String>> {
        let id = id.to_string();
        self.argv.as_ref().map(|argv| {
            argv.iter()
                .map(|arg| arg.replace(ID_PLACEHOLDER, &id))
                .collect()
        })
    }
}

impl SiteHook for CommandSiteHook {
    async fn init_site(&self, id: DocumentationId) -> Result<(), SiteHookError> {
        let Some(argv) = self.command_line(id) else {
            return Ok(());
        };
        let (program, args) = argv
            .split_first()
            .ok_or("site.init_command is empty")?;

        tracing::info!(documentation = %id, program, "Running site init command");
        let status = Command::new(program).args(args).status().await?;
        if !status.success() {
            return Err(format!("{program} exited with {status}").into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn hook(argv: &[&str]) -> CommandSiteHook {
        CommandSiteHook::from_config(&SiteConfig {
            init_command: Some(argv.iter().map(|arg| (*arg).to_owned()).collect()),
        })
    }

    #[test]
    fn test_command_line_substitutes_id() {
        let hook = hook(&["site-init", "--doc={id}", "docs/{id}/site"]);

        assert_eq!(
            hook.command_line(DocumentationId(12)),
            Some(vec![
                "site-init".to_owned(),
                "--doc=12".to_owned(),
                "docs/12/site".to_owned(),
            ])
        );
    }

    #[test]
    fn test_command_line_without_command() {
        let hook = CommandSiteHook::from_config(&SiteConfig::default());

        assert_eq!(hook.command_line(DocumentationId(1)), None);
    }

    #[tokio::test]
    async fn test_unconfigured_hook_succeeds() {
        let hook = CommandSiteHook::default();

        assert!(hook.init_site(DocumentationId(1)).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_receives_id() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("site-{id}");
        let hook = hook(&["touch", marker.to_str().unwrap()]);

        hook.init_site(DocumentationId(7)).await.unwrap();

        assert!(dir.path().join("site-7").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_is_reported() {
        let hook = hook(&["sh", "-c", "exit 3"]);

        let err = hook.init_site(DocumentationId(7)).await.unwrap_err();

        assert!(err.to_string().starts_with("sh exited with"));
    }
}
