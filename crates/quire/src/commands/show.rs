//! `quire show` command implementation.

use std::collections::{HashMap, HashSet};

use clap::Args;
use quire_storage::{Documentation, DocumentationId, Page, PageGroup, PageGroupId};

use super::{GlobalArgs, connect};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the show command.
#[derive(Args)]
pub(crate) struct ShowArgs {
    /// Documentation ID.
    id: i64,

    /// Print the documentation as JSON.
    #[arg(long)]
    json: bool,
}

impl ShowArgs {
    pub(crate) async fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let service = connect(global).await?;

        let documentation = service
            .get_documentation(DocumentationId(self.id))
            .await?;

        if self.json {
            output.data(&serde_json::to_string_pretty(&documentation)?);
        } else {
            print_documentation(&output, &documentation);
        }
        Ok(())
    }
}

fn print_documentation(output: &Output, documentation: &Documentation) {
    output.highlight(&format!(
        "{} {} (documentation {})",
        documentation.name, documentation.version, documentation.id
    ));
    if !documentation.description.is_empty() {
        output.info(&documentation.description);
    }
    if let Some(source) = documentation.cloned_from {
        output.info(&format!("Forked from: {source}"));
    }
    let editors: Vec<&str> = documentation
        .editors
        .iter()
        .map(|editor| editor.username.as_str())
        .collect();
    output.info(&format!("Editors: {}", editors.join(", ")));
    output.separator();

    let local: HashSet<PageGroupId> = documentation.page_groups.iter().map(|g| g.id).collect();
    let mut children: HashMap<Option<PageGroupId>, Vec<&PageGroup>> = HashMap::new();
    for group in &documentation.page_groups {
        let parent = group.parent_id.filter(|parent| local.contains(parent));
        children.entry(parent).or_default().push(group);
    }

    let mut visited = HashSet::new();
    for group in children.get(&None).into_iter().flatten() {
        print_group(output, group, &children, &mut visited, 0);
    }
    for page in &documentation.pages {
        print_page(output, page, 0);
    }
}

fn print_group(
    output: &Output,
    group: &PageGroup,
    children: &HashMap<Option<PageGroupId>, Vec<&PageGroup>>,
    visited: &mut HashSet<PageGroupId>,
    depth: usize,
) {
    if !visited.insert(group.id) {
        return;
    }
    let indent = "  ".repeat(depth);
    let link = group
        .parent_id
        .filter(|_| depth == 0)
        .map(|parent| output.detail(&format!("  (under ancestor group {parent})")))
        .unwrap_or_default();
    output.data(&format!("{indent}[{}] {}{link}", group.id, group.name));

    for child in children.get(&Some(group.id)).into_iter().flatten() {
        print_group(output, child, children, visited, depth + 1);
    }
    for page in &group.pages {
        print_page(output, page, depth + 1);
    }
}

fn print_page(output: &Output, page: &Page, depth: usize) {
    output.data(&format!(
        "{}{} {}",
        "  ".repeat(depth),
        page.title,
        output.detail(&page.slug)
    ));
}
