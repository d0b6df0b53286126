//! Documentation operations over a [`Storage`] backend.
//!
//! [`DocumentationService`] bundles the storage, the site hook and the
//! ancestry limits, and exposes the operations the CLI drives: reading,
//! creating, editing and deleting documentations, and forking versions.

use quire_storage::{
    Associations, DisplayMetadata, Documentation, DocumentationId, EntityKind, EntityRef,
    NewDocumentation, NewPage, Storage, StorageError, StorageErrorKind, Transaction, UserId,
};
use serde_json::json;
use uuid::Uuid;

use crate::ancestry::{AncestryLimits, resolve_ancestors};
use crate::cloner::ClonedTree;
use crate::error::{Error, Step};
use crate::fork::create_documentation_version;
use crate::site::{NoopSiteHook, SiteHook};

/// Editors only, as needed by edits.
const EDITORS: Associations = Associations {
    editors: true,
    ..Associations::NONE
};

/// Pages and groups without bodies, as needed by deletes.
const TREE: Associations = Associations {
    page_groups: true,
    pages: true,
    ..Associations::NONE
};

/// Fields of a documentation to create.
#[derive(Debug, Clone, Default)]
pub struct CreateDocumentation {
    pub name: String,
    pub description: String,
    pub version: String,
    pub display: DisplayMetadata,
}

/// New field values applied by an edit.
///
/// An empty `version` leaves the version label unchanged.
#[derive(Debug, Clone, Default)]
pub struct EditDocumentation {
    pub name: String,
    pub description: String,
    pub version: String,
    pub display: DisplayMetadata,
}

/// Block document for the introduction page of a new documentation.
fn intro_page_content(name: &str) -> String {
    let props = json!({
        "textColor": "default",
        "backgroundColor": "default",
        "textAlignment": "left",
    });
    json!([
        {
            "id": Uuid::new_v4(),
            "type": "paragraph",
            "props": props.clone(),
            "content": [
                {
                    "type": "text",
                    "text": format!("Welcome to the {name} documentation!"),
                    "styles": {},
                }
            ],
            "children": [],
        },
        {
            "id": Uuid::new_v4(),
            "type": "paragraph",
            "props": props,
            "content": [],
            "children": [],
        },
    ])
    .to_string()
}

/// Map a uniqueness violation on a documentation write to `Conflict`.
fn name_conflict(name: &str, step: Step) -> impl FnOnce(StorageError) -> Error + '_ {
    move |source| {
        if source.kind() == StorageErrorKind::AlreadyExists {
            Error::Conflict {
                name: name.to_owned(),
            }
        } else {
            Error::Persistence { step, source }
        }
    }
}

/// Documentation operations.
#[derive(Debug)]
pub struct DocumentationService<S, H = NoopSiteHook> {
    storage: S,
    site_hook: H,
    limits: AncestryLimits,
}

impl<S: Storage> DocumentationService<S> {
    /// Create a service without a site hook.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            site_hook: NoopSiteHook,
            limits: AncestryLimits::default(),
        }
    }
}

impl<S: Storage, H: SiteHook> DocumentationService<S, H> {
    /// Replace the site hook run after creation.
    #[must_use]
    pub fn with_site_hook<H2: SiteHook>(self, site_hook: H2) -> DocumentationService<S, H2> {
        DocumentationService {
            storage: self.storage,
            site_hook,
            limits: self.limits,
        }
    }

    /// Set the bounds for ancestry walks.
    #[must_use]
    pub fn with_limits(mut self, limits: AncestryLimits) -> Self {
        self.limits = limits;
        self
    }

    /// The underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Load one documentation with its tree and editors, without page bodies.
    pub async fn get_documentation(&self, id: DocumentationId) -> Result<Documentation, Error> {
        self.storage
            .load_documentation(id, Associations::DISPLAY)
            .await
            .map_err(Error::loading(id))
    }

    /// Load every documentation with its tree and editors, without page bodies.
    pub async fn get_documentations(&self) -> Result<Vec<Documentation>, Error> {
        self.storage
            .load_documentations(Associations::DISPLAY)
            .await
            .map_err(Error::at(Step::LoadDocumentation))
    }

    /// Ids of the documentations forked directly from `id`.
    pub async fn children_of_documentation(
        &self,
        id: DocumentationId,
    ) -> Result<Vec<DocumentationId>, Error> {
        let documentations = self
            .storage
            .load_documentations(Associations::NONE)
            .await
            .map_err(Error::at(Step::LoadDocumentation))?;
        Ok(documentations
            .into_iter()
            .filter(|documentation| documentation.cloned_from == Some(id))
            .map(|documentation| documentation.id)
            .collect())
    }

    /// Ancestors of `id`, nearest first.
    pub async fn ancestors(&self, id: DocumentationId) -> Result<Vec<Documentation>, Error> {
        resolve_ancestors(&self.storage, id, self.limits).await
    }

    /// Create a root documentation authored by `user` with an introduction
    /// page, then run the site hook.
    ///
    /// If the hook fails the documentation is deleted again.
    pub async fn create_documentation(
        &self,
        documentation: &CreateDocumentation,
        user: UserId,
    ) -> Result<DocumentationId, Error> {
        let name = documentation.name.as_str();
        let mut tx = self
            .storage
            .begin()
            .await
            .map_err(Error::at(Step::BeginTransaction))?;

        if tx
            .root_name_taken(name)
            .await
            .map_err(Error::at(Step::CheckName))?
        {
            return Err(Error::Conflict {
                name: name.to_owned(),
            });
        }

        let id = tx
            .create_documentation(&NewDocumentation {
                name: documentation.name.clone(),
                description: documentation.description.clone(),
                version: documentation.version.clone(),
                cloned_from: None,
                author_id: user,
                last_editor_id: Some(user),
                display: documentation.display.clone(),
            })
            .await
            .map_err(name_conflict(name, Step::CreateDocumentation))?;
        tx.append_editor(EntityRef::Documentation(id), user)
            .await
            .map_err(Error::at(Step::AddEditor))?;

        let page = tx
            .create_page(&NewPage {
                documentation_id: id,
                page_group_id: None,
                title: "Introduction".to_owned(),
                slug: "/".to_owned(),
                content: intro_page_content(name),
                order: Some(0),
                author_id: user,
                last_editor_id: Some(user),
            })
            .await
            .map_err(Error::at(Step::CreatePage))?;
        tx.append_editor(EntityRef::Page(page), user)
            .await
            .map_err(Error::at(Step::AddEditor))?;

        tx.commit()
            .await
            .map_err(name_conflict(name, Step::Commit))?;

        if let Err(err) = self.site_hook.init_site(id).await {
            tracing::error!(documentation = %id, error = %err, "Failed to initialise site");
            if let Err(cleanup) = self.delete_documentation(id).await {
                tracing::warn!(
                    documentation = %id,
                    error = %cleanup,
                    "Failed to remove documentation"
                );
            }
            return Err(Error::SiteHook {
                id,
                message: err.to_string(),
            });
        }

        tracing::info!(documentation = %id, name, "Created documentation");
        Ok(id)
    }

    /// Apply `edit` to documentation `id` and to the documentations adjacent
    /// to it in its version lineage, recording `user` as editor of each.
    ///
    /// The version label is only changed on `id` itself.
    pub async fn edit_documentation(
        &self,
        user: UserId,
        id: DocumentationId,
        edit: &EditDocumentation,
    ) -> Result<(), Error> {
        let mut tx = self
            .storage
            .begin()
            .await
            .map_err(Error::at(Step::BeginTransaction))?;

        let target = tx
            .load_documentation(id, EDITORS)
            .await
            .map_err(Error::loading(id))?;
        let related = tx
            .load_version_neighbours(id, target.cloned_from, EDITORS)
            .await
            .map_err(Error::at(Step::LoadRelated))?;

        let count = related.len();
        apply_edit(&mut tx, target, user, edit, true).await?;
        for documentation in related {
            apply_edit(&mut tx, documentation, user, edit, false).await?;
        }

        tx.commit()
            .await
            .map_err(name_conflict(&edit.name, Step::Commit))?;
        tracing::info!(documentation = %id, related = count, "Edited documentation");
        Ok(())
    }

    /// Delete documentation `id` with its pages, page groups and editor
    /// links.
    ///
    /// Forks of `id` keep their `cloned_from` link.
    pub async fn delete_documentation(&self, id: DocumentationId) -> Result<(), Error> {
        let mut tx = self
            .storage
            .begin()
            .await
            .map_err(Error::at(Step::BeginTransaction))?;

        let documentation = tx
            .load_documentation(id, TREE)
            .await
            .map_err(Error::loading(id))?;

        let pages = documentation
            .page_groups
            .iter()
            .flat_map(|group| &group.pages)
            .chain(&documentation.pages);
        for page in pages {
            tx.clear_editors(EntityRef::Page(page.id))
                .await
                .map_err(Error::at(Step::ClearEditors))?;
        }
        for group in &documentation.page_groups {
            tx.clear_editors(EntityRef::PageGroup(group.id))
                .await
                .map_err(Error::at(Step::ClearEditors))?;
        }
        tx.clear_editors(EntityRef::Documentation(id))
            .await
            .map_err(Error::at(Step::ClearEditors))?;

        tx.delete_pages(id)
            .await
            .map_err(Error::at(Step::DeletePages))?;
        tx.delete_page_groups(id)
            .await
            .map_err(Error::at(Step::DeletePageGroups))?;
        tx.delete_documentation(id)
            .await
            .map_err(Error::at(Step::DeleteDocumentation))?;

        tx.commit().await.map_err(Error::at(Step::Commit))?;
        tracing::info!(documentation = %id, "Deleted documentation");
        Ok(())
    }

    /// Fork documentation `id` into a new version labelled `version`.
    pub async fn create_documentation_version(
        &self,
        id: DocumentationId,
        version: &str,
    ) -> Result<ClonedTree, Error> {
        create_documentation_version(&self.storage, id, version, self.limits).await
    }
}

async fn apply_edit<T: Transaction>(
    tx: &mut T,
    mut documentation: Documentation,
    user: UserId,
    edit: &EditDocumentation,
    is_target: bool,
) -> Result<(), Error> {
    documentation.last_editor_id = Some(user);
    documentation.name.clone_from(&edit.name);
    documentation.description.clone_from(&edit.description);
    documentation.display.clone_from(&edit.display);
    if is_target && !edit.version.is_empty() {
        documentation.version.clone_from(&edit.version);
    }

    tx.update_documentation(&documentation)
        .await
        .map_err(name_conflict(&edit.name, Step::UpdateDocumentation))?;

    if !documentation.editors.iter().any(|editor| editor.id == user) {
        tx.append_editor(EntityRef::Documentation(documentation.id), user)
            .await
            .map_err(|source| match source.entity() {
                Some(EntityKind::User) if source.is_not_found() => Error::NotFound {
                    entity: EntityKind::User,
                    id: user.0,
                },
                _ => Error::Persistence {
                    step: Step::AddEditor,
                    source,
                },
            })?;
    }
    Ok(())
}
