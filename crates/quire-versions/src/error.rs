//! Error types for documentation operations.

use std::fmt;

use quire_storage::{DocumentationId, EntityKind, StorageError, StorageErrorKind};

/// Storage step an operation was performing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    BeginTransaction,
    LoadDocumentation,
    LoadRelated,
    CheckName,
    CreateDocumentation,
    UpdateDocumentation,
    DeleteDocumentation,
    AddEditor,
    ClearEditors,
    CreatePageGroup,
    ReparentPageGroup,
    DeletePageGroups,
    CreatePage,
    DeletePages,
    Commit,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BeginTransaction => "begin transaction",
            Self::LoadDocumentation => "load documentation",
            Self::LoadRelated => "load related documentations",
            Self::CheckName => "check documentation name",
            Self::CreateDocumentation => "create documentation",
            Self::UpdateDocumentation => "update documentation",
            Self::DeleteDocumentation => "delete documentation",
            Self::AddEditor => "add editor",
            Self::ClearEditors => "clear editors",
            Self::CreatePageGroup => "create page group",
            Self::ReparentPageGroup => "update page group parent",
            Self::DeletePageGroups => "delete page groups",
            Self::CreatePage => "create page",
            Self::DeletePages => "delete pages",
            Self::Commit => "commit transaction",
        })
    }
}

/// Error returned by documentation operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: i64 },

    /// Another root documentation already uses this name.
    #[error("Documentation name already exists: {name}")]
    Conflict { name: String },

    /// A storage operation failed.
    #[error("Failed to {step}: {source}")]
    Persistence {
        step: Step,
        #[source]
        source: StorageError,
    },

    /// Loading an ancestor failed for a reason other than absence.
    #[error("Failed to resolve ancestry at documentation {id}: {source}")]
    AncestryWalk {
        id: DocumentationId,
        #[source]
        source: StorageError,
    },

    /// The `cloned_from` chain revisits a documentation.
    #[error("Ancestry cycle detected at documentation {id}")]
    CycleDetected { id: DocumentationId },

    /// The `cloned_from` chain is longer than the configured limit.
    #[error("Ancestry of documentation {id} exceeds {limit} levels")]
    AncestryTooDeep { id: DocumentationId, limit: usize },

    /// The site hook rejected a newly created documentation.
    #[error("Site initialisation failed for documentation {id}: {message}")]
    SiteHook { id: DocumentationId, message: String },
}

impl Error {
    /// Wrap a storage error with the step that produced it.
    pub(crate) fn at(step: Step) -> impl FnOnce(StorageError) -> Self {
        move |source| Self::Persistence { step, source }
    }

    /// Like [`Error::at`], but report a missing documentation as `NotFound`.
    pub(crate) fn loading(id: DocumentationId) -> impl FnOnce(StorageError) -> Self {
        move |source| {
            if source.kind() == StorageErrorKind::NotFound
                && source.entity() == Some(EntityKind::Documentation)
            {
                Self::NotFound {
                    entity: EntityKind::Documentation,
                    id: id.0,
                }
            } else {
                Self::Persistence {
                    step: Step::LoadDocumentation,
                    source,
                }
            }
        }
    }

    /// Whether this error reports a missing entity.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_display_names_step() {
        let err = Error::at(Step::CreatePage)(
            StorageError::new(StorageErrorKind::Unavailable).with_message("pool closed"),
        );

        assert_eq!(err.to_string(), "Failed to create page: Unavailable: pool closed");
    }

    #[test]
    fn test_loading_maps_missing_documentation() {
        let err = Error::loading(DocumentationId(4))(StorageError::not_found(
            EntityKind::Documentation,
            4,
        ));

        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "documentation 4 not found");
    }

    #[test]
    fn test_loading_keeps_other_failures() {
        let err = Error::loading(DocumentationId(4))(StorageError::new(StorageErrorKind::Other));

        assert!(matches!(
            err,
            Error::Persistence {
                step: Step::LoadDocumentation,
                ..
            }
        ));
    }
}
