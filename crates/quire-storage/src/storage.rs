//! Storage traits and error types.
//!
//! [`Storage`] hands out reads and opens [`Transaction`]s. Every write goes
//! through a transaction value the caller owns and passes by `&mut` into each
//! call; nothing is committed until [`Transaction::commit`] succeeds, and
//! dropping a transaction without committing discards its writes.

use crate::model::{
    Associations, Documentation, DocumentationId, EntityKind, EntityRef, NewDocumentation,
    NewPage, NewPageGroup, NewUser, PageGroupId, PageId, UserId,
};

/// Semantic error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Entity does not exist.
    NotFound,
    /// A uniqueness constraint rejected the write.
    AlreadyExists,
    /// Backend is temporarily unavailable (pool closed, busy, I/O).
    Unavailable,
    /// Other/unknown error category.
    Other,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    kind: StorageErrorKind,
    entity: Option<EntityKind>,
    id: Option<i64>,
    backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            entity: None,
            id: None,
            backend: None,
            source: None,
        }
    }

    /// Attach the entity kind the failed operation concerned.
    #[must_use]
    pub fn with_entity(mut self, entity: EntityKind) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Attach the id of the entity concerned.
    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Attach a plain message as the error source.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message: String = message.into();
        self.source = Some(message.into());
        self
    }

    /// Create a not found error for an entity.
    #[must_use]
    pub fn not_found(entity: EntityKind, id: i64) -> Self {
        Self::new(StorageErrorKind::NotFound)
            .with_entity(entity)
            .with_id(id)
    }

    /// Semantic error category.
    #[must_use]
    pub fn kind(&self) -> StorageErrorKind {
        self.kind
    }

    /// Entity kind the failed operation concerned.
    #[must_use]
    pub fn entity(&self) -> Option<EntityKind> {
        self.entity
    }

    /// Id of the entity concerned.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Backend identifier (e.g., "Sqlite", "Memory").
    #[must_use]
    pub fn backend(&self) -> Option<&'static str> {
        self.backend
    }

    /// Whether this error reports a missing entity.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == StorageErrorKind::NotFound
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (page group 12)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::AlreadyExists => "Already exists",
            StorageErrorKind::Unavailable => "Unavailable",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        match (self.entity, self.id) {
            (Some(entity), Some(id)) => write!(f, " ({entity} {id})")?,
            (Some(entity), None) => write!(f, " ({entity})")?,
            (None, Some(id)) => write!(f, " (id {id})")?,
            (None, None) => {}
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Read access to persisted documentations and the entry point for writes.
#[allow(async_fn_in_trait)]
pub trait Storage: Send + Sync {
    /// Transaction type handed out by [`Storage::begin`].
    type Transaction: Transaction;

    /// Open a transaction.
    async fn begin(&self) -> Result<Self::Transaction, StorageError>;

    /// Load one documentation with the requested associations.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageErrorKind::NotFound`] error if no documentation has
    /// this id.
    async fn load_documentation(
        &self,
        id: DocumentationId,
        associations: Associations,
    ) -> Result<Documentation, StorageError>;

    /// Load every documentation, ordered by id.
    async fn load_documentations(
        &self,
        associations: Associations,
    ) -> Result<Vec<Documentation>, StorageError>;

    /// Register a user that can be referenced as author or editor.
    async fn create_user(&self, user: &NewUser) -> Result<UserId, StorageError>;
}

/// A unit of writes that becomes visible atomically on commit.
#[allow(async_fn_in_trait)]
pub trait Transaction: Send {
    /// Load one documentation as seen inside this transaction.
    async fn load_documentation(
        &mut self,
        id: DocumentationId,
        associations: Associations,
    ) -> Result<Documentation, StorageError>;

    /// Load the documentations adjacent to `id` in its version lineage:
    /// its source (`cloned_from`) and its direct forks.
    async fn load_version_neighbours(
        &mut self,
        id: DocumentationId,
        cloned_from: Option<DocumentationId>,
        associations: Associations,
    ) -> Result<Vec<Documentation>, StorageError>;

    /// Whether a root version already uses `name`.
    async fn root_name_taken(&mut self, name: &str) -> Result<bool, StorageError>;

    /// Insert a documentation row and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorKind::AlreadyExists`] if the row is a root version
    /// whose name another root already uses.
    async fn create_documentation(
        &mut self,
        documentation: &NewDocumentation,
    ) -> Result<DocumentationId, StorageError>;

    /// Save the scalar fields of a documentation (associations are ignored).
    async fn update_documentation(
        &mut self,
        documentation: &Documentation,
    ) -> Result<(), StorageError>;

    /// Delete a documentation row. Its pages, page groups and editors must
    /// already be gone.
    async fn delete_documentation(&mut self, id: DocumentationId) -> Result<(), StorageError>;

    /// Insert a page group row and return its id.
    async fn create_page_group(&mut self, group: &NewPageGroup)
    -> Result<PageGroupId, StorageError>;

    /// Replace the parent link of a page group.
    async fn set_page_group_parent(
        &mut self,
        id: PageGroupId,
        parent_id: Option<PageGroupId>,
    ) -> Result<(), StorageError>;

    /// Delete every page group of a documentation. Groups elsewhere that
    /// pointed at a deleted group lose their parent.
    async fn delete_page_groups(&mut self, documentation: DocumentationId)
    -> Result<(), StorageError>;

    /// Insert a page row and return its id.
    async fn create_page(&mut self, page: &NewPage) -> Result<PageId, StorageError>;

    /// Delete every page of a documentation.
    async fn delete_pages(&mut self, documentation: DocumentationId) -> Result<(), StorageError>;

    /// Add a user to an entity's editors. Appending an existing editor is a
    /// no-op.
    async fn append_editor(&mut self, entity: EntityRef, user: UserId)
    -> Result<(), StorageError>;

    /// Remove every editor of an entity.
    async fn clear_editors(&mut self, entity: EntityRef) -> Result<(), StorageError>;

    /// Make every write of this transaction visible.
    async fn commit(self) -> Result<(), StorageError>;

    /// Discard every write of this transaction.
    async fn rollback(self) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_new() {
        let err = StorageError::new(StorageErrorKind::Other);

        assert_eq!(err.kind(), StorageErrorKind::Other);
        assert!(err.entity().is_none());
        assert!(err.id().is_none());
        assert!(err.backend().is_none());
    }

    #[test]
    fn test_storage_error_not_found() {
        let err = StorageError::not_found(EntityKind::PageGroup, 12);

        assert!(err.is_not_found());
        assert_eq!(err.entity(), Some(EntityKind::PageGroup));
        assert_eq!(err.id(), Some(12));
    }

    #[test]
    fn test_storage_error_with_source() {
        let io_err = std::io::Error::other("disk full");
        let err = StorageError::new(StorageErrorKind::Unavailable).with_source(io_err);

        assert!(err.downcast_source::<std::io::Error>().is_some());
    }

    #[test]
    fn test_storage_error_display_simple() {
        let err = StorageError::new(StorageErrorKind::NotFound);

        assert_eq!(err.to_string(), "Not found");
    }

    #[test]
    fn test_storage_error_display_full() {
        let err = StorageError::not_found(EntityKind::Documentation, 3)
            .with_backend("Sqlite")
            .with_message("no rows");

        assert_eq!(
            err.to_string(),
            "[Sqlite] Not found: no rows (documentation 3)"
        );
    }

    #[test]
    fn test_storage_error_display_entity_without_id() {
        let err = StorageError::new(StorageErrorKind::AlreadyExists)
            .with_entity(EntityKind::Documentation)
            .with_backend("Memory");

        assert_eq!(err.to_string(), "[Memory] Already exists (documentation)");
    }

    #[test]
    fn test_storage_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StorageError>();
    }
}
