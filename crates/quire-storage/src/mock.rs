//! Mock storage implementation for testing.
//!
//! Provides [`MockStorage`], an in-memory backend with the same constraints
//! as the SQLite schema, plus failure injection for exercising rollback paths.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::model::{
    Associations, Documentation, DocumentationId, EntityKind, EntityRef, NewDocumentation,
    NewPage, NewPageGroup, NewUser, Page, PageGroup, PageGroupId, PageId, UserId, UserSummary,
    order_key,
};
use crate::storage::{Storage, StorageError, StorageErrorKind, Transaction};

const BACKEND: &str = "Memory";

/// Storage operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Begin,
    LoadDocumentation,
    CreateDocumentation,
    UpdateDocumentation,
    DeleteDocumentation,
    CreatePageGroup,
    SetPageGroupParent,
    CreatePage,
    AppendEditor,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    last_id: i64,
    users: BTreeMap<i64, UserSummary>,
    documentations: BTreeMap<i64, Documentation>,
    page_groups: BTreeMap<i64, PageGroup>,
    pages: BTreeMap<i64, Page>,
    documentation_editors: BTreeSet<(i64, i64)>,
    page_group_editors: BTreeSet<(i64, i64)>,
    page_editors: BTreeSet<(i64, i64)>,
}

#[derive(Debug, Default)]
struct Faults {
    planned: HashMap<Operation, usize>,
    calls: HashMap<Operation, usize>,
}

impl Faults {
    fn check(&mut self, operation: Operation) -> Result<(), StorageError> {
        let calls = self.calls.entry(operation).or_default();
        *calls += 1;
        if self.planned.get(&operation) == Some(calls) {
            return Err(StorageError::new(StorageErrorKind::Unavailable)
                .with_backend(BACKEND)
                .with_message(format!("injected failure on {operation:?}")));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn referenced(entity: EntityKind, id: i64) -> StorageError {
    StorageError::new(StorageErrorKind::Other)
        .with_entity(entity)
        .with_id(id)
        .with_backend(BACKEND)
        .with_message("still referenced")
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn require_user(&self, id: UserId) -> Result<(), StorageError> {
        if self.users.contains_key(&id.0) {
            Ok(())
        } else {
            Err(StorageError::not_found(EntityKind::User, id.0).with_backend(BACKEND))
        }
    }

    fn require_documentation(&self, id: DocumentationId) -> Result<(), StorageError> {
        if self.documentations.contains_key(&id.0) {
            Ok(())
        } else {
            Err(StorageError::not_found(EntityKind::Documentation, id.0).with_backend(BACKEND))
        }
    }

    fn require_page_group(&self, id: PageGroupId) -> Result<(), StorageError> {
        if self.page_groups.contains_key(&id.0) {
            Ok(())
        } else {
            Err(StorageError::not_found(EntityKind::PageGroup, id.0).with_backend(BACKEND))
        }
    }

    fn require_entity(&self, entity: EntityRef) -> Result<(), StorageError> {
        let exists = match entity {
            EntityRef::Documentation(id) => self.documentations.contains_key(&id.0),
            EntityRef::PageGroup(id) => self.page_groups.contains_key(&id.0),
            EntityRef::Page(id) => self.pages.contains_key(&id.0),
        };
        if exists {
            Ok(())
        } else {
            Err(StorageError::not_found(entity.kind(), entity.raw_id()).with_backend(BACKEND))
        }
    }

    fn editor_set(&mut self, entity: EntityRef) -> &mut BTreeSet<(i64, i64)> {
        match entity {
            EntityRef::Documentation(_) => &mut self.documentation_editors,
            EntityRef::PageGroup(_) => &mut self.page_group_editors,
            EntityRef::Page(_) => &mut self.page_editors,
        }
    }

    fn editors(&self, entity: EntityRef) -> Vec<UserSummary> {
        let set = match entity {
            EntityRef::Documentation(_) => &self.documentation_editors,
            EntityRef::PageGroup(_) => &self.page_group_editors,
            EntityRef::Page(_) => &self.page_editors,
        };
        let key = entity.raw_id();
        set.range((key, i64::MIN)..=(key, i64::MAX))
            .filter_map(|(_, user)| self.users.get(user).cloned())
            .collect()
    }

    fn pages_where(
        &self,
        filter: impl Fn(&Page) -> bool,
        associations: Associations,
    ) -> Vec<Page> {
        let mut pages: Vec<Page> = self
            .pages
            .values()
            .filter(|page| filter(page))
            .cloned()
            .collect();
        pages.sort_by_key(|page| order_key(page.order, page.id.0));
        for page in &mut pages {
            if !associations.content {
                page.content.clear();
            }
            if associations.editors {
                page.editors = self.editors(EntityRef::Page(page.id));
            }
        }
        pages
    }

    fn assemble(
        &self,
        id: DocumentationId,
        associations: Associations,
    ) -> Result<Documentation, StorageError> {
        let mut documentation = self
            .documentations
            .get(&id.0)
            .cloned()
            .ok_or_else(|| {
                StorageError::not_found(EntityKind::Documentation, id.0).with_backend(BACKEND)
            })?;

        if associations.editors {
            documentation.editors = self.editors(EntityRef::Documentation(id));
        }

        if associations.page_groups {
            let mut groups: Vec<PageGroup> = self
                .page_groups
                .values()
                .filter(|group| group.documentation_id == id)
                .cloned()
                .collect();
            groups.sort_by_key(|group| order_key(group.order, group.id.0));
            for group in &mut groups {
                if associations.editors {
                    group.editors = self.editors(EntityRef::PageGroup(group.id));
                }
                if associations.pages {
                    let group_id = group.id;
                    group.pages =
                        self.pages_where(|page| page.page_group_id == Some(group_id), associations);
                }
            }
            documentation.page_groups = groups;
        }

        if associations.pages {
            documentation.pages = self.pages_where(
                |page| page.documentation_id == id && page.page_group_id.is_none(),
                associations,
            );
        }

        Ok(documentation)
    }
}

/// Mock storage for testing.
///
/// Holds every table in memory. Transactions work on a private snapshot that
/// replaces the shared tables on commit, so concurrent writers are not
/// isolated from each other: the last commit wins.
///
/// # Example
///
/// ```ignore
/// use quire_storage::{MockStorage, Operation, Storage};
///
/// let storage = MockStorage::new()
///     .with_user("alice")
///     .with_failure(Operation::CreatePage, 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockStorage {
    tables: Arc<Mutex<Tables>>,
    faults: Arc<Mutex<Faults>>,
}

impl MockStorage {
    /// Create a new empty mock storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user with the given username.
    #[must_use]
    pub fn with_user(self, username: &str) -> Self {
        {
            let mut tables = lock(&self.tables);
            let id = tables.next_id();
            tables.users.insert(
                id,
                UserSummary {
                    id: UserId(id),
                    username: username.to_owned(),
                    email: format!("{username}@example.com"),
                    photo: String::new(),
                },
            );
        }
        self
    }

    /// Fail the `nth` call (counting from 1) of `operation`.
    #[must_use]
    pub fn with_failure(self, operation: Operation, nth: usize) -> Self {
        lock(&self.faults).planned.insert(operation, nth);
        self
    }

    /// Number of calls made to `operation` so far.
    #[must_use]
    pub fn calls(&self, operation: Operation) -> usize {
        lock(&self.faults)
            .calls
            .get(&operation)
            .copied()
            .unwrap_or_default()
    }

    /// Id of the user with the given username.
    #[must_use]
    pub fn user_id(&self, username: &str) -> Option<UserId> {
        lock(&self.tables)
            .users
            .values()
            .find(|user| user.username == username)
            .map(|user| user.id)
    }

    /// Total number of stored documentations, page groups and pages.
    #[must_use]
    pub fn row_counts(&self) -> (usize, usize, usize) {
        let tables = lock(&self.tables);
        (
            tables.documentations.len(),
            tables.page_groups.len(),
            tables.pages.len(),
        )
    }

    fn check(&self, operation: Operation) -> Result<(), StorageError> {
        lock(&self.faults).check(operation)
    }
}

impl Storage for MockStorage {
    type Transaction = MockTransaction;

    async fn begin(&self) -> Result<MockTransaction, StorageError> {
        self.check(Operation::Begin)?;
        let snapshot = lock(&self.tables).clone();
        Ok(MockTransaction {
            storage: self.clone(),
            snapshot,
        })
    }

    async fn load_documentation(
        &self,
        id: DocumentationId,
        associations: Associations,
    ) -> Result<Documentation, StorageError> {
        self.check(Operation::LoadDocumentation)?;
        lock(&self.tables).assemble(id, associations)
    }

    async fn load_documentations(
        &self,
        associations: Associations,
    ) -> Result<Vec<Documentation>, StorageError> {
        let tables = lock(&self.tables);
        tables
            .documentations
            .keys()
            .map(|id| tables.assemble(DocumentationId(*id), associations))
            .collect()
    }

    async fn create_user(&self, user: &NewUser) -> Result<UserId, StorageError> {
        let mut tables = lock(&self.tables);
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StorageError::new(StorageErrorKind::AlreadyExists)
                .with_entity(EntityKind::User)
                .with_backend(BACKEND));
        }
        let id = tables.next_id();
        tables.users.insert(
            id,
            UserSummary {
                id: UserId(id),
                username: user.username.clone(),
                email: user.email.clone(),
                photo: user.photo.clone(),
            },
        );
        Ok(UserId(id))
    }
}

/// Transaction over a private copy of the mock tables.
#[derive(Debug)]
pub struct MockTransaction {
    storage: MockStorage,
    snapshot: Tables,
}

impl Transaction for MockTransaction {
    async fn load_documentation(
        &mut self,
        id: DocumentationId,
        associations: Associations,
    ) -> Result<Documentation, StorageError> {
        self.storage.check(Operation::LoadDocumentation)?;
        self.snapshot.assemble(id, associations)
    }

    async fn load_version_neighbours(
        &mut self,
        id: DocumentationId,
        cloned_from: Option<DocumentationId>,
        associations: Associations,
    ) -> Result<Vec<Documentation>, StorageError> {
        let ids: Vec<DocumentationId> = self
            .snapshot
            .documentations
            .values()
            .filter(|doc| {
                doc.id != id && (Some(doc.id) == cloned_from || doc.cloned_from == Some(id))
            })
            .map(|doc| doc.id)
            .collect();
        ids.into_iter()
            .map(|neighbour| self.snapshot.assemble(neighbour, associations))
            .collect()
    }

    async fn root_name_taken(&mut self, name: &str) -> Result<bool, StorageError> {
        Ok(self
            .snapshot
            .documentations
            .values()
            .any(|doc| doc.is_root() && doc.name == name))
    }

    async fn create_documentation(
        &mut self,
        documentation: &NewDocumentation,
    ) -> Result<DocumentationId, StorageError> {
        self.storage.check(Operation::CreateDocumentation)?;
        let tables = &mut self.snapshot;
        tables.require_user(documentation.author_id)?;
        if documentation.cloned_from.is_none()
            && tables
                .documentations
                .values()
                .any(|doc| doc.is_root() && doc.name == documentation.name)
        {
            return Err(StorageError::new(StorageErrorKind::AlreadyExists)
                .with_entity(EntityKind::Documentation)
                .with_backend(BACKEND)
                .with_message(format!("name {:?} is taken", documentation.name)));
        }

        let id = tables.next_id();
        let now = Utc::now();
        tables.documentations.insert(
            id,
            Documentation {
                id: DocumentationId(id),
                name: documentation.name.clone(),
                description: documentation.description.clone(),
                version: documentation.version.clone(),
                cloned_from: documentation.cloned_from,
                author_id: documentation.author_id,
                last_editor_id: documentation.last_editor_id,
                display: documentation.display.clone(),
                created_at: now,
                updated_at: now,
                editors: Vec::new(),
                page_groups: Vec::new(),
                pages: Vec::new(),
            },
        );
        Ok(DocumentationId(id))
    }

    async fn update_documentation(
        &mut self,
        documentation: &Documentation,
    ) -> Result<(), StorageError> {
        self.storage.check(Operation::UpdateDocumentation)?;
        if documentation.cloned_from.is_none()
            && self.snapshot.documentations.values().any(|doc| {
                doc.id != documentation.id && doc.is_root() && doc.name == documentation.name
            })
        {
            return Err(StorageError::new(StorageErrorKind::AlreadyExists)
                .with_entity(EntityKind::Documentation)
                .with_id(documentation.id.0)
                .with_backend(BACKEND));
        }
        let stored = self
            .snapshot
            .documentations
            .get_mut(&documentation.id.0)
            .ok_or_else(|| {
                StorageError::not_found(EntityKind::Documentation, documentation.id.0)
                    .with_backend(BACKEND)
            })?;
        stored.name.clone_from(&documentation.name);
        stored.description.clone_from(&documentation.description);
        stored.version.clone_from(&documentation.version);
        stored.cloned_from = documentation.cloned_from;
        stored.last_editor_id = documentation.last_editor_id;
        stored.display.clone_from(&documentation.display);
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_documentation(&mut self, id: DocumentationId) -> Result<(), StorageError> {
        self.storage.check(Operation::DeleteDocumentation)?;
        let tables = &mut self.snapshot;
        tables.require_documentation(id)?;
        let in_use = tables.page_groups.values().any(|g| g.documentation_id == id)
            || tables.pages.values().any(|p| p.documentation_id == id)
            || tables
                .documentation_editors
                .iter()
                .any(|(doc, _)| *doc == id.0);
        if in_use {
            return Err(referenced(EntityKind::Documentation, id.0));
        }
        tables.documentations.remove(&id.0);
        Ok(())
    }

    async fn create_page_group(
        &mut self,
        group: &NewPageGroup,
    ) -> Result<PageGroupId, StorageError> {
        self.storage.check(Operation::CreatePageGroup)?;
        let tables = &mut self.snapshot;
        tables.require_documentation(group.documentation_id)?;
        tables.require_user(group.author_id)?;
        if let Some(parent) = group.parent_id {
            tables.require_page_group(parent)?;
        }

        let id = tables.next_id();
        let now = Utc::now();
        tables.page_groups.insert(
            id,
            PageGroup {
                id: PageGroupId(id),
                documentation_id: group.documentation_id,
                parent_id: group.parent_id,
                name: group.name.clone(),
                order: group.order,
                author_id: group.author_id,
                created_at: now,
                updated_at: now,
                editors: Vec::new(),
                pages: Vec::new(),
            },
        );
        Ok(PageGroupId(id))
    }

    async fn set_page_group_parent(
        &mut self,
        id: PageGroupId,
        parent_id: Option<PageGroupId>,
    ) -> Result<(), StorageError> {
        self.storage.check(Operation::SetPageGroupParent)?;
        let tables = &mut self.snapshot;
        if let Some(parent) = parent_id {
            tables.require_page_group(parent)?;
        }
        let group = tables.page_groups.get_mut(&id.0).ok_or_else(|| {
            StorageError::not_found(EntityKind::PageGroup, id.0).with_backend(BACKEND)
        })?;
        group.parent_id = parent_id;
        group.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_page_groups(
        &mut self,
        documentation: DocumentationId,
    ) -> Result<(), StorageError> {
        let tables = &mut self.snapshot;
        let doomed: BTreeSet<i64> = tables
            .page_groups
            .values()
            .filter(|g| g.documentation_id == documentation)
            .map(|g| g.id.0)
            .collect();

        if let Some(page) = tables
            .pages
            .values()
            .find(|p| p.page_group_id.is_some_and(|g| doomed.contains(&g.0)))
        {
            return Err(referenced(EntityKind::PageGroup, page.page_group_id.map_or(0, |g| g.0)));
        }
        if let Some((group, _)) = tables
            .page_group_editors
            .iter()
            .find(|(group, _)| doomed.contains(group))
        {
            return Err(referenced(EntityKind::PageGroup, *group));
        }

        tables.page_groups.retain(|id, _| !doomed.contains(id));
        for group in tables.page_groups.values_mut() {
            if group.parent_id.is_some_and(|p| doomed.contains(&p.0)) {
                group.parent_id = None;
            }
        }
        Ok(())
    }

    async fn create_page(&mut self, page: &NewPage) -> Result<PageId, StorageError> {
        self.storage.check(Operation::CreatePage)?;
        let tables = &mut self.snapshot;
        tables.require_documentation(page.documentation_id)?;
        tables.require_user(page.author_id)?;
        if let Some(group) = page.page_group_id {
            tables.require_page_group(group)?;
        }

        let id = tables.next_id();
        let now = Utc::now();
        tables.pages.insert(
            id,
            Page {
                id: PageId(id),
                documentation_id: page.documentation_id,
                page_group_id: page.page_group_id,
                title: page.title.clone(),
                slug: page.slug.clone(),
                content: page.content.clone(),
                order: page.order,
                author_id: page.author_id,
                last_editor_id: page.last_editor_id,
                created_at: now,
                updated_at: now,
                editors: Vec::new(),
            },
        );
        Ok(PageId(id))
    }

    async fn delete_pages(&mut self, documentation: DocumentationId) -> Result<(), StorageError> {
        let tables = &mut self.snapshot;
        let doomed: BTreeSet<i64> = tables
            .pages
            .values()
            .filter(|p| p.documentation_id == documentation)
            .map(|p| p.id.0)
            .collect();
        if let Some((page, _)) = tables
            .page_editors
            .iter()
            .find(|(page, _)| doomed.contains(page))
        {
            return Err(referenced(EntityKind::Page, *page));
        }
        tables.pages.retain(|id, _| !doomed.contains(id));
        Ok(())
    }

    async fn append_editor(&mut self, entity: EntityRef, user: UserId) -> Result<(), StorageError> {
        self.storage.check(Operation::AppendEditor)?;
        let tables = &mut self.snapshot;
        tables.require_entity(entity)?;
        tables.require_user(user)?;
        tables.editor_set(entity).insert((entity.raw_id(), user.0));
        Ok(())
    }

    async fn clear_editors(&mut self, entity: EntityRef) -> Result<(), StorageError> {
        let key = entity.raw_id();
        self.snapshot
            .editor_set(entity)
            .retain(|(owner, _)| *owner != key);
        Ok(())
    }

    async fn commit(self) -> Result<(), StorageError> {
        self.storage.check(Operation::Commit)?;
        *lock(&self.storage.tables) = self.snapshot;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::DisplayMetadata;

    fn new_documentation(name: &str, author: UserId) -> NewDocumentation {
        NewDocumentation {
            name: name.to_owned(),
            description: String::new(),
            version: String::new(),
            cloned_from: None,
            author_id: author,
            last_editor_id: None,
            display: DisplayMetadata::default(),
        }
    }

    #[tokio::test]
    async fn test_commit_publishes_snapshot() {
        let storage = MockStorage::new().with_user("alice");
        let alice = storage.user_id("alice").unwrap();

        let mut tx = storage.begin().await.unwrap();
        let doc = tx
            .create_documentation(&new_documentation("Handbook", alice))
            .await
            .unwrap();
        assert_eq!(storage.row_counts(), (0, 0, 0));
        tx.commit().await.unwrap();

        assert_eq!(storage.row_counts(), (1, 0, 0));
        let loaded = storage
            .load_documentation(doc, Associations::NONE)
            .await
            .unwrap();
        assert_eq!(loaded.name, "Handbook");
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let storage = MockStorage::new().with_user("alice");
        let alice = storage.user_id("alice").unwrap();

        {
            let mut tx = storage.begin().await.unwrap();
            tx.create_documentation(&new_documentation("Handbook", alice))
                .await
                .unwrap();
        }

        assert_eq!(storage.row_counts(), (0, 0, 0));
    }

    #[tokio::test]
    async fn test_injected_failure_hits_nth_call() {
        let storage = MockStorage::new()
            .with_user("alice")
            .with_failure(Operation::CreateDocumentation, 2);
        let alice = storage.user_id("alice").unwrap();

        let mut tx = storage.begin().await.unwrap();
        tx.create_documentation(&new_documentation("One", alice))
            .await
            .unwrap();
        let err = tx
            .create_documentation(&new_documentation("Two", alice))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), StorageErrorKind::Unavailable);
        assert_eq!(storage.calls(Operation::CreateDocumentation), 2);
    }

    #[tokio::test]
    async fn test_root_name_unique() {
        let storage = MockStorage::new().with_user("alice");
        let alice = storage.user_id("alice").unwrap();

        let mut tx = storage.begin().await.unwrap();
        let root = tx
            .create_documentation(&new_documentation("Handbook", alice))
            .await
            .unwrap();
        let err = tx
            .create_documentation(&new_documentation("Handbook", alice))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::AlreadyExists);

        tx.create_documentation(&NewDocumentation {
            cloned_from: Some(root),
            ..new_documentation("Handbook", alice)
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_delete_page_groups_detaches_foreign_children() {
        let storage = MockStorage::new().with_user("alice");
        let alice = storage.user_id("alice").unwrap();

        let mut tx = storage.begin().await.unwrap();
        let doc = tx
            .create_documentation(&new_documentation("A", alice))
            .await
            .unwrap();
        let other = tx
            .create_documentation(&new_documentation("B", alice))
            .await
            .unwrap();
        let parent = tx
            .create_page_group(&NewPageGroup {
                documentation_id: doc,
                parent_id: None,
                name: "Parent".to_owned(),
                order: None,
                author_id: alice,
            })
            .await
            .unwrap();
        let child = tx
            .create_page_group(&NewPageGroup {
                documentation_id: other,
                parent_id: Some(parent),
                name: "Child".to_owned(),
                order: None,
                author_id: alice,
            })
            .await
            .unwrap();

        tx.delete_page_groups(doc).await.unwrap();

        let loaded = tx
            .load_documentation(other, Associations::GROUPS)
            .await
            .unwrap();
        assert_eq!(loaded.page_groups[0].id, child);
        assert_eq!(loaded.page_groups[0].parent_id, None);
    }

    #[tokio::test]
    async fn test_delete_documentation_requires_cleared_associations() {
        let storage = MockStorage::new().with_user("alice");
        let alice = storage.user_id("alice").unwrap();

        let mut tx = storage.begin().await.unwrap();
        let doc = tx
            .create_documentation(&new_documentation("A", alice))
            .await
            .unwrap();
        tx.append_editor(EntityRef::Documentation(doc), alice)
            .await
            .unwrap();

        assert!(tx.delete_documentation(doc).await.is_err());

        tx.clear_editors(EntityRef::Documentation(doc))
            .await
            .unwrap();
        tx.delete_documentation(doc).await.unwrap();
    }

    #[tokio::test]
    async fn test_append_editor_requires_user() {
        let storage = MockStorage::new().with_user("alice");
        let alice = storage.user_id("alice").unwrap();

        let mut tx = storage.begin().await.unwrap();
        let doc = tx
            .create_documentation(&new_documentation("A", alice))
            .await
            .unwrap();
        let err = tx
            .append_editor(EntityRef::Documentation(doc), UserId(999))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.entity(), Some(EntityKind::User));
    }

    #[tokio::test]
    async fn test_pages_sorted_by_order_then_id() {
        let storage = MockStorage::new().with_user("alice");
        let alice = storage.user_id("alice").unwrap();

        let mut tx = storage.begin().await.unwrap();
        let doc = tx
            .create_documentation(&new_documentation("A", alice))
            .await
            .unwrap();
        for (title, order) in [("c", None), ("b", Some(2)), ("a", Some(1))] {
            tx.create_page(&NewPage {
                documentation_id: doc,
                page_group_id: None,
                title: title.to_owned(),
                slug: format!("/{title}"),
                content: String::new(),
                order,
                author_id: alice,
                last_editor_id: None,
            })
            .await
            .unwrap();
        }

        let loaded = tx
            .load_documentation(doc, Associations::DISPLAY)
            .await
            .unwrap();
        let titles: Vec<_> = loaded.pages.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }
}
