//! SQLite backend built on sqlx.
//!
//! [`SqliteStorage`] owns a connection pool; each [`SqliteTransaction`] holds
//! one pooled connection inside `BEGIN` until it is committed, rolled back or
//! dropped (which rolls back).
//!
//! Transactions take the write lock when they begin. Root-name uniqueness is
//! enforced by a partial unique index, so a race between two creates surfaces
//! as [`StorageErrorKind::AlreadyExists`] instead of a duplicate row.

mod queries;
mod schema;

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Row, Sqlite};

use crate::model::{
    Associations, Documentation, DocumentationId, EntityKind, EntityRef, NewDocumentation,
    NewPage, NewPageGroup, NewUser, PageGroupId, PageId, UserId,
};
use crate::storage::{Storage, StorageError, Transaction};
use queries::{BACKEND, DOCUMENTATION_COLUMNS, editor_table, sqlx_error};

/// Pooled SQLite storage.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (creating if missing) the database file at `path` and apply the
    /// schema.
    pub async fn open(path: &Path, max_connections: u32) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(sqlx_error)?;

        let storage = Self { pool };
        storage.migrate().await?;
        tracing::debug!(path = %path.display(), max_connections, "Opened SQLite storage");
        Ok(storage)
    }

    /// Apply the schema statements.
    async fn migrate(&self) -> Result<(), StorageError> {
        for statement in schema::SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(sqlx_error)?;
        }
        Ok(())
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl Storage for SqliteStorage {
    type Transaction = SqliteTransaction;

    /// Opens the transaction with `BEGIN IMMEDIATE` so a second writer waits
    /// on the busy timeout and then sees committed rows, instead of failing
    /// its first write on a stale snapshot.
    async fn begin(&self) -> Result<SqliteTransaction, StorageError> {
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(sqlx_error)?;
        Ok(SqliteTransaction { tx })
    }

    async fn load_documentation(
        &self,
        id: DocumentationId,
        associations: Associations,
    ) -> Result<Documentation, StorageError> {
        let mut conn = self.pool.acquire().await.map_err(sqlx_error)?;
        queries::load_documentation(&mut conn, id, associations).await
    }

    async fn load_documentations(
        &self,
        associations: Associations,
    ) -> Result<Vec<Documentation>, StorageError> {
        let mut conn = self.pool.acquire().await.map_err(sqlx_error)?;
        let sql = format!("SELECT {DOCUMENTATION_COLUMNS} FROM documentations ORDER BY id");
        let rows = sqlx::query(&sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| sqlx_error(e).with_entity(EntityKind::Documentation))?;
        queries::documentations_from_rows(&mut conn, &rows, associations).await
    }

    async fn create_user(&self, user: &NewUser) -> Result<UserId, StorageError> {
        let result = sqlx::query("INSERT INTO users (username, email, photo) VALUES (?, ?, ?)")
            .bind(user.username.as_str())
            .bind(user.email.as_str())
            .bind(user.photo.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| sqlx_error(e).with_entity(EntityKind::User))?;
        Ok(UserId(result.last_insert_rowid()))
    }
}

/// An open SQLite transaction.
pub struct SqliteTransaction {
    tx: sqlx::Transaction<'static, Sqlite>,
}

impl SqliteTransaction {
    /// Fail with `NotFound` when an update or delete touched no row.
    fn require_row(affected: u64, entity: EntityKind, id: i64) -> Result<(), StorageError> {
        if affected == 0 {
            return Err(StorageError::not_found(entity, id).with_backend(BACKEND));
        }
        Ok(())
    }
}

impl Transaction for SqliteTransaction {
    async fn load_documentation(
        &mut self,
        id: DocumentationId,
        associations: Associations,
    ) -> Result<Documentation, StorageError> {
        queries::load_documentation(&mut self.tx, id, associations).await
    }

    async fn load_version_neighbours(
        &mut self,
        id: DocumentationId,
        cloned_from: Option<DocumentationId>,
        associations: Associations,
    ) -> Result<Vec<Documentation>, StorageError> {
        let sql = format!(
            "SELECT {DOCUMENTATION_COLUMNS} FROM documentations \
             WHERE (id = ? OR cloned_from = ?) AND id != ? ORDER BY id"
        );
        let rows = sqlx::query(&sql)
            .bind(cloned_from.map(|source| source.0))
            .bind(id.0)
            .bind(id.0)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| sqlx_error(e).with_entity(EntityKind::Documentation))?;
        queries::documentations_from_rows(&mut self.tx, &rows, associations).await
    }

    async fn root_name_taken(&mut self, name: &str) -> Result<bool, StorageError> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM documentations WHERE name = ? AND cloned_from IS NULL)",
        )
        .bind(name)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| sqlx_error(e).with_entity(EntityKind::Documentation))?;
        row.try_get::<bool, _>(0)
            .map_err(|e| sqlx_error(e).with_entity(EntityKind::Documentation))
    }

    async fn create_documentation(
        &mut self,
        documentation: &NewDocumentation,
    ) -> Result<DocumentationId, StorageError> {
        let now = Utc::now();
        let display = &documentation.display;
        let result = sqlx::query(
            "INSERT INTO documentations (name, description, version, cloned_from, author_id, \
             last_editor_id, favicon, meta_image, nav_image, custom_css, footer_label_links, \
             more_label_links, copyright_text, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(documentation.name.as_str())
        .bind(documentation.description.as_str())
        .bind(documentation.version.as_str())
        .bind(documentation.cloned_from.map(|id| id.0))
        .bind(documentation.author_id.0)
        .bind(documentation.last_editor_id.map(|id| id.0))
        .bind(display.favicon.as_str())
        .bind(display.meta_image.as_str())
        .bind(display.nav_image.as_str())
        .bind(display.custom_css.as_str())
        .bind(display.footer_label_links.as_str())
        .bind(display.more_label_links.as_str())
        .bind(display.copyright_text.as_str())
        .bind(now)
        .bind(now)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| sqlx_error(e).with_entity(EntityKind::Documentation))?;
        Ok(DocumentationId(result.last_insert_rowid()))
    }

    async fn update_documentation(
        &mut self,
        documentation: &Documentation,
    ) -> Result<(), StorageError> {
        let display = &documentation.display;
        let result = sqlx::query(
            "UPDATE documentations SET name = ?, description = ?, version = ?, cloned_from = ?, \
             last_editor_id = ?, favicon = ?, meta_image = ?, nav_image = ?, custom_css = ?, \
             footer_label_links = ?, more_label_links = ?, copyright_text = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(documentation.name.as_str())
        .bind(documentation.description.as_str())
        .bind(documentation.version.as_str())
        .bind(documentation.cloned_from.map(|id| id.0))
        .bind(documentation.last_editor_id.map(|id| id.0))
        .bind(display.favicon.as_str())
        .bind(display.meta_image.as_str())
        .bind(display.nav_image.as_str())
        .bind(display.custom_css.as_str())
        .bind(display.footer_label_links.as_str())
        .bind(display.more_label_links.as_str())
        .bind(display.copyright_text.as_str())
        .bind(Utc::now())
        .bind(documentation.id.0)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            sqlx_error(e)
                .with_entity(EntityKind::Documentation)
                .with_id(documentation.id.0)
        })?;
        Self::require_row(
            result.rows_affected(),
            EntityKind::Documentation,
            documentation.id.0,
        )
    }

    async fn delete_documentation(&mut self, id: DocumentationId) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM documentations WHERE id = ?")
            .bind(id.0)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                sqlx_error(e)
                    .with_entity(EntityKind::Documentation)
                    .with_id(id.0)
            })?;
        Self::require_row(result.rows_affected(), EntityKind::Documentation, id.0)
    }

    async fn create_page_group(
        &mut self,
        group: &NewPageGroup,
    ) -> Result<PageGroupId, StorageError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO page_groups (documentation_id, parent_id, name, sort_order, author_id, \
             created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(group.documentation_id.0)
        .bind(group.parent_id.map(|id| id.0))
        .bind(group.name.as_str())
        .bind(group.order)
        .bind(group.author_id.0)
        .bind(now)
        .bind(now)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| sqlx_error(e).with_entity(EntityKind::PageGroup))?;
        Ok(PageGroupId(result.last_insert_rowid()))
    }

    async fn set_page_group_parent(
        &mut self,
        id: PageGroupId,
        parent_id: Option<PageGroupId>,
    ) -> Result<(), StorageError> {
        let result =
            sqlx::query("UPDATE page_groups SET parent_id = ?, updated_at = ? WHERE id = ?")
                .bind(parent_id.map(|parent| parent.0))
                .bind(Utc::now())
                .bind(id.0)
                .execute(&mut *self.tx)
                .await
                .map_err(|e| sqlx_error(e).with_entity(EntityKind::PageGroup).with_id(id.0))?;
        Self::require_row(result.rows_affected(), EntityKind::PageGroup, id.0)
    }

    async fn delete_page_groups(
        &mut self,
        documentation: DocumentationId,
    ) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM page_groups WHERE documentation_id = ?")
            .bind(documentation.0)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| sqlx_error(e).with_entity(EntityKind::PageGroup))?;
        Ok(())
    }

    async fn create_page(&mut self, page: &NewPage) -> Result<PageId, StorageError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO pages (documentation_id, page_group_id, title, slug, content, \
             sort_order, author_id, last_editor_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(page.documentation_id.0)
        .bind(page.page_group_id.map(|id| id.0))
        .bind(page.title.as_str())
        .bind(page.slug.as_str())
        .bind(page.content.as_str())
        .bind(page.order)
        .bind(page.author_id.0)
        .bind(page.last_editor_id.map(|id| id.0))
        .bind(now)
        .bind(now)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| sqlx_error(e).with_entity(EntityKind::Page))?;
        Ok(PageId(result.last_insert_rowid()))
    }

    async fn delete_pages(&mut self, documentation: DocumentationId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM pages WHERE documentation_id = ?")
            .bind(documentation.0)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| sqlx_error(e).with_entity(EntityKind::Page))?;
        Ok(())
    }

    async fn append_editor(&mut self, entity: EntityRef, user: UserId) -> Result<(), StorageError> {
        let (table, column) = editor_table(entity);
        let sql = format!("INSERT OR IGNORE INTO {table} ({column}, user_id) VALUES (?, ?)");
        sqlx::query(&sql)
            .bind(entity.raw_id())
            .bind(user.0)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                sqlx_error(e)
                    .with_entity(entity.kind())
                    .with_id(entity.raw_id())
            })?;
        Ok(())
    }

    async fn clear_editors(&mut self, entity: EntityRef) -> Result<(), StorageError> {
        let (table, column) = editor_table(entity);
        let sql = format!("DELETE FROM {table} WHERE {column} = ?");
        sqlx::query(&sql)
            .bind(entity.raw_id())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                sqlx_error(e)
                    .with_entity(entity.kind())
                    .with_id(entity.raw_id())
            })?;
        Ok(())
    }

    async fn commit(self) -> Result<(), StorageError> {
        self.tx.commit().await.map_err(sqlx_error)
    }

    async fn rollback(self) -> Result<(), StorageError> {
        self.tx.rollback().await.map_err(sqlx_error)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::model::DisplayMetadata;
    use crate::storage::StorageErrorKind;

    async fn open_storage() -> (TempDir, SqliteStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::open(&dir.path().join("quire.db"), 2)
            .await
            .unwrap();
        (dir, storage)
    }

    async fn create_user(storage: &SqliteStorage, username: &str) -> UserId {
        storage
            .create_user(&NewUser {
                username: username.to_owned(),
                email: format!("{username}@example.com"),
                photo: String::new(),
            })
            .await
            .unwrap()
    }

    fn new_documentation(name: &str, author: UserId) -> NewDocumentation {
        NewDocumentation {
            name: name.to_owned(),
            description: "Handbook".to_owned(),
            version: "1.0".to_owned(),
            cloned_from: None,
            author_id: author,
            last_editor_id: Some(author),
            display: DisplayMetadata {
                favicon: "favicon.ico".to_owned(),
                ..DisplayMetadata::default()
            },
        }
    }

    #[tokio::test]
    async fn test_create_and_load_tree() {
        let (_dir, storage) = open_storage().await;
        let alice = create_user(&storage, "alice").await;

        let mut tx = storage.begin().await.unwrap();
        let doc = tx
            .create_documentation(&new_documentation("Handbook", alice))
            .await
            .unwrap();
        tx.append_editor(EntityRef::Documentation(doc), alice)
            .await
            .unwrap();
        let group = tx
            .create_page_group(&NewPageGroup {
                documentation_id: doc,
                parent_id: None,
                name: "Guides".to_owned(),
                order: Some(1),
                author_id: alice,
            })
            .await
            .unwrap();
        tx.create_page(&NewPage {
            documentation_id: doc,
            page_group_id: Some(group),
            title: "Install".to_owned(),
            slug: "/install".to_owned(),
            content: "[]".to_owned(),
            order: Some(0),
            author_id: alice,
            last_editor_id: None,
        })
        .await
        .unwrap();
        tx.create_page(&NewPage {
            documentation_id: doc,
            page_group_id: None,
            title: "Introduction".to_owned(),
            slug: "/".to_owned(),
            content: "[{}]".to_owned(),
            order: Some(0),
            author_id: alice,
            last_editor_id: Some(alice),
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let loaded = storage
            .load_documentation(doc, Associations::FULL)
            .await
            .unwrap();

        assert_eq!(loaded.name, "Handbook");
        assert_eq!(loaded.display.favicon, "favicon.ico");
        assert_eq!(loaded.editors.len(), 1);
        assert_eq!(loaded.editors[0].username, "alice");
        assert_eq!(loaded.page_groups.len(), 1);
        assert_eq!(loaded.page_groups[0].pages.len(), 1);
        assert_eq!(loaded.page_groups[0].pages[0].content, "[]");
        assert_eq!(loaded.pages.len(), 1);
        assert_eq!(loaded.pages[0].title, "Introduction");
    }

    #[tokio::test]
    async fn test_display_load_omits_content() {
        let (_dir, storage) = open_storage().await;
        let alice = create_user(&storage, "alice").await;

        let mut tx = storage.begin().await.unwrap();
        let doc = tx
            .create_documentation(&new_documentation("Handbook", alice))
            .await
            .unwrap();
        tx.create_page(&NewPage {
            documentation_id: doc,
            page_group_id: None,
            title: "Introduction".to_owned(),
            slug: "/".to_owned(),
            content: "body".to_owned(),
            order: None,
            author_id: alice,
            last_editor_id: None,
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let loaded = storage
            .load_documentation(doc, Associations::DISPLAY)
            .await
            .unwrap();

        assert_eq!(loaded.pages.len(), 1);
        assert_eq!(loaded.pages[0].content, "");
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let (_dir, storage) = open_storage().await;
        let alice = create_user(&storage, "alice").await;

        let mut tx = storage.begin().await.unwrap();
        let doc = tx
            .create_documentation(&new_documentation("Handbook", alice))
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        let err = storage
            .load_documentation(doc, Associations::NONE)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::NotFound);
        assert_eq!(err.entity(), Some(EntityKind::Documentation));
    }

    #[tokio::test]
    async fn test_duplicate_root_name_rejected() {
        let (_dir, storage) = open_storage().await;
        let alice = create_user(&storage, "alice").await;

        let mut tx = storage.begin().await.unwrap();
        let first = tx
            .create_documentation(&new_documentation("Handbook", alice))
            .await
            .unwrap();
        let err = tx
            .create_documentation(&new_documentation("Handbook", alice))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::AlreadyExists);

        // Forks share their source's name.
        let fork = NewDocumentation {
            cloned_from: Some(first),
            ..new_documentation("Handbook", alice)
        };
        tx.create_documentation(&fork).await.unwrap();
        assert!(tx.root_name_taken("Handbook").await.unwrap());
        assert!(!tx.root_name_taken("Other").await.unwrap());
    }

    /// Check the name, create the row and commit, yielding between steps.
    async fn create_if_free(
        storage: &SqliteStorage,
        name: &str,
        author: UserId,
    ) -> Result<Option<DocumentationId>, StorageError> {
        let mut tx = storage.begin().await?;
        if tx.root_name_taken(name).await? {
            return Ok(None);
        }
        let id = tx
            .create_documentation(&new_documentation(name, author))
            .await?;
        tokio::task::yield_now().await;
        tx.commit().await?;
        Ok(Some(id))
    }

    #[tokio::test]
    async fn test_concurrent_creates_of_one_name() {
        let (_dir, storage) = open_storage().await;
        let alice = create_user(&storage, "alice").await;

        let (first, second) = tokio::join!(
            create_if_free(&storage, "Handbook", alice),
            create_if_free(&storage, "Handbook", alice)
        );

        let created: Vec<_> = [first.unwrap(), second.unwrap()]
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(created.len(), 1);
        let all = storage
            .load_documentations(Associations::NONE)
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_second_writer_sees_committed_name() {
        let (_dir, storage) = open_storage().await;
        let alice = create_user(&storage, "alice").await;

        let mut first = storage.begin().await.unwrap();
        assert!(!first.root_name_taken("Handbook").await.unwrap());

        let contender = async {
            let mut second = storage.begin().await.unwrap();
            second
                .create_documentation(&new_documentation("Handbook", alice))
                .await
        };
        let winner = async {
            first
                .create_documentation(&new_documentation("Handbook", alice))
                .await
                .unwrap();
            first.commit().await.unwrap();
        };
        let (err, ()) = tokio::join!(contender, winner);

        assert_eq!(err.unwrap_err().kind(), StorageErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn test_version_neighbours() {
        let (_dir, storage) = open_storage().await;
        let alice = create_user(&storage, "alice").await;

        let mut tx = storage.begin().await.unwrap();
        let root = tx
            .create_documentation(&new_documentation("Handbook", alice))
            .await
            .unwrap();
        let middle = tx
            .create_documentation(&NewDocumentation {
                cloned_from: Some(root),
                ..new_documentation("Handbook", alice)
            })
            .await
            .unwrap();
        let leaf = tx
            .create_documentation(&NewDocumentation {
                cloned_from: Some(middle),
                ..new_documentation("Handbook", alice)
            })
            .await
            .unwrap();

        let neighbours = tx
            .load_version_neighbours(middle, Some(root), Associations::NONE)
            .await
            .unwrap();
        let ids: Vec<_> = neighbours.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![root, leaf]);
    }

    #[tokio::test]
    async fn test_set_parent_and_delete_detaches_children() {
        let (_dir, storage) = open_storage().await;
        let alice = create_user(&storage, "alice").await;

        let mut tx = storage.begin().await.unwrap();
        let doc = tx
            .create_documentation(&new_documentation("Handbook", alice))
            .await
            .unwrap();
        let other = tx
            .create_documentation(&new_documentation("Other", alice))
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
                parent_id: None,
                name: "Child".to_owned(),
                order: None,
                author_id: alice,
            })
            .await
            .unwrap();
        tx.set_page_group_parent(child, Some(parent)).await.unwrap();
        tx.delete_page_groups(doc).await.unwrap();
        tx.commit().await.unwrap();

        let loaded = storage
            .load_documentation(other, Associations::GROUPS)
            .await
            .unwrap();
        assert_eq!(loaded.page_groups[0].parent_id, None);
    }

    #[tokio::test]
    async fn test_set_parent_missing_group() {
        let (_dir, storage) = open_storage().await;

        let mut tx = storage.begin().await.unwrap();
        let err = tx
            .set_page_group_parent(PageGroupId(99), None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), StorageErrorKind::NotFound);
        assert_eq!(err.entity(), Some(EntityKind::PageGroup));
        assert_eq!(err.id(), Some(99));
    }

    #[tokio::test]
    async fn test_append_editor_is_idempotent_and_clearable() {
        let (_dir, storage) = open_storage().await;
        let alice = create_user(&storage, "alice").await;
        let bob = create_user(&storage, "bob").await;

        let mut tx = storage.begin().await.unwrap();
        let doc = tx
            .create_documentation(&new_documentation("Handbook", alice))
            .await
            .unwrap();
        let entity = EntityRef::Documentation(doc);
        tx.append_editor(entity, alice).await.unwrap();
        tx.append_editor(entity, alice).await.unwrap();
        tx.append_editor(entity, bob).await.unwrap();

        let loaded = tx
            .load_documentation(doc, Associations::DISPLAY)
            .await
            .unwrap();
        assert_eq!(loaded.editors.len(), 2);

        tx.clear_editors(entity).await.unwrap();
        let loaded = tx
            .load_documentation(doc, Associations::DISPLAY)
            .await
            .unwrap();
        assert!(loaded.editors.is_empty());
    }
}
