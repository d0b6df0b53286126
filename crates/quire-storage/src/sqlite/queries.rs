//! Row loading shared by pooled reads and transactional reads.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::model::{
    Associations, DisplayMetadata, Documentation, DocumentationId, EntityKind, EntityRef, Page,
    PageGroup, PageGroupId, PageId, UserId, UserSummary,
};
use crate::storage::{StorageError, StorageErrorKind};

pub(super) const BACKEND: &str = "Sqlite";

pub(super) const DOCUMENTATION_COLUMNS: &str = "id, name, description, version, cloned_from, \
     author_id, last_editor_id, favicon, meta_image, nav_image, custom_css, \
     footer_label_links, more_label_links, copyright_text, created_at, updated_at";

const GROUP_COLUMNS: &str =
    "id, documentation_id, parent_id, name, sort_order, author_id, created_at, updated_at";

const PAGE_COLUMNS: &str = "id, documentation_id, page_group_id, title, slug, sort_order, \
     author_id, last_editor_id, created_at, updated_at";

const ORDERING: &str = "ORDER BY sort_order IS NULL, sort_order, id";

/// Map a sqlx error onto a storage error kind.
pub(super) fn sqlx_error(err: sqlx::Error) -> StorageError {
    let kind = match &err {
        sqlx::Error::RowNotFound => StorageErrorKind::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageErrorKind::AlreadyExists,
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageErrorKind::NotFound,
        sqlx::Error::Database(db) if db.code().as_deref().is_some_and(is_busy_code) => {
            StorageErrorKind::Unavailable
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StorageErrorKind::Unavailable
        }
        _ => StorageErrorKind::Other,
    };
    StorageError::new(kind)
        .with_backend(BACKEND)
        .with_source(err)
}

/// `SQLITE_BUSY` or `SQLITE_LOCKED`, including their extended codes.
fn is_busy_code(code: &str) -> bool {
    const SQLITE_BUSY: i32 = 5;
    const SQLITE_LOCKED: i32 = 6;
    code.parse::<i32>()
        .is_ok_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
}

/// Join table and key column holding an entity's editors.
pub(super) fn editor_table(entity: EntityRef) -> (&'static str, &'static str) {
    match entity {
        EntityRef::Documentation(_) => ("documentation_editors", "documentation_id"),
        EntityRef::PageGroup(_) => ("page_group_editors", "page_group_id"),
        EntityRef::Page(_) => ("page_editors", "page_id"),
    }
}

pub(super) fn documentation_from_row(row: &SqliteRow) -> Result<Documentation, sqlx::Error> {
    Ok(Documentation {
        id: DocumentationId(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        version: row.try_get("version")?,
        cloned_from: row
            .try_get::<Option<i64>, _>("cloned_from")?
            .map(DocumentationId),
        author_id: UserId(row.try_get("author_id")?),
        last_editor_id: row
            .try_get::<Option<i64>, _>("last_editor_id")?
            .map(UserId),
        display: DisplayMetadata {
            favicon: row.try_get("favicon")?,
            meta_image: row.try_get("meta_image")?,
            nav_image: row.try_get("nav_image")?,
            custom_css: row.try_get("custom_css")?,
            footer_label_links: row.try_get("footer_label_links")?,
            more_label_links: row.try_get("more_label_links")?,
            copyright_text: row.try_get("copyright_text")?,
        },
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        editors: Vec::new(),
        page_groups: Vec::new(),
        pages: Vec::new(),
    })
}

fn page_group_from_row(row: &SqliteRow) -> Result<PageGroup, sqlx::Error> {
    Ok(PageGroup {
        id: PageGroupId(row.try_get("id")?),
        documentation_id: DocumentationId(row.try_get("documentation_id")?),
        parent_id: row
            .try_get::<Option<i64>, _>("parent_id")?
            .map(PageGroupId),
        name: row.try_get("name")?,
        order: row.try_get("sort_order")?,
        author_id: UserId(row.try_get("author_id")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        editors: Vec::new(),
        pages: Vec::new(),
    })
}

fn page_from_row(row: &SqliteRow) -> Result<Page, sqlx::Error> {
    Ok(Page {
        id: PageId(row.try_get("id")?),
        documentation_id: DocumentationId(row.try_get("documentation_id")?),
        page_group_id: row
            .try_get::<Option<i64>, _>("page_group_id")?
            .map(PageGroupId),
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        content: row.try_get("content")?,
        order: row.try_get("sort_order")?,
        author_id: UserId(row.try_get("author_id")?),
        last_editor_id: row
            .try_get::<Option<i64>, _>("last_editor_id")?
            .map(UserId),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        editors: Vec::new(),
    })
}

/// Load one documentation row and the requested associations.
pub(super) async fn load_documentation(
    conn: &mut SqliteConnection,
    id: DocumentationId,
    associations: Associations,
) -> Result<Documentation, StorageError> {
    let sql = format!("SELECT {DOCUMENTATION_COLUMNS} FROM documentations WHERE id = ?");
    let row = sqlx::query(&sql)
        .bind(id.0)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| sqlx_error(e).with_entity(EntityKind::Documentation))?
        .ok_or_else(|| {
            StorageError::not_found(EntityKind::Documentation, id.0).with_backend(BACKEND)
        })?;

    let mut documentation = documentation_from_row(&row).map_err(|e| {
        sqlx_error(e)
            .with_entity(EntityKind::Documentation)
            .with_id(id.0)
    })?;
    hydrate(conn, &mut documentation, associations).await?;
    Ok(documentation)
}

/// Map documentation rows and load their associations.
pub(super) async fn documentations_from_rows(
    conn: &mut SqliteConnection,
    rows: &[SqliteRow],
    associations: Associations,
) -> Result<Vec<Documentation>, StorageError> {
    let mut documentations = Vec::with_capacity(rows.len());
    for row in rows {
        let mut documentation = documentation_from_row(row)
            .map_err(|e| sqlx_error(e).with_entity(EntityKind::Documentation))?;
        hydrate(conn, &mut documentation, associations).await?;
        documentations.push(documentation);
    }
    Ok(documentations)
}

/// Populate the associations of a loaded documentation.
async fn hydrate(
    conn: &mut SqliteConnection,
    documentation: &mut Documentation,
    associations: Associations,
) -> Result<(), StorageError> {
    if associations.editors {
        documentation.editors =
            load_editors(conn, EntityRef::Documentation(documentation.id)).await?;
    }

    if associations.page_groups {
        let sql = format!(
            "SELECT {GROUP_COLUMNS} FROM page_groups WHERE documentation_id = ? {ORDERING}"
        );
        let rows = sqlx::query(&sql)
            .bind(documentation.id.0)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| sqlx_error(e).with_entity(EntityKind::PageGroup))?;

        let mut groups = rows
            .iter()
            .map(page_group_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| sqlx_error(e).with_entity(EntityKind::PageGroup))?;

        for group in &mut groups {
            if associations.editors {
                group.editors = load_editors(conn, EntityRef::PageGroup(group.id)).await?;
            }
            if associations.pages {
                group.pages =
                    load_pages(conn, "page_group_id = ?", group.id.0, associations).await?;
            }
        }
        documentation.page_groups = groups;
    }

    if associations.pages {
        documentation.pages = load_pages(
            conn,
            "documentation_id = ? AND page_group_id IS NULL",
            documentation.id.0,
            associations,
        )
        .await?;
    }

    Ok(())
}

async fn load_pages(
    conn: &mut SqliteConnection,
    filter: &str,
    key: i64,
    associations: Associations,
) -> Result<Vec<Page>, StorageError> {
    let content = if associations.content {
        "content"
    } else {
        "'' AS content"
    };
    let sql = format!("SELECT {PAGE_COLUMNS}, {content} FROM pages WHERE {filter} {ORDERING}");
    let rows = sqlx::query(&sql)
        .bind(key)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| sqlx_error(e).with_entity(EntityKind::Page))?;

    let mut pages = rows
        .iter()
        .map(page_from_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| sqlx_error(e).with_entity(EntityKind::Page))?;

    if associations.editors {
        for page in &mut pages {
            page.editors = load_editors(conn, EntityRef::Page(page.id)).await?;
        }
    }
    Ok(pages)
}

async fn load_editors(
    conn: &mut SqliteConnection,
    entity: EntityRef,
) -> Result<Vec<UserSummary>, StorageError> {
    let (table, column) = editor_table(entity);
    let sql = format!(
        "SELECT u.id, u.username, u.email, u.photo FROM {table} e \
         JOIN users u ON u.id = e.user_id WHERE e.{column} = ? ORDER BY u.id"
    );
    let rows = sqlx::query(&sql)
        .bind(entity.raw_id())
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| sqlx_error(e).with_entity(EntityKind::User))?;

    rows.iter()
        .map(|row| {
            Ok(UserSummary {
                id: UserId(row.try_get("id")?),
                username: row.try_get("username")?,
                email: row.try_get("email")?,
                photo: row.try_get("photo")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()
        .map_err(|e| sqlx_error(e).with_entity(EntityKind::User))
}
