//! Documentation tree entities.
//!
//! A [`Documentation`] owns [`PageGroup`]s and [`Page`]s. Groups nest through
//! [`PageGroup::parent_id`]; a page belongs to at most one group. Which
//! associations are populated on a loaded entity is decided by the
//! [`Associations`] passed to the load call; unloaded collections are empty.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(
    /// Identity of a [`Documentation`].
    DocumentationId
);
entity_id!(
    /// Identity of a [`PageGroup`].
    PageGroupId
);
entity_id!(
    /// Identity of a [`Page`].
    PageId
);
entity_id!(
    /// Identity of a user referenced as author or editor.
    UserId
);

/// Kind of persisted entity, used to attribute errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Documentation,
    PageGroup,
    Page,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Documentation => "documentation",
            Self::PageGroup => "page group",
            Self::Page => "page",
        })
    }
}

/// An entity that carries an editor set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Documentation(DocumentationId),
    PageGroup(PageGroupId),
    Page(PageId),
}

impl EntityRef {
    /// Kind of the referenced entity.
    #[must_use]
    pub fn kind(self) -> EntityKind {
        match self {
            Self::Documentation(_) => EntityKind::Documentation,
            Self::PageGroup(_) => EntityKind::PageGroup,
            Self::Page(_) => EntityKind::Page,
        }
    }

    /// Raw row id of the referenced entity.
    #[must_use]
    pub fn raw_id(self) -> i64 {
        match self {
            Self::Documentation(id) => id.0,
            Self::PageGroup(id) => id.0,
            Self::Page(id) => id.0,
        }
    }
}

/// Selects which associations a load populates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Associations {
    /// Load every page group of the documentation.
    pub page_groups: bool,
    /// Load pages: grouped pages into their group (requires `page_groups`)
    /// and ungrouped pages into [`Documentation::pages`].
    pub pages: bool,
    /// Load editor summaries of every loaded entity.
    pub editors: bool,
    /// Load page bodies. Without it [`Page::content`] is empty.
    pub content: bool,
}

impl Associations {
    /// Scalar fields only.
    pub const NONE: Self = Self {
        page_groups: false,
        pages: false,
        editors: false,
        content: false,
    };

    /// Page groups without pages, as needed to resolve ancestry.
    pub const GROUPS: Self = Self {
        page_groups: true,
        pages: false,
        editors: false,
        content: false,
    };

    /// Full tree with editors but without page bodies.
    pub const DISPLAY: Self = Self {
        page_groups: true,
        pages: true,
        editors: true,
        content: false,
    };

    /// Everything, as needed to clone a documentation.
    pub const FULL: Self = Self {
        page_groups: true,
        pages: true,
        editors: true,
        content: true,
    };
}

/// Public fields of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub photo: String,
}

/// Site presentation settings of a documentation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DisplayMetadata {
    pub favicon: String,
    pub meta_image: String,
    pub nav_image: String,
    pub custom_css: String,
    pub footer_label_links: String,
    pub more_label_links: String,
    pub copyright_text: String,
}

/// A versioned documentation tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Documentation {
    pub id: DocumentationId,
    pub name: String,
    pub description: String,
    /// Version label (e.g., "2.0"). Empty for unlabelled versions.
    pub version: String,
    /// Documentation this one was forked from. `None` marks a root version.
    pub cloned_from: Option<DocumentationId>,
    pub author_id: UserId,
    pub last_editor_id: Option<UserId>,
    #[serde(flatten)]
    pub display: DisplayMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub editors: Vec<UserSummary>,
    /// Every page group of the documentation, at any nesting depth.
    pub page_groups: Vec<PageGroup>,
    /// Ungrouped (top-level) pages.
    pub pages: Vec<Page>,
}

impl Documentation {
    /// Whether this documentation is a root version.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.cloned_from.is_none()
    }
}

/// A nestable folder of pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageGroup {
    pub id: PageGroupId,
    pub documentation_id: DocumentationId,
    /// Enclosing group. May belong to an ancestor documentation.
    pub parent_id: Option<PageGroupId>,
    pub name: String,
    pub order: Option<u32>,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub editors: Vec<UserSummary>,
    pub pages: Vec<Page>,
}

/// A leaf content unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub id: PageId,
    pub documentation_id: DocumentationId,
    pub page_group_id: Option<PageGroupId>,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub order: Option<u32>,
    pub author_id: UserId,
    pub last_editor_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub editors: Vec<UserSummary>,
}

/// Fields of a documentation row to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocumentation {
    pub name: String,
    pub description: String,
    pub version: String,
    pub cloned_from: Option<DocumentationId>,
    pub author_id: UserId,
    pub last_editor_id: Option<UserId>,
    pub display: DisplayMetadata,
}

/// Fields of a page group row to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPageGroup {
    pub documentation_id: DocumentationId,
    pub parent_id: Option<PageGroupId>,
    pub name: String,
    pub order: Option<u32>,
    pub author_id: UserId,
}

/// Fields of a page row to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPage {
    pub documentation_id: DocumentationId,
    pub page_group_id: Option<PageGroupId>,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub order: Option<u32>,
    pub author_id: UserId,
    pub last_editor_id: Option<UserId>,
}

/// Fields of a user row to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub photo: String,
}

/// Sort key shared by every backend: explicit order first, then id.
pub(crate) fn order_key(order: Option<u32>, id: i64) -> (bool, u32, i64) {
    (order.is_none(), order.unwrap_or(0), id)
}
