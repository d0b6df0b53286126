//! Copying a documentation tree into a new version.
//!
//! [`clone_tree`] writes a new documentation and a copy of every page group
//! and page of its source inside the caller's transaction. Copied groups are
//! first created with their original parent and then re-rooted once every
//! group has a new id; see [`ParentLink`] for the possible outcomes.

use std::collections::{BTreeMap, HashMap, HashSet};

use quire_storage::{
    Documentation, DocumentationId, EntityRef, NewDocumentation, NewPage, NewPageGroup, Page,
    PageGroupId, Transaction, UserSummary,
};

use crate::error::{Error, Step};

/// Where a copied page group's parent link ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentLink {
    /// The original parent lies outside the source's lineage; the copy has
    /// no parent.
    Detached,
    /// The original parent was copied too; the copy points at the new id.
    RemappedTo(PageGroupId),
    /// The original parent belongs to an ancestor and was not copied; the
    /// copy keeps pointing at it.
    LinkedToAncestor(PageGroupId),
}

impl ParentLink {
    /// Parent id stored for the copied group.
    #[must_use]
    pub fn parent_id(self) -> Option<PageGroupId> {
        match self {
            Self::Detached => None,
            Self::RemappedTo(id) | Self::LinkedToAncestor(id) => Some(id),
        }
    }
}

/// Decide the parent link of a copied group whose original parent is
/// `original`.
///
/// `lineage` holds the ids of every group of the source and its ancestors;
/// `copied` maps source group ids to their copies.
#[must_use]
pub fn resolve_parent_link(
    original: PageGroupId,
    lineage: &HashSet<PageGroupId>,
    copied: &HashMap<PageGroupId, PageGroupId>,
) -> ParentLink {
    if !lineage.contains(&original) {
        return ParentLink::Detached;
    }
    match copied.get(&original) {
        Some(new_id) => ParentLink::RemappedTo(*new_id),
        None => ParentLink::LinkedToAncestor(original),
    }
}

/// Summary of a completed copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonedTree {
    /// The new documentation.
    pub documentation_id: DocumentationId,
    /// Source group id to copied group id.
    pub page_groups: BTreeMap<PageGroupId, PageGroupId>,
    /// Parent link chosen for every copied group whose original had a parent,
    /// keyed by the copied group's id.
    pub parent_links: BTreeMap<PageGroupId, ParentLink>,
    /// Number of pages copied, grouped and ungrouped.
    pub pages: usize,
}

/// Copy `source` into a new documentation labelled `version`.
///
/// `source` must be loaded with page groups, pages, editors and content;
/// `ancestors` need their page groups. Nothing is committed here: on error the
/// caller must roll `tx` back.
pub async fn clone_tree<T: Transaction>(
    tx: &mut T,
    source: &Documentation,
    ancestors: &[Documentation],
    version: &str,
) -> Result<ClonedTree, Error> {
    let documentation_id = tx
        .create_documentation(&NewDocumentation {
            name: source.name.clone(),
            description: source.description.clone(),
            version: version.to_owned(),
            cloned_from: Some(source.id),
            author_id: source.author_id,
            last_editor_id: source.last_editor_id,
            display: source.display.clone(),
        })
        .await
        .map_err(Error::at(Step::CreateDocumentation))?;
    copy_editors(tx, EntityRef::Documentation(documentation_id), &source.editors).await?;

    let lineage: HashSet<PageGroupId> = std::iter::once(source)
        .chain(ancestors)
        .flat_map(|documentation| documentation.page_groups.iter().map(|group| group.id))
        .collect();

    let mut copied = HashMap::with_capacity(source.page_groups.len());
    let mut pages = 0;
    for group in &source.page_groups {
        let new_group = tx
            .create_page_group(&NewPageGroup {
                documentation_id,
                parent_id: group.parent_id,
                name: group.name.clone(),
                order: group.order,
                author_id: group.author_id,
            })
            .await
            .map_err(Error::at(Step::CreatePageGroup))?;
        copied.insert(group.id, new_group);
        copy_editors(tx, EntityRef::PageGroup(new_group), &group.editors).await?;

        for page in &group.pages {
            copy_page(tx, page, documentation_id, Some(new_group)).await?;
        }
        pages += group.pages.len();
    }

    let mut parent_links = BTreeMap::new();
    for group in &source.page_groups {
        let (Some(original), Some(&new_group)) = (group.parent_id, copied.get(&group.id)) else {
            continue;
        };
        let link = resolve_parent_link(original, &lineage, &copied);
        if !matches!(link, ParentLink::LinkedToAncestor(_)) {
            tx.set_page_group_parent(new_group, link.parent_id())
                .await
                .map_err(Error::at(Step::ReparentPageGroup))?;
        }
        tracing::debug!(
            group = %new_group,
            original_parent = %original,
            ?link,
            "Re-rooted page group"
        );
        parent_links.insert(new_group, link);
    }

    for page in source.pages.iter().filter(|page| page.page_group_id.is_none()) {
        copy_page(tx, page, documentation_id, None).await?;
        pages += 1;
    }

    Ok(ClonedTree {
        documentation_id,
        page_groups: copied.into_iter().collect(),
        parent_links,
        pages,
    })
}

async fn copy_editors<T: Transaction>(
    tx: &mut T,
    entity: EntityRef,
    editors: &[UserSummary],
) -> Result<(), Error> {
    for editor in editors {
        tx.append_editor(entity, editor.id)
            .await
            .map_err(Error::at(Step::AddEditor))?;
    }
    Ok(())
}

async fn copy_page<T: Transaction>(
    tx: &mut T,
    page: &Page,
    documentation_id: DocumentationId,
    page_group_id: Option<PageGroupId>,
) -> Result<(), Error> {
    let new_page = tx
        .create_page(&NewPage {
            documentation_id,
            page_group_id,
            title: page.title.clone(),
            slug: page.slug.clone(),
            content: page.content.clone(),
            order: page.order,
            author_id: page.author_id,
            last_editor_id: page.last_editor_id,
        })
        .await
        .map_err(Error::at(Step::CreatePage))?;
    copy_editors(tx, EntityRef::Page(new_page), &page.editors).await
}
