//! Ancestry resolution along `cloned_from` links.
//!
//! The ancestors of a documentation are the documentations reachable by
//! following `cloned_from`, nearest first, up to and including the root
//! version. The starting documentation is never its own ancestor.
//!
//! A chain that ends at a missing record (its source was deleted) is treated
//! as complete. Malformed chains are rejected instead of walked forever: a
//! revisited id fails with [`Error::CycleDetected`] and a chain longer than
//! [`AncestryLimits::max_depth`] existing ancestors fails with
//! [`Error::AncestryTooDeep`].

use std::collections::HashSet;

use quire_storage::{Associations, Documentation, DocumentationId, Storage, StorageErrorKind};

use crate::error::Error;

/// Default bound on followed `cloned_from` hops.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Bounds applied while walking an ancestry chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AncestryLimits {
    /// Maximum number of ancestors returned before the walk is rejected.
    pub max_depth: usize,
}

impl Default for AncestryLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Resolve the ancestors of documentation `id`, page groups loaded.
///
/// Returns an empty list if `id` is a root version or does not exist.
pub async fn resolve_ancestors<S: Storage>(
    storage: &S,
    id: DocumentationId,
    limits: AncestryLimits,
) -> Result<Vec<Documentation>, Error> {
    let start = match storage.load_documentation(id, Associations::NONE).await {
        Ok(documentation) => documentation,
        Err(err) if err.kind() == StorageErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(Error::AncestryWalk { id, source }),
    };
    ancestors_of(storage, &start, limits).await
}

/// Resolve the ancestors of an already loaded documentation.
pub async fn ancestors_of<S: Storage>(
    storage: &S,
    documentation: &Documentation,
    limits: AncestryLimits,
) -> Result<Vec<Documentation>, Error> {
    let mut visited = HashSet::from([documentation.id]);
    let mut ancestors = Vec::new();
    let mut next = documentation.cloned_from;

    while let Some(id) = next {
        if !visited.insert(id) {
            return Err(Error::CycleDetected { id });
        }
        let ancestor = match storage.load_documentation(id, Associations::GROUPS).await {
            Ok(ancestor) => ancestor,
            Err(err) if err.kind() == StorageErrorKind::NotFound => {
                tracing::debug!(
                    documentation = %documentation.id,
                    missing = %id,
                    "Ancestry ends at a deleted documentation"
                );
                break;
            }
            Err(source) => return Err(Error::AncestryWalk { id, source }),
        };
        if ancestors.len() == limits.max_depth {
            return Err(Error::AncestryTooDeep {
                id: documentation.id,
                limit: limits.max_depth,
            });
        }

        next = ancestor.cloned_from;
        ancestors.push(ancestor);
    }

    Ok(ancestors)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use quire_storage::{EntityRef, Operation, Storage, Transaction};

    use super::*;
    use crate::testing::Fixture;

    fn ids(documentations: &[Documentation]) -> Vec<DocumentationId> {
        documentations.iter().map(|d| d.id).collect()
    }

    #[tokio::test]
    async fn test_root_has_no_ancestors() {
        let fixture = Fixture::new();
        let root = fixture.root("Handbook").await;

        let ancestors = resolve_ancestors(&fixture.storage, root, AncestryLimits::default())
            .await
            .unwrap();

        assert!(ancestors.is_empty());
    }

    #[tokio::test]
    async fn test_chain_of_length_k_returns_k_ancestors() {
        let fixture = Fixture::new();
        let mut chain = vec![fixture.root("Handbook").await];
        for _ in 0..4 {
            let source = *chain.last().unwrap();
            chain.push(fixture.fork_row(source).await);
        }

        for (k, id) in chain.iter().enumerate() {
            let ancestors = resolve_ancestors(&fixture.storage, *id, AncestryLimits::default())
                .await
                .unwrap();
            let expected: Vec<_> = chain[..k].iter().rev().copied().collect();
            assert_eq!(ids(&ancestors), expected);
        }
    }

    #[tokio::test]
    async fn test_ancestors_carry_page_groups() {
        let fixture = Fixture::new();
        let d1 = fixture.root("Handbook").await;
        let group = fixture.group(d1, None, "Guides").await;
        let d2 = fixture.fork_row(d1).await;

        let ancestors = resolve_ancestors(&fixture.storage, d2, AncestryLimits::default())
            .await
            .unwrap();

        assert_eq!(ids(&ancestors), vec![d1]);
        assert_eq!(ancestors[0].page_groups.len(), 1);
        assert_eq!(ancestors[0].page_groups[0].id, group);
    }

    #[tokio::test]
    async fn test_missing_start_yields_empty() {
        let fixture = Fixture::new();

        let ancestors = resolve_ancestors(
            &fixture.storage,
            DocumentationId(404),
            AncestryLimits::default(),
        )
        .await
        .unwrap();

        assert!(ancestors.is_empty());
    }

    #[tokio::test]
    async fn test_walk_stops_at_deleted_source() {
        let fixture = Fixture::new();
        let d1 = fixture.root("Handbook").await;
        let d2 = fixture.fork_row(d1).await;
        let d3 = fixture.fork_row(d2).await;

        let mut tx = fixture.storage.begin().await.unwrap();
        tx.clear_editors(EntityRef::Documentation(d1))
            .await
            .unwrap();
        tx.delete_documentation(d1).await.unwrap();
        tx.commit().await.unwrap();

        let ancestors = resolve_ancestors(&fixture.storage, d3, AncestryLimits::default())
            .await
            .unwrap();

        assert_eq!(ids(&ancestors), vec![d2]);
    }

    #[tokio::test]
    async fn test_cycle_is_detected() {
        let fixture = Fixture::new();
        let d1 = fixture.root("Handbook").await;
        let d2 = fixture.fork_row(d1).await;
        fixture.set_cloned_from(d1, Some(d2)).await;

        let err = resolve_ancestors(&fixture.storage, d2, AncestryLimits::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::CycleDetected { id } if id == d2));
    }

    #[tokio::test]
    async fn test_self_reference_is_a_cycle() {
        let fixture = Fixture::new();
        let d1 = fixture.root("Handbook").await;
        fixture.set_cloned_from(d1, Some(d1)).await;

        let err = resolve_ancestors(&fixture.storage, d1, AncestryLimits::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::CycleDetected { id } if id == d1));
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let fixture = Fixture::new();
        let d1 = fixture.root("Handbook").await;
        let d2 = fixture.fork_row(d1).await;
        let d3 = fixture.fork_row(d2).await;
        let limits = AncestryLimits { max_depth: 1 };

        let err = resolve_ancestors(&fixture.storage, d3, limits)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AncestryTooDeep { id, limit: 1 } if id == d3));

        let ancestors = resolve_ancestors(&fixture.storage, d2, limits)
            .await
            .unwrap();
        assert_eq!(ids(&ancestors), vec![d1]);
    }

    #[tokio::test]
    async fn test_dangling_source_within_depth_limit() {
        let fixture = Fixture::new();
        let d1 = fixture.root("Handbook").await;
        let d2 = fixture.fork_row(d1).await;
        fixture.set_cloned_from(d1, Some(DocumentationId(999))).await;

        let ancestors = resolve_ancestors(&fixture.storage, d2, AncestryLimits { max_depth: 1 })
            .await
            .unwrap();

        assert_eq!(ids(&ancestors), vec![d1]);
    }

    #[tokio::test]
    async fn test_other_errors_abort_walk() {
        let fixture = Fixture::new();
        let d1 = fixture.root("Handbook").await;
        let d2 = fixture.fork_row(d1).await;
        let storage = fixture.storage.with_failure(Operation::LoadDocumentation, 2);

        let err = resolve_ancestors(&storage, d2, AncestryLimits::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AncestryWalk { id, .. } if id == d1));
    }
}
