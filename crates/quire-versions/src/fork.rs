//! Forking a documentation into a new version.

use std::fmt;

use quire_storage::{Associations, DocumentationId, Storage, Transaction};

use crate::ancestry::{AncestryLimits, ancestors_of};
use crate::cloner::{ClonedTree, clone_tree};
use crate::error::{Error, Step};

/// Progress of a fork, reported in traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkPhase {
    LoadingSource,
    ResolvingAncestry,
    Cloning,
    Committing,
    Done,
    RolledBack,
}

impl fmt::Display for ForkPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LoadingSource => "loading source",
            Self::ResolvingAncestry => "resolving ancestry",
            Self::Cloning => "cloning",
            Self::Committing => "committing",
            Self::Done => "done",
            Self::RolledBack => "rolled back",
        })
    }
}

/// Fork documentation `source_id` into a new version labelled `version`.
///
/// The source and its ancestry are read before a transaction is opened. The
/// copy is written in one transaction: if any write fails it is rolled back
/// and no part of the new documentation is visible.
pub async fn create_documentation_version<S: Storage>(
    storage: &S,
    source_id: DocumentationId,
    version: &str,
    limits: AncestryLimits,
) -> Result<ClonedTree, Error> {
    let mut phase = ForkPhase::LoadingSource;
    tracing::debug!(source = %source_id, %phase, "Forking documentation");
    let source = storage
        .load_documentation(source_id, Associations::FULL)
        .await
        .map_err(Error::loading(source_id))?;

    phase = ForkPhase::ResolvingAncestry;
    tracing::debug!(source = %source_id, %phase, "Forking documentation");
    let ancestors = ancestors_of(storage, &source, limits).await?;

    phase = ForkPhase::Cloning;
    tracing::debug!(
        source = %source_id,
        %phase,
        ancestors = ancestors.len(),
        "Forking documentation"
    );
    let mut tx = storage
        .begin()
        .await
        .map_err(Error::at(Step::BeginTransaction))?;
    let tree = match clone_tree(&mut tx, &source, &ancestors, version).await {
        Ok(tree) => tree,
        Err(err) => {
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!(source = %source_id, error = %rollback, "Rollback failed");
            }
            phase = ForkPhase::RolledBack;
            tracing::warn!(source = %source_id, %phase, error = %err, "Fork failed");
            return Err(err);
        }
    };

    phase = ForkPhase::Committing;
    tracing::debug!(source = %source_id, %phase, "Forking documentation");
    tx.commit().await.map_err(Error::at(Step::Commit))?;

    phase = ForkPhase::Done;
    tracing::info!(
        source = %source_id,
        documentation = %tree.documentation_id,
        version,
        page_groups = tree.page_groups.len(),
        pages = tree.pages,
        %phase,
        "Created documentation version"
    );
    Ok(tree)
}
