//! Hook invoked after a documentation is created.

use quire_storage::DocumentationId;

/// Error reported by a [`SiteHook`].
pub type SiteHookError = Box<dyn std::error::Error + Send + Sync>;

/// Prepares the published site of a newly created documentation.
///
/// A failing hook undoes the creation.
#[allow(async_fn_in_trait)]
pub trait SiteHook: Send + Sync {
    async fn init_site(&self, id: DocumentationId) -> Result<(), SiteHookError>;
}

/// Hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSiteHook;

impl SiteHook for NoopSiteHook {
    async fn init_site(&self, _id: DocumentationId) -> Result<(), SiteHookError> {
        Ok(())
    }
}
