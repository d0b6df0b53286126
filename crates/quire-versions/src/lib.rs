//! Documentation versioning for Quire.
//!
//! A documentation is forked into a new version by copying its page groups and
//! pages into a fresh documentation whose `cloned_from` points back at the
//! source. Forks of forks form an ancestry chain; page groups of a fork may
//! link to groups of an ancestor, and those links are preserved when the fork
//! is copied again.
//!
//! # Architecture
//!
//! - [`resolve_ancestors`] walks the `cloned_from` chain with cycle and depth
//!   guards
//! - [`clone_tree`] writes the copy inside a caller-owned transaction and
//!   re-roots copied groups ([`ParentLink`])
//! - [`create_documentation_version`] sequences the two and commits or rolls
//!   back
//! - [`DocumentationService`] adds reads, creation, edits and deletion
//!
//! # Example
//!
//! ```ignore
//! use quire_versions::DocumentationService;
//!
//! let service = DocumentationService::new(storage);
//! let tree = service.create_documentation_version(id, "2.0").await?;
//! println!("created {}", tree.documentation_id);
//! ```

mod ancestry;
mod cloner;
mod error;
mod fork;
mod service;
mod site;
#[cfg(test)]
mod testing;

pub use ancestry::{AncestryLimits, DEFAULT_MAX_DEPTH, ancestors_of, resolve_ancestors};
pub use cloner::{ClonedTree, ParentLink, clone_tree, resolve_parent_link};
pub use error::{Error, Step};
pub use fork::{ForkPhase, create_documentation_version};
pub use service::{CreateDocumentation, DocumentationService, EditDocumentation};
pub use site::{NoopSiteHook, SiteHook, SiteHookError};
