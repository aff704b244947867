//! Versioning domain module
//!
//! Append-only, per-post version history.
//!
//! # Architecture
//!
//! - **Entities**: `Version`, `VersionStats`, `VersionDiff`
//! - **Repository**: `VersionRepository` for database operations
//! - **Allocator**: `VersionNumberAllocator` for `MAX + 1` numbering with bounded retry
//! - **Restore**: `RestoreCoordinator` for atomic restore-as-new-version
//! - **Retention**: `RetentionPolicy` for keep-count pruning
//! - **Service**: `VersionService` tying the above together
//!
//! # Example
//!
//! ```ignore
//! use folio_core::domain::versioning::VersionService;
//!
//! let service = VersionService::new(pool);
//!
//! let (post, _) = service.create_content("Hello", "line1").await?;
//! service.record_edit(post.id, "Hello", "line1\nline2").await?;
//!
//! let diff = service.compare_versions(post.id, 1, 2).await?;
//! assert_eq!(diff.summary, "+1 / -0 lines");
//!
//! let v1 = service.get_version(post.id, 1).await?;
//! service.restore_version(post.id, v1.id).await?;
//! ```

pub mod allocator;
pub mod diff;
pub mod repository;
pub mod restore;
pub mod retention;
pub mod service;
pub mod version;

pub use allocator::VersionNumberAllocator;
pub use diff::{LineDelta, VersionDiff, diff_bodies, summarize};
pub use repository::VersionRepository;
pub use restore::{RestoreCoordinator, RestoreResult};
pub use retention::{RetentionPolicy, select_for_deletion};
pub use service::VersionService;
pub use version::{Version, VersionStats};
