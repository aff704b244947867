//! Folio Core Library
//!
//! Version history for blog posts:
//! - Append-only, gap-free version numbering per post
//! - Line-level comparison between versions
//! - Atomic restore of a past version onto live content
//! - Keep-count retention
//! - SQLite storage with migrations

pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use domain::content::{Content, ContentRepository, ContentStore, ContentUpdate};
pub use domain::versioning::{
    RestoreResult, Version, VersionDiff, VersionService, VersionStats, diff_bodies,
};
pub use error::{Error, Result};
pub use storage::Database;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::content::{Content, ContentUpdate};
    pub use crate::domain::versioning::{Version, VersionDiff, VersionService};
    pub use crate::error::{Error, Result};
    pub use crate::storage::Database;
}

#[cfg(test)]
mod config_tests;
