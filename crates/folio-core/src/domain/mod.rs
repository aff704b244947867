//! Domain layer
//!
//! Live post content and its version history.

pub mod content;
pub mod versioning;
