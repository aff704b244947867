//! Content domain module
//!
//! Live post content: the mutable side of a post that version records
//! snapshot and that restore writes back to.

pub mod entity;
pub mod repository;
pub mod repository_trait;

pub use entity::{Content, ContentUpdate};
pub use repository::ContentRepository;
pub use repository_trait::ContentStore;
