//! Live post content
//!
//! The current, mutable state of a post. Version records snapshot it; they
//! never alias it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A post as readers currently see it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// Unique post identifier
    pub id: Uuid,

    pub title: String,

    /// Markdown body
    pub body: String,

    pub created_at: DateTime<Utc>,

    /// Last edit or restore
    pub updated_at: DateTime<Utc>,
}

impl Content {
    /// Create a new post stamped with `now`
    pub fn new(title: impl Into<String>, body: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            body: body.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this post already reads exactly as `update`
    pub fn matches(&self, update: &ContentUpdate) -> bool {
        self.title == update.title && self.body == update.body
    }
}

/// New title/body for a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUpdate {
    pub title: String,
    pub body: String,
}

impl ContentUpdate {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}
