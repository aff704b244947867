//! Line-level change summary between two versions
//!
//! Lines are compared as a multiset, not aligned as a sequence. The result
//! approximates how much changed; it is not a patch:
//!
//! - a line moved elsewhere in the body counts as unchanged
//! - a one-character edit counts as one line removed plus one line added
//! - duplicate lines match whichever copy comes first

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::version::Version;

/// Added/removed line counts between two bodies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDelta {
    pub added: usize,
    pub removed: usize,
}

impl LineDelta {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Count lines added and removed going from `from` to `to`
///
/// Both bodies are split on `\n`. A trailing newline yields a final empty
/// line and the empty body is a single empty line, so `"a"` and `"a\n"`
/// differ by one added line.
pub fn diff_bodies(from: &str, to: &str) -> LineDelta {
    let from_lines: Vec<&str> = from.split('\n').collect();

    let mut remaining: HashMap<&str, usize> = HashMap::new();
    for &line in &from_lines {
        *remaining.entry(line).or_insert(0) += 1;
    }

    let mut matched = 0;
    let mut added = 0;
    for line in to.split('\n') {
        match remaining.get_mut(line) {
            Some(count) if *count > 0 => {
                *count -= 1;
                matched += 1;
            }
            _ => added += 1,
        }
    }

    LineDelta {
        added,
        removed: from_lines.len() - matched,
    }
}

/// Human-readable summary, e.g. `"Title changed; +2 / -1 lines"`
pub fn summarize(title_changed: bool, delta: LineDelta) -> String {
    let mut parts = Vec::new();
    if title_changed {
        parts.push("Title changed".to_string());
    }
    if !delta.is_empty() {
        parts.push(format!("+{} / -{} lines", delta.added, delta.removed));
    }

    if parts.is_empty() {
        "No changes".to_string()
    } else {
        parts.join("; ")
    }
}

/// Comparison of two versions of one post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDiff {
    pub content_id: Uuid,
    pub from_version: i64,
    pub to_version: i64,
    pub title_changed: bool,
    pub added: usize,
    pub removed: usize,
    pub summary: String,
}

impl VersionDiff {
    /// Compare `from` against `to`
    pub fn between(from: &Version, to: &Version) -> Self {
        let title_changed = from.title != to.title;
        let delta = diff_bodies(&from.body, &to.body);

        Self {
            content_id: to.content_id,
            from_version: from.version,
            to_version: to.version,
            title_changed,
            added: delta.added,
            removed: delta.removed,
            summary: summarize(title_changed, delta),
        }
    }

    /// Whether neither title nor body lines changed
    pub fn is_unchanged(&self) -> bool {
        !self.title_changed && self.added == 0 && self.removed == 0
    }
}
