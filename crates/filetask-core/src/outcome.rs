//! Result types returned by a finished batch.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One top-level item that reached its destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyEntry {
    /// Absolute path the item was written to.
    pub destination: PathBuf,
    /// Absolute path the item came from.
    pub source: PathBuf,
    /// Content type derived from the source name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl CopyEntry {
    /// Create an entry without a content type.
    pub fn new(destination: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            source: source.into(),
            mime_type: None,
        }
    }
}

/// A file inside a replicated tree that was left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedItem {
    /// The source path that was not transferred.
    pub path: PathBuf,
    /// Human-readable reason.
    pub reason: String,
}

impl SkippedItem {
    /// Create a skipped item record.
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Everything a successful batch produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Processed top-level items in request order.
    pub entries: Vec<CopyEntry>,
    /// Files inside directory trees whose transfer failed and was skipped.
    pub skipped: Vec<SkippedItem>,
    /// Bytes streamed across the whole batch.
    pub bytes_copied: u64,
    /// Size estimate computed before the batch started.
    pub bytes_total: u64,
}

impl BatchOutcome {
    /// Check if every visited file made it across.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Destination paths in request order.
    pub fn destinations(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.iter().map(|entry| &entry.destination)
    }

    /// Get a human-readable summary of the batch.
    pub fn summary(&self, verb: &str) -> String {
        if self.skipped.is_empty() {
            format!("{} {} items", verb, self.entries.len())
        } else {
            format!(
                "{} {} items, {} files skipped",
                verb,
                self.entries.len(),
                self.skipped.len()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let mut outcome = BatchOutcome::default();
        outcome.entries.push(CopyEntry::new("/dst/a", "/src/a"));
        assert_eq!(outcome.summary("Copied"), "Copied 1 items");
        assert!(outcome.is_complete());

        outcome.skipped.push(SkippedItem::new("/src/b/c", "Permission denied"));
        assert_eq!(outcome.summary("Moved"), "Moved 1 items, 1 files skipped");
        assert!(!outcome.is_complete());
    }
}
