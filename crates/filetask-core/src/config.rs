//! Batch configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default size of one streamed chunk (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// What to do with entries that cannot be stat'ed while sizing a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizePolicy {
    /// Count them as zero bytes.
    #[default]
    Lenient,
    /// Fail the size computation.
    Strict,
}

/// When a moved directory's sources are removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveCleanup {
    /// Remove each directory right after its own tree was replicated.
    #[default]
    PerItem,
    /// Remove every requested source as soon as any directory was moved.
    ///
    /// A source that is still present afterwards fails the batch with
    /// `SourceNotRemoved`.
    WholeBatch,
}

/// How standalone deletions dispose of paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteMode {
    /// Unlink permanently.
    #[default]
    Permanent,
    /// Send to the system trash.
    Trash,
}

/// Configuration for one copy, move or delete batch.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct BatchConfig {
    /// Bytes read and written per chunk.
    #[builder(default = "DEFAULT_CHUNK_SIZE")]
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Handling of unreadable entries during sizing.
    #[builder(default)]
    #[serde(default)]
    pub size_policy: SizePolicy,

    /// Source removal strategy for moved directories.
    #[builder(default)]
    #[serde(default)]
    pub move_cleanup: MoveCleanup,

    /// Disposal used by standalone deletions.
    #[builder(default)]
    #[serde(default)]
    pub delete_mode: DeleteMode,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl BatchConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.chunk_size == Some(0) {
            return Err("Chunk size must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl BatchConfig {
    /// Create a new batch config builder.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder::default()
    }

    /// Chunk size, never zero even for hand-built configs.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            size_policy: SizePolicy::Lenient,
            move_cleanup: MoveCleanup::PerItem,
            delete_mode: DeleteMode::Permanent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = BatchConfig::builder()
            .chunk_size(4096usize)
            .size_policy(SizePolicy::Strict)
            .build()
            .unwrap();

        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.size_policy, SizePolicy::Strict);
        assert_eq!(config.move_cleanup, MoveCleanup::PerItem);
        assert_eq!(config.delete_mode, DeleteMode::Permanent);
    }

    #[test]
    fn test_config_rejects_zero_chunk() {
        assert!(BatchConfig::builder().chunk_size(0usize).build().is_err());
    }

    #[test]
    fn test_effective_chunk_size() {
        let config = BatchConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert_eq!(config.effective_chunk_size(), 1);
    }
}
