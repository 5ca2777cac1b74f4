//! Conflict decisions and transfer modes.

use serde::{Deserialize, Serialize};

/// How to handle a destination path that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConflictStrategy {
    /// Leave source and destination untouched and drop the item.
    Skip,
    /// Write into a fresh sibling name such as "file (1).txt".
    KeepBoth,
    /// Replace the existing destination content.
    Overwrite,
}

impl std::fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip => write!(f, "Skip"),
            Self::KeepBoth => write!(f, "Keep both"),
            Self::Overwrite => write!(f, "Overwrite"),
        }
    }
}

/// A conflict answer, optionally sticky for the rest of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictDecision {
    /// What to do with the conflicting item.
    pub strategy: ConflictStrategy,
    /// Reuse this decision for every later conflict without asking.
    pub apply_to_all: bool,
}

impl ConflictDecision {
    /// Create a decision.
    pub fn new(strategy: ConflictStrategy, apply_to_all: bool) -> Self {
        Self {
            strategy,
            apply_to_all,
        }
    }

    /// A decision for this item only.
    pub fn once(strategy: ConflictStrategy) -> Self {
        Self::new(strategy, false)
    }

    /// A decision for this and every later conflict.
    pub fn always(strategy: ConflictStrategy) -> Self {
        Self::new(strategy, true)
    }
}

impl Default for ConflictDecision {
    /// Batches start out overwriting, still asking on the first conflict.
    fn default() -> Self {
        Self::once(ConflictStrategy::Overwrite)
    }
}

/// Whether a batch keeps or removes its sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferMode {
    Copy,
    Move,
}

impl TransferMode {
    /// Check if the sources must be removed after transfer.
    pub fn is_move(self) -> bool {
        matches!(self, Self::Move)
    }
}

impl std::fmt::Display for TransferMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Copy => write!(f, "Copy"),
            Self::Move => write!(f, "Move"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_decision() {
        let decision = ConflictDecision::default();
        assert_eq!(decision.strategy, ConflictStrategy::Overwrite);
        assert!(!decision.apply_to_all);
    }
}
