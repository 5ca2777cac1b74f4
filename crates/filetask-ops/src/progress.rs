//! Batch-wide byte progress.

/// Running byte count of a batch against its up-front size estimate.
///
/// The total is fixed when the batch starts. Skipped items never shrink it,
/// so a batch with skips may finish below 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    bytes_total: u64,
    bytes_copied: u64,
}

impl ProgressState {
    /// Create a progress tracker for a batch of `bytes_total` bytes.
    pub fn new(bytes_total: u64) -> Self {
        Self {
            bytes_total,
            bytes_copied: 0,
        }
    }

    /// Record more transferred bytes.
    pub fn add(&mut self, bytes: u64) {
        self.bytes_copied = self.bytes_copied.saturating_add(bytes);
    }

    /// Bytes transferred so far.
    pub fn bytes_copied(&self) -> u64 {
        self.bytes_copied
    }

    /// Integer percentage, clamped to 100. An empty batch counts as done.
    pub fn percentage(&self) -> u8 {
        if self.bytes_total == 0 {
            return 100;
        }
        let percent = u128::from(self.bytes_copied) * 100 / u128::from(self.bytes_total);
        percent.min(100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_floors() {
        let mut progress = ProgressState::new(3);
        progress.add(1);
        assert_eq!(progress.percentage(), 33);
        progress.add(1);
        assert_eq!(progress.percentage(), 66);
        progress.add(1);
        assert_eq!(progress.percentage(), 100);
    }

    #[test]
    fn test_zero_total_is_complete() {
        let progress = ProgressState::new(0);
        assert_eq!(progress.percentage(), 100);
    }

    #[test]
    fn test_overrun_is_clamped() {
        let mut progress = ProgressState::new(10);
        progress.add(25);
        assert_eq!(progress.percentage(), 100);
        assert_eq!(progress.bytes_copied(), 25);
    }

    #[test]
    fn test_large_sizes_do_not_overflow() {
        let mut progress = ProgressState::new(u64::MAX);
        progress.add(u64::MAX / 2);
        assert_eq!(progress.percentage(), 49);
    }
}
