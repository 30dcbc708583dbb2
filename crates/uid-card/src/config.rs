//! Configuration options for the PC/SC frontend

use std::time::Duration;

/// Sharing mode for card connections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareMode {
    /// Exclusive access to the card
    Exclusive,
    /// Shared access to the card (default)
    Shared,
}

impl From<ShareMode> for pcsc::ShareMode {
    fn from(mode: ShareMode) -> Self {
        match mode {
            ShareMode::Exclusive => Self::Exclusive,
            ShareMode::Shared => Self::Shared,
        }
    }
}

/// Configuration options for the PC/SC frontend
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Sharing mode for card connections
    pub share_mode: ShareMode,

    /// How often a blocked card wait wakes up to check for an interrupt.
    /// The wait itself has no deadline.
    pub poll_interval: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            share_mode: ShareMode::Shared,
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl ReaderConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sharing mode
    pub const fn with_share_mode(mut self, mode: ShareMode) -> Self {
        self.share_mode = mode;
        self
    }

    /// Set the interrupt check interval
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReaderConfig::new();
        assert_eq!(config.share_mode, ShareMode::Shared);
        assert_eq!(config.poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_builder() {
        let config = ReaderConfig::new()
            .with_share_mode(ShareMode::Exclusive)
            .with_poll_interval(Duration::from_millis(100));
        assert_eq!(config.share_mode, ShareMode::Exclusive);
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert!(matches!(
            pcsc::ShareMode::from(config.share_mode),
            pcsc::ShareMode::Exclusive
        ));
    }
}
