//! Runtime configuration

use std::time::Duration;

/// Jeda default antar pengecekan ack (usleep(100) di desain awal)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(100);

/// Jeda default setelah ack sebelum bit berikutnya
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_micros(100);

/// Sender pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderConfig {
    /// Idle sleep between checks of the outstanding-ack flag.
    /// Zero means `yield_now` instead of sleeping.
    pub poll_interval: Duration,
    /// Extra pause after each acknowledged bit.
    pub settle_delay: Duration,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl SenderConfig {
    /// No sleeping at all. Untuk channel in-process dan benchmark.
    pub const fn immediate() -> Self {
        Self {
            poll_interval: Duration::ZERO,
            settle_delay: Duration::ZERO,
        }
    }

    pub fn from_micros(poll_us: u64, settle_us: u64) -> Self {
        Self {
            poll_interval: Duration::from_micros(poll_us),
            settle_delay: Duration::from_micros(settle_us),
        }
    }
}
