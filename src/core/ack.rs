//! Outstanding-Ack Flag milik sender
//!
//! Satu bit in-flight per sender: `arm()` sebelum kirim bit, signal
//! handler memanggil `raise()`, main flow menunggu di `wait()`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

/// Sender-side acknowledgment state shared with the ack handler.
pub struct AckFlag {
    // true = bit terkirim, ack belum terlihat
    outstanding: AtomicBool,
    received: AtomicU64,
}

impl Default for AckFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl AckFlag {
    pub const fn new() -> Self {
        Self {
            outstanding: AtomicBool::new(false),
            received: AtomicU64::new(0),
        }
    }

    /// Tandai satu bit sebagai in-flight. Dipanggil sebelum notifikasi dikirim
    /// supaya ack yang datang sangat cepat tidak hilang.
    #[inline(always)]
    pub fn arm(&self) {
        self.outstanding.store(true, Ordering::SeqCst);
    }

    /// Called from the ack handler. Async-signal-safe.
    #[inline(always)]
    pub fn raise(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
        self.outstanding.store(false, Ordering::SeqCst);
    }

    #[inline(always)]
    pub fn is_outstanding(&self) -> bool {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Blocks until the outstanding bit is acknowledged, sleeping
    /// `poll_interval` between checks. There is no timeout.
    pub fn wait(&self, poll_interval: Duration) {
        while self.is_outstanding() {
            if poll_interval.is_zero() {
                thread::yield_now();
            } else {
                thread::sleep(poll_interval);
            }
        }
    }

    /// Total ack yang pernah diterima handler
    #[inline(always)]
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_arm_raise_cycle() {
        let flag = AckFlag::new();
        assert!(!flag.is_outstanding());

        flag.arm();
        assert!(flag.is_outstanding());

        flag.raise();
        assert!(!flag.is_outstanding());
        assert_eq!(flag.received(), 1);
    }

    #[test]
    fn test_wait_returns_immediately_when_acked() {
        let flag = AckFlag::new();
        flag.arm();
        flag.raise();
        flag.wait(Duration::from_secs(3600));
    }

    #[test]
    fn test_wait_unblocks_from_other_thread() {
        let flag = Arc::new(AckFlag::new());
        flag.arm();

        let remote = Arc::clone(&flag);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            remote.raise();
        });

        flag.wait(Duration::from_micros(100));
        assert!(!flag.is_outstanding());
        handle.join().unwrap();
    }
}
