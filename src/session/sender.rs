//! Sender Session: Bit Encoder + ack half of the flow controller
//!
//! Untuk setiap bit: arm flag → kirim notifikasi → tunggu ack → settle.
//! Tidak ada timeout, tidak ada retry: jika receiver tidak pernah ack,
//! sender block selamanya.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::channel::Notifier;
use crate::config::SenderConfig;
use crate::core::AckFlag;
use crate::error::TransportResult;
use crate::protocol::{frame_bits, Bit, Pid};

/// Summary of one transmitted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReport {
    /// Payload bytes, terminator excluded
    pub bytes: usize,
    /// Bit notifications emitted, `8 * (bytes + 1)`
    pub bits: usize,
    /// Acknowledgments consumed while sending
    pub acks: u64,
    pub elapsed: Duration,
}

/// Lock-step sender: at most one bit in flight.
pub struct Sender<'a, N> {
    notifier: N,
    target: Pid,
    ack: &'a AckFlag,
    config: SenderConfig,
}

impl<'a, N: Notifier> Sender<'a, N> {
    pub fn new(notifier: N, target: Pid, ack: &'a AckFlag, config: SenderConfig) -> Self {
        Self {
            notifier,
            target,
            ack,
            config,
        }
    }

    /// Kirim satu bit lalu block sampai ack-nya terlihat
    ///
    /// # Errors
    /// `TransportError::Notify` jika target tidak ada atau permission ditolak.
    pub fn send_bit(&self, bit: Bit) -> TransportResult<()> {
        // Arm sebelum kirim: ack bisa datang sebelum kill() return
        self.ack.arm();
        self.notifier.notify(self.target, bit.notification())?;

        self.ack.wait(self.config.poll_interval);

        if !self.config.settle_delay.is_zero() {
            thread::sleep(self.config.settle_delay);
        }
        Ok(())
    }

    /// Kirim pesan lengkap + terminator, bit demi bit (MSB dulu)
    ///
    /// # Errors
    /// - `EmbeddedTerminator` sebelum notifikasi pertama dikirim
    /// - `Notify` pada kegagalan `kill` pertama; bit berikutnya tidak dikirim
    pub fn send_message(&self, message: &[u8]) -> TransportResult<SendReport> {
        let frame = frame_bits(message)?;
        let bits = frame.len();

        debug!(
            target_pid = self.target.get(),
            bytes = message.len(),
            bits,
            "Sending message"
        );

        let acks_before = self.ack.received();
        let start = Instant::now();

        for (index, bit) in frame.enumerate() {
            trace!(index, %bit, "bit");
            self.send_bit(bit)?;
        }

        Ok(SendReport {
            bytes: message.len(),
            bits,
            acks: self.ack.received().wrapping_sub(acks_before),
            elapsed: start.elapsed(),
        })
    }
}
