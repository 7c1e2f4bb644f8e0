//! Receiver Session: Bit Decoder + ack half of the flow controller
//!
//! `on_notification` berjalan di konteks signal handler:
//! 1. catat pengirim sebagai Remote Identity
//! 2. fold bit ke accumulator
//! 3. jika byte lengkap → push event ke ring
//! 4. kirim tepat satu ack ke Remote Identity
//!
//! Main flow hanya membaca: `drain` mengosongkan ring ke output.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU16, AtomicU64, Ordering};

use tracing::{debug, info};

use crate::channel::{Notifier, WakeHandle, WakeWaiter};
use crate::core::{ByteAccumulator, RingBuffer};
use crate::error::{TransportError, TransportResult};
use crate::protocol::{Decoded, Notification, Pid};

/// Kapasitas ring event handler → main flow
pub const EVENT_CAPACITY: usize = 4096;

// Tidak ada fault yang tercatat
const NO_FAULT: i32 = 0;
// si_pid tidak valid (mis. sinyal dari kernel)
const FAULT_NO_SENDER: i32 = -1;

/// One-slot overflow cell, encoded in a single atomic word.
///
/// `0` = empty, `0x100 | byte` = data byte, `0x200` = end of message.
struct ParkedEvent(AtomicU16);

impl ParkedEvent {
    const EMPTY: u16 = 0;
    const BYTE: u16 = 0x100;
    const END: u16 = 0x200;

    const fn new() -> Self {
        Self(AtomicU16::new(Self::EMPTY))
    }

    fn park(&self, event: Decoded) {
        let word = match event {
            Decoded::Byte(b) => Self::BYTE | u16::from(b),
            Decoded::EndOfMessage => Self::END,
        };
        self.0.store(word, Ordering::Release);
    }

    fn take(&self) -> Option<Decoded> {
        match self.0.swap(Self::EMPTY, Ordering::AcqRel) {
            Self::EMPTY => None,
            Self::END => Some(Decoded::EndOfMessage),
            word => Some(Decoded::Byte((word & 0xFF) as u8)),
        }
    }
}

/// Running totals kept by the main flow while draining.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MessageTally {
    /// Pesan yang sudah selesai (terminator diterima)
    pub messages: u64,
    /// Total byte data yang sudah ditulis
    pub bytes: u64,
    // Panjang pesan yang sedang berjalan
    current_len: u64,
}

/// All receiver state shared between the signal handler and the main flow.
///
/// Single-session: decode state is global to the session, and acks always
/// go to whoever sent the last notification.
pub struct ReceiverSession<N> {
    notifier: N,
    accumulator: ByteAccumulator,
    events: RingBuffer<Decoded, EVENT_CAPACITY>,
    parked: ParkedEvent,
    remote: AtomicI32,
    fault: AtomicI32,
    // errno dari write(2) ke wake pipe yang gagal
    wake_fault: AtomicI32,
    shutdown: AtomicBool,
    bits_received: AtomicU64,
    acks_sent: AtomicU64,
    waker: Option<WakeHandle>,
}

impl<N: Notifier> ReceiverSession<N> {
    pub fn new(notifier: N) -> Self {
        Self {
            notifier,
            accumulator: ByteAccumulator::new(),
            events: RingBuffer::new(),
            parked: ParkedEvent::new(),
            remote: AtomicI32::new(0),
            fault: AtomicI32::new(NO_FAULT),
            wake_fault: AtomicI32::new(NO_FAULT),
            shutdown: AtomicBool::new(false),
            bits_received: AtomicU64::new(0),
            acks_sent: AtomicU64::new(0),
            waker: None,
        }
    }

    /// Attach the write end of the self-pipe used to wake the main flow.
    pub fn with_waker(mut self, waker: WakeHandle) -> Self {
        self.waker = Some(waker);
        self
    }

    /// Handler entry point for one inbound bit notification.
    ///
    /// Async-signal-safe. Returns the event completed by this bit, if any.
    pub fn on_notification(&self, kind: Notification, from: i32) -> Option<Decoded> {
        self.remote.store(from, Ordering::SeqCst);
        self.bits_received.fetch_add(1, Ordering::Relaxed);

        let event = self.accumulator.fold(kind.bit());

        if let Some(ev) = event {
            if !self.events.push(ev) {
                // Ring penuh: tahan event dan ack-nya sampai main flow drain.
                // Sender tetap block, jadi lock-step tidak rusak.
                self.parked.park(ev);
                self.wake();
                return event;
            }
        }

        if let Err(errno) = self.acknowledge() {
            self.fault.store(errno, Ordering::SeqCst);
        }

        if event.is_some() || self.has_fault() {
            self.wake();
        }
        event
    }

    // Ack ke Remote Identity. Err berisi errno untuk dicatat sebagai fault.
    fn acknowledge(&self) -> Result<(), i32> {
        let raw = self.remote.load(Ordering::SeqCst);
        let pid = Pid::new(raw).ok_or(FAULT_NO_SENDER)?;

        match self.notifier.notify(pid, Notification::ACK) {
            Ok(()) => {
                self.acks_sent.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TransportError::Notify { source, .. }) => {
                Err(source.raw_os_error().unwrap_or(libc::EIO))
            }
            Err(_) => Err(libc::EIO),
        }
    }

    /// Empty the event ring into `out`.
    ///
    /// Bytes are written as they were decoded, a newline closes each
    /// message. A parked event is written last and its deferred ack sent.
    pub fn drain<W: Write>(&self, out: &mut W, tally: &mut MessageTally) -> TransportResult<usize> {
        self.check_fault()?;

        let mut written = 0;
        while let Some(event) = self.events.pop() {
            self.emit(out, event, tally)?;
            written += 1;
        }

        if let Some(event) = self.parked.take() {
            self.emit(out, event, tally)?;
            written += 1;
            debug!("Sending deferred ack after ring overflow");
            if let Err(errno) = self.acknowledge() {
                self.fault.store(errno, Ordering::SeqCst);
            }
        }

        if written > 0 {
            out.flush()?;
        }

        self.check_fault()?;
        Ok(written)
    }

    fn emit<W: Write>(&self, out: &mut W, event: Decoded, tally: &mut MessageTally) -> io::Result<()> {
        match event {
            Decoded::Byte(b) => {
                out.write_all(&[b])?;
                tally.bytes += 1;
                tally.current_len += 1;
            }
            Decoded::EndOfMessage => {
                out.write_all(b"\n")?;
                tally.messages += 1;
                info!(
                    from = self.remote(),
                    bytes = tally.current_len,
                    "Message received"
                );
                tally.current_len = 0;
            }
        }
        Ok(())
    }

    fn check_fault(&self) -> TransportResult<()> {
        let wake_errno = self.wake_fault.load(Ordering::SeqCst);
        if wake_errno != NO_FAULT {
            return Err(TransportError::Wake(io::Error::from_raw_os_error(wake_errno)));
        }
        match self.fault.load(Ordering::SeqCst) {
            NO_FAULT => Ok(()),
            FAULT_NO_SENDER => Err(TransportError::AckFault {
                pid: self.remote(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "notification has no sender pid"),
            }),
            errno => Err(TransportError::AckFault {
                pid: self.remote(),
                source: io::Error::from_raw_os_error(errno),
            }),
        }
    }

    /// Main loop receiver: drain, lalu block sampai handler membangunkan
    ///
    /// Returns saat shutdown diminta (SIGINT/SIGTERM) atau terjadi fault.
    pub fn serve<W: Write>(&self, waiter: &mut WakeWaiter, out: &mut W) -> TransportResult<MessageTally> {
        let mut tally = MessageTally::default();

        loop {
            // Baca flag sebelum drain: event yang masuk sebelum shutdown
            // pasti ikut ter-drain di iterasi terakhir
            let stopping = self.is_shutdown();
            self.drain(out, &mut tally)?;
            if stopping {
                info!(
                    messages = tally.messages,
                    bytes = tally.bytes,
                    "Receiver shutting down"
                );
                return Ok(tally);
            }
            waiter.wait().map_err(TransportError::Wake)?;
        }
    }
}

impl<N> ReceiverSession<N> {
    #[inline(always)]
    fn wake(&self) {
        if let Some(waker) = &self.waker {
            if let Err(errno) = waker.wake() {
                // Simpan errno pertama saja
                let _ = self.wake_fault.compare_exchange(
                    NO_FAULT,
                    errno,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                );
            }
        }
    }

    /// Called from the SIGINT/SIGTERM handler.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.wake();
    }

    #[inline(always)]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    #[inline(always)]
    fn has_fault(&self) -> bool {
        self.fault.load(Ordering::SeqCst) != NO_FAULT
    }

    /// Pid of the sender of the last processed notification (0 = none yet).
    #[inline(always)]
    pub fn remote(&self) -> i32 {
        self.remote.load(Ordering::SeqCst)
    }

    pub fn accumulator(&self) -> &ByteAccumulator {
        &self.accumulator
    }

    pub fn bits_received(&self) -> u64 {
        self.bits_received.load(Ordering::Relaxed)
    }

    pub fn acks_sent(&self) -> u64 {
        self.acks_sent.load(Ordering::Relaxed)
    }

    /// Events decoded but not yet drained.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}
