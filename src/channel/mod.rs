//! Channel Layer: Payload-Free Notifications
//!
//! Satu-satunya primitive yang dipakai protokol: "event jenis A atau B
//! terjadi", dialamatkan ke sebuah pid. Pada Unix ini adalah
//! `SIGUSR1`/`SIGUSR2` lewat `kill(2)`.
//!
//! Fitur:
//! - `Notifier` trait supaya sesi bisa diuji dengan channel in-process
//! - Handler install via `sigaction` dengan kedua sinyal data di-mask
//! - Self-pipe + mio untuk membangunkan main flow receiver

pub mod signal;
mod wake;

pub use signal::SignalNotifier;
pub use wake::{wake_pipe, WakeHandle, WakeWaiter};

use crate::error::TransportResult;
use crate::protocol::{Notification, Pid};

/// Sends one payload-free notification to a process.
///
/// Implementations used from signal-handler context must be
/// async-signal-safe: no allocation, no locks.
pub trait Notifier {
    fn notify(&self, target: Pid, kind: Notification) -> TransportResult<()>;
}

impl<N: Notifier + ?Sized> Notifier for &N {
    #[inline(always)]
    fn notify(&self, target: Pid, kind: Notification) -> TransportResult<()> {
        (**self).notify(target, kind)
    }
}
