//! POSIX signal backend
//!
//! `SIGUSR1` = bit 1 (dan ack), `SIGUSR2` = bit 0.
//!
//! Handler C tidak bisa membawa state, jadi satu-satunya global adalah
//! jembatan ke objek state eksplisit: `SENDER_ACK` untuk client dan
//! `RECEIVER` untuk server. Handler hanya memakai operasi
//! async-signal-safe: atomic, `kill(2)`, `write(2)`.

use std::io;
use std::ptr;
use std::sync::OnceLock;

use libc::{c_int, c_void, siginfo_t};
use tracing::debug;

use crate::core::AckFlag;
use crate::error::{TransportError, TransportResult};
use crate::protocol::{Notification, Pid};
use crate::session::ReceiverSession;

use super::Notifier;

static SENDER_ACK: AckFlag = AckFlag::new();
static RECEIVER: OnceLock<ReceiverSession<SignalNotifier>> = OnceLock::new();

/// Signal number carrying a notification kind.
#[inline(always)]
pub const fn signal_number(kind: Notification) -> c_int {
    match kind {
        Notification::Usr1 => libc::SIGUSR1,
        Notification::Usr2 => libc::SIGUSR2,
    }
}

/// Reverse of [`signal_number`]; `None` for signals outside the alphabet.
#[inline(always)]
pub const fn notification_of(signo: c_int) -> Option<Notification> {
    match signo {
        libc::SIGUSR1 => Some(Notification::Usr1),
        libc::SIGUSR2 => Some(Notification::Usr2),
        _ => None,
    }
}

/// `kill(2)`-based notifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalNotifier;

impl Notifier for SignalNotifier {
    #[inline(always)]
    fn notify(&self, target: Pid, kind: Notification) -> TransportResult<()> {
        // SAFETY: kill tidak menyentuh memori proses ini
        let rc = unsafe { libc::kill(target.get(), signal_number(kind)) };
        if rc == -1 {
            return Err(TransportError::Notify {
                kind,
                pid: target,
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }
}

/// pid proses ini
pub fn current_pid() -> i32 {
    // SAFETY: getpid selalu sukses
    unsafe { libc::getpid() }
}

/// Install the sender's acknowledgment handler for `SIGUSR1`.
///
/// Only the ack kind gets a handler; `SIGUSR2` keeps its default action.
pub fn install_ack_handler() -> TransportResult<&'static AckFlag> {
    let handler = on_ack as extern "C" fn(c_int);
    // SAFETY: handler hanya menyentuh atomic
    unsafe {
        register(
            Notification::ACK,
            handler as usize,
            libc::SA_RESTART,
            &[],
        )?;
    }
    debug!(signal = %Notification::ACK, "Ack handler installed");
    Ok(&SENDER_ACK)
}

/// Install the receiver's bit handler for both data signals, plus
/// `SIGINT`/`SIGTERM` as shutdown requests.
///
/// While the bit handler runs both data signals are masked, so one bit is
/// folded and acknowledged before the next is delivered.
pub fn install_receiver(
    session: ReceiverSession<SignalNotifier>,
) -> TransportResult<&'static ReceiverSession<SignalNotifier>> {
    let already_installed = || TransportError::Register {
        signal: "SIGUSR1",
        source: io::Error::new(io::ErrorKind::AlreadyExists, "receiver already installed"),
    };
    RECEIVER.set(session).map_err(|_| already_installed())?;
    let session = RECEIVER.get().ok_or_else(already_installed)?;

    let data_mask = [libc::SIGUSR1, libc::SIGUSR2];
    let bit_handler = on_bit as extern "C" fn(c_int, *mut siginfo_t, *mut c_void);
    let stop_handler = on_shutdown as extern "C" fn(c_int);

    // SAFETY: semua handler hanya memakai operasi async-signal-safe
    unsafe {
        for kind in [Notification::Usr1, Notification::Usr2] {
            register(
                kind,
                bit_handler as usize,
                libc::SA_SIGINFO | libc::SA_RESTART,
                &data_mask,
            )?;
        }
        register_raw(libc::SIGINT, "SIGINT", stop_handler as usize, libc::SA_RESTART, &[])?;
        register_raw(libc::SIGTERM, "SIGTERM", stop_handler as usize, libc::SA_RESTART, &[])?;
    }

    debug!("Receiver handlers installed");
    Ok(session)
}

unsafe fn register(
    kind: Notification,
    handler: usize,
    flags: c_int,
    mask: &[c_int],
) -> TransportResult<()> {
    register_raw(signal_number(kind), kind.name(), handler, flags, mask)
}

unsafe fn register_raw(
    signo: c_int,
    name: &'static str,
    handler: usize,
    flags: c_int,
    mask: &[c_int],
) -> TransportResult<()> {
    let mut action: libc::sigaction = std::mem::zeroed();
    action.sa_sigaction = handler;
    action.sa_flags = flags;
    libc::sigemptyset(&mut action.sa_mask);
    for &sig in mask {
        libc::sigaddset(&mut action.sa_mask, sig);
    }

    if libc::sigaction(signo, &action, ptr::null_mut()) == -1 {
        return Err(TransportError::last_os_error_for_register(name));
    }
    Ok(())
}

// Handler berikut berjalan di konteks sinyal: tidak boleh alokasi,
// lock, logging, atau panic.

extern "C" fn on_ack(_signo: c_int) {
    SENDER_ACK.raise();
}

extern "C" fn on_bit(signo: c_int, info: *mut siginfo_t, _ctx: *mut c_void) {
    let _errno = ErrnoGuard::save();

    let (Some(session), Some(kind)) = (RECEIVER.get(), notification_of(signo)) else {
        return;
    };
    let from = if info.is_null() {
        0
    } else {
        // SAFETY: SA_SIGINFO menjamin info valid selama handler berjalan
        unsafe { sender_pid(&*info) }
    };

    session.on_notification(kind, from);
}

extern "C" fn on_shutdown(_signo: c_int) {
    let _errno = ErrnoGuard::save();
    if let Some(session) = RECEIVER.get() {
        session.request_shutdown();
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
unsafe fn sender_pid(info: &siginfo_t) -> i32 {
    info.si_pid()
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
unsafe fn sender_pid(info: &siginfo_t) -> i32 {
    info.si_pid
}

/// Simpan errno main flow, kembalikan saat handler selesai
struct ErrnoGuard(c_int);

impl ErrnoGuard {
    fn save() -> Self {
        // SAFETY: lokasi errno thread-local selalu valid
        Self(unsafe { *errno_location() })
    }
}

impl Drop for ErrnoGuard {
    fn drop(&mut self) {
        // SAFETY: lihat save()
        unsafe { *errno_location() = self.0 };
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
unsafe fn errno_location() -> *mut c_int {
    libc::__errno_location()
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
unsafe fn errno_location() -> *mut c_int {
    libc::__error()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_mapping_roundtrip() {
        for kind in [Notification::Usr1, Notification::Usr2] {
            assert_eq!(notification_of(signal_number(kind)), Some(kind));
        }
        assert_eq!(notification_of(libc::SIGINT), None);
        assert_eq!(signal_number(Notification::ACK), libc::SIGUSR1);
    }

    #[test]
    fn test_notify_missing_process_fails() {
        // pid_max di Linux jauh di bawah i32::MAX
        let ghost = Pid::new(i32::MAX).unwrap();
        let err = SignalNotifier
            .notify(ghost, Notification::Usr2)
            .unwrap_err();
        match err {
            TransportError::Notify { source, .. } => {
                assert_eq!(source.raw_os_error(), Some(libc::ESRCH));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_errno_guard_restores_errno() {
        // SAFETY: errno thread-local milik thread test ini
        unsafe { *errno_location() = libc::EINTR };
        {
            let _guard = ErrnoGuard::save();
            unsafe { *errno_location() = libc::ESRCH };
        }
        assert_eq!(unsafe { *errno_location() }, libc::EINTR);
    }

    #[test]
    fn test_current_pid_positive() {
        assert!(Pid::new(current_pid()).is_some());
    }
}
