//! Self-pipe untuk membangunkan main flow receiver
//!
//! Handler menulis satu byte ke pipe (write(2) async-signal-safe),
//! main flow block di `mio::Poll` sampai pipe readable. Menggantikan
//! busy-poll dengan blocking wait.

use std::io::{self, Read};
use std::os::unix::io::AsRawFd;

use libc::c_int;

use mio::unix::pipe;
use mio::{Events, Interest, Poll, Token};

const WAKE_TOKEN: Token = Token(0);
const EVENTS_CAPACITY: usize = 4;

/// Membuat pasangan pipe non-blocking
pub fn wake_pipe() -> io::Result<(WakeHandle, WakeWaiter)> {
    let (sender, mut receiver) = pipe::new()?;

    let poll = Poll::new()?;
    poll.registry()
        .register(&mut receiver, WAKE_TOKEN, Interest::READABLE)?;

    Ok((
        WakeHandle { sender },
        WakeWaiter {
            poll,
            events: Events::with_capacity(EVENTS_CAPACITY),
            receiver,
        },
    ))
}

/// Write end, owned by the receiver session and used from the handler.
pub struct WakeHandle {
    sender: pipe::Sender,
}

impl WakeHandle {
    /// Async-signal-safe. A full pipe already guarantees a pending wake-up,
    /// so `EAGAIN` counts as success; `EINTR` is retried.
    ///
    /// # Errors
    /// The raw errno of any other `write(2)` failure (mis. `EPIPE` jika read
    /// end sudah ditutup). Caller mencatatnya sebagai fault.
    #[inline(always)]
    pub fn wake(&self) -> Result<(), c_int> {
        let byte = 1u8;
        loop {
            // SAFETY: fd hidup selama WakeHandle hidup, buffer 1 byte valid
            let rc = unsafe {
                libc::write(
                    self.sender.as_raw_fd(),
                    &byte as *const u8 as *const libc::c_void,
                    1,
                )
            };
            if rc >= 0 {
                return Ok(());
            }
            match io::Error::last_os_error().raw_os_error() {
                Some(libc::EINTR) => continue,
                Some(errno) if errno == libc::EAGAIN || errno == libc::EWOULDBLOCK => return Ok(()),
                Some(errno) => return Err(errno),
                None => return Err(libc::EIO),
            }
        }
    }
}

/// Read end, owned by the receiver's main flow.
pub struct WakeWaiter {
    poll: Poll,
    events: Events,
    receiver: pipe::Receiver,
}

impl WakeWaiter {
    /// Block sampai ada wake-up (atau poll di-interrupt sinyal), lalu
    /// kosongkan pipe. Spurious return aman: caller selalu drain ulang.
    pub fn wait(&mut self) -> io::Result<()> {
        match self.poll.poll(&mut self.events, None) {
            Ok(()) => {}
            // epoll_wait tidak di-restart oleh SA_RESTART
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
        self.drain()
    }

    fn drain(&mut self) -> io::Result<()> {
        let mut buf = [0u8; 64];
        loop {
            match self.receiver.read(&mut buf) {
                Ok(0) => return Ok(()),
                Ok(_) => continue,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_wake_unblocks_waiter() {
        let (handle, mut waiter) = wake_pipe().unwrap();

        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            handle.wake().unwrap();
            handle
        });

        waiter.wait().unwrap();
        let _handle = t.join().unwrap();
    }

    #[test]
    fn test_repeated_wakes_coalesce() {
        let (handle, mut waiter) = wake_pipe().unwrap();
        for _ in 0..100 {
            handle.wake().unwrap();
        }
        waiter.wait().unwrap();
        // Pipe sudah kosong setelah wait
        let mut buf = [0u8; 1];
        let err = waiter.receiver.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn test_full_pipe_is_not_an_error() {
        let (handle, mut waiter) = wake_pipe().unwrap();
        // Kapasitas pipe Linux default 64 KiB
        for _ in 0..200_000 {
            assert_eq!(handle.wake(), Ok(()));
        }
        waiter.wait().unwrap();
    }

    #[test]
    fn test_closed_read_end_reports_errno() {
        let (handle, waiter) = wake_pipe().unwrap();
        drop(waiter);
        // std mengabaikan SIGPIPE, jadi write gagal dengan EPIPE
        assert_eq!(handle.wake(), Err(libc::EPIPE));
    }
}
