//! sigwire - message transport over one-bit POSIX signals
//!
//! Arsitektur:
//! - Protocol: byte → bit MSB-first, ditutup terminator nol
//! - Core: state atomic yang dibagi handler dan main flow
//! - Session: sender/receiver lock-step, satu bit in-flight
//! - Channel: `SIGUSR1`/`SIGUSR2` via `kill(2)` + self-pipe wake-up

// Platform yang punya akses errno thread-local untuk handler sinyal
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
)))]
compile_error!("sigwire supports Linux, Android, macOS, iOS and FreeBSD (POSIX signals with errno access)");

pub mod channel;
pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod session;
pub mod telemetry;

pub use error::{TransportError, TransportResult};
