//! Session Layer: dua state machine lock-step
//!
//! - Sender: satu bit in-flight, block sampai ack
//! - Receiver: fold bit, emit byte, tepat satu ack per bit
//!
//! Keduanya generik atas `Notifier`, jadi bisa dijalankan di atas sinyal
//! POSIX atau channel in-process untuk test.

mod receiver;
mod sender;

pub use receiver::{MessageTally, ReceiverSession, EVENT_CAPACITY};
pub use sender::{SendReport, Sender};
