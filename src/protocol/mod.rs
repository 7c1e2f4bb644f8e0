//! Protocol Layer: One-Bit Wire Encoding
//!
//! Prinsip desain:
//! - Payload-free: nilai bit = jenis notifikasi, bukan isi
//! - MSB first: bit pertama tiap byte adalah bit 7
//! - Terminated: setiap pesan ditutup byte nol (8 notifikasi)

mod bit;
mod encoder;

pub use bit::{Bit, Decoded, Notification, Pid, BITS_PER_BYTE, FIRST_BIT, TERMINATOR};
pub use encoder::{frame_bits, frame_len, Decoder, FrameBits};
