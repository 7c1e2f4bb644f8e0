//! Core module: state yang dibagi antara signal handler dan main flow
//!
//! Prinsip desain:
//! - Atomic-only: setiap field satu-word, aman di-preempt di titik mana pun
//! - No-Allocation: semua buffer di-alokasi sebelum handler dipasang
//! - Explicit: state hidup di objek, bukan global tersembunyi

mod accumulator;
mod ack;
mod ring_buffer;

pub use accumulator::ByteAccumulator;
pub use ack::AckFlag;
pub use ring_buffer::RingBuffer;
