//! Byte Accumulator milik receiver
//!
//! Menyimpan byte yang sedang dibangun + cursor bit (7 → 0).
//! Ditulis dari signal handler, dibaca dari main flow, jadi semua field
//! adalah atomic satu-word. Tidak ada lock.

use std::sync::atomic::{AtomicI8, AtomicU8, Ordering};

use crate::protocol::{Bit, Decoded, FIRST_BIT};

/// Partially reconstructed byte plus its bit cursor.
///
/// Invariant: cursor is always in `[-1, 7]`. It only reaches `-1` inside
/// [`fold`](Self::fold), which flushes the byte and resets to `(0, 7)`
/// before returning.
pub struct ByteAccumulator {
    value: AtomicU8,
    cursor: AtomicI8,
}

impl Default for ByteAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteAccumulator {
    pub const fn new() -> Self {
        Self {
            value: AtomicU8::new(0),
            cursor: AtomicI8::new(FIRST_BIT),
        }
    }

    /// Fold satu bit ke posisi cursor
    ///
    /// Returns `Some` hanya jika bit ini melengkapi byte. Aman dipanggil
    /// dari signal handler: tidak ada alokasi, tidak ada I/O.
    #[inline(always)]
    pub fn fold(&self, bit: Bit) -> Option<Decoded> {
        let cursor = self.cursor.load(Ordering::Acquire).clamp(0, FIRST_BIT);
        let mask = 1u8 << cursor;

        if bit.is_one() {
            self.value.fetch_or(mask, Ordering::AcqRel);
        } else {
            self.value.fetch_and(!mask, Ordering::AcqRel);
        }

        let next = cursor - 1;
        self.cursor.store(next, Ordering::Release);

        if next >= 0 {
            return None;
        }

        // Byte lengkap: flush lalu reset sebelum bit berikutnya diterima
        let byte = self.value.swap(0, Ordering::AcqRel);
        self.cursor.store(FIRST_BIT, Ordering::Release);

        Some(Decoded::from_byte(byte))
    }

    /// Snapshot `(value, cursor)` untuk observasi dari main flow
    #[inline(always)]
    pub fn snapshot(&self) -> (u8, i8) {
        (
            self.value.load(Ordering::Acquire),
            self.cursor.load(Ordering::Acquire),
        )
    }

    /// True when no partial byte is pending.
    #[inline(always)]
    pub fn is_idle(&self) -> bool {
        self.snapshot() == (0, FIRST_BIT)
    }

    /// Bits received so far for the byte in progress.
    #[inline(always)]
    pub fn pending_bits(&self) -> u8 {
        let cursor = self.cursor.load(Ordering::Acquire).clamp(-1, FIRST_BIT);
        (FIRST_BIT - cursor) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(acc: &ByteAccumulator, byte: u8) -> Option<Decoded> {
        let mut out = None;
        for i in (0..8).rev() {
            out = acc.fold(Bit::of(byte, i));
            if i > 0 {
                assert_eq!(out, None);
            }
        }
        out
    }

    #[test]
    fn test_initial_state() {
        let acc = ByteAccumulator::new();
        assert_eq!(acc.snapshot(), (0, 7));
        assert!(acc.is_idle());
        assert_eq!(acc.pending_bits(), 0);
    }

    #[test]
    fn test_fold_full_byte() {
        let acc = ByteAccumulator::new();
        assert_eq!(feed(&acc, b'A'), Some(Decoded::Byte(b'A')));
        assert!(acc.is_idle());
    }

    #[test]
    fn test_partial_byte_not_emitted() {
        let acc = ByteAccumulator::new();
        acc.fold(Bit::One);
        acc.fold(Bit::One);
        acc.fold(Bit::Zero);

        let (value, cursor) = acc.snapshot();
        assert_eq!(value, 0b1100_0000);
        assert_eq!(cursor, 4);
        assert_eq!(acc.pending_bits(), 3);
        assert!(!acc.is_idle());
    }

    #[test]
    fn test_terminator_resets_state() {
        let acc = ByteAccumulator::new();
        assert_eq!(feed(&acc, 0xFF), Some(Decoded::Byte(0xFF)));
        assert_eq!(feed(&acc, 0), Some(Decoded::EndOfMessage));
        assert!(acc.is_idle());

        // New message starts fresh
        assert_eq!(feed(&acc, b'z'), Some(Decoded::Byte(b'z')));
    }

    #[test]
    fn test_zero_bit_clears_stale_value() {
        // Setelah 0xFF, byte berikutnya harus tetap bersih
        let acc = ByteAccumulator::new();
        feed(&acc, 0xFF);
        assert_eq!(feed(&acc, 0x01), Some(Decoded::Byte(0x01)));
    }
}
