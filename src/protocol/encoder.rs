//! Bit Encoder/Decoder
//!
//! Encode: byte stream → urutan bit (MSB dulu) + 8 bit terminator.
//! Decode: urutan bit → `Decoded` events lewat `ByteAccumulator`.
//! Tidak ada alokasi di kedua arah.

use super::bit::{Bit, Decoded, BITS_PER_BYTE, TERMINATOR};
use crate::core::ByteAccumulator;
use crate::error::{TransportError, TransportResult};

/// Validasi pesan lalu kembalikan iterator bit-nya
///
/// Pesan yang berisi byte nol ditolak sebelum satu notifikasi pun dikirim,
/// karena receiver akan menganggapnya sebagai akhir pesan.
pub fn frame_bits(message: &[u8]) -> TransportResult<FrameBits<'_>> {
    if let Some(offset) = message.iter().position(|&b| b == TERMINATOR) {
        return Err(TransportError::EmbeddedTerminator { offset });
    }
    Ok(FrameBits::new(message))
}

/// Number of bit notifications needed to carry `len` payload bytes.
#[inline(always)]
pub const fn frame_len(len: usize) -> usize {
    (len + 1) * BITS_PER_BYTE
}

/// Iterator over the wire bits of one message, terminator included.
///
/// Yields exactly `8 * (N + 1)` bits.
#[derive(Debug, Clone)]
pub struct FrameBits<'a> {
    payload: &'a [u8],
    // Index byte saat ini; == payload.len() berarti terminator
    byte_pos: usize,
    // Bit berikutnya di dalam byte, 8 = belum mulai, 0 = habis
    remaining_in_byte: u8,
}

impl<'a> FrameBits<'a> {
    fn new(payload: &'a [u8]) -> Self {
        Self {
            payload,
            byte_pos: 0,
            remaining_in_byte: BITS_PER_BYTE as u8,
        }
    }

    #[inline(always)]
    fn current_byte(&self) -> Option<u8> {
        match self.payload.get(self.byte_pos) {
            Some(&b) => Some(b),
            None if self.byte_pos == self.payload.len() => Some(TERMINATOR),
            None => None,
        }
    }
}

impl Iterator for FrameBits<'_> {
    type Item = Bit;

    #[inline(always)]
    fn next(&mut self) -> Option<Bit> {
        let byte = self.current_byte()?;

        self.remaining_in_byte -= 1;
        let bit = Bit::of(byte, self.remaining_in_byte);

        if self.remaining_in_byte == 0 {
            self.byte_pos += 1;
            self.remaining_in_byte = BITS_PER_BYTE as u8;
        }

        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let total = frame_len(self.payload.len());
        let done = self.byte_pos * BITS_PER_BYTE + (BITS_PER_BYTE - self.remaining_in_byte as usize);
        let left = total.saturating_sub(done);
        (left, Some(left))
    }
}

impl ExactSizeIterator for FrameBits<'_> {}

/// Decoder di atas accumulator milik receiver
///
/// Dipakai tanpa channel: fold setiap bit dari iterator, hanya
/// menghasilkan event saat byte lengkap.
pub struct Decoder<'a, I> {
    bits: I,
    accumulator: &'a ByteAccumulator,
}

impl<'a, I: Iterator<Item = Bit>> Decoder<'a, I> {
    pub fn new(bits: I, accumulator: &'a ByteAccumulator) -> Self {
        Self { bits, accumulator }
    }
}

impl<I: Iterator<Item = Bit>> Iterator for Decoder<'_, I> {
    type Item = Decoded;

    fn next(&mut self) -> Option<Decoded> {
        for bit in self.bits.by_ref() {
            if let Some(event) = self.accumulator.fold(bit) {
                return Some(event);
            }
        }
        None
    }
}
