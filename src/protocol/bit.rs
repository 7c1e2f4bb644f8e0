//! Wire alphabet: dua jenis notifikasi tanpa payload
//!
//! Layout per byte (MSB dulu):
//! ┌────┬────┬────┬────┬────┬────┬────┬────┐
//! │ b7 │ b6 │ b5 │ b4 │ b3 │ b2 │ b1 │ b0 │  → 8 notifikasi, 8 ack
//! └────┴────┴────┴────┴────┴────┴────┴────┘
//!
//! Nilai bit dibawa sepenuhnya oleh *jenis* notifikasi yang dikirim:
//! `Usr1` = 1, `Usr2` = 0. Ack dari receiver memakai `Usr1` lagi.

use std::fmt;

/// Byte penutup pesan. Tidak pernah dikirim sebagai isi pesan.
pub const TERMINATOR: u8 = 0;

/// Jumlah bit per byte di wire
pub const BITS_PER_BYTE: usize = 8;

/// Posisi cursor untuk bit pertama (MSB)
pub const FIRST_BIT: i8 = 7;

/// One bit of information, carried by which notification kind was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bit {
    Zero,
    One,
}

impl Bit {
    /// Ambil bit ke-`index` dari `byte` (7 = MSB, 0 = LSB)
    #[inline(always)]
    pub const fn of(byte: u8, index: u8) -> Self {
        if (byte >> index) & 1 == 1 {
            Self::One
        } else {
            Self::Zero
        }
    }

    /// Notification kind that carries this bit value.
    #[inline(always)]
    pub const fn notification(self) -> Notification {
        match self {
            Self::One => Notification::Usr1,
            Self::Zero => Notification::Usr2,
        }
    }

    #[inline(always)]
    pub const fn is_one(self) -> bool {
        matches!(self, Self::One)
    }
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => f.write_str("0"),
            Self::One => f.write_str("1"),
        }
    }
}

/// The two payload-free notification kinds of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notification {
    Usr1,
    Usr2,
}

impl Notification {
    /// Jenis notifikasi yang dipakai receiver sebagai acknowledgment.
    ///
    /// Sender hanya memasang handler untuk jenis ini, jadi tidak pernah
    /// tertukar dengan bit data.
    pub const ACK: Self = Self::Usr1;

    /// Bit value this notification carries when it arrives at a receiver.
    #[inline(always)]
    pub const fn bit(self) -> Bit {
        match self {
            Self::Usr1 => Bit::One,
            Self::Usr2 => Bit::Zero,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Usr1 => "SIGUSR1",
            Self::Usr2 => "SIGUSR2",
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hasil decode yang di-emit receiver setiap kali satu byte lengkap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// Byte data (tidak pernah `TERMINATOR`)
    Byte(u8),
    /// Terminator diterima, pesan selesai
    EndOfMessage,
}

impl Decoded {
    #[inline(always)]
    pub const fn from_byte(byte: u8) -> Self {
        if byte == TERMINATOR {
            Self::EndOfMessage
        } else {
            Self::Byte(byte)
        }
    }
}

/// Process identifier of a remote endpoint. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pid(i32);

impl Pid {
    /// Returns `None` for zero or negative values, which `kill(2)` would
    /// interpret as process groups.
    #[inline(always)]
    pub const fn new(raw: i32) -> Option<Self> {
        if raw > 0 {
            Some(Self(raw))
        } else {
            None
        }
    }

    #[inline(always)]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Pid {
    type Err = crate::error::TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || crate::error::TransportError::InvalidPid(s.to_string());
        let raw: i32 = s.trim().parse().map_err(|_| invalid())?;
        Self::new(raw).ok_or_else(invalid)
    }
}
