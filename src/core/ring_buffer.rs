//! Lock-Free SPSC Event Ring: signal handler → main flow
//!
//! Producer = signal handler (push), consumer = main flow (pop).
//! Lamport queue, semua slot di-alokasi saat init. Push tidak pernah
//! alokasi, tidak pernah lock, jadi aman dari konteks signal.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Padding untuk cache line isolation (64 bytes pada x86-64)
#[repr(C, align(64))]
struct CacheLinePadded<T> {
    value: T,
}

/// Fixed-capacity single-producer single-consumer ring.
///
/// `N` must be a power of two.
#[repr(C)]
pub struct RingBuffer<T, const N: usize> {
    // Ditulis hanya oleh producer (handler)
    head: CacheLinePadded<AtomicUsize>,
    // Ditulis hanya oleh consumer (main flow)
    tail: CacheLinePadded<AtomicUsize>,
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// SAFETY: satu producer menulis head, satu consumer menulis tail, dan
// slot hanya disentuh oleh sisi yang sedang memilikinya (Acquire/Release).
unsafe impl<T: Send, const N: usize> Send for RingBuffer<T, N> {}
unsafe impl<T: Send, const N: usize> Sync for RingBuffer<T, N> {}

impl<T: Copy, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy, const N: usize> RingBuffer<T, N> {
    const MASK: usize = N - 1;

    /// Alokasi hanya terjadi di sini, sebelum handler dipasang.
    ///
    /// # Panics
    /// Panic jika N bukan power of 2
    pub fn new() -> Self {
        assert!(N > 0 && N.is_power_of_two(), "N must be power of 2");

        let slots = (0..N)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            head: CacheLinePadded {
                value: AtomicUsize::new(0),
            },
            tail: CacheLinePadded {
                value: AtomicUsize::new(0),
            },
            slots,
        }
    }

    /// Producer side. Returns `false` when full; the value is not stored.
    #[inline(always)]
    pub fn push(&self, value: T) -> bool {
        let head = self.head.value.load(Ordering::Relaxed);
        let tail = self.tail.value.load(Ordering::Acquire);

        if head.wrapping_sub(tail) >= N {
            return false;
        }

        // SAFETY: slot di antara tail..head+N belum dibaca consumer
        unsafe {
            (*self.slots[head & Self::MASK].get()).write(value);
        }

        self.head
            .value
            .store(head.wrapping_add(1), Ordering::Release);
        true
    }

    /// Consumer side.
    #[inline(always)]
    pub fn pop(&self) -> Option<T> {
        let tail = self.tail.value.load(Ordering::Relaxed);
        let head = self.head.value.load(Ordering::Acquire);

        if tail == head {
            return None;
        }

        // SAFETY: producer sudah publish slot ini lewat Release pada head
        let value = unsafe { (*self.slots[tail & Self::MASK].get()).assume_init_read() };

        self.tail
            .value
            .store(tail.wrapping_add(1), Ordering::Release);
        Some(value)
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        let head = self.head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);
        head.wrapping_sub(tail)
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}
