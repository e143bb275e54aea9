//! Single-producer single-consumer byte ring.
//!
//! The UART IRQ path is the only producer and thread code the only consumer,
//! so head and tail are plain atomics and no lock is taken on either side.

use core::cell::UnsafeCell;
use portable_atomic::{AtomicUsize, Ordering};

/// Fixed-capacity byte ring holding at most `N - 1` bytes.
pub struct RxRing<const N: usize> {
    buf: UnsafeCell<[u8; N]>,
    /// Next slot the producer writes
    head: AtomicUsize,
    /// Next slot the consumer reads
    tail: AtomicUsize,
}

// Safety: a slot is written only by the producer before publishing `head`
// and read only by the consumer before publishing `tail`.
unsafe impl<const N: usize> Sync for RxRing<N> {}

impl<const N: usize> RxRing<N> {
    pub const fn new() -> Self {
        Self {
            buf: UnsafeCell::new([0; N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Append a byte. Returns `false` and drops the byte when full.
    pub fn push(&self, byte: u8) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) % N;
        if next == self.tail.load(Ordering::Acquire) {
            return false;
        }

        unsafe {
            self.buf.get().cast::<u8>().add(head).write_volatile(byte);
        }
        self.head.store(next, Ordering::Release);
        true
    }

    /// Take the oldest byte, if any.
    pub fn pop(&self) -> Option<u8> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        let byte = unsafe { self.buf.get().cast::<u8>().add(tail).read_volatile() };
        self.tail.store((tail + 1) % N, Ordering::Release);
        Some(byte)
    }

    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + N - tail) % N
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<const N: usize> Default for RxRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let ring: RxRing<8> = RxRing::new();
        for byte in b"abc" {
            assert!(ring.push(*byte));
        }
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.pop(), Some(b'a'));
        assert_eq!(ring.pop(), Some(b'b'));
        assert_eq!(ring.pop(), Some(b'c'));
        assert_eq!(ring.pop(), None);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_full_ring_drops_new_bytes() {
        let ring: RxRing<4> = RxRing::new();
        assert!(ring.push(1));
        assert!(ring.push(2));
        assert!(ring.push(3));
        assert!(!ring.push(4), "ring of 4 slots holds 3 bytes");
        assert_eq!(ring.len(), ring.capacity());

        assert_eq!(ring.pop(), Some(1));
        assert!(ring.push(5), "space frees up after a pop");
        assert_eq!(ring.pop(), Some(2));
        assert_eq!(ring.pop(), Some(3));
        assert_eq!(ring.pop(), Some(5));
    }

    #[test]
    fn test_wraps_around_many_times() {
        let ring: RxRing<3> = RxRing::new();
        for i in 0..100u8 {
            assert!(ring.push(i));
            assert_eq!(ring.pop(), Some(i));
        }
        assert!(ring.is_empty());
    }
}
