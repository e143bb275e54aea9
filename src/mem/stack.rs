//! Fixed-size thread stacks.
//!
//! Every TCB owns one [`ThreadStack`] inline, so stacks are never shared and
//! never allocated at runtime. Stacks grow down from [`ThreadStack::top`].

use crate::config::THREAD_STACK_SIZE;

/// Value written at the lowest word of a stack to catch overflows.
pub const STACK_CANARY: u32 = 0xDEAD_C0DE;

/// Bytes that must stay free below a pushed argument.
pub const MIN_FREE_STACK: usize = 256;

/// Largest argument blob a thread can receive.
pub const MAX_ARGUMENT_SIZE: usize = THREAD_STACK_SIZE - MIN_FREE_STACK;

/// A thread's private stack region.
#[repr(C, align(8))]
pub struct ThreadStack {
    bytes: [u8; THREAD_STACK_SIZE],
}

impl ThreadStack {
    pub const fn new() -> Self {
        Self {
            bytes: [0; THREAD_STACK_SIZE],
        }
    }

    /// Lowest address of the region.
    pub fn base(&self) -> usize {
        self.bytes.as_ptr() as usize
    }

    /// Initial stack pointer: one past the highest byte, aligned down to 8.
    pub fn top(&self) -> usize {
        (self.base() + THREAD_STACK_SIZE) & !0x7
    }

    /// Check whether `addr` lies inside this stack.
    pub fn contains(&self, addr: usize) -> bool {
        addr >= self.base() && addr < self.base() + THREAD_STACK_SIZE
    }

    /// Copy `arg` just below the top of the stack.
    ///
    /// The reserved size is rounded up to 8 bytes so the stack pointer stays
    /// aligned. Returns the new stack pointer, which is also the address of
    /// the copied bytes, or `None` if the blob is larger than
    /// [`MAX_ARGUMENT_SIZE`]. An empty argument leaves the top untouched.
    pub fn push_argument(&mut self, arg: &[u8]) -> Option<usize> {
        let top = self.top();
        if arg.is_empty() {
            return Some(top);
        }
        if arg.len() > MAX_ARGUMENT_SIZE {
            return None;
        }

        let reserved = (arg.len() + 7) & !0x7;
        let sp = top - reserved;
        let offset = sp - self.base();
        self.bytes[offset..offset + arg.len()].copy_from_slice(arg);
        Some(sp)
    }

    /// Raw contents, lowest address first.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Write the overflow canary into the lowest word.
    pub fn install_canary(&mut self) {
        self.bytes[..4].copy_from_slice(&STACK_CANARY.to_ne_bytes());
    }

    /// `false` once the thread has written over the bottom of its stack.
    pub fn canary_intact(&self) -> bool {
        self.bytes[..4] == STACK_CANARY.to_ne_bytes()
    }
}

impl Default for ThreadStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::boxed::Box;

    #[test]
    fn test_top_is_aligned_and_inside_region() {
        let stack = Box::new(ThreadStack::new());
        assert_eq!(stack.top() % 8, 0);
        assert_eq!(stack.top(), stack.base() + THREAD_STACK_SIZE);
        assert!(stack.contains(stack.top() - 1));
        assert!(!stack.contains(stack.top()));
    }

    #[test]
    fn test_push_argument_rounds_up_to_eight() {
        let mut stack = Box::new(ThreadStack::new());
        let sp = stack.push_argument(b"hello").expect("argument should fit");

        assert_eq!(stack.top() - sp, 8, "5 bytes reserve one 8-byte slot");
        assert_eq!(sp % 8, 0);
        let offset = sp - stack.base();
        assert_eq!(&stack.as_bytes()[offset..offset + 5], b"hello");
    }

    #[test]
    fn test_empty_argument_keeps_top() {
        let mut stack = Box::new(ThreadStack::new());
        assert_eq!(stack.push_argument(&[]), Some(stack.top()));
    }

    #[test]
    fn test_oversized_argument_is_rejected() {
        let mut stack = Box::new(ThreadStack::new());
        let blob = [0xAAu8; MAX_ARGUMENT_SIZE + 1];
        assert_eq!(stack.push_argument(&blob), None);
        assert!(stack.push_argument(&blob[..MAX_ARGUMENT_SIZE]).is_some());
    }

    #[test]
    fn test_canary_detects_overwrite() {
        let mut stack = Box::new(ThreadStack::new());
        stack.install_canary();
        assert!(stack.canary_intact());

        stack.bytes[1] ^= 0xFF;
        assert!(!stack.canary_intact());
    }
}
