//! Error types for kernel operations.
//!
//! Faults are not errors in this sense: they are handled by the exception
//! dispatch layer and never propagate as values. What remains are the
//! recoverable conditions a caller can act on.

#![allow(clippy::uninlined_format_args)]

use core::fmt;

/// Result type for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;

/// Top-level kernel error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// `init` was called more than once
    AlreadyInitialized,
    /// An operation needed `init` first
    NotInitialized,
    /// `start` was called on a running kernel
    AlreadyStarted,
    /// Thread creation failed
    Spawn(SpawnError),
}

/// Errors that can occur during thread creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    /// Kernel has not been initialized
    NotInitialized,
    /// Every non-idle slot in the thread table is in use
    TooManyThreads,
    /// The argument blob (in bytes) does not fit on a thread stack
    ArgumentTooLarge(usize),
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::AlreadyInitialized => write!(f, "Kernel already initialized"),
            KernelError::NotInitialized => write!(f, "Kernel not initialized"),
            KernelError::AlreadyStarted => write!(f, "Kernel already started"),
            KernelError::Spawn(e) => write!(f, "Thread spawn error: {}", e),
        }
    }
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpawnError::NotInitialized => write!(f, "Kernel not initialized"),
            SpawnError::TooManyThreads => write!(f, "Could not create thread: thread table full"),
            SpawnError::ArgumentTooLarge(size) => {
                write!(f, "Thread argument of {} bytes does not fit on the stack", size)
            }
        }
    }
}

impl From<SpawnError> for KernelError {
    fn from(error: SpawnError) -> Self {
        KernelError::Spawn(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::format;

    #[test]
    fn test_spawn_error_converts_into_kernel_error() {
        let err: KernelError = SpawnError::TooManyThreads.into();
        assert_eq!(err, KernelError::Spawn(SpawnError::TooManyThreads));
    }

    #[test]
    fn test_display_includes_cause() {
        let msg = format!("{}", KernelError::Spawn(SpawnError::ArgumentTooLarge(4096)));
        assert!(msg.contains("4096"), "size missing from '{}'", msg);
        assert!(msg.starts_with("Thread spawn error"));
    }
}
