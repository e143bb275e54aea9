//! Thread scheduler.
//!
//! A single round-robin policy over the fixed thread table. The scheduler is
//! the only code that changes thread state or moves registers between an
//! exception frame and a TCB.

pub mod rr;

pub use rr::RoundRobinScheduler;

/// Default scheduler type.
pub type DefaultScheduler = RoundRobinScheduler<crate::arch::DefaultArch>;
