#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(unreachable_pub)]

//! Preemptive round-robin threads for the Raspberry Pi 2/3 in AArch32 state.
//!
//! A fixed table of threads, each with its own stack, is time-sliced by the
//! BCM283x system timer. Threads run in user mode; every exception lands in
//! the [`exception`] dispatch layer, which either switches to another thread,
//! terminates the one that faulted, or prints a register dump and halts the
//! CPU when the kernel itself faulted.
//!
//! # Target Platform
//!
//! - **Hardware**: Raspberry Pi 2 / 3 (BCM2836 / BCM2837)
//! - **Architecture**: ARMv7-A, AArch32 state
//! - **Environment**: Bare-metal, single core
//!
//! # Features
//!
//! - `irq-debug`: print every IRQ and context switch from the start
//! - `log-trace`: raise the log level from `Info` to `Trace`
//! - `rpi-demo`: build the demo kernel image under `demos/`
//!
//! # Quick Start
//!
//! ```ignore
//! use bcm_rr_kernel::{DefaultKernel, DefaultBoard, ThreadArg};
//!
//! static KERNEL: DefaultKernel = DefaultKernel::new(DefaultBoard::new());
//!
//! fn worker(arg: ThreadArg) {
//!     loop { /* thread work */ }
//! }
//!
//! #[no_mangle]
//! fn kernel_main() -> ! {
//!     KERNEL.init().ok();
//!     KERNEL.spawn(worker, b"a").ok();
//!     unsafe { KERNEL.register_global() };
//!     KERNEL.start()
//! }
//! ```
//!
//! # Architecture
//!
//! - [`arch`]: CPU and board seams, the exception frame, PSR and fault decoding
//! - [`sched`]: the thread table and round-robin selection
//! - [`kernel`]: the lock-protected scheduler plus the board, registered
//!   globally for the vector stubs
//! - [`exception`]: per-exception handlers and the diagnostic report

// Core modules
pub mod arch;
pub mod config;
pub mod console;
pub mod errors;
pub mod exception;
pub mod kernel;
pub mod logger;
pub mod mem;
pub mod sched;
pub mod thread;

#[cfg(test)]
extern crate std;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests;

#[cfg(all(not(test), target_os = "none"))]
use core::panic::PanicInfo;

#[cfg(all(not(test), target_os = "none"))]
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    crate::kprintln!("kernel panic: {}", info);
    console::putc(exception::END_OF_TRANSMISSION);
    <DefaultArch as Arch>::halt()
}

// ============================================================================
// Public API
// ============================================================================

// Architecture abstraction
pub use arch::frame::ExceptionFrame;
pub use arch::psr::{ProcessorMode, Psr};
pub use arch::{Arch, Board, DefaultArch, DefaultBoard, InterruptGuard, PendingIrqs};

// Kernel
pub use kernel::{get_global_kernel, Kernel};

/// Kernel on the real CPU and board.
pub type DefaultKernel = Kernel<DefaultArch, DefaultBoard>;

// Scheduler
pub use sched::{DefaultScheduler, RoundRobinScheduler};

// Threads
pub use thread::{ThreadArg, ThreadEntry, ThreadId, ThreadState};

// Errors
pub use errors::{KernelError, KernelResult, SpawnError};

// ============================================================================
// Convenience Functions
// ============================================================================

/// End the calling thread.
///
/// Raises the supervisor call; the kernel marks the thread terminated and
/// switches to the next one. Returning from a thread entry does the same.
#[inline]
pub fn exit_thread() -> ! {
    DefaultArch::exit_thread()
}
