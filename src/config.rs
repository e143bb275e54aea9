//! Compile-time kernel configuration.
//!
//! Everything here is a constant; the few knobs that change behaviour at
//! build time are Cargo features (`irq-debug`, `log-trace`).

use log::LevelFilter;

/// Number of thread control blocks, including the idle thread.
pub const MAX_THREADS: usize = 32;

/// Size of every thread's private stack in bytes.
pub const THREAD_STACK_SIZE: usize = 1024;

/// Slot of the idle thread.
pub const IDLE_THREAD_ID: usize = 0;

/// System timer ticks (1 MHz) between two preemption interrupts.
pub const TIMER_INTERVAL: u32 = 100_000;

/// Capacity of the UART receive ring.
pub const UART_INPUT_BUFFER_SIZE: usize = 256;

/// Base of the BCM2836/BCM2837 peripheral window as seen by the ARM core.
pub const PERIPHERAL_BASE: usize = 0x3F00_0000;

/// Maximum level accepted by the console logger.
pub const LOG_LEVEL: LevelFilter = if cfg!(feature = "log-trace") {
    LevelFilter::Trace
} else {
    LevelFilter::Info
};

/// Whether IRQ tracing starts enabled.
pub const IRQ_DEBUG_DEFAULT: bool = cfg!(feature = "irq-debug");

/// Busy-wait iterations between two characters printed by demo threads.
pub const BUSY_WAIT_COUNTER: u32 = 500_000;

/// How many times a demo thread prints its character.
pub const PRINT_COUNT: u32 = 10;

const _: () = assert!(MAX_THREADS >= 2, "need the idle thread and at least one worker");
const _: () = assert!(THREAD_STACK_SIZE % 8 == 0);
