//! Stub implementation of the ARMv7 CPU and BCM283x board for other targets.
//!
//! This module provides type-compatible stand-ins so the kernel core builds
//! and runs its unit tests on a development host. No hardware is touched.

use super::psr::Psr;
use super::syndrome::{FaultRegisters, ModeRegisters};
use super::{Arch, Board, PendingIrqs};
use crate::thread::ThreadContext;
use portable_atomic::{AtomicBool, Ordering};

static IRQ_ENABLED: AtomicBool = AtomicBool::new(false);

/// ARMv7 CPU (stub for host builds).
pub struct Armv7;

impl Arch for Armv7 {
    fn enable_interrupts() {
        IRQ_ENABLED.store(true, Ordering::Relaxed);
    }

    fn disable_interrupts() {
        IRQ_ENABLED.store(false, Ordering::Relaxed);
    }

    fn interrupts_enabled() -> bool {
        IRQ_ENABLED.load(Ordering::Relaxed)
    }

    fn wait_for_interrupt() {
        core::hint::spin_loop();
    }

    fn halt() -> ! {
        Self::disable_interrupts();
        loop {
            core::hint::spin_loop();
        }
    }

    fn exit_thread() -> ! {
        Self::halt()
    }

    fn fault_registers() -> FaultRegisters {
        FaultRegisters::default()
    }

    fn mode_registers() -> ModeRegisters {
        ModeRegisters::default()
    }

    fn current_psr() -> Psr {
        Psr(0x1D3)
    }

    unsafe fn enter_thread(_ctx: &ThreadContext) -> ! {
        Self::halt()
    }
}

/// BCM283x board (stub): nothing is ever pending.
pub struct Bcm283x;

impl Bcm283x {
    pub const fn new() -> Self {
        Self
    }
}

impl Board for Bcm283x {
    fn pending_interrupts(&self) -> PendingIrqs {
        PendingIrqs::default()
    }

    fn reload_timer(&self) {}

    fn drain_uart_rx(&self) {}
}
