//! Architecture and board abstraction layer.
//!
//! [`Arch`] covers the CPU: interrupt masking, low-power wait, halting, the
//! fault-syndrome registers and entering a thread. [`Board`] covers the
//! BCM283x peripherals the exception dispatch layer talks to. The kernel core
//! is generic over both so the scheduler and dispatch logic can run on the
//! host under test doubles.

use core::marker::PhantomData;

pub mod frame;
pub mod psr;
pub mod syndrome;

use crate::thread::ThreadContext;
use psr::Psr;
use syndrome::{FaultRegisters, ModeRegisters};

/// CPU abstraction trait.
///
/// # Safety
///
/// Implementations touch processor state directly. Methods marked unsafe
/// have preconditions that the caller must uphold.
pub trait Arch {
    /// Enable IRQ delivery on the current CPU.
    fn enable_interrupts();

    /// Disable IRQ delivery on the current CPU.
    fn disable_interrupts();

    /// Check if IRQs are currently enabled.
    fn interrupts_enabled() -> bool;

    /// Low-power wait until the next interrupt.
    fn wait_for_interrupt();

    /// Stop the CPU for good with interrupts masked.
    fn halt() -> !;

    /// Leave the calling thread through the supervisor call trap.
    fn exit_thread() -> !;

    /// Snapshot of DFSR/DFAR/IFSR/IFAR.
    fn fault_registers() -> FaultRegisters;

    /// Snapshot of the banked sp/lr/spsr of every mode.
    fn mode_registers() -> ModeRegisters;

    /// The current CPSR.
    fn current_psr() -> Psr;

    /// Drop to the mode in `ctx.cpsr` and jump to `ctx.pc` on `ctx.sp`.
    ///
    /// # Safety
    ///
    /// - Must be called from a privileged mode with IRQs masked
    /// - `ctx` must describe a valid entry point and stack
    /// - Never returns; everything on the current stack is abandoned
    unsafe fn enter_thread(ctx: &ThreadContext) -> !;
}

/// Interrupt lines reported by the BCM283x interrupt controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingIrqs {
    /// IRQ pending 1 (GPU interrupts 0-31)
    pub pending1: u32,
    /// IRQ pending 2 (GPU interrupts 32-63)
    pub pending2: u32,
}

impl PendingIrqs {
    /// System timer compare channel 1.
    pub const TIMER_C1: u32 = 1 << 1;
    /// PL011 UART (GPU interrupt 57).
    pub const UART: u32 = 1 << 25;

    pub const fn timer_match(&self) -> bool {
        self.pending1 & Self::TIMER_C1 != 0
    }

    pub const fn uart_rx(&self) -> bool {
        self.pending2 & Self::UART != 0
    }
}

/// Peripheral interrupt sources serviced by the IRQ path.
pub trait Board: Sync {
    /// Read both pending bitmasks from the interrupt controller.
    fn pending_interrupts(&self) -> PendingIrqs;

    /// Advance the timer compare register and clear its match status.
    fn reload_timer(&self);

    /// Move every received byte into the RX ring and clear the UART interrupt.
    fn drain_uart_rx(&self);
}

/// RAII interrupt mask: IRQs are disabled while the guard lives and the
/// previous enable state is restored when it drops.
#[must_use = "interrupts are re-enabled as soon as the guard is dropped"]
pub struct InterruptGuard<A: Arch> {
    was_enabled: bool,
    _arch: PhantomData<fn() -> A>,
}

impl<A: Arch> InterruptGuard<A> {
    pub fn new() -> Self {
        let was_enabled = A::interrupts_enabled();
        A::disable_interrupts();
        Self {
            was_enabled,
            _arch: PhantomData,
        }
    }
}

impl<A: Arch> Default for InterruptGuard<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Arch> Drop for InterruptGuard<A> {
    fn drop(&mut self) {
        if self.was_enabled {
            A::enable_interrupts();
        }
    }
}

// BCM2836/BCM2837 in AArch32 state
#[cfg(target_arch = "arm")]
pub mod armv7;
#[cfg(not(target_arch = "arm"))]
#[path = "armv7_stub.rs"]
pub mod armv7;

#[cfg(target_arch = "arm")]
pub mod armv7_boot;
#[cfg(target_arch = "arm")]
pub mod armv7_vectors;
#[cfg(target_arch = "arm")]
pub mod bcm_irq;
#[cfg(target_arch = "arm")]
pub mod bcm_timer;
#[cfg(target_arch = "arm")]
pub mod uart_pl011;

pub use armv7::{Armv7 as DefaultArch, Bcm283x as DefaultBoard};
