//! BCM283x legacy interrupt controller.
//!
//! # Memory Map
//!
//! Interrupt controller base: `PERIPHERAL_BASE + 0xB200`

use super::PendingIrqs;
use crate::config::PERIPHERAL_BASE;
use core::ptr::{read_volatile, write_volatile};

const IRQ_BASE: usize = PERIPHERAL_BASE + 0xB200;
const IRQ_PENDING_1: usize = IRQ_BASE + 0x04;
const IRQ_PENDING_2: usize = IRQ_BASE + 0x08;
const ENABLE_IRQS_1: usize = IRQ_BASE + 0x10;
const ENABLE_IRQS_2: usize = IRQ_BASE + 0x14;

/// Read both GPU pending registers.
pub fn pending() -> PendingIrqs {
    unsafe {
        PendingIrqs {
            pending1: read_volatile(IRQ_PENDING_1 as *const u32),
            pending2: read_volatile(IRQ_PENDING_2 as *const u32),
        }
    }
}

/// Enable the lines set in `lines` (write-one-to-set).
///
/// # Safety
///
/// Writes interrupt controller registers; the handlers for the enabled lines
/// must be ready.
pub unsafe fn enable(lines: PendingIrqs) {
    unsafe {
        write_volatile(ENABLE_IRQS_1 as *mut u32, lines.pending1);
        write_volatile(ENABLE_IRQS_2 as *mut u32, lines.pending2);
    }
}
