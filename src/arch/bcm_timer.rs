//! BCM283x system timer, compare channel 1 as the preemption tick.
//!
//! The free-running counter ticks at 1 MHz. Channels 0 and 2 belong to the
//! GPU firmware.

use crate::config::{PERIPHERAL_BASE, TIMER_INTERVAL};
use core::ptr::{read_volatile, write_volatile};

const SYSTIMER_BASE: usize = PERIPHERAL_BASE + 0x3000;
const SYSTIMER_CS: usize = SYSTIMER_BASE + 0x00;  // Control/Status
const SYSTIMER_CLO: usize = SYSTIMER_BASE + 0x04; // Counter lower 32 bits
const SYSTIMER_C1: usize = SYSTIMER_BASE + 0x10;  // Compare 1

/// Match flag of compare channel 1 (write one to clear).
const CS_M1: u32 = 1 << 1;

/// Arm the first tick.
///
/// # Safety
///
/// Must be called once during system initialization.
pub unsafe fn init() {
    unsafe {
        write_volatile(SYSTIMER_CS as *mut u32, CS_M1);
    }
    reload_and_ack();
}

/// Schedule the next tick `TIMER_INTERVAL` from now and clear the match.
pub fn reload_and_ack() {
    unsafe {
        let now = read_volatile(SYSTIMER_CLO as *const u32);
        write_volatile(SYSTIMER_C1 as *mut u32, now.wrapping_add(TIMER_INTERVAL));
        write_volatile(SYSTIMER_CS as *mut u32, CS_M1);
    }
}
