//! Boot code for the Raspberry Pi 2/3 in AArch32 state.
//!
//! This module handles early initialization before the kernel starts:
//! - Parking secondary cores
//! - Leaving HYP mode
//! - Per-mode stacks
//! - BSS clearing
//! - Exception vector installation
//!
//! # Memory Layout
//!
//! The GPU firmware loads `kernel7.img` at 0x8000. The linker script defines:
//! - `.text.boot` - Entry point (must be first)
//! - `.vectors` - Exception vector table
//! - `.text`, `.rodata`, `.data`
//! - `.bss` - Uninitialized data (cleared here), bounded by
//!   `__bss_start`/`__bss_end`

use super::armv7::Bcm283x;
use core::arch::naked_asm;

/// Stack size of each exception mode and of the boot (SVC) stack.
pub const MODE_STACK_SIZE: usize = 8 * 1024;

/// FIQ, IRQ, Abort, Undefined and SVC, in that order.
const MODE_STACK_COUNT: usize = 5;

#[repr(C, align(8))]
struct ModeStacks([u8; MODE_STACK_SIZE * MODE_STACK_COUNT]);

static mut MODE_STACKS: ModeStacks = ModeStacks([0; MODE_STACK_SIZE * MODE_STACK_COUNT]);

/// Kernel entry point.
///
/// First code executed after the firmware hands over. Core 0 continues in
/// SVC mode with IRQ and FIQ masked; the other cores are parked.
///
/// # Safety
///
/// This function must be the first thing in `.text.boot` section.
/// It sets up the environment and calls `kernel_main`.
#[link_section = ".text.boot"]
#[no_mangle]
#[unsafe(naked)]
pub unsafe extern "C" fn _start() -> ! {
    naked_asm!(
        ".arch_extension virt",

        // Park secondary cores
        "mrc p15, 0, r0, c0, c0, 5",    // MPIDR
        "ands r0, r0, #3",
        "bne .Lpark",

        // HYP (0x1A) cannot take our exceptions: eret into SVC
        "mrs r0, cpsr",
        "and r1, r0, #0x1F",
        "cmp r1, #0x1A",
        "bne .Lin_svc",
        "bic r0, r0, #0x1F",
        "orr r0, r0, #0xD3",            // SVC, IRQ and FIQ masked
        "msr spsr_cxsf, r0",
        "adr r0, .Lin_svc",
        "msr elr_hyp, r0",
        "eret",

    ".Lin_svc:",
        "cpsid if, #0x13",

        // One stack per mode, carved from MODE_STACKS bottom up
        "movw r0, #:lower16:{stacks}",
        "movt r0, #:upper16:{stacks}",
        "add r0, r0, #{size}",
        "cps #0x11",
        "mov sp, r0",
        "add r0, r0, #{size}",
        "cps #0x12",
        "mov sp, r0",
        "add r0, r0, #{size}",
        "cps #0x17",
        "mov sp, r0",
        "add r0, r0, #{size}",
        "cps #0x1B",
        "mov sp, r0",
        "add r0, r0, #{size}",
        "cps #0x13",
        "mov sp, r0",

        // Clear BSS (word aligned by the linker script)
        "movw r0, #:lower16:__bss_start",
        "movt r0, #:upper16:__bss_start",
        "movw r1, #:lower16:__bss_end",
        "movt r1, #:upper16:__bss_end",
        "mov r2, #0",
    ".Lclear_bss:",
        "cmp r0, r1",
        "strlo r2, [r0], #4",
        "blo .Lclear_bss",

        "b {boot_rust}",

    ".Lpark:",
        "wfe",
        "b .Lpark",

        stacks = sym MODE_STACKS,
        size = const MODE_STACK_SIZE,
        boot_rust = sym boot_rust,
    );
}

/// Rust boot code - called after basic ASM setup.
unsafe extern "C" fn boot_rust() -> ! {
    unsafe {
        super::armv7_vectors::install_vector_table();

        Bcm283x::new().init();

        extern "Rust" {
            fn kernel_main() -> !;
        }

        kernel_main();
    }
}
