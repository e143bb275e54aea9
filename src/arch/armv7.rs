//! ARMv7-A (AArch32) CPU support for BCM2836/BCM2837.
//!
//! Threads run in user mode; the kernel runs in SVC mode during bring-up and
//! in the exception modes afterwards. Interrupt masking only affects IRQs:
//! FIQ is never routed.

use super::psr::Psr;
use super::syndrome::{BankedRegisters, FaultRegisters, ModeRegisters};
use super::{bcm_irq, bcm_timer, uart_pl011, Arch, Board, PendingIrqs};
use crate::thread::ThreadContext;
use core::arch::asm;

/// sp, lr and spsr banked in the mode with the given number.
///
/// Fixed low registers are used because r13/r14 change meaning while the
/// CPU is in the other mode.
macro_rules! banked {
    ($mode:literal) => {{
        let (sp, lr, spsr): (u32, u32, u32);
        unsafe {
            asm!(
                "mrs r0, cpsr",
                concat!("cps #", $mode),
                "mov r1, sp",
                "mov r2, lr",
                "mrs r3, spsr",
                "msr cpsr_c, r0",
                out("r0") _,
                out("r1") sp,
                out("r2") lr,
                out("r3") spsr,
                options(nomem, nostack),
            );
        }
        BankedRegisters {
            sp,
            lr,
            spsr: Some(Psr(spsr)),
        }
    }};
}

/// ARMv7-A architecture implementation.
pub struct Armv7;

impl Arch for Armv7 {
    fn enable_interrupts() {
        unsafe {
            asm!("cpsie i", options(nostack, preserves_flags));
        }
    }

    fn disable_interrupts() {
        unsafe {
            asm!("cpsid i", options(nostack, preserves_flags));
        }
    }

    fn interrupts_enabled() -> bool {
        !Self::current_psr().irq_masked()
    }

    fn wait_for_interrupt() {
        unsafe {
            asm!("wfi", options(nomem, nostack, preserves_flags));
        }
    }

    fn halt() -> ! {
        unsafe {
            asm!("cpsid if", options(nomem, nostack, preserves_flags));
        }
        loop {
            unsafe {
                asm!("wfe", options(nomem, nostack, preserves_flags));
            }
        }
    }

    fn exit_thread() -> ! {
        unsafe {
            asm!("svc #0", options(nostack));
        }
        // The supervisor call never comes back to a terminated thread.
        loop {
            core::hint::spin_loop();
        }
    }

    fn fault_registers() -> FaultRegisters {
        FaultRegisters {
            dfsr: read_dfsr(),
            dfar: read_dfar(),
            ifsr: read_ifsr(),
            ifar: read_ifar(),
        }
    }

    fn mode_registers() -> ModeRegisters {
        ModeRegisters {
            user: banked_user(),
            irq: banked!(0x12),
            abort: banked!(0x17),
            undefined: banked!(0x1B),
            supervisor: banked!(0x13),
        }
    }

    fn current_psr() -> Psr {
        let cpsr: u32;
        unsafe {
            asm!("mrs {}, cpsr", out(reg) cpsr, options(nomem, nostack, preserves_flags));
        }
        Psr(cpsr)
    }

    unsafe fn enter_thread(ctx: &ThreadContext) -> ! {
        // User sp/lr are set from System mode, which shares the user bank.
        // The final ldm overwrites its own base register, which is allowed
        // without writeback.
        unsafe {
            asm!(
                "msr spsr_cxsf, r0",
                "mrs r4, cpsr",
                "cps #0x1F",
                "mov sp, r1",
                "mov lr, r2",
                "msr cpsr_c, r4",
                "mov lr, r3",
                "ldm r12, {{r0-r12}}",
                "movs pc, lr",
                in("r0") ctx.cpsr,
                in("r1") ctx.sp,
                in("r2") ctx.lr,
                in("r3") ctx.pc,
                in("r12") ctx.r.as_ptr(),
                options(noreturn),
            );
        }
    }
}

/// Data Fault Status Register.
pub fn read_dfsr() -> u32 {
    let value: u32;
    unsafe {
        asm!("mrc p15, 0, {}, c5, c0, 0", out(reg) value, options(nomem, nostack, preserves_flags));
    }
    value
}

/// Data Fault Address Register.
pub fn read_dfar() -> u32 {
    let value: u32;
    unsafe {
        asm!("mrc p15, 0, {}, c6, c0, 0", out(reg) value, options(nomem, nostack, preserves_flags));
    }
    value
}

/// Instruction Fault Status Register.
pub fn read_ifsr() -> u32 {
    let value: u32;
    unsafe {
        asm!("mrc p15, 0, {}, c5, c0, 1", out(reg) value, options(nomem, nostack, preserves_flags));
    }
    value
}

/// Instruction Fault Address Register.
pub fn read_ifar() -> u32 {
    let value: u32;
    unsafe {
        asm!("mrc p15, 0, {}, c6, c0, 2", out(reg) value, options(nomem, nostack, preserves_flags));
    }
    value
}

/// User sp and lr, read through System mode. User mode has no SPSR.
fn banked_user() -> BankedRegisters {
    let (sp, lr): (u32, u32);
    unsafe {
        asm!(
            "mrs r0, cpsr",
            "cps #0x1F",
            "mov r1, sp",
            "mov r2, lr",
            "msr cpsr_c, r0",
            out("r0") _,
            out("r1") sp,
            out("r2") lr,
            options(nomem, nostack),
        );
    }
    BankedRegisters { sp, lr, spsr: None }
}

/// BCM2836/BCM2837 peripherals used by the kernel.
pub struct Bcm283x;

impl Bcm283x {
    pub const fn new() -> Self {
        Self
    }

    /// Bring up the UART, the system timer and their interrupt lines.
    ///
    /// # Safety
    ///
    /// Must be called once during boot with IRQs masked.
    pub unsafe fn init(&self) {
        unsafe {
            uart_pl011::init();
            bcm_timer::init();
            bcm_irq::enable(PendingIrqs {
                pending1: PendingIrqs::TIMER_C1,
                pending2: PendingIrqs::UART,
            });
        }
    }
}

impl Board for Bcm283x {
    fn pending_interrupts(&self) -> PendingIrqs {
        bcm_irq::pending()
    }

    fn reload_timer(&self) {
        bcm_timer::reload_and_ack();
    }

    fn drain_uart_rx(&self) {
        uart_pl011::drain_rx_fifo();
    }
}
