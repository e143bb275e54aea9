//! ARMv7-A exception vector table and entry stubs.
//!
//! The table holds eight branch instructions, one per exception, and must be
//! 32-byte aligned for VBAR. Every stub builds an [`ExceptionFrame`] on the
//! stack of the mode the exception was taken to, calls the matching Rust
//! handler with a pointer to it, and returns through whatever the handler
//! left in the frame. That is how a context switch becomes a plain return.
//!
//! # Return address adjustment
//!
//! | Exception              | lr on entry  | adjust |
//! |------------------------|--------------|--------|
//! | Undefined instruction  | insn + 4     | 0      |
//! | Supervisor call        | insn + 4     | 0      |
//! | Prefetch abort         | insn + 4     | -4     |
//! | Data abort             | insn + 8     | -8     |
//! | IRQ / FIQ              | next + 4     | -4     |
//!
//! Undefined instructions and supervisor calls resume after the trapping
//! instruction; aborts re-execute it.

use super::armv7::{Armv7, Bcm283x};
use super::frame::ExceptionFrame;
use super::Arch;
use crate::kernel::{get_global_kernel, Kernel};
use core::arch::{asm, naked_asm};

/// Entry stub for one exception.
///
/// User-bank r0-r14 are stored with `stm ^` so FIQ's banked r8-r12 never
/// leak into a thread context. Layout matches [`ExceptionFrame`]: r0-r12 at
/// 0, sp at 52, lr at 56, return pc at 60, spsr at 64. 72 bytes keep the
/// handler stack 8-byte aligned.
macro_rules! exception_entry {
    ($name:ident, $handler:ident, $lr_adjust:literal) => {
        #[unsafe(naked)]
        unsafe extern "C" fn $name() {
            naked_asm!(
                concat!("sub lr, lr, #", $lr_adjust),
                "sub sp, sp, #72",
                "stmia sp, {{r0-r14}}^",
                "str lr, [sp, #60]",
                "mrs r0, spsr",
                "str r0, [sp, #64]",

                "mov r0, sp",
                "bl {handler}",

                "ldr r0, [sp, #64]",
                "msr spsr_cxsf, r0",
                "ldr lr, [sp, #60]",
                "ldmia sp, {{r0-r14}}^",
                "nop",
                "add sp, sp, #72",
                "movs pc, lr",
                handler = sym $handler,
            );
        }
    };
}

exception_entry!(undefined_entry, undefined_instruction_handler, 0);
exception_entry!(svc_entry, supervisor_call_handler, 0);
exception_entry!(prefetch_abort_entry, prefetch_abort_handler, 4);
exception_entry!(data_abort_entry, data_abort_handler, 8);
exception_entry!(not_used_entry, not_used_handler, 0);
exception_entry!(irq_entry, irq_handler, 4);
exception_entry!(fiq_entry, fiq_handler, 4);

/// The exception vector table.
///
/// `__vector_table` is the aligned label VBAR points at; the function symbol
/// itself may precede the alignment padding.
///
/// # Safety
///
/// Never called. Installed at boot by [`install_vector_table`].
#[link_section = ".vectors"]
#[no_mangle]
#[unsafe(naked)]
pub unsafe extern "C" fn _vectors() {
    naked_asm!(
        ".balign 32",
        ".global __vector_table",
        "__vector_table:",
        "b {reset}",
        "b {undefined}",
        "b {svc}",
        "b {prefetch_abort}",
        "b {data_abort}",
        "b {not_used}",
        "b {irq}",
        "b {fiq}",
        reset = sym super::armv7_boot::_start,
        undefined = sym undefined_entry,
        svc = sym svc_entry,
        prefetch_abort = sym prefetch_abort_entry,
        data_abort = sym data_abort_entry,
        not_used = sym not_used_entry,
        irq = sym irq_entry,
        fiq = sym fiq_entry,
    );
}

/// Install the exception vector table.
///
/// # Safety
///
/// Must be called once during system initialization with interrupts disabled.
pub unsafe fn install_vector_table() {
    unsafe {
        asm!(
            "movw {tmp}, #:lower16:__vector_table",
            "movt {tmp}, #:upper16:__vector_table",
            "mcr p15, 0, {tmp}, c12, c0, 0",
            "isb",
            tmp = out(reg) _,
            options(nostack),
        );
    }
}

type BoardKernel = Kernel<Armv7, Bcm283x>;

/// Run `f` against the registered kernel, halting if there is none yet.
#[inline(always)]
fn dispatch(frame: *mut ExceptionFrame, f: impl FnOnce(&BoardKernel, &mut ExceptionFrame)) {
    // Safety: the entry stub passes the frame it has just built on this stack.
    let frame = unsafe { &mut *frame };
    match get_global_kernel::<Armv7, Bcm283x>() {
        Some(kernel) => f(kernel, frame),
        None => {
            crate::kprintln!("exception before kernel registration, pc=0x{:08x}", frame.pc);
            Armv7::halt()
        }
    }
}

#[no_mangle]
extern "C" fn undefined_instruction_handler(frame: *mut ExceptionFrame) {
    dispatch(frame, |kernel, frame| kernel.on_undefined_instruction(frame));
}

#[no_mangle]
extern "C" fn supervisor_call_handler(frame: *mut ExceptionFrame) {
    dispatch(frame, |kernel, frame| kernel.on_supervisor_call(frame));
}

#[no_mangle]
extern "C" fn prefetch_abort_handler(frame: *mut ExceptionFrame) {
    dispatch(frame, |kernel, frame| kernel.on_prefetch_abort(frame));
}

#[no_mangle]
extern "C" fn data_abort_handler(frame: *mut ExceptionFrame) {
    dispatch(frame, |kernel, frame| kernel.on_data_abort(frame));
}

#[no_mangle]
extern "C" fn not_used_handler(frame: *mut ExceptionFrame) {
    dispatch(frame, |kernel, frame| kernel.on_not_used(frame));
}

#[no_mangle]
extern "C" fn irq_handler(frame: *mut ExceptionFrame) {
    dispatch(frame, |kernel, frame| kernel.on_irq(frame));
}

#[no_mangle]
extern "C" fn fiq_handler(frame: *mut ExceptionFrame) {
    dispatch(frame, |kernel, frame| kernel.on_fiq(frame));
}
