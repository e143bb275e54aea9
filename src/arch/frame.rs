//! The register frame built by the exception entry code.

use super::psr::Psr;

/// Registers saved on exception entry, in the order the vector stubs
/// store them.
///
/// DO NOT reorder: `sp`, `lr`, `pc` and `spsr` are addressed by fixed
/// offsets from the entry assembly. `sp` and `lr` are the banked user/system
/// registers (stored with `stm {sp, lr}^`); `pc` is the return address with
/// the per-vector adjustment already applied.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExceptionFrame {
    /// General purpose registers r0-r12
    pub r: [usize; 13],
    /// Stack pointer of the interrupted mode
    pub sp: usize,
    /// Link register of the interrupted mode
    pub lr: usize,
    /// Address execution resumes at
    pub pc: usize,
    /// Saved program status register
    pub spsr: usize,
}

/// Word offsets used by the entry code.
pub const FRAME_WORDS: usize = 17;
pub const FRAME_SP_OFFSET: usize = 13 * core::mem::size_of::<usize>();
pub const FRAME_PC_OFFSET: usize = 15 * core::mem::size_of::<usize>();
pub const FRAME_SPSR_OFFSET: usize = 16 * core::mem::size_of::<usize>();

const _: () = assert!(core::mem::size_of::<ExceptionFrame>() == FRAME_WORDS * core::mem::size_of::<usize>());
const _: () = assert!(core::mem::offset_of!(ExceptionFrame, sp) == FRAME_SP_OFFSET);
const _: () = assert!(core::mem::offset_of!(ExceptionFrame, pc) == FRAME_PC_OFFSET);
const _: () = assert!(core::mem::offset_of!(ExceptionFrame, spsr) == FRAME_SPSR_OFFSET);

#[cfg(target_arch = "arm")]
const _: () = assert!(FRAME_SPSR_OFFSET == 64, "entry code stores SPSR at [sp, #64]");

impl ExceptionFrame {
    /// Status of the interrupted code.
    pub fn psr(&self) -> Psr {
        Psr::from(self.spsr)
    }

    /// Whether the exception was taken from user mode.
    pub fn is_from_user_mode(&self) -> bool {
        self.psr().is_user()
    }
}
