//! Saved register context of a parked thread.

use crate::arch::frame::ExceptionFrame;
use crate::arch::psr::Psr;

/// Registers of a thread that is not on the CPU.
///
/// Mirrors [`ExceptionFrame`] field for field. [`save_from`](Self::save_from)
/// and [`restore_into`](Self::restore_into) are the only code that maps one
/// onto the other.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThreadContext {
    /// General purpose registers r0-r12
    pub r: [usize; 13],
    /// Stack pointer
    pub sp: usize,
    /// Link register
    pub lr: usize,
    /// Resume address
    pub pc: usize,
    /// Program status the thread resumes with
    pub cpsr: usize,
}

impl ThreadContext {
    /// All registers zero.
    pub const ZERO: ThreadContext = ThreadContext {
        r: [0; 13],
        sp: 0,
        lr: 0,
        pc: 0,
        cpsr: 0,
    };

    /// Context of a thread that has never run.
    pub fn fresh(entry: usize, sp: usize, psr: Psr) -> Self {
        Self {
            r: [0; 13],
            sp,
            lr: entry,
            pc: entry,
            cpsr: psr.bits() as usize,
        }
    }

    /// Copy a live exception frame into this context.
    pub fn save_from(&mut self, frame: &ExceptionFrame) {
        self.r = frame.r;
        self.sp = frame.sp;
        self.lr = frame.lr;
        self.pc = frame.pc;
        self.cpsr = frame.spsr;
    }

    /// Load this context into an exception frame so that the exception
    /// return resumes the thread.
    pub fn restore_into(&self, frame: &mut ExceptionFrame) {
        frame.r = self.r;
        frame.sp = self.sp;
        frame.lr = self.lr;
        frame.pc = self.pc;
        frame.spsr = self.cpsr;
    }

    pub fn psr(&self) -> Psr {
        Psr::from(self.cpsr)
    }
}
