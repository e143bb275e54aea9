//! Diagnostic dump written when an exception is reported.

use super::ExceptionKind;
use crate::arch::frame::ExceptionFrame;
use crate::arch::psr::{ProcessorMode, Psr};
use crate::arch::syndrome::{fault_status_description, BankedRegisters, FaultRegisters, ModeRegisters};
use crate::arch::Arch;
use core::fmt;

/// Everything known about an exception at the time it was taken.
#[derive(Debug, Clone, Copy)]
pub struct ExceptionReport {
    pub kind: ExceptionKind,
    pub frame: ExceptionFrame,
    pub faults: FaultRegisters,
    pub modes: ModeRegisters,
    /// CPSR of the handler
    pub cpsr: Psr,
}

impl ExceptionReport {
    /// Read the syndrome and banked registers through `A`.
    ///
    /// The banked SPSR of the mode handling the exception has already been
    /// clobbered by the time the handler runs, so the frame's copy is used.
    pub fn capture<A: Arch>(kind: ExceptionKind, frame: &ExceptionFrame) -> Self {
        let mut modes = A::mode_registers();
        let spsr = Some(frame.psr());
        match kind.handler_mode() {
            Some(ProcessorMode::Irq) => modes.irq.spsr = spsr,
            Some(ProcessorMode::Abort) => modes.abort.spsr = spsr,
            Some(ProcessorMode::Undefined) => modes.undefined.spsr = spsr,
            Some(ProcessorMode::Supervisor) => modes.supervisor.spsr = spsr,
            _ => {}
        }

        Self {
            kind,
            frame: *frame,
            faults: A::fault_registers(),
            modes,
            cpsr: A::current_psr(),
        }
    }
}

fn banked_row(f: &mut fmt::Formatter<'_>, name: &str, regs: &BankedRegisters) -> fmt::Result {
    write!(f, "{:<11} | LR: 0x{:08x} | SP: 0x{:08x}", name, regs.lr, regs.sp)?;
    match regs.spsr {
        Some(spsr) => writeln!(f, " | SPSR: {}", spsr),
        None => writeln!(f),
    }
}

impl fmt::Display for ExceptionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frame = &self.frame;

        writeln!(f, "############ EXCEPTION ############")?;
        writeln!(f, "{} at address: 0x{:08x}", self.kind.name(), frame.pc)?;
        match self.kind {
            ExceptionKind::DataAbort => {
                let dfsr = self.faults.dfsr;
                writeln!(f, "Data Fault Status Register: 0x{:08x} -> {}", dfsr, fault_status_description(dfsr))?;
                writeln!(f, "Data Fault Address Register: 0x{:08x}", self.faults.dfar)?;
            }
            ExceptionKind::PrefetchAbort => {
                let ifsr = self.faults.ifsr;
                writeln!(f, "Instruction Fault Status Register: 0x{:08x} -> {}", ifsr, fault_status_description(ifsr))?;
                writeln!(f, "Instruction Fault Address Register: 0x{:08x}", self.faults.ifar)?;
            }
            _ => {}
        }

        writeln!(f)?;
        writeln!(f, ">> Register snapshot <<")?;
        for row in 0..5 {
            let third = match row {
                0..=2 => (["R10", "R11", "R12"][row], frame.r[row + 10]),
                3 => ("SP", frame.sp),
                _ => ("LR", frame.lr),
            };
            writeln!(
                f,
                "R{}: 0x{:08x}  R{}: 0x{:08x}  {:>3}: 0x{:08x}",
                row,
                frame.r[row],
                row + 5,
                frame.r[row + 5],
                third.0,
                third.1
            )?;
        }
        writeln!(f, "Saved status: {}", frame.psr())?;
        writeln!(f, "Handler CPSR: {}", self.cpsr)?;

        writeln!(f)?;
        writeln!(f, ">> Mode-specific registers <<")?;
        banked_row(f, "User/System", &self.modes.user)?;
        banked_row(f, "IRQ", &self.modes.irq)?;
        banked_row(f, "Abort", &self.modes.abort)?;
        banked_row(f, "Undefined", &self.modes.undefined)?;
        banked_row(f, "Supervisor", &self.modes.supervisor)
    }
}
