//! Fault-syndrome and banked-register snapshots.
//!
//! The values are read by [`Arch::fault_registers`](super::Arch::fault_registers)
//! and [`Arch::mode_registers`](super::Arch::mode_registers); this module only
//! holds the plain data and the short-descriptor fault-status decoding.

use super::psr::Psr;

/// Data/instruction fault status and address registers (CP15 c5/c6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaultRegisters {
    /// Data Fault Status Register
    pub dfsr: u32,
    /// Data Fault Address Register
    pub dfar: u32,
    /// Instruction Fault Status Register
    pub ifsr: u32,
    /// Instruction Fault Address Register
    pub ifar: u32,
}

/// Banked stack pointer, link register and SPSR of one processor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BankedRegisters {
    pub sp: u32,
    pub lr: u32,
    /// `None` for user/system mode, which have no SPSR.
    pub spsr: Option<Psr>,
}

/// Banked registers of every mode the kernel uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeRegisters {
    pub user: BankedRegisters,
    pub irq: BankedRegisters,
    pub abort: BankedRegisters,
    pub undefined: BankedRegisters,
    pub supervisor: BankedRegisters,
}

/// Short-descriptor fault status index: `FS[3:0] | FS[4] << 4`, FS[4] being bit 10.
pub const fn fault_status_index(fsr: u32) -> u32 {
    (fsr & 0xF) | ((fsr >> 10) & 1) << 4
}

/// Human readable cause of a DFSR/IFSR value.
pub fn fault_status_description(fsr: u32) -> &'static str {
    match fault_status_index(fsr) {
        0b00000 => "No function, reset value",
        0b00001 => "Alignment fault",
        0b00010 => "Debug event fault",
        0b00011 => "Access Flag fault on Section",
        0b00100 => "Cache maintenance operation fault",
        0b00101 => "Translation fault on Section",
        0b00110 => "Access Flag fault on Page",
        0b00111 => "Translation fault on Page",
        0b01000 => "Precise External Abort",
        0b01001 => "Domain fault on Section",
        0b01011 => "Domain fault on Page",
        0b01100 => "External abort on Section",
        0b01101 => "Permission fault on Section",
        0b01110 => "External abort on Page",
        0b01111 => "Permission fault on Page",
        0b10000 => "TLB conflict abort",
        0b10100 => "Implementation defined fault (Lockdown fault)",
        0b10110 => "Asynchronous External Abort",
        0b11000 => "Asynchronous parity error on memory access",
        0b11001 => "Synchronous parity error on memory access",
        0b11010 => "Implementation defined fault (Coprocessor Abort)",
        0b11100 => "Synchronous parity error on translation table walk on Section",
        0b11110 => "Synchronous parity error on translation table walk on Page",
        _ => "Invalid fault status register value",
    }
}
