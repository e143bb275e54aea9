//! ARMv7 program status registers (CPSR/SPSR).

use bitflags::bitflags;
use core::fmt;

/// Mask of the mode field in a PSR.
pub const PSR_MODE_MASK: u32 = 0x1F;

bitflags! {
    /// Condition and control flags of a PSR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PsrFlags: u32 {
        /// Negative
        const N = 1 << 31;
        /// Zero
        const Z = 1 << 30;
        /// Carry
        const C = 1 << 29;
        /// Overflow
        const V = 1 << 28;
        /// Big-endian data
        const E = 1 << 9;
        /// IRQ masked
        const I = 1 << 7;
        /// FIQ masked
        const F = 1 << 6;
        /// Thumb state
        const T = 1 << 5;
    }
}

/// Processor mode encoded in `PSR[4:0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ProcessorMode {
    User = 0x10,
    Fiq = 0x11,
    Irq = 0x12,
    Supervisor = 0x13,
    Abort = 0x17,
    Undefined = 0x1B,
    System = 0x1F,
}

impl ProcessorMode {
    /// Decode a mode field, `None` for reserved encodings.
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits & PSR_MODE_MASK {
            0x10 => Some(Self::User),
            0x11 => Some(Self::Fiq),
            0x12 => Some(Self::Irq),
            0x13 => Some(Self::Supervisor),
            0x17 => Some(Self::Abort),
            0x1B => Some(Self::Undefined),
            0x1F => Some(Self::System),
            _ => None,
        }
    }

    /// Short name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Fiq => "FIQ",
            Self::Irq => "IRQ",
            Self::Supervisor => "SVC",
            Self::Abort => "Abort",
            Self::Undefined => "Undefined",
            Self::System => "System",
        }
    }
}

/// A raw CPSR or SPSR value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Psr(pub u32);

impl Psr {
    /// User mode, ARM state, IRQ and FIQ unmasked.
    pub const USER: Psr = Psr(ProcessorMode::User as u32);

    /// Raw register value.
    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn mode(self) -> Option<ProcessorMode> {
        ProcessorMode::from_bits(self.0)
    }

    pub fn flags(self) -> PsrFlags {
        PsrFlags::from_bits_truncate(self.0)
    }

    /// Whether the mode field says user mode.
    pub const fn is_user(self) -> bool {
        self.0 & PSR_MODE_MASK == ProcessorMode::User as u32
    }

    pub fn irq_masked(self) -> bool {
        self.flags().contains(PsrFlags::I)
    }
}

impl From<usize> for Psr {
    fn from(raw: usize) -> Self {
        Psr(raw as u32)
    }
}

impl fmt::Display for Psr {
    /// `NZCV E IFT <mode> 0x<value>`, with `_` for every clear flag.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = self.flags();
        let bit = |flag: PsrFlags, letter: char| if flags.contains(flag) { letter } else { '_' };

        write!(
            f,
            "{}{}{}{} {} {}{}{} {:<10} 0x{:08x}",
            bit(PsrFlags::N, 'N'),
            bit(PsrFlags::Z, 'Z'),
            bit(PsrFlags::C, 'C'),
            bit(PsrFlags::V, 'V'),
            bit(PsrFlags::E, 'E'),
            bit(PsrFlags::I, 'I'),
            bit(PsrFlags::F, 'F'),
            bit(PsrFlags::T, 'T'),
            self.mode().map_or("Unknown", ProcessorMode::name),
            self.0,
        )
    }
}
