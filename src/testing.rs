//! Test doubles for the CPU and board seams.
//!
//! `MockArch` keeps its interrupt state in thread-locals so parallel tests do
//! not see each other. Halting panics with [`HALT_MESSAGE`], which lets a
//! test observe that the kernel gave up without actually spinning forever.

use crate::arch::frame::ExceptionFrame;
use crate::arch::psr::Psr;
use crate::arch::syndrome::{FaultRegisters, ModeRegisters};
use crate::arch::{Arch, Board, PendingIrqs};
use crate::thread::ThreadContext;
use std::cell::Cell;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

pub(crate) const HALT_MESSAGE: &str = "cpu halted";

std::thread_local! {
    static IRQ_ENABLED: Cell<bool> = const { Cell::new(true) };
    static MASK_CALLS: Cell<usize> = const { Cell::new(0) };
    static FAULTS: Cell<FaultRegisters> = const {
        Cell::new(FaultRegisters { dfsr: 0, dfar: 0, ifsr: 0, ifar: 0 })
    };
}

pub(crate) struct MockArch;

impl MockArch {
    pub(crate) fn reset() {
        IRQ_ENABLED.set(true);
        MASK_CALLS.set(0);
        FAULTS.set(FaultRegisters::default());
    }

    pub(crate) fn set_interrupts_enabled(enabled: bool) {
        IRQ_ENABLED.set(enabled);
    }

    /// Number of `disable_interrupts` calls since the last reset.
    pub(crate) fn mask_calls() -> usize {
        MASK_CALLS.get()
    }

    pub(crate) fn set_fault_registers(regs: FaultRegisters) {
        FAULTS.set(regs);
    }
}

impl Arch for MockArch {
    fn enable_interrupts() {
        IRQ_ENABLED.set(true);
    }

    fn disable_interrupts() {
        IRQ_ENABLED.set(false);
        MASK_CALLS.set(MASK_CALLS.get() + 1);
    }

    fn interrupts_enabled() -> bool {
        IRQ_ENABLED.get()
    }

    fn wait_for_interrupt() {}

    fn halt() -> ! {
        panic!("{}", HALT_MESSAGE)
    }

    fn exit_thread() -> ! {
        panic!("thread exit trap")
    }

    fn fault_registers() -> FaultRegisters {
        FAULTS.get()
    }

    fn mode_registers() -> ModeRegisters {
        ModeRegisters::default()
    }

    fn current_psr() -> Psr {
        Psr(0x1D2)
    }

    unsafe fn enter_thread(_ctx: &ThreadContext) -> ! {
        panic!("enter_thread is not available on the host")
    }
}

/// Board whose pending lines are set by the test.
///
/// Every serviced event takes a ticket from a shared sequence so tests can
/// check the order in which the IRQ path handled them.
pub(crate) struct MockBoard {
    pending1: AtomicU32,
    pending2: AtomicU32,
    reloads: AtomicUsize,
    drains: AtomicUsize,
    sequence: AtomicUsize,
    last_drain: AtomicUsize,
    last_reload: AtomicUsize,
}

impl MockBoard {
    pub(crate) const fn new() -> Self {
        Self {
            pending1: AtomicU32::new(0),
            pending2: AtomicU32::new(0),
            reloads: AtomicUsize::new(0),
            drains: AtomicUsize::new(0),
            sequence: AtomicUsize::new(0),
            last_drain: AtomicUsize::new(0),
            last_reload: AtomicUsize::new(0),
        }
    }

    pub(crate) fn raise(&self, pending: PendingIrqs) {
        self.pending1.store(pending.pending1, Ordering::SeqCst);
        self.pending2.store(pending.pending2, Ordering::SeqCst);
    }

    pub(crate) fn raise_timer(&self) {
        self.raise(PendingIrqs {
            pending1: PendingIrqs::TIMER_C1,
            pending2: 0,
        });
    }

    pub(crate) fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }

    pub(crate) fn drains(&self) -> usize {
        self.drains.load(Ordering::SeqCst)
    }

    /// Sequence numbers of the last drain and the last reload.
    pub(crate) fn last_drain_and_reload(&self) -> (usize, usize) {
        (self.last_drain.load(Ordering::SeqCst), self.last_reload.load(Ordering::SeqCst))
    }

    fn ticket(&self) -> usize {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Board for MockBoard {
    fn pending_interrupts(&self) -> PendingIrqs {
        PendingIrqs {
            pending1: self.pending1.load(Ordering::SeqCst),
            pending2: self.pending2.load(Ordering::SeqCst),
        }
    }

    fn reload_timer(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        self.last_reload.store(self.ticket(), Ordering::SeqCst);
        self.pending1.fetch_and(!PendingIrqs::TIMER_C1, Ordering::SeqCst);
    }

    fn drain_uart_rx(&self) {
        self.drains.fetch_add(1, Ordering::SeqCst);
        self.last_drain.store(self.ticket(), Ordering::SeqCst);
        self.pending2.fetch_and(!PendingIrqs::UART, Ordering::SeqCst);
    }
}

/// A frame whose every register is derived from `seed`, in user mode.
pub(crate) fn sentinel_frame(seed: usize) -> ExceptionFrame {
    let mut r = [0; 13];
    for (i, reg) in r.iter_mut().enumerate() {
        *reg = seed + i;
    }
    ExceptionFrame {
        r,
        sp: seed + 0x40,
        lr: seed + 0x44,
        pc: seed + 0x48,
        spsr: Psr::USER.bits() as usize,
    }
}
