//! Exception dispatch.
//!
//! One entry point per exception class, each taking the frame built by the
//! vector entry code. The frame is the only thing a handler changes to
//! decide what the CPU resumes into:
//!
//! - supervisor call: the current thread exits, another one is switched in
//! - IRQ: UART RX is drained first, then a timer match reloads the timer and
//!   forces a context switch
//! - FIQ, undefined instruction, prefetch abort, data abort, unused vector:
//!   the fault is reported, then a user-mode thread is terminated and
//!   switched away from, while a fault in kernel mode halts the CPU

pub mod report;

use crate::arch::frame::ExceptionFrame;
use crate::arch::psr::ProcessorMode;
use crate::arch::{Arch, Board};
use crate::kernel::Kernel;
use report::ExceptionReport;

/// End-of-transmission byte sent to the console before halting.
pub const END_OF_TRANSMISSION: u8 = 0x04;

/// Exception classes routed by the vector table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionKind {
    SupervisorCall,
    Irq,
    Fiq,
    UndefinedInstruction,
    PrefetchAbort,
    DataAbort,
    NotUsed,
}

impl ExceptionKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::SupervisorCall => "Supervisor Call",
            Self::Irq => "IRQ",
            Self::Fiq => "FIQ",
            Self::UndefinedInstruction => "Undefined Instruction",
            Self::PrefetchAbort => "Prefetch Abort",
            Self::DataAbort => "Data Abort",
            Self::NotUsed => "Unused Vector",
        }
    }

    /// Mode the CPU is in while handling this class.
    pub const fn handler_mode(self) -> Option<ProcessorMode> {
        match self {
            Self::SupervisorCall => Some(ProcessorMode::Supervisor),
            Self::Irq => Some(ProcessorMode::Irq),
            Self::Fiq => Some(ProcessorMode::Fiq),
            Self::UndefinedInstruction => Some(ProcessorMode::Undefined),
            Self::PrefetchAbort | Self::DataAbort => Some(ProcessorMode::Abort),
            Self::NotUsed => None,
        }
    }
}

/// What happens after a fault has been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultAction {
    /// The faulting thread was in user mode: drop it and keep scheduling.
    TerminateThread,
    /// The kernel itself faulted: stop the machine.
    Halt,
}

impl FaultAction {
    pub fn for_frame(frame: &ExceptionFrame) -> Self {
        if frame.is_from_user_mode() {
            FaultAction::TerminateThread
        } else {
            FaultAction::Halt
        }
    }
}

impl<A: Arch, B: Board> Kernel<A, B> {
    /// The current thread asked to exit.
    pub fn on_supervisor_call(&self, frame: &mut ExceptionFrame) {
        self.with_scheduler(|sched| {
            log::debug!("thread {} exited", sched.current_id());
            sched.terminate_current();
            sched.context_switch(frame);
        });
    }

    /// Service pending peripheral interrupts.
    pub fn on_irq(&self, frame: &mut ExceptionFrame) {
        let pending = self.board.pending_interrupts();
        log::trace!("irq pending1={:#010x} pending2={:#010x}", pending.pending1, pending.pending2);

        if pending.uart_rx() {
            self.board.drain_uart_rx();
        }

        if pending.timer_match() {
            self.board.reload_timer();
            self.with_scheduler(|sched| sched.context_switch(frame));
        }

        if self.irq_debug() {
            self.report(ExceptionKind::Irq, frame);
        }
    }

    pub fn on_fiq(&self, frame: &mut ExceptionFrame) {
        self.on_fault(ExceptionKind::Fiq, frame);
    }

    pub fn on_undefined_instruction(&self, frame: &mut ExceptionFrame) {
        self.on_fault(ExceptionKind::UndefinedInstruction, frame);
    }

    pub fn on_prefetch_abort(&self, frame: &mut ExceptionFrame) {
        self.on_fault(ExceptionKind::PrefetchAbort, frame);
    }

    pub fn on_data_abort(&self, frame: &mut ExceptionFrame) {
        self.on_fault(ExceptionKind::DataAbort, frame);
    }

    pub fn on_not_used(&self, frame: &mut ExceptionFrame) {
        self.on_fault(ExceptionKind::NotUsed, frame);
    }

    fn on_fault(&self, kind: ExceptionKind, frame: &mut ExceptionFrame) {
        self.report(kind, frame);

        match FaultAction::for_frame(frame) {
            FaultAction::TerminateThread => self.with_scheduler(|sched| {
                log::warn!("{} in thread {}, terminating it", kind.name(), sched.current_id());
                sched.terminate_current();
                sched.context_switch(frame);
            }),
            FaultAction::Halt => {
                log::error!("{} in {} mode, halting", kind.name(), frame.psr().mode().map_or("Unknown", ProcessorMode::name));
                crate::console::putc(END_OF_TRANSMISSION);
                A::halt();
            }
        }
    }

    fn report(&self, kind: ExceptionKind, frame: &ExceptionFrame) {
        crate::kprint!("{}", ExceptionReport::capture::<A>(kind, frame));
    }
}
