//! Round-robin scheduler over a fixed thread table.

use crate::arch::frame::ExceptionFrame;
use crate::arch::psr::Psr;
use crate::arch::{Arch, InterruptGuard};
use crate::config::{IDLE_THREAD_ID, MAX_THREADS};
use crate::errors::SpawnError;
use crate::thread::{
    idle_loop, thread_trampoline, Tcb, ThreadArg, ThreadContext, ThreadEntry, ThreadId, ThreadStart,
    ThreadState,
};
use core::marker::PhantomData;

/// Round-robin scheduler.
///
/// Owns the thread table and the index of the current thread. Slot 0 is the
/// idle thread, which only runs when no other slot is ready. Selection walks
/// the worker slots `1..MAX_THREADS` cyclically starting after the current
/// one, so every ready thread gets a turn before any thread gets a second.
///
/// Nothing happens on `schedule` or `context_switch` until [`start`](Self::start).
pub struct RoundRobinScheduler<A: Arch> {
    threads: [Tcb; MAX_THREADS],
    current: usize,
    started: bool,
    switches: u64,
    _arch: PhantomData<fn() -> A>,
}

impl<A: Arch> RoundRobinScheduler<A> {
    /// Create a scheduler with every slot terminated.
    pub const fn new() -> Self {
        Self {
            threads: [Tcb::EMPTY; MAX_THREADS],
            current: IDLE_THREAD_ID,
            started: false,
            switches: 0,
            _arch: PhantomData,
        }
    }

    /// Reset the table and build the idle thread.
    ///
    /// The idle thread is left running so that exactly one thread is
    /// running from here on. Addresses of the stacks are taken in place:
    /// the scheduler must not move after this call.
    pub fn init(&mut self) {
        for (index, tcb) in self.threads.iter_mut().enumerate() {
            tcb.state = ThreadState::Terminated;
            tcb.id = ThreadId::new(index);
            tcb.start = None;
            tcb.context = ThreadContext::ZERO;
        }
        self.current = IDLE_THREAD_ID;
        self.started = false;
        self.switches = 0;

        let idle = &mut self.threads[IDLE_THREAD_ID];
        idle.stack.install_canary();
        idle.context = ThreadContext::fresh(idle_loop::<A> as *const () as usize, idle.stack.top(), Psr::USER);
        idle.state = ThreadState::Running;

        log::debug!("scheduler initialized, idle stack top {:#x}", idle.context.sp);
    }

    /// Let `schedule` and `context_switch` take effect.
    pub fn start(&mut self) {
        self.started = true;
        log::info!("scheduler started");
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Put a new thread in the first free slot.
    ///
    /// `arg` is copied onto the new thread's stack; the thread sees it as the
    /// [`ThreadArg`] handed to `entry`. IRQs are masked for the whole call and
    /// the previous mask state is restored on every return.
    pub fn create(&mut self, entry: ThreadEntry, arg: &[u8]) -> Result<ThreadId, SpawnError> {
        let _irq = InterruptGuard::<A>::new();

        let Some(slot) = self.free_slot() else {
            log::warn!("Could not create thread: all {} slots in use", MAX_THREADS - 1);
            return Err(SpawnError::TooManyThreads);
        };

        let tcb = &mut self.threads[slot];
        let Some(sp) = tcb.stack.push_argument(arg) else {
            log::warn!("Could not create thread: {} byte argument does not fit", arg.len());
            return Err(SpawnError::ArgumentTooLarge(arg.len()));
        };
        let arg_ptr = if arg.is_empty() { 0 } else { sp };
        tcb.stack.install_canary();

        let mut context = ThreadContext::fresh(thread_trampoline::<A> as *const () as usize, sp, Psr::USER);
        context.r[0] = entry as usize;
        context.r[1] = arg_ptr;
        context.r[2] = arg.len();

        tcb.context = context;
        tcb.start = Some(ThreadStart {
            entry,
            arg: ThreadArg::from_raw(arg_ptr, arg.len()),
        });
        tcb.id = ThreadId::new(slot);
        tcb.state = ThreadState::Ready;

        log::debug!("created thread {} (sp {:#x}, {} byte argument)", slot, sp, arg.len());
        Ok(tcb.id)
    }

    /// Pick the next thread to run.
    pub fn schedule(&mut self) {
        if !self.started {
            return;
        }

        let previous = self.current;
        if self.threads[previous].state == ThreadState::Running {
            self.threads[previous].state = ThreadState::Ready;
        }

        self.current = self.next_ready(previous).unwrap_or(IDLE_THREAD_ID);
        self.threads[self.current].state = ThreadState::Running;
    }

    /// Mark the current thread terminated. The caller must switch away.
    pub fn terminate_current(&mut self) {
        let current = self.current;
        self.threads[current].state = ThreadState::Terminated;

        if current == IDLE_THREAD_ID {
            log::warn!("idle thread terminated, it will be revived on the next switch");
        } else {
            log::debug!("thread {} terminated", current);
        }
    }

    /// Exchange register state between `frame` and the thread table.
    ///
    /// The interrupted thread's registers are saved into its slot unless it
    /// was terminated, a new thread is selected, and its registers are
    /// written back into `frame` for the exception return.
    pub fn context_switch(&mut self, frame: &mut ExceptionFrame) {
        if !self.started {
            return;
        }

        let previous = self.current;
        let outgoing = &mut self.threads[previous];
        if outgoing.state != ThreadState::Terminated {
            outgoing.context.save_from(frame);
            if !outgoing.stack.canary_intact() {
                log::error!("stack overflow in thread {}", previous);
            }
        }

        self.schedule();

        if self.threads[self.current].state == ThreadState::Terminated {
            self.current = IDLE_THREAD_ID;
            self.threads[IDLE_THREAD_ID].state = ThreadState::Running;
        }

        self.threads[self.current].context.restore_into(frame);
        self.switches += 1;

        if previous != self.current {
            log::trace!("switch {} -> {}", previous, self.current);
        }
    }

    /// The thread currently selected to run.
    pub fn current(&self) -> &Tcb {
        &self.threads[self.current]
    }

    pub fn current_id(&self) -> ThreadId {
        ThreadId::new(self.current)
    }

    pub fn thread(&self, id: ThreadId) -> Option<&Tcb> {
        self.threads.get(id.get())
    }

    pub fn state(&self, id: ThreadId) -> Option<ThreadState> {
        self.thread(id).map(Tcb::state)
    }

    /// Number of threads in the given state.
    pub fn count(&self, state: ThreadState) -> usize {
        self.threads.iter().filter(|tcb| tcb.state == state).count()
    }

    /// Number of completed context switches.
    pub fn switch_count(&self) -> u64 {
        self.switches
    }

    fn free_slot(&self) -> Option<usize> {
        (1..MAX_THREADS).find(|&slot| self.threads[slot].state == ThreadState::Terminated)
    }

    /// First ready worker after `from`, wrapping, with `from` itself last.
    fn next_ready(&self, from: usize) -> Option<usize> {
        let workers = MAX_THREADS - 1;
        // Worker slots are 1..=workers; the idle slot starts the walk at slot 1.
        let start = if from == IDLE_THREAD_ID { 0 } else { from };
        (0..workers)
            .map(|step| 1 + (start + step) % workers)
            .find(|&slot| self.threads[slot].state == ThreadState::Ready)
    }
}

impl<A: Arch> Default for RoundRobinScheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}
