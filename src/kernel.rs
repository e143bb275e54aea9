//! Kernel handle tying the scheduler to the CPU and board.
//!
//! A [`Kernel`] owns the scheduler behind a spin lock and the board used by
//! the IRQ path. Exception shims find it through [`get_global_kernel`] once
//! [`Kernel::register_global`] has been called; tests build their own
//! instances instead.

use crate::arch::{Arch, Board, InterruptGuard};
use crate::config::IRQ_DEBUG_DEFAULT;
use crate::errors::{KernelError, KernelResult, SpawnError};
use crate::sched::RoundRobinScheduler;
use crate::thread::{ThreadContext, ThreadEntry, ThreadId, ThreadState};
use portable_atomic::{AtomicBool, AtomicPtr, Ordering};

/// Global kernel reference for exception handlers.
static GLOBAL_KERNEL: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());

/// Main kernel handle.
///
/// # Type Parameters
///
/// * `A` - CPU implementation
/// * `B` - Board (interrupt controller, timer, UART)
///
/// Every method that takes the scheduler lock masks IRQs first, so an
/// interrupt can never spin on a lock held by the code it interrupted.
pub struct Kernel<A: Arch, B: Board> {
    pub(crate) scheduler: spin::Mutex<RoundRobinScheduler<A>>,
    pub(crate) board: B,
    initialized: AtomicBool,
    irq_debug: AtomicBool,
}

impl<A: Arch, B: Board> Kernel<A, B> {
    /// Create a new kernel instance; call [`init`](Self::init) before use.
    pub const fn new(board: B) -> Self {
        Self {
            scheduler: spin::Mutex::new(RoundRobinScheduler::new()),
            board,
            initialized: AtomicBool::new(false),
            irq_debug: AtomicBool::new(IRQ_DEBUG_DEFAULT),
        }
    }

    /// Initialize the thread table and the idle thread.
    ///
    /// The kernel must not move afterwards: thread stacks are addressed in
    /// place. Returns `Err(KernelError::AlreadyInitialized)` on a second call.
    pub fn init(&self) -> KernelResult<()> {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(KernelError::AlreadyInitialized);
        }

        self.with_scheduler(|sched| sched.init());
        log::info!("kernel initialized");
        Ok(())
    }

    /// Check if the kernel has been initialized.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Create a thread running `entry` with a copy of `arg`.
    ///
    /// Must be called from a privileged mode (kernel bring-up or an exception
    /// handler): masking IRQs has no effect in user mode.
    pub fn spawn(&self, entry: ThreadEntry, arg: &[u8]) -> Result<ThreadId, SpawnError> {
        if !self.is_initialized() {
            return Err(SpawnError::NotInitialized);
        }
        self.with_scheduler(|sched| sched.create(entry, arg))
    }

    /// Start scheduling and enter the first thread in user mode.
    ///
    /// Halts if the kernel was never initialized or is already running.
    pub fn start(&self) -> ! {
        let first = match self.select_first_thread() {
            Ok(context) => context,
            Err(e) => {
                log::error!("cannot start: {}", e);
                A::halt();
            }
        };

        A::disable_interrupts();
        // Safety: privileged, IRQs masked, and the context was built by the
        // scheduler for a thread that has a stack of its own.
        unsafe { A::enter_thread(&first) }
    }

    /// Mark the scheduler started and pick the thread `start` enters.
    pub(crate) fn select_first_thread(&self) -> KernelResult<ThreadContext> {
        if !self.is_initialized() {
            return Err(KernelError::NotInitialized);
        }

        self.with_scheduler(|sched| {
            if sched.is_started() {
                return Err(KernelError::AlreadyStarted);
            }
            sched.start();
            sched.schedule();
            log::info!("entering thread {}", sched.current_id());
            Ok(*sched.current().context())
        })
    }

    /// Id of the thread currently selected to run.
    pub fn current_id(&self) -> ThreadId {
        self.with_scheduler(|sched| sched.current_id())
    }

    pub fn thread_state(&self, id: ThreadId) -> Option<ThreadState> {
        self.with_scheduler(|sched| sched.state(id))
    }

    /// Number of context switches performed so far.
    pub fn switch_count(&self) -> u64 {
        self.with_scheduler(|sched| sched.switch_count())
    }

    /// Whether every IRQ dumps the register state.
    pub fn irq_debug(&self) -> bool {
        self.irq_debug.load(Ordering::Relaxed)
    }

    pub fn set_irq_debug(&self, enabled: bool) {
        self.irq_debug.store(enabled, Ordering::Relaxed);
    }

    /// Flip IRQ tracing and return the new setting.
    pub fn toggle_irq_debug(&self) -> bool {
        !self.irq_debug.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    /// Run `f` on the scheduler with IRQs masked and the lock held.
    ///
    /// Privileged callers only. From user mode the mask is a no-op and a
    /// tick arriving while the lock is held would spin forever.
    pub fn with_scheduler<R>(&self, f: impl FnOnce(&mut RoundRobinScheduler<A>) -> R) -> R {
        let _irq = InterruptGuard::<A>::new();
        let mut sched = self.scheduler.lock();
        f(&mut sched)
    }

    /// Register this kernel as the global kernel for exception handlers.
    ///
    /// # Safety
    ///
    /// The kernel must live for the rest of the system's lifetime and must
    /// have the concrete type the exception shims look up.
    pub unsafe fn register_global(&'static self) {
        GLOBAL_KERNEL.store(self as *const _ as *mut (), Ordering::Release);
    }
}

/// Get the global kernel reference (for exception handlers).
///
/// Returns None if no kernel has been registered.
pub fn get_global_kernel<A: Arch, B: Board>() -> Option<&'static Kernel<A, B>> {
    let ptr = GLOBAL_KERNEL.load(Ordering::Acquire);
    if ptr.is_null() {
        None
    } else {
        // Safety: `register_global` stored a `&'static Kernel<A, B>` and its
        // caller guarantees the type matches.
        Some(unsafe { &*(ptr as *const Kernel<A, B>) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockArch, MockBoard};
    use crate::thread::ThreadArg;
    use std::boxed::Box;

    fn worker(_: ThreadArg) {}

    fn kernel() -> Box<Kernel<MockArch, MockBoard>> {
        MockArch::reset();
        Box::new(Kernel::new(MockBoard::new()))
    }

    #[test]
    fn test_init_only_once() {
        let kernel = kernel();
        assert!(!kernel.is_initialized());
        assert_eq!(kernel.init(), Ok(()));
        assert_eq!(kernel.init(), Err(KernelError::AlreadyInitialized));
        assert_eq!(kernel.current_id(), ThreadId::IDLE);
    }

    #[test]
    fn test_spawn_requires_init() {
        let kernel = kernel();
        assert_eq!(kernel.spawn(worker, &[]), Err(SpawnError::NotInitialized));

        kernel.init().expect("first init");
        assert_eq!(kernel.spawn(worker, b"arg"), Ok(ThreadId::new(1)));
        assert_eq!(kernel.thread_state(ThreadId::new(1)), Some(ThreadState::Ready));
    }

    #[test]
    fn test_first_thread_needs_init_and_a_single_start() {
        let kernel = kernel();
        assert_eq!(kernel.select_first_thread(), Err(KernelError::NotInitialized));

        kernel.init().expect("first init");
        let id = kernel.spawn(worker, &[]).expect("free slot");
        let first = kernel.select_first_thread().expect("initialized kernel");

        assert_eq!(kernel.current_id(), id);
        assert_eq!(kernel.thread_state(id), Some(ThreadState::Running));
        assert_eq!(first.pc, crate::thread::thread_trampoline::<MockArch> as *const () as usize);
        assert_eq!(kernel.select_first_thread(), Err(KernelError::AlreadyStarted));
    }

    #[test]
    fn test_scheduler_access_masks_interrupts() {
        let kernel = kernel();
        kernel.init().expect("first init");

        kernel.with_scheduler(|_| {
            assert!(!MockArch::interrupts_enabled(), "lock is only held with IRQs masked");
        });
        assert!(MockArch::interrupts_enabled());
    }

    #[test]
    fn test_irq_debug_toggle() {
        let kernel = kernel();
        kernel.set_irq_debug(false);
        assert!(kernel.toggle_irq_debug());
        assert!(kernel.irq_debug());
        assert!(!kernel.toggle_irq_debug());
        assert!(!kernel.irq_debug());
    }

    #[test]
    fn test_global_kernel_lookup() {
        static GLOBAL: Kernel<MockArch, MockBoard> = Kernel::new(MockBoard::new());

        unsafe { GLOBAL.register_global() };
        let found = get_global_kernel::<MockArch, MockBoard>().expect("registered");
        assert!(core::ptr::eq(found, &GLOBAL));
    }
}
