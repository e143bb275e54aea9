//! Thread control blocks and the thread startup contract.
//!
//! A thread is a slot in the scheduler's table: a [`Tcb`] holding the saved
//! registers, a state tag, the slot id and a private stack. Thread code is a
//! plain `fn(ThreadArg)`; it is entered through [`thread_trampoline`] and
//! returning from it exits the thread.

use crate::arch::Arch;
use crate::config::IDLE_THREAD_ID;
use crate::mem::ThreadStack;
use core::fmt;

pub mod context;

pub use context::ThreadContext;

/// Index of a slot in the thread table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(usize);

impl ThreadId {
    /// The idle thread.
    pub const IDLE: ThreadId = ThreadId(IDLE_THREAD_ID);

    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the raw slot index.
    pub const fn get(self) -> usize {
        self.0
    }

    pub const fn is_idle(self) -> bool {
        self.0 == IDLE_THREAD_ID
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ThreadState {
    Ready = 0,
    Running = 1,
    Terminated = 2,
}

/// The argument a thread receives: a blob copied onto its own stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadArg {
    ptr: usize,
    len: usize,
}

impl ThreadArg {
    /// Argument of a thread created without one.
    pub const fn empty() -> Self {
        Self { ptr: 0, len: 0 }
    }

    /// Rebuild an argument from the registers the trampoline receives.
    pub(crate) const fn from_raw(ptr: usize, len: usize) -> Self {
        Self { ptr, len }
    }

    /// Address of the copied bytes, null for an empty argument.
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr as *const u8
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The copied bytes.
    pub fn as_bytes(&self) -> &[u8] {
        if self.len == 0 || self.ptr == 0 {
            return &[];
        }
        // Safety: a non-empty argument always points at `len` bytes the
        // kernel copied onto the owning thread's stack.
        unsafe { core::slice::from_raw_parts(self.as_ptr(), self.len) }
    }
}

/// Thread body.
pub type ThreadEntry = fn(ThreadArg);

/// Startup record of a created thread.
#[derive(Debug, Clone, Copy)]
pub struct ThreadStart {
    pub entry: ThreadEntry,
    pub arg: ThreadArg,
}

/// Thread control block.
pub struct Tcb {
    pub(crate) context: ThreadContext,
    pub(crate) state: ThreadState,
    pub(crate) id: ThreadId,
    pub(crate) start: Option<ThreadStart>,
    pub(crate) stack: ThreadStack,
}

impl Tcb {
    /// A terminated slot with an empty stack.
    pub const EMPTY: Tcb = Tcb {
        context: ThreadContext::ZERO,
        state: ThreadState::Terminated,
        id: ThreadId::IDLE,
        start: None,
        stack: ThreadStack::new(),
    };

    /// Get the thread's slot id.
    pub fn id(&self) -> ThreadId {
        self.id
    }

    pub fn state(&self) -> ThreadState {
        self.state
    }

    /// Registers saved at the last switch away from this thread.
    pub fn context(&self) -> &ThreadContext {
        &self.context
    }

    /// Entry and argument, `None` for the idle thread and free slots.
    pub fn start(&self) -> Option<&ThreadStart> {
        self.start.as_ref()
    }

    pub fn stack(&self) -> &ThreadStack {
        &self.stack
    }
}

/// First code every created thread runs.
///
/// `create` puts the entry in r0, the argument pointer in r1 and its length
/// in r2, which is exactly where the C ABI delivers the three parameters.
pub extern "C" fn thread_trampoline<A: Arch>(entry: usize, arg_ptr: usize, arg_len: usize) -> ! {
    run_thread::<A>(entry, arg_ptr, arg_len)
}

/// Decode the startup registers, run the entry and exit the thread.
pub(crate) fn run_thread<A: Arch>(entry: usize, arg_ptr: usize, arg_len: usize) -> ! {
    // Safety: r0 was written from a `ThreadEntry` by the scheduler.
    let entry = unsafe { core::mem::transmute::<usize, ThreadEntry>(entry) };
    entry(ThreadArg::from_raw(arg_ptr, arg_len));
    A::exit_thread()
}

/// Body of the idle thread.
pub extern "C" fn idle_loop<A: Arch>() -> ! {
    loop {
        A::wait_for_interrupt();
    }
}
