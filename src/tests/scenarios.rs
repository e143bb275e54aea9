use crate::arch::frame::ExceptionFrame;
use crate::kernel::Kernel;
use crate::testing::{sentinel_frame, MockArch, MockBoard, HALT_MESSAGE};
use crate::thread::{run_thread, ThreadArg, ThreadId, ThreadState};
use std::boxed::Box;
use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::string::String;
use std::vec::Vec;

fn noop(_: ThreadArg) {}

fn kernel() -> Box<Kernel<MockArch, MockBoard>> {
    MockArch::reset();
    let kernel = Box::new(Kernel::new(MockBoard::new()));
    kernel.init().expect("fresh kernel");
    kernel.set_irq_debug(false);
    kernel
}

fn tick(kernel: &Kernel<MockArch, MockBoard>, frame: &mut ExceptionFrame) {
    kernel.board().raise_timer();
    kernel.on_irq(frame);
}

fn states(kernel: &Kernel<MockArch, MockBoard>) -> Vec<ThreadState> {
    kernel.with_scheduler(|sched| {
        (0..crate::config::MAX_THREADS)
            .map(|slot| sched.state(ThreadId::new(slot)).expect("slot in range"))
            .collect()
    })
}

#[test]
fn test_first_tick_moves_from_idle_to_created_thread() {
    let kernel = kernel();
    let id = kernel.spawn(noop, &[]).expect("free slot");
    assert_eq!(id, ThreadId::new(1));
    assert_eq!(kernel.thread_state(id), Some(ThreadState::Ready));

    kernel.with_scheduler(|sched| sched.start());
    assert_eq!(kernel.current_id(), ThreadId::IDLE, "start alone does not switch");

    let mut frame = sentinel_frame(0x100);
    tick(&kernel, &mut frame);

    assert_eq!(kernel.current_id(), id);
    assert_eq!(kernel.thread_state(id), Some(ThreadState::Running));
    assert_eq!(kernel.thread_state(ThreadId::IDLE), Some(ThreadState::Ready));

    let entered = kernel.with_scheduler(|sched| *sched.current().context());
    assert_eq!(frame.pc, entered.pc, "exception return goes to the new thread");
    assert_eq!(frame.sp, entered.sp);
    assert_eq!(frame.spsr, entered.cpsr);
    assert!(frame.is_from_user_mode());
}

#[test]
fn test_exit_of_last_thread_falls_back_to_idle() {
    let kernel = kernel();
    let id = kernel.spawn(noop, &[]).expect("free slot");
    kernel.with_scheduler(|sched| sched.start());

    let mut frame = sentinel_frame(0x200);
    tick(&kernel, &mut frame);
    assert_eq!(kernel.current_id(), id);

    kernel.on_supervisor_call(&mut frame);

    assert_eq!(kernel.thread_state(id), Some(ThreadState::Terminated));
    assert_eq!(kernel.current_id(), ThreadId::IDLE);
    assert_eq!(kernel.thread_state(ThreadId::IDLE), Some(ThreadState::Running));

    // Later ticks keep running idle.
    tick(&kernel, &mut frame);
    assert_eq!(kernel.current_id(), ThreadId::IDLE);
}

#[test]
fn test_kernel_mode_data_abort_halts_without_scheduling() {
    let kernel = kernel();
    kernel.spawn(noop, &[]).expect("free slot");
    kernel.spawn(noop, &[]).expect("free slot");
    kernel.with_scheduler(|sched| sched.start());

    let mut frame = sentinel_frame(0x300);
    tick(&kernel, &mut frame);

    let before = states(&kernel);
    let current = kernel.current_id();
    let switches = kernel.switch_count();

    let mut abort = sentinel_frame(0x3000);
    abort.spsr = 0x1D3;
    let saved = abort;

    let result = catch_unwind(AssertUnwindSafe(|| kernel.on_data_abort(&mut abort)));
    let payload = result.expect_err("data abort in SVC mode must halt");
    assert_eq!(payload.downcast_ref::<String>().map(String::as_str), Some(HALT_MESSAGE));

    assert_eq!(states(&kernel), before);
    assert_eq!(kernel.current_id(), current);
    assert_eq!(kernel.switch_count(), switches);
    assert_eq!(abort, saved, "frame is left as the fault found it");
}

#[test]
fn test_thread_registers_survive_a_full_round() {
    let kernel = kernel();
    for _ in 0..3 {
        kernel.spawn(noop, &[]).expect("free slot");
    }
    kernel.with_scheduler(|sched| sched.start());

    let mut frame = sentinel_frame(0);
    tick(&kernel, &mut frame);

    // Each thread leaves a distinct register image behind when preempted.
    let mut images = Vec::new();
    for round in 0..3 {
        let id = kernel.current_id();
        let image = sentinel_frame(0x1000 * (round + 1));
        images.push((id, image));
        frame = image;
        tick(&kernel, &mut frame);
    }

    for (id, image) in images {
        assert_eq!(kernel.current_id(), id, "round robin returns in order");
        assert_eq!(frame, image, "thread {} resumed with its own registers", id);
        tick(&kernel, &mut frame);
    }
}

type Snapshot = (ExceptionFrame, ThreadId, Vec<ThreadState>, u64);

fn run_ticks(irq_debug: bool) -> Snapshot {
    let kernel = kernel();
    kernel.set_irq_debug(irq_debug);
    for _ in 0..2 {
        kernel.spawn(noop, &[]).expect("free slot");
    }
    kernel.with_scheduler(|sched| sched.start());

    // Each running thread overwrites the frame, so the thread resumed last
    // hands back registers that do not depend on where this kernel lives.
    let mut frame = sentinel_frame(0x600);
    for round in 1..=3 {
        tick(&kernel, &mut frame);
        if round < 3 {
            frame = sentinel_frame(0x1000 * round);
        }
    }
    kernel.on_irq(&mut frame);
    (frame, kernel.current_id(), states(&kernel), kernel.switch_count())
}

#[test]
fn test_irq_debug_output_has_no_control_effect() {
    let quiet = run_ticks(false);
    let verbose = run_ticks(true);
    assert_eq!(verbose, quiet);
    assert_eq!(quiet.0, sentinel_frame(0x1000), "thread 1 resumed with its own registers");
    assert_eq!(quiet.1, ThreadId::new(1));
    assert_eq!(quiet.3, 3, "one switch per timer tick");
}

std::thread_local! {
    static SEEN: RefCell<Vec<u8>> = const { RefCell::new(Vec::new()) };
}

fn record(arg: ThreadArg) {
    SEEN.with(|seen| seen.borrow_mut().extend_from_slice(arg.as_bytes()));
}

#[test]
fn test_thread_startup_runs_entry_then_exits() {
    let kernel = kernel();
    let id = kernel.spawn(record, b"hello").expect("free slot");

    let (entry, arg_ptr, arg_len) = kernel.with_scheduler(|sched| {
        let ctx = sched.thread(id).expect("slot").context();
        (ctx.r[0], ctx.r[1], ctx.r[2])
    });

    SEEN.with(|seen| seen.borrow_mut().clear());
    let result = catch_unwind(|| run_thread::<MockArch>(entry, arg_ptr, arg_len));

    let payload = result.expect_err("returning from the entry raises the exit trap");
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"thread exit trap"));
    SEEN.with(|seen| assert_eq!(seen.borrow().as_slice(), b"hello"));
}

#[test]
fn test_faulting_thread_does_not_stop_the_others() {
    let kernel = kernel();
    let ids: Vec<_> = (0..3).map(|_| kernel.spawn(noop, &[]).expect("free slot")).collect();
    kernel.with_scheduler(|sched| sched.start());

    let mut frame = sentinel_frame(0x400);
    tick(&kernel, &mut frame);
    assert_eq!(kernel.current_id(), ids[0]);

    let mut fault = sentinel_frame(0x4000);
    kernel.on_prefetch_abort(&mut fault);
    assert_eq!(kernel.thread_state(ids[0]), Some(ThreadState::Terminated));
    assert_eq!(kernel.current_id(), ids[1]);

    tick(&kernel, &mut fault);
    assert_eq!(kernel.current_id(), ids[2]);
    tick(&kernel, &mut fault);
    assert_eq!(kernel.current_id(), ids[1], "terminated thread is skipped");
}

#[test]
fn test_freed_slot_can_be_respawned_while_running() {
    let kernel = kernel();
    let first = kernel.spawn(noop, &[]).expect("free slot");
    kernel.spawn(noop, &[]).expect("free slot");
    kernel.with_scheduler(|sched| sched.start());

    let mut frame = sentinel_frame(0x500);
    tick(&kernel, &mut frame);
    kernel.on_supervisor_call(&mut frame);
    assert_eq!(kernel.thread_state(first), Some(ThreadState::Terminated));

    let again = kernel.spawn(record, b"x").expect("reuses the slot");
    assert_eq!(again, first);
    assert_eq!(kernel.thread_state(again), Some(ThreadState::Ready));
}
