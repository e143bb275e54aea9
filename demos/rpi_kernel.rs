//! Demo kernel for the Raspberry Pi 2/3.
//!
//! Two printer threads write their letter to the console a few times and
//! exit. A console thread reads keys and reacts:
//!
//! - `a`: data abort (unaligned `stm`)
//! - `p`: prefetch abort (`bkpt`)
//! - `u`: undefined instruction
//! - `s`: supervisor call, i.e. a plain thread exit
//! - `d`: toggle IRQ tracing
//! - anything else: printed back [`PRINT_COUNT`] times
//!
//! The fault keys end the console thread; the other threads keep running.
//!
//! # Building
//!
//! ```bash
//! RUSTFLAGS="-C link-arg=-Tdemos/kernel.ld" \
//!     cargo build --release --target armv7a-none-eabi --features rpi-demo --example rpi_kernel
//! ```
//!
//! # Deploying
//!
//! 1. Convert ELF to binary:
//!    ```bash
//!    rust-objcopy -O binary target/armv7a-none-eabi/release/examples/rpi_kernel kernel7.img
//!    ```
//!
//! 2. Copy kernel7.img to SD card boot partition
//!
//! 3. Boot the Raspberry Pi; the console is on GPIO14/15 at 115200 8N1

#![no_std]
#![no_main]

use bcm_rr_kernel::config::{BUSY_WAIT_COUNTER, PRINT_COUNT};
use bcm_rr_kernel::{console, kprint, kprintln, DefaultBoard, DefaultKernel, ThreadArg};
use core::arch::asm;

/// The kernel instance (static for exception handler access).
static KERNEL: DefaultKernel = DefaultKernel::new(DefaultBoard::new());

fn busy_wait() {
    for _ in 0..BUSY_WAIT_COUNTER {
        core::hint::spin_loop();
    }
}

/// Print the first byte of the argument a few times.
fn printer(arg: ThreadArg) {
    let letter = arg.as_bytes().first().copied().unwrap_or(b'?');
    for _ in 0..PRINT_COUNT {
        busy_wait();
        kprint!("{}", letter as char);
    }
}

fn data_abort() {
    // Multi-register stores fault on unaligned addresses whatever SCTLR.A says.
    unsafe { asm!("stm {addr}, {{r0}}", addr = in(reg) 0x1usize) }
}

fn prefetch_abort() {
    unsafe { asm!("bkpt #0") }
}

fn undefined_instruction() {
    unsafe { asm!("udf #0") }
}

fn console(_: ThreadArg) {
    loop {
        let key = console::getc();
        match key {
            b'a' => data_abort(),
            b'p' => prefetch_abort(),
            b'u' => undefined_instruction(),
            b's' => bcm_rr_kernel::exit_thread(),
            b'd' => {
                let enabled = KERNEL.toggle_irq_debug();
                kprintln!("irq debug {}", if enabled { "on" } else { "off" });
            }
            other => {
                for _ in 0..PRINT_COUNT {
                    kprint!("{}", other as char);
                    busy_wait();
                }
            }
        }
    }
}

/// Kernel entry point - called from boot code after hardware init.
#[no_mangle]
pub fn kernel_main() -> ! {
    if bcm_rr_kernel::logger::init().is_err() {
        kprintln!("logger already installed");
    }
    kprintln!("=== bcm-rr-kernel ===");

    if let Err(err) = KERNEL.init() {
        kprintln!("init failed: {}", err);
    }

    let threads: [(fn(ThreadArg), &[u8]); 3] = [(printer, b"A"), (printer, b"B"), (console, b"")];
    for (entry, arg) in threads {
        if let Err(err) = KERNEL.spawn(entry, arg) {
            kprintln!("{}", err);
        }
    }

    // Register kernel globally for exception handlers
    unsafe {
        KERNEL.register_global();
    }

    KERNEL.start()
}

// Panic handler is provided by the library
