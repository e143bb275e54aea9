//! Kernel console.
//!
//! Formatted output for diagnostics and the logger. On the target it goes to
//! the PL011 UART; host unit tests print to stdout; any other build drops it.
//! Writing never blocks on anything but the UART FIFO and never fails.
//!
//! Input arrives through [`RX_RING`], which the UART interrupt fills.

use crate::config::UART_INPUT_BUFFER_SIZE;
use crate::mem::RxRing;
use core::fmt;

/// Print a formatted string to the console.
#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => {
        $crate::console::_print(format_args!($($arg)*))
    };
}

/// Print a formatted string to the console with a newline.
#[macro_export]
macro_rules! kprintln {
    () => {
        $crate::kprint!("\n")
    };
    ($($arg:tt)*) => {{
        $crate::kprint!($($arg)*);
        $crate::kprint!("\n");
    }};
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments<'_>) {
    #[cfg(target_arch = "arm")]
    {
        use core::fmt::Write;
        let _ = crate::arch::uart_pl011::UartWriter.write_fmt(args);
    }

    #[cfg(all(test, not(target_arch = "arm")))]
    std::print!("{}", args);

    #[cfg(all(not(test), not(target_arch = "arm")))]
    let _ = args;
}

/// Send one raw byte.
pub fn putc(byte: u8) {
    #[cfg(target_arch = "arm")]
    crate::arch::uart_pl011::send_byte(byte);

    #[cfg(not(target_arch = "arm"))]
    let _ = byte;
}

/// Bytes received on the console, filled by the UART interrupt.
pub static RX_RING: RxRing<UART_INPUT_BUFFER_SIZE> = RxRing::new();

/// Take one received byte without waiting.
pub fn try_getc() -> Option<u8> {
    RX_RING.pop()
}

/// Wait until a byte has been received and return it.
///
/// Only callable from threads: the ring is filled by the UART IRQ, which
/// must be able to preempt the caller.
pub fn getc() -> u8 {
    loop {
        if let Some(byte) = RX_RING.pop() {
            return byte;
        }
        core::hint::spin_loop();
    }
}
