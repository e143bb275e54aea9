//! PL011 UART driver for the Raspberry Pi 2/3.
//!
//! Transmit is polled. Receive is interrupt driven: the IRQ path drains the
//! RX FIFO into [`console::RX_RING`](crate::console::RX_RING).
//!
//! # Memory Map
//!
//! - PL011 UART base: `PERIPHERAL_BASE + 0x20_1000`
//! - GPIO base: `PERIPHERAL_BASE + 0x20_0000`

use crate::config::PERIPHERAL_BASE;
use crate::console::RX_RING;
use core::fmt::{self, Write};
use core::ptr::{read_volatile, write_volatile};

// PL011 UART registers
const UART0_BASE: usize = PERIPHERAL_BASE + 0x20_1000;
const UART0_DR: usize = UART0_BASE + 0x00;     // Data Register
const UART0_FR: usize = UART0_BASE + 0x18;     // Flag Register
const UART0_IBRD: usize = UART0_BASE + 0x24;   // Integer Baud Rate Divisor
const UART0_FBRD: usize = UART0_BASE + 0x28;   // Fractional Baud Rate Divisor
const UART0_LCRH: usize = UART0_BASE + 0x2C;   // Line Control Register
const UART0_CR: usize = UART0_BASE + 0x30;     // Control Register
const UART0_IMSC: usize = UART0_BASE + 0x38;   // Interrupt Mask Set/Clear
const UART0_ICR: usize = UART0_BASE + 0x44;    // Interrupt Clear Register

// GPIO registers for pin configuration
const GPIO_BASE: usize = PERIPHERAL_BASE + 0x20_0000;
const GPFSEL1: usize = GPIO_BASE + 0x04;       // GPIO Function Select 1 (pins 10-19)
const GPPUD: usize = GPIO_BASE + 0x94;         // GPIO Pull-up/down Enable
const GPPUDCLK0: usize = GPIO_BASE + 0x98;     // GPIO Pull-up/down Clock 0

// Flag register bits
const FR_TXFF: u32 = 1 << 5;  // Transmit FIFO full
const FR_RXFE: u32 = 1 << 4;  // Receive FIFO empty

// Interrupt bits (IMSC/ICR)
const INT_RX: u32 = 1 << 4;
const INT_RX_TIMEOUT: u32 = 1 << 6;
const INT_ALL: u32 = 0x7FF;

/// Initialize the PL011 UART for 115200 8N1 with the RX interrupt unmasked.
///
/// # Safety
///
/// Must be called once during system initialization.
/// Modifies GPIO and UART hardware registers.
pub unsafe fn init() {
    unsafe {
        write_volatile(UART0_CR as *mut u32, 0);

        // GPIO14/15 to ALT0 (TXD0/RXD0)
        let mut gpfsel1 = read_volatile(GPFSEL1 as *const u32);
        gpfsel1 &= !((7 << 12) | (7 << 15));
        gpfsel1 |= (4 << 12) | (4 << 15);
        write_volatile(GPFSEL1 as *mut u32, gpfsel1);

        // No pull-up/down on 14 and 15
        write_volatile(GPPUD as *mut u32, 0);
        delay_cycles(150);
        write_volatile(GPPUDCLK0 as *mut u32, (1 << 14) | (1 << 15));
        delay_cycles(150);
        write_volatile(GPPUDCLK0 as *mut u32, 0);

        write_volatile(UART0_ICR as *mut u32, INT_ALL);

        // 48 MHz UART clock: 48_000_000 / (16 * 115_200) = 26.0417
        write_volatile(UART0_IBRD as *mut u32, 26);
        write_volatile(UART0_FBRD as *mut u32, 3);

        // WLEN=8, FEN=1
        write_volatile(UART0_LCRH as *mut u32, (1 << 4) | (1 << 5) | (1 << 6));

        write_volatile(UART0_IMSC as *mut u32, INT_RX | INT_RX_TIMEOUT);

        // UARTEN, TXE, RXE
        write_volatile(UART0_CR as *mut u32, (1 << 0) | (1 << 8) | (1 << 9));
    }
}

/// Spin-wait for approximately `count` CPU cycles.
#[inline]
fn delay_cycles(count: u32) {
    for _ in 0..count {
        core::hint::spin_loop();
    }
}

#[inline]
fn can_transmit() -> bool {
    unsafe { (read_volatile(UART0_FR as *const u32) & FR_TXFF) == 0 }
}

#[inline]
fn rx_fifo_empty() -> bool {
    unsafe { (read_volatile(UART0_FR as *const u32) & FR_RXFE) != 0 }
}

/// Send a single byte over UART.
pub fn send_byte(byte: u8) {
    while !can_transmit() {
        core::hint::spin_loop();
    }
    unsafe {
        write_volatile(UART0_DR as *mut u32, byte as u32);
    }
}

/// Send a string over UART.
pub fn send_str(s: &str) {
    for byte in s.bytes() {
        if byte == b'\n' {
            send_byte(b'\r');
        }
        send_byte(byte);
    }
}

/// Move every byte waiting in the RX FIFO into the console ring and clear
/// the UART interrupt. Bytes that do not fit are dropped.
pub fn drain_rx_fifo() {
    let mut dropped = 0usize;
    while !rx_fifo_empty() {
        let byte = unsafe { read_volatile(UART0_DR as *const u32) } as u8;
        if !RX_RING.push(byte) {
            dropped += 1;
        }
    }
    unsafe {
        write_volatile(UART0_ICR as *mut u32, INT_ALL);
    }

    if dropped > 0 {
        log::trace!("uart: rx ring full, dropped {} bytes", dropped);
    }
}

/// UART writer for use with `write!`.
pub struct UartWriter;

impl Write for UartWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        send_str(s);
        Ok(())
    }
}
