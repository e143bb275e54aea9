//! Static memory for threads and drivers.
//!
//! Nothing here allocates: thread stacks live inline in the thread table and
//! the UART receive ring is a fixed-size static.

pub mod ring;
pub mod stack;

pub use ring::RxRing;
pub use stack::{ThreadStack, MAX_ARGUMENT_SIZE};
