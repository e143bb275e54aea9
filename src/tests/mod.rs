//! Kernel-level tests that drive the exception handlers the way the vector
//! stubs do, against the mock CPU and board.

mod scenarios;
