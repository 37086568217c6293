//! NMEA-style sentence machinery for the Nortek PNOR family: checksums,
//! frame extraction from a byte stream, binary-input detection, and the
//! per-sentence field parsers.
//!
//! Everything in this crate is pure: no I/O, no clocks, no globals. The
//! recorder crate owns the serial port, the queue and the persistence side.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod assembler;
pub mod checksum;
pub mod classify;
pub mod frame;
pub mod parser;
pub mod record;

/// Maximum length of a frame in bytes, inclusive of `$`, `*` and the two
/// checksum digits. Residue that grows past this without completing a frame
/// is discarded.
pub const MAX_FRAME_LEN: usize = 2048;
