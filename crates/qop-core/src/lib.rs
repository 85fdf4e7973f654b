//! # Qop Core Library
//!
//! `qop-core` provides the core functionality for qop, an air-gapped
//! file-transfer tool that carries text files across a physical gap as a
//! stream of QR codes shown on one screen and scanned on another device.
//!
//! ## How a transfer works
//!
//! - The sender walks a directory, splits each file into fixed-size groups
//!   of lines, and emits one self-describing payload per group.
//! - Each payload is rendered as a QR code and held on screen for a dwell
//!   interval. There is no acknowledgment channel: the broadcast is
//!   fire-and-forget and relies on redundancy from repeated captures.
//! - The receiver feeds every decoded payload string into a reassembler
//!   that de-duplicates repeats, accumulates content per target file, and
//!   flushes to disk on file boundaries, idle timeouts, and session end.
//!
//! ## Modules
//!
//! - [`payload`] - The wire grammar carried inside each QR code
//! - [`sender`] - Payload sequencing and broadcast pacing
//! - [`receiver`] - Reassembly state machine and flush logic
//! - [`mod@file`] - Directory walking and path handling
//! - [`diff`] - Byte-exact directory comparison for post-transfer checks
//! - [`qr`] - QR rendering (terminal and PNG)
//! - [`config`] - Configuration management
//!
//! ## Example
//!
//! ```rust,ignore
//! use qop_core::sender::{Sequencer, SequencerConfig};
//! use qop_core::receiver::{Reassembler, ReassemblerConfig};
//!
//! let sequencer = Sequencer::new("./src", SequencerConfig::default())?;
//! for payload in sequencer.payloads()? {
//!     show_qr(&payload.encode());
//! }
//!
//! // On the receiving device, for every decoded string:
//! let mut rx = Reassembler::new("./out", ReassemblerConfig::default());
//! rx.accept(&scanned)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod diff;
pub mod error;
pub mod file;
pub mod payload;
pub mod qr;
pub mod receiver;
pub mod sender;

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of source lines carried by one QR code
pub const DEFAULT_LINES_PER_CODE: usize = 10;

/// Default dwell time for each displayed QR code, in milliseconds
pub const DEFAULT_DWELL_MS: u64 = 1500;

/// Default receiver idle timeout before the current file is flushed, in seconds
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 5;

/// Default receiver polling cadence, in milliseconds
pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 500;

/// Buffer size for byte-exact file comparison
pub const DIFF_BUFFER_SIZE: usize = 8192;
