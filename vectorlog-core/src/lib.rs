//! Decoder library for vector-display beam tracer logs.
//!
//! A beam tracer records the X/Y deflection and Z intensity driving a vector
//! display, plus beam blank/unblank transitions. This crate decodes both of
//! its log formats into one [`Record`] stream, computes statistics over it,
//! and writes it back out.
//!
//! # Example
//!
//! ```no_run
//! use vectorlog_core::{decode_file, InputFormat, Statistics};
//!
//! let path = "vector_test.bin";
//! let result = decode_file(path, InputFormat::from_path(path)).unwrap();
//!
//! for warning in &result.warnings {
//!     eprintln!("warning: {}", warning);
//! }
//! println!("{}", Statistics::compute(&result.records));
//! ```
//!
//! # Formats
//!
//! - Text: `frame,x,y,z[,comment]` lines, `#` comments, optional header
//! - Binary: `VEC1` magic, version byte, then 6-byte `(x, y, z)` chunks with
//!   `(0xFFFF, 0xFFFF, z)` sentinels for BLANK/UNBLANK
//!
//! Both decoders are tolerant: malformed input is skipped and reported as
//! [`DecodeWarning`]s, never as an error.

pub mod decoder;
pub mod output;
pub mod parser;
pub mod stats;
pub mod text;
pub mod types;

// Re-export commonly used types
pub use decoder::{decode_file, BinaryDecoder, DecodeError, InputFormat};
pub use output::{encode_text, BinaryWriter, OutputError, TextWriter};
pub use stats::{Range, Statistics};
pub use text::TextDecoder;
pub use types::{
    BinaryHeader, DecodeResult, DecodeWarning, Event, EventKind, ParseEventKindError, Record,
    Sample, SkipReason,
};
