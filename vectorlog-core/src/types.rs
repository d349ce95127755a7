//! Core types for decoded vector log data.
//!
//! Every decoder produces a sequence of [`Record`]s, and every consumer
//! (statistics, writers, renderers) reads them without caring which wire
//! format they came from.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A single beam position sample.
///
/// Coordinates are optional because the text format allows empty fields.
/// Binary samples always carry all three.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sample {
    /// Frame counter (text: device-reported, binary: chunk index)
    pub frame: u64,
    /// Horizontal deflection
    pub x: Option<u64>,
    /// Vertical deflection
    pub y: Option<u64>,
    /// Beam intensity, 0 = fully off
    pub z: Option<u64>,
    /// Free-text comment (text format only)
    pub comment: Option<String>,
}

impl Sample {
    /// Creates a sample with all three coordinates present and no comment.
    #[inline]
    pub fn new(frame: u64, x: u64, y: u64, z: u64) -> Self {
        Self {
            frame,
            x: Some(x),
            y: Some(y),
            z: Some(z),
            comment: None,
        }
    }

    /// Attaches a comment to this sample.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Beam-enable transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Beam switched off
    Blank,
    /// Beam switched on
    Unblank,
}

impl EventKind {
    /// Canonical upper-case name, as written in text logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blank => "BLANK",
            Self::Unblank => "UNBLANK",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not an event name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown event kind: {0:?}. Use BLANK or UNBLANK")]
pub struct ParseEventKindError(pub String);

impl FromStr for EventKind {
    type Err = ParseEventKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "BLANK" => Ok(Self::Blank),
            "UNBLANK" => Ok(Self::Unblank),
            other => Err(ParseEventKindError(other.to_string())),
        }
    }
}

/// A control event decoded from a binary sentinel chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Frame counter of the sentinel chunk
    pub frame: u64,
    /// Transition kind
    pub kind: EventKind,
}

impl Event {
    /// Creates a new event.
    #[inline]
    pub fn new(frame: u64, kind: EventKind) -> Self {
        Self { frame, kind }
    }
}

/// One decoded log entry: either a coordinate sample or a control event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Sample(Sample),
    Event(Event),
}

impl Record {
    /// Frame counter of either variant.
    #[inline]
    pub fn frame(&self) -> u64 {
        match self {
            Self::Sample(sample) => sample.frame,
            Self::Event(event) => event.frame,
        }
    }

    pub fn as_sample(&self) -> Option<&Sample> {
        match self {
            Self::Sample(sample) => Some(sample),
            Self::Event(_) => None,
        }
    }

    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Self::Sample(_) => None,
            Self::Event(event) => Some(event),
        }
    }
}

impl From<Sample> for Record {
    fn from(sample: Sample) -> Self {
        Self::Sample(sample)
    }
}

impl From<Event> for Record {
    fn from(event: Event) -> Self {
        Self::Event(event)
    }
}

/// Header of a binary log: magic bytes as read and the version byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl BinaryHeader {
    /// Returns true if the magic bytes read `VEC1`.
    #[inline]
    pub fn has_valid_magic(&self) -> bool {
        self.magic == crate::parser::MAGIC
    }
}

/// Why a text line was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than the four required fields
    TooFewFields { found: usize },
    /// Frame field is not an unsigned integer
    InvalidFrame,
    /// A non-empty coordinate field is not an unsigned integer
    InvalidField { field: &'static str },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewFields { found } => {
                write!(f, "expected at least 4 fields, found {}", found)
            }
            Self::InvalidFrame => f.write_str("frame is not an unsigned integer"),
            Self::InvalidField { field } => write!(f, "{} is not an unsigned integer", field),
        }
    }
}

/// A non-fatal anomaly found while decoding.
///
/// Warnings describe input the tolerant decoders discarded or did not
/// expect; they never change which records are produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    /// Binary magic did not read `VEC1`
    BadMagic { found: [u8; 4] },
    /// Buffer ended before the 5-byte binary header was complete
    TruncatedHeader { available: usize },
    /// Sentinel chunk with a `z` that is neither BLANK nor UNBLANK
    UnknownSentinel { frame: u64, z: u16 },
    /// Incomplete trailing binary chunk
    TrailingBytes { count: usize },
    /// Malformed text line (1-based line number)
    SkippedLine { line: usize, reason: SkipReason },
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMagic { found } => write!(f, "invalid magic number: {:?}", found),
            Self::TruncatedHeader { available } => {
                write!(f, "binary header truncated ({} of 5 bytes)", available)
            }
            Self::UnknownSentinel { frame, z } => {
                write!(f, "frame {}: unknown sentinel z=0x{:04X}", frame, z)
            }
            Self::TrailingBytes { count } => {
                write!(f, "discarded {} trailing bytes", count)
            }
            Self::SkippedLine { line, reason } => write!(f, "line {}: {}", line, reason),
        }
    }
}

/// Result of decoding a vector log.
#[derive(Debug, Default)]
pub struct DecodeResult {
    /// Decoded records in input order
    pub records: Vec<Record>,
    /// Non-fatal anomalies
    pub warnings: Vec<DecodeWarning>,
    /// Binary header, if the input was binary and long enough
    pub header: Option<BinaryHeader>,
}
