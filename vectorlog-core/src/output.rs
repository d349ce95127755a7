//! Output format writers for decoded vector logs.
//!
//! The text writer produces the same delimited shape the text decoder reads.
//! The binary writer produces the device's `VEC1` log.

use crate::parser::{self, MAGIC, SENTINEL};
use crate::types::{Event, Record, Sample};
use byteorder::{LittleEndian, WriteBytesExt};
use std::borrow::Borrow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output writing.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame {frame}: {field}={value} does not fit in 16 bits")]
    ValueOutOfRange {
        frame: u64,
        field: &'static str,
        value: u64,
    },

    #[error("frame {frame}: sample at (0xFFFF, 0xFFFF) collides with the control sentinel")]
    SentinelCollision { frame: u64 },
}

/// Header line written before text records.
pub const TEXT_HEADER: &str = "frame,x,y,z,comment";

/// Version byte written by the device in binary log mode.
pub const DEFAULT_BINARY_VERSION: u8 = 2;

/// Text (CSV) writer for records.
pub struct TextWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> TextWriter<W> {
    /// Creates a new text writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Writes the `frame,x,y,z,comment` header line.
    pub fn write_header(&mut self) -> Result<(), OutputError> {
        writeln!(self.writer, "{}", TEXT_HEADER)?;
        Ok(())
    }

    /// Writes a batch of records.
    pub fn write_records<I>(&mut self, records: I) -> Result<(), OutputError>
    where
        I: IntoIterator,
        I::Item: Borrow<Record>,
    {
        for record in records {
            self.write_record(record.borrow())?;
        }
        Ok(())
    }

    /// Writes a single record.
    ///
    /// Events become `frame,,,KIND`; note that this line does not decode
    /// back as a record since its fourth field is not an integer.
    #[inline]
    pub fn write_record(&mut self, record: &Record) -> Result<(), OutputError> {
        match record {
            Record::Event(event) => {
                writeln!(self.writer, "{},,,{}", event.frame, event.kind)?;
            }
            Record::Sample(sample) => {
                writeln!(
                    self.writer,
                    "{},{},{},{},{}",
                    sample.frame,
                    OptField(sample.x),
                    OptField(sample.y),
                    OptField(sample.z),
                    sample.comment.as_deref().unwrap_or("")
                )?;
            }
        }
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

// Formats an absent value as an empty field
struct OptField(Option<u64>);

impl std::fmt::Display for OptField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{}", value),
            None => Ok(()),
        }
    }
}

/// Binary `VEC1` writer.
///
/// Each record is written as three little-endian u16 fields:
/// - x: u16 (2 bytes)
/// - y: u16 (2 bytes)
/// - z: u16 (2 bytes)
///
/// Events are written as sentinel chunks `(0xFFFF, 0xFFFF, z)`. Frame
/// numbers are not stored; they are implied by chunk position.
pub struct BinaryWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> BinaryWriter<W> {
    /// Creates a new binary writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Writes the magic number and version byte.
    pub fn write_header(&mut self, version: u8) -> Result<(), OutputError> {
        self.writer.write_all(&MAGIC)?;
        self.writer.write_u8(version)?;
        Ok(())
    }

    /// Writes a batch of records, returning the number of chunks written.
    ///
    /// Samples missing any of x/y/z cannot be represented and are skipped.
    pub fn write_records<I>(&mut self, records: I) -> Result<usize, OutputError>
    where
        I: IntoIterator,
        I::Item: Borrow<Record>,
    {
        let mut written = 0;
        for record in records {
            if self.write_record(record.borrow())? {
                written += 1;
            }
        }
        Ok(written)
    }

    /// Writes a single record. Returns `false` if the record was skipped.
    pub fn write_record(&mut self, record: &Record) -> Result<bool, OutputError> {
        match record {
            Record::Event(event) => {
                self.write_event(event)?;
                Ok(true)
            }
            Record::Sample(sample) => self.write_sample(sample),
        }
    }

    fn write_event(&mut self, event: &Event) -> Result<(), OutputError> {
        self.write_chunk(SENTINEL, SENTINEL, parser::sentinel_z(event.kind))
    }

    fn write_sample(&mut self, sample: &Sample) -> Result<bool, OutputError> {
        let (Some(x), Some(y), Some(z)) = (sample.x, sample.y, sample.z) else {
            return Ok(false);
        };

        let narrow = |field: &'static str, value: u64| {
            u16::try_from(value).map_err(|_| OutputError::ValueOutOfRange {
                frame: sample.frame,
                field,
                value,
            })
        };
        let (x, y, z) = (narrow("x", x)?, narrow("y", y)?, narrow("z", z)?);

        if x == SENTINEL && y == SENTINEL {
            return Err(OutputError::SentinelCollision {
                frame: sample.frame,
            });
        }

        self.write_chunk(x, y, z)?;
        Ok(true)
    }

    #[inline]
    fn write_chunk(&mut self, x: u16, y: u16, z: u16) -> Result<(), OutputError> {
        self.writer.write_u16::<LittleEndian>(x)?;
        self.writer.write_u16::<LittleEndian>(y)?;
        self.writer.write_u16::<LittleEndian>(z)?;
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Encodes records as text, header line included.
pub fn encode_text<I>(records: I) -> Result<String, OutputError>
where
    I: IntoIterator,
    I::Item: Borrow<Record>,
{
    let mut output = Vec::new();
    {
        let mut writer = TextWriter::new(&mut output);
        writer.write_header()?;
        writer.write_records(records)?;
        writer.flush()?;
    }
    Ok(String::from_utf8_lossy(&output).into_owned())
}

/// Writes records to a text file.
pub fn write_text<P, I>(path: P, records: I) -> Result<(), OutputError>
where
    P: AsRef<Path>,
    I: IntoIterator,
    I::Item: Borrow<Record>,
{
    let file = File::create(path)?;
    let mut writer = TextWriter::new(file);
    writer.write_header()?;
    writer.write_records(records)?;
    writer.flush()?;
    Ok(())
}

/// Writes records to a binary file, returning the number of chunks written.
pub fn write_binary<P, I>(path: P, records: I, version: u8) -> Result<usize, OutputError>
where
    P: AsRef<Path>,
    I: IntoIterator,
    I::Item: Borrow<Record>,
{
    let file = File::create(path)?;
    let mut writer = BinaryWriter::new(file);
    writer.write_header(version)?;
    let written = writer.write_records(records)?;
    writer.flush()?;
    Ok(written)
}
