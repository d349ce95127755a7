//! Stateful `VEC1` binary decoder and file-level format dispatch.
//!
//! The binary decoder tracks the header, the positional frame counter, and
//! any bytes of a header or chunk that straddle two input buffers.

use crate::parser::{self, ChunkKind, HEADER_SIZE, MAGIC, RECORD_SIZE};
use crate::text::TextDecoder;
use crate::types::{BinaryHeader, DecodeResult, DecodeWarning, Event, Record, Sample};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while decoding a vector log.
///
/// Only I/O can fail; malformed content degrades to [`DecodeWarning`]s.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Buffer size for reading binary files (bytes).
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Wire format of an input log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    /// `frame,x,y,z[,comment]` lines
    #[default]
    Text,
    /// `VEC1` header followed by 6-byte chunks
    Binary,
}

impl InputFormat {
    /// Picks a format from the file extension.
    ///
    /// `.bin` is binary, `.csv` and `.txt` are text. Anything else falls
    /// back to text with a warning.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("bin") => Self::Binary,
            Some("csv") | Some("txt") => Self::Text,
            other => {
                log::warn!(
                    "Unknown file type {:?}, trying text format",
                    other.unwrap_or("")
                );
                Self::Text
            }
        }
    }
}

/// Decodes a file in the given format.
pub fn decode_file<P: AsRef<Path>>(
    path: P,
    format: InputFormat,
) -> Result<DecodeResult, DecodeError> {
    match format {
        InputFormat::Text => TextDecoder::new().decode_file(path),
        InputFormat::Binary => BinaryDecoder::new().decode_file(path),
    }
}

/// Stateful `VEC1` binary decoder.
///
/// Feed it any number of consecutive buffers with [`decode_buffer`], then
/// call [`finish`] once the stream ends.
///
/// [`decode_buffer`]: BinaryDecoder::decode_buffer
/// [`finish`]: BinaryDecoder::finish
#[derive(Debug, Default)]
pub struct BinaryDecoder {
    header: Option<BinaryHeader>,
    // Next chunk index
    frame: u64,
    // Bytes of an unfinished header or chunk
    pending: Vec<u8>,
}

impl BinaryDecoder {
    /// Creates a new decoder with default state.
    pub fn new() -> Self {
        Self {
            header: None,
            frame: 0,
            pending: Vec::with_capacity(RECORD_SIZE),
        }
    }

    /// Resets the decoder state.
    pub fn reset(&mut self) {
        self.header = None;
        self.frame = 0;
        self.pending.clear();
    }

    /// Header parsed so far, if any.
    pub fn header(&self) -> Option<&BinaryHeader> {
        self.header.as_ref()
    }

    /// Decodes a slice of the byte stream.
    ///
    /// Records are appended to `records` and anomalies to `warnings`. A
    /// trailing partial chunk is held back until the next call.
    pub fn decode_buffer(
        &mut self,
        mut bytes: &[u8],
        records: &mut Vec<Record>,
        warnings: &mut Vec<DecodeWarning>,
    ) {
        if self.header.is_none() {
            let take = (HEADER_SIZE - self.pending.len()).min(bytes.len());
            self.pending.extend_from_slice(&bytes[..take]);
            bytes = &bytes[take..];

            match parser::parse_header(&self.pending) {
                Some(header) => {
                    self.accept_header(header, warnings);
                    self.pending.clear();
                }
                None => return,
            }
        }

        // Complete a chunk left over from the previous buffer
        if !self.pending.is_empty() {
            let take = (RECORD_SIZE - self.pending.len()).min(bytes.len());
            self.pending.extend_from_slice(&bytes[..take]);
            bytes = &bytes[take..];

            if self.pending.len() < RECORD_SIZE {
                return;
            }

            let mut chunk = [0u8; RECORD_SIZE];
            chunk.copy_from_slice(&self.pending);
            self.pending.clear();
            self.process_chunk(&chunk, records, warnings);
        }

        let mut chunks = bytes.chunks_exact(RECORD_SIZE);
        for chunk in &mut chunks {
            self.process_chunk(chunk, records, warnings);
        }
        self.pending.extend_from_slice(chunks.remainder());
    }

    /// Ends the stream, reporting a missing header or discarded bytes.
    pub fn finish(&mut self, warnings: &mut Vec<DecodeWarning>) {
        if self.header.is_none() {
            // A short buffer may still hold the complete magic
            if let Some(magic) = self.pending.get(..MAGIC.len()) {
                let mut found = [0u8; 4];
                found.copy_from_slice(magic);
                check_magic(found, warnings);
            }
            log::warn!(
                "Binary header truncated: {} of {} bytes",
                self.pending.len(),
                HEADER_SIZE
            );
            warnings.push(DecodeWarning::TruncatedHeader {
                available: self.pending.len(),
            });
        } else if !self.pending.is_empty() {
            log::debug!("Discarding {} trailing bytes", self.pending.len());
            warnings.push(DecodeWarning::TrailingBytes {
                count: self.pending.len(),
            });
        }
        self.pending.clear();
    }

    /// Decodes a complete in-memory binary log.
    pub fn decode_bytes(&mut self, bytes: &[u8]) -> DecodeResult {
        self.reset();

        let mut records = Vec::with_capacity(bytes.len() / RECORD_SIZE);
        let mut warnings = Vec::new();
        self.decode_buffer(bytes, &mut records, &mut warnings);
        self.finish(&mut warnings);

        DecodeResult {
            records,
            warnings,
            header: self.header,
        }
    }

    /// Decodes a binary log file from disk.
    pub fn decode_file<P: AsRef<Path>>(&mut self, path: P) -> Result<DecodeResult, DecodeError> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        self.reset();

        let mut records = Vec::new();
        let mut warnings = Vec::new();
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];

        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            self.decode_buffer(&buffer[..bytes_read], &mut records, &mut warnings);
        }
        self.finish(&mut warnings);

        Ok(DecodeResult {
            records,
            warnings,
            header: self.header,
        })
    }

    fn accept_header(&mut self, header: BinaryHeader, warnings: &mut Vec<DecodeWarning>) {
        check_magic(header.magic, warnings);
        log::debug!("Binary format version: {}", header.version);
        self.header = Some(header);
    }

    #[inline]
    fn process_chunk(
        &mut self,
        chunk: &[u8],
        records: &mut Vec<Record>,
        warnings: &mut Vec<DecodeWarning>,
    ) {
        let frame = self.frame;
        self.frame += 1;

        match parser::parse_chunk(chunk) {
            ChunkKind::Sample { x, y, z } => {
                records.push(Sample::new(frame, x.into(), y.into(), z.into()).into());
            }
            ChunkKind::Control(kind) => {
                records.push(Event::new(frame, kind).into());
            }
            ChunkKind::UnknownSentinel { z } => {
                log::debug!("Frame {}: skipping sentinel with z=0x{:04X}", frame, z);
                warnings.push(DecodeWarning::UnknownSentinel { frame, z });
            }
        }
    }
}

fn check_magic(found: [u8; 4], warnings: &mut Vec<DecodeWarning>) {
    if found != MAGIC {
        log::warn!("Invalid magic number: {:?}", found);
        warnings.push(DecodeWarning::BadMagic { found });
    }
}
