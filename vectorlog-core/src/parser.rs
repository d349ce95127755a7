//! Low-level parsing of the `VEC1` binary layout.
//!
//! This module knows the byte offsets of the header and the 6-byte record
//! chunks, and how a chunk is classified as a sample or a control sentinel.

use crate::types::{BinaryHeader, EventKind};
use byteorder::{ByteOrder, LittleEndian};

/// Magic bytes at the start of every binary log.
pub const MAGIC: [u8; 4] = *b"VEC1";

/// Magic (4 bytes) + version (1 byte).
pub const HEADER_SIZE: usize = 5;

/// Three little-endian u16 fields: x, y, z.
pub const RECORD_SIZE: usize = 6;

/// Reserved x/y value marking a control chunk.
pub const SENTINEL: u16 = 0xFFFF;

/// Sentinel `z` for a BLANK event.
pub const SENTINEL_BLANK_Z: u16 = 0x0000;

/// Sentinel `z` for an UNBLANK event.
pub const SENTINEL_UNBLANK_Z: u16 = 0xFFFF;

// ============================================================================
// Header
// offset 0..4 magic | offset 4 version
// ============================================================================

/// Parses the header from the first [`HEADER_SIZE`] bytes.
///
/// Returns `None` if `bytes` is too short. The magic is not validated here.
#[inline]
pub fn parse_header(bytes: &[u8]) -> Option<BinaryHeader> {
    if bytes.len() < HEADER_SIZE {
        return None;
    }
    let mut magic = [0u8; 4];
    magic.copy_from_slice(&bytes[..4]);
    Some(BinaryHeader {
        magic,
        version: bytes[4],
    })
}

// ============================================================================
// Record chunk
// offset 0..2 x | offset 2..4 y | offset 4..6 z   (all u16 little-endian)
// ============================================================================

/// Extracts `(x, y, z)` from a 6-byte chunk.
///
/// `chunk` must be at least [`RECORD_SIZE`] bytes long.
#[inline]
pub fn chunk_fields(chunk: &[u8]) -> (u16, u16, u16) {
    (
        LittleEndian::read_u16(&chunk[0..2]),
        LittleEndian::read_u16(&chunk[2..4]),
        LittleEndian::read_u16(&chunk[4..6]),
    )
}

/// What a chunk means once its fields are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// Ordinary coordinate triple
    Sample { x: u16, y: u16, z: u16 },
    /// Recognised control sentinel
    Control(EventKind),
    /// `x == y == 0xFFFF` with an undefined `z`
    UnknownSentinel { z: u16 },
}

/// Classifies a decoded field triple.
#[inline]
pub fn classify(x: u16, y: u16, z: u16) -> ChunkKind {
    if x == SENTINEL && y == SENTINEL {
        match z {
            SENTINEL_BLANK_Z => ChunkKind::Control(EventKind::Blank),
            SENTINEL_UNBLANK_Z => ChunkKind::Control(EventKind::Unblank),
            z => ChunkKind::UnknownSentinel { z },
        }
    } else {
        ChunkKind::Sample { x, y, z }
    }
}

/// Parses and classifies a 6-byte chunk.
#[inline]
pub fn parse_chunk(chunk: &[u8]) -> ChunkKind {
    let (x, y, z) = chunk_fields(chunk);
    classify(x, y, z)
}

/// Sentinel `z` value for an event kind.
#[inline]
pub fn sentinel_z(kind: EventKind) -> u16 {
    match kind {
        EventKind::Blank => SENTINEL_BLANK_Z,
        EventKind::Unblank => SENTINEL_UNBLANK_Z,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_parsing() {
        let header = parse_header(b"VEC1\x02rest").unwrap();
        assert_eq!(header.magic, MAGIC);
        assert_eq!(header.version, 2);

        assert!(parse_header(b"VEC1").is_none());
    }

    #[test]
    fn test_chunk_fields_little_endian() {
        // x=0x0102, y=0x0FFF, z=0x0000
        let chunk = [0x02, 0x01, 0xFF, 0x0F, 0x00, 0x00];
        assert_eq!(chunk_fields(&chunk), (0x0102, 0x0FFF, 0x0000));
    }

    #[test]
    fn test_sentinel_classification() {
        assert_eq!(
            classify(0xFFFF, 0xFFFF, 0x0000),
            ChunkKind::Control(EventKind::Blank)
        );
        assert_eq!(
            classify(0xFFFF, 0xFFFF, 0xFFFF),
            ChunkKind::Control(EventKind::Unblank)
        );
        assert_eq!(
            classify(0xFFFF, 0xFFFF, 0x0800),
            ChunkKind::UnknownSentinel { z: 0x0800 }
        );
        // Only one coordinate saturated: still a sample
        assert_eq!(
            classify(0xFFFF, 0x0010, 0x0000),
            ChunkKind::Sample {
                x: 0xFFFF,
                y: 0x0010,
                z: 0
            }
        );
    }

    #[test]
    fn test_sentinel_z_matches_classification() {
        for kind in [EventKind::Blank, EventKind::Unblank] {
            assert_eq!(
                classify(SENTINEL, SENTINEL, sentinel_z(kind)),
                ChunkKind::Control(kind)
            );
        }
    }
}
