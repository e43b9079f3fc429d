// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pixveil

//! Self-describing header format.
//!
//! The header is a small fixed-layout record embedded under its own
//! pattern, ahead of the payload, so a receiver can discover the frame
//! body length and (optionally) the full data pattern without out-of-band
//! knowledge:
//!
//! ```text
//! [4 bytes ] magic "STEG"
//! [1 byte  ] version (currently 1)
//! [1 byte  ] flags
//! [4 bytes ] frame body length, LE (zero unless flag bit 0)
//! [2 bytes ] descriptor length, LE (16 or 0)
//! [L bytes ] canonical pattern descriptor (present iff flag bit 1)
//! [2 bytes ] CRC-16/CCITT over everything above, LE
//! ```
//!
//! The CRC (poly 0x1021, init 0xFFFF) is verified before any field is
//! trusted. Parsing is strict: wrong magic, version, descriptor length or
//! checksum all land on [`StegoError::HeaderCorrupt`] and the caller moves
//! on to the next probe position.

use crc::{Crc, CRC_16_IBM_3740};

use crate::stego::error::{Result, StegoError};
use crate::stego::pattern::{
    AdvancedRedundancy, Compression, HashCheck, Pattern, ResolvedPattern, DESCRIPTOR_LEN,
};

/// Header magic, ASCII "STEG".
pub const MAGIC: [u8; 4] = *b"STEG";

/// Current header format version.
pub const VERSION: u8 = 1;

/// Fixed bytes before the (optional) descriptor.
pub const PRELUDE_LEN: usize = 12;

/// Trailing checksum width.
pub const CRC_LEN: usize = 2;

const FLAG_DATA_SIZE: u8 = 0x01;
const FLAG_PATTERN: u8 = 0x02;
const FLAG_HASH: u8 = 0x04;
const FLAG_COMPRESSION: u8 = 0x08;
const FLAG_RS: u8 = 0x10;

const HEADER_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Total header length in bytes, with or without the embedded descriptor.
pub fn header_len(with_pattern: bool) -> usize {
    PRELUDE_LEN + if with_pattern { DESCRIPTOR_LEN } else { 0 } + CRC_LEN
}

/// Fields recovered from a parsed header.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderInfo {
    /// Frame body length, when the encoder recorded it.
    pub body_len: Option<usize>,
    /// Data pattern reconstructed from the descriptor, when embedded.
    pub pattern: Option<Pattern>,
}

/// Serialize the header for a data pattern and body length.
///
/// Which fields are recorded follows the resolved header's
/// `write_data_size` / `write_pattern` switches; the informational flag
/// bits mirror the data pattern's framing so a receiver can sanity-check
/// its own configuration.
pub fn build(pattern: &ResolvedPattern, body_len: usize) -> Result<Vec<u8>> {
    let header = pattern
        .header
        .as_ref()
        .ok_or_else(|| StegoError::InvalidPattern("header is not enabled".into()))?;

    if header.write_data_size && body_len > u32::MAX as usize {
        return Err(StegoError::CapacityExceeded {
            required: body_len,
            available: u32::MAX as usize,
        });
    }

    let mut flags = 0u8;
    if header.write_data_size {
        flags |= FLAG_DATA_SIZE;
    }
    if header.write_pattern {
        flags |= FLAG_PATTERN;
    }
    if pattern.hash_check != HashCheck::None {
        flags |= FLAG_HASH;
    }
    if pattern.compression != Compression::None {
        flags |= FLAG_COMPRESSION;
    }
    if pattern.advanced_redundancy != AdvancedRedundancy::None {
        flags |= FLAG_RS;
    }

    let descriptor_len = if header.write_pattern { DESCRIPTOR_LEN } else { 0 };
    let mut out = Vec::with_capacity(PRELUDE_LEN + descriptor_len + CRC_LEN);
    out.extend_from_slice(&MAGIC);
    out.push(VERSION);
    out.push(flags);
    let recorded = if header.write_data_size { body_len as u32 } else { 0 };
    out.extend_from_slice(&recorded.to_le_bytes());
    out.extend_from_slice(&(descriptor_len as u16).to_le_bytes());
    if header.write_pattern {
        out.extend_from_slice(&pattern.descriptor());
    }
    let crc = HEADER_CRC.checksum(&out);
    out.extend_from_slice(&crc.to_le_bytes());
    Ok(out)
}

/// Inspect a candidate prelude. Returns the flags and descriptor length,
/// or `None` if the bytes cannot be the start of a header (the caller
/// treats that position as header-free, not as corruption).
pub fn inspect_prelude(prelude: &[u8]) -> Option<(u8, usize)> {
    if prelude.len() < PRELUDE_LEN || prelude[..4] != MAGIC || prelude[4] != VERSION {
        return None;
    }
    let flags = prelude[5];
    let descriptor_len = u16::from_le_bytes([prelude[10], prelude[11]]) as usize;
    let expected = if flags & FLAG_PATTERN != 0 { DESCRIPTOR_LEN } else { 0 };
    (descriptor_len == expected).then_some((flags, descriptor_len))
}

/// Parse and verify a complete header.
///
/// # Errors
/// [`StegoError::HeaderCorrupt`] on any structural or checksum mismatch.
pub fn parse(bytes: &[u8]) -> Result<HeaderInfo> {
    let (flags, descriptor_len) =
        inspect_prelude(bytes).ok_or(StegoError::HeaderCorrupt)?;
    let total = PRELUDE_LEN + descriptor_len + CRC_LEN;
    if bytes.len() < total {
        return Err(StegoError::HeaderCorrupt);
    }

    let payload = &bytes[..total - CRC_LEN];
    let stored = u16::from_le_bytes([bytes[total - CRC_LEN], bytes[total - 1]]);
    if HEADER_CRC.checksum(payload) != stored {
        return Err(StegoError::HeaderCorrupt);
    }

    let body_len = (flags & FLAG_DATA_SIZE != 0).then(|| {
        u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize
    });
    let pattern = if flags & FLAG_PATTERN != 0 {
        Some(
            Pattern::from_descriptor(&bytes[PRELUDE_LEN..PRELUDE_LEN + DESCRIPTOR_LEN])
                .map_err(|_| StegoError::HeaderCorrupt)?,
        )
    } else {
        None
    };

    Ok(HeaderInfo { body_len, pattern })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageMode;
    use crate::stego::pattern::{HeaderSpec, Pattern};

    fn resolved(write_pattern: bool) -> ResolvedPattern {
        Pattern {
            header: HeaderSpec { write_pattern, ..HeaderSpec::default() },
            ..Pattern::default()
        }
        .resolve(ImageMode::Rgba)
        .unwrap()
    }

    #[test]
    fn lengths() {
        assert_eq!(header_len(false), 14);
        assert_eq!(header_len(true), 30);
    }

    #[test]
    fn roundtrip_without_descriptor() {
        let p = resolved(false);
        let bytes = build(&p, 1234).unwrap();
        assert_eq!(bytes.len(), header_len(false));
        assert_eq!(&bytes[..4], b"STEG");

        let info = parse(&bytes).unwrap();
        assert_eq!(info.body_len, Some(1234));
        assert!(info.pattern.is_none());
    }

    #[test]
    fn roundtrip_with_descriptor() {
        let p = resolved(true);
        let bytes = build(&p, 77).unwrap();
        assert_eq!(bytes.len(), header_len(true));

        let info = parse(&bytes).unwrap();
        assert_eq!(info.body_len, Some(77));
        let embedded = info.pattern.unwrap().resolve(ImageMode::Rgba).unwrap();
        assert_eq!(embedded.channels, p.channels);
        assert_eq!(embedded.rs_parity, p.rs_parity);
    }

    #[test]
    fn crc_flip_detected() {
        let p = resolved(false);
        let mut bytes = build(&p, 5).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(matches!(parse(&bytes), Err(StegoError::HeaderCorrupt)));
    }

    #[test]
    fn field_flip_detected() {
        let p = resolved(false);
        let mut bytes = build(&p, 5).unwrap();
        bytes[6] ^= 0x40; // body length field
        assert!(matches!(parse(&bytes), Err(StegoError::HeaderCorrupt)));
    }

    #[test]
    fn wrong_magic_is_not_a_header() {
        let p = resolved(false);
        let mut bytes = build(&p, 5).unwrap();
        bytes[0] = b'X';
        assert!(inspect_prelude(&bytes).is_none());
        assert!(matches!(parse(&bytes), Err(StegoError::HeaderCorrupt)));
    }

    #[test]
    fn wrong_version_is_not_a_header() {
        let p = resolved(false);
        let mut bytes = build(&p, 5).unwrap();
        bytes[4] = 2;
        assert!(inspect_prelude(&bytes).is_none());
    }

    #[test]
    fn descriptor_length_must_match_flag() {
        let p = resolved(true);
        let mut bytes = build(&p, 5).unwrap();
        bytes[10] = 15; // descriptor length field disagrees with flag
        assert!(inspect_prelude(&bytes).is_none());
    }

    #[test]
    fn truncated_header_rejected() {
        let p = resolved(true);
        let bytes = build(&p, 5).unwrap();
        assert!(matches!(
            parse(&bytes[..header_len(true) - 3]),
            Err(StegoError::HeaderCorrupt)
        ));
    }

    #[test]
    fn known_crc_parameters() {
        // CRC-16/CCITT-FALSE check value for "123456789".
        assert_eq!(HEADER_CRC.checksum(b"123456789"), 0x29B1);
    }
}
