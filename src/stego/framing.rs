// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pixveil

//! Frame construction and recovery.
//!
//! The frame body is built inner to outer: optional zlib compression of the
//! raw payload (behind a one-byte kept/stored flag, so incompressible data
//! never grows by more than that byte), then the digest of everything so
//! far when a hash is configured. The body then passes through
//! Reed-Solomon and repetition coding to become the embedded stream.
//!
//! All length arithmetic between payload, body and framed stream lives
//! here: [`framed_len`] is the single source of truth the drivers and the
//! header share.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use log::debug;
use md5::{Digest, Md5};
use sha2::Sha256;

use crate::stego::ecc;
use crate::stego::error::{Result, StegoError};
use crate::stego::pattern::{Compression, HashCheck, RepetitionMode, ResolvedPattern};
use crate::stego::repetition;

/// Compression flag values: whether the zlib output was actually kept.
const FLAG_DEFLATED: u8 = 1;
const FLAG_STORED: u8 = 0;

/// Upper bound for decompressed bodies, against zlib bombs.
const MAX_DECOMPRESSED: u64 = 256 * 1024 * 1024;

/// Digest of `data` under the configured algorithm (empty for `None`).
pub fn digest(algo: HashCheck, data: &[u8]) -> Vec<u8> {
    match algo {
        HashCheck::None => Vec::new(),
        HashCheck::Md5 => Md5::digest(data).to_vec(),
        HashCheck::Sha256 => Sha256::digest(data).to_vec(),
    }
}

fn zlib_compress(data: &[u8], level: u8) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::new(level as u32));
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zlib_decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data).take(MAX_DECOMPRESSED).read_to_end(&mut out)?;
    Ok(out)
}

/// Build the frame body: `[flag || compressed payload] || digest`.
///
/// Without compression the body is the payload itself (no flag byte); the
/// digest covers every body byte that precedes it.
pub fn build_body(pattern: &ResolvedPattern, payload: &[u8]) -> Result<Vec<u8>> {
    let mut body = match pattern.compression {
        Compression::None => payload.to_vec(),
        Compression::Zlib => {
            let compressed = zlib_compress(payload, pattern.compression_strength)?;
            if compressed.len() < payload.len() {
                debug!(
                    "zlib kept: {} -> {} bytes (level {})",
                    payload.len(),
                    compressed.len(),
                    pattern.compression_strength
                );
                let mut body = Vec::with_capacity(1 + compressed.len());
                body.push(FLAG_DEFLATED);
                body.extend_from_slice(&compressed);
                body
            } else {
                debug!(
                    "zlib skipped: {} -> {} bytes, storing raw",
                    payload.len(),
                    compressed.len()
                );
                let mut body = Vec::with_capacity(1 + payload.len());
                body.push(FLAG_STORED);
                body.extend_from_slice(payload);
                body
            }
        }
    };

    let tag = digest(pattern.hash_check, &body);
    body.extend_from_slice(&tag);
    Ok(body)
}

/// Framed stream length (in bytes) for a given body length.
pub fn framed_len(pattern: &ResolvedPattern, body_len: usize) -> usize {
    repetition::expanded_len(
        ecc::encoded_len(body_len, pattern.rs_parity),
        pattern.repetitive_redundancy as usize,
    )
}

/// Run the full outbound pipeline: body -> Reed-Solomon -> repetition.
///
/// Returns the framed stream and the body length (what the header records
/// and headerless decodes must be told).
pub fn frame_payload(pattern: &ResolvedPattern, payload: &[u8]) -> Result<(Vec<u8>, usize)> {
    let body = build_body(pattern, payload)?;
    let coded = ecc::encode_blocks(&body, pattern.rs_parity);
    let r = pattern.repetitive_redundancy as usize;
    let framed = match pattern.repetitive_redundancy_mode {
        RepetitionMode::BytePerByte => repetition::expand_bytes(&coded, r),
        RepetitionMode::Block => {
            repetition::expand_units(&coded, &ecc::block_lens(body.len(), pattern.rs_parity), r)
        }
    };
    debug_assert_eq!(framed.len(), framed_len(pattern, body.len()));
    Ok((framed, body.len()))
}

/// Run the full inbound pipeline: repetition vote -> Reed-Solomon
/// correction -> hash verification -> decompression.
///
/// # Errors
/// - [`StegoError::IntegrityFailure`] when a configured hash does not match
///   (the recovered body is attached).
/// - [`StegoError::Uncorrectable`] when Reed-Solomon capacity was exhausted
///   and no hash is configured to arbitrate, or the compression envelope is
///   unreadable.
pub fn unframe_payload(
    pattern: &ResolvedPattern,
    body_len: usize,
    stream: &[u8],
) -> Result<Vec<u8>> {
    let r = pattern.repetitive_redundancy as usize;
    let coded_len = ecc::encoded_len(body_len, pattern.rs_parity);
    let coded = match pattern.repetitive_redundancy_mode {
        RepetitionMode::BytePerByte => repetition::collapse_bytes(stream, coded_len, r),
        RepetitionMode::Block => {
            repetition::collapse_units(stream, &ecc::block_lens(body_len, pattern.rs_parity), r)
        }
    };

    let (body, stats) = ecc::decode_blocks(&coded, body_len, pattern.rs_parity);

    let digest_len = pattern.hash_check.digest_len();
    if digest_len > 0 {
        if body.len() < digest_len {
            return Err(StegoError::IntegrityFailure { recovered: body });
        }
        let (core, stored) = body.split_at(body.len() - digest_len);
        if digest(pattern.hash_check, core) != stored {
            return Err(StegoError::IntegrityFailure { recovered: core.to_vec() });
        }
        decompress_body(pattern, core)
    } else {
        if stats.corrupt_blocks > 0 {
            return Err(StegoError::Uncorrectable { recovered: body });
        }
        decompress_body(pattern, &body)
    }
}

/// Peel the compression envelope off a verified body core.
fn decompress_body(pattern: &ResolvedPattern, core: &[u8]) -> Result<Vec<u8>> {
    match pattern.compression {
        Compression::None => Ok(core.to_vec()),
        Compression::Zlib => match core.first() {
            Some(&FLAG_DEFLATED) => zlib_decompress(&core[1..])
                .map_err(|_| StegoError::Uncorrectable { recovered: core.to_vec() }),
            Some(&FLAG_STORED) => Ok(core[1..].to_vec()),
            _ => Err(StegoError::Uncorrectable { recovered: core.to_vec() }),
        },
    }
}
