// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pixveil

//! Pattern model: the configuration that governs slot selection and framing.
//!
//! A [`Pattern`] is what callers build (by hand or from JSON); a
//! [`ResolvedPattern`] is the validated form, normalized against a concrete
//! [`ImageMode`], that the rest of the pipeline consumes. Resolution is the
//! only place range checks happen — downstream code may assume a resolved
//! pattern is internally consistent.
//!
//! The resolved form also packs into a fixed 16-byte little-endian
//! descriptor for embedding in the self-describing header.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::image::{Channel, ImageMode, CANONICAL_CHANNELS};
use crate::stego::error::{Result, StegoError};

/// Length of the canonical pattern descriptor in bytes.
pub const DESCRIPTOR_LEN: usize = 16;

/// Integrity hash algorithm applied to the frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashCheck {
    None,
    Md5,
    Sha256,
}

impl HashCheck {
    /// Digest length in bytes (0 when disabled).
    pub fn digest_len(self) -> usize {
        match self {
            Self::None => 0,
            Self::Md5 => 16,
            Self::Sha256 => 32,
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Md5 => 1,
            Self::Sha256 => 2,
        }
    }

    fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(Self::None),
            1 => Ok(Self::Md5),
            2 => Ok(Self::Sha256),
            other => Err(StegoError::InvalidPattern(format!(
                "unknown hash algorithm tag {other}"
            ))),
        }
    }
}

/// Frame body compression algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    None,
    Zlib,
}

impl Compression {
    fn to_byte(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Zlib => 1,
        }
    }

    fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(Self::None),
            1 => Ok(Self::Zlib),
            other => Err(StegoError::InvalidPattern(format!(
                "unknown compression tag {other}"
            ))),
        }
    }
}

/// Error-correcting code applied to the frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancedRedundancy {
    None,
    ReedSolomon,
}

impl AdvancedRedundancy {
    fn to_byte(self) -> u8 {
        match self {
            Self::None => 0,
            Self::ReedSolomon => 1,
        }
    }

    fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(Self::None),
            1 => Ok(Self::ReedSolomon),
            other => Err(StegoError::InvalidPattern(format!(
                "unknown redundancy tag {other}"
            ))),
        }
    }
}

/// Granularity of the repetition code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepetitionMode {
    /// Each byte of the post-ECC stream is written `r` times in a row.
    BytePerByte,
    /// Each ECC block (the whole stream when ECC is off) is written `r`
    /// times in a row.
    Block,
}

impl RepetitionMode {
    fn to_byte(self) -> u8 {
        match self {
            Self::BytePerByte => 0,
            Self::Block => 1,
        }
    }

    fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(Self::BytePerByte),
            1 => Ok(Self::Block),
            other => Err(StegoError::InvalidPattern(format!(
                "unknown repetition mode tag {other}"
            ))),
        }
    }
}

/// Where the header's slot sequence begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderPosition {
    /// Pixel 0.
    Start,
    /// Flush against the last pixel of the image.
    End,
    /// An explicit pixel coordinate.
    Custom { x: u32, y: u32 },
}

/// Channel selection: an explicit ordered subset, or one of the sentinels
/// `"auto"` (all non-alpha channels) and `"all"` (every channel).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelSelect {
    Subset(Vec<Channel>),
    Sentinel(String),
}

impl ChannelSelect {
    pub fn auto() -> Self {
        Self::Sentinel("auto".into())
    }

    pub fn all() -> Self {
        Self::Sentinel("all".into())
    }

    fn resolve(&self, mode: ImageMode, what: &str) -> Result<Vec<Channel>> {
        let channels: Vec<Channel> = match self {
            Self::Sentinel(word) => match word.to_ascii_lowercase().as_str() {
                "auto" => mode
                    .channels()
                    .iter()
                    .copied()
                    .filter(|&c| c != Channel::A)
                    .collect(),
                "all" => mode.channels().to_vec(),
                other => {
                    return Err(StegoError::InvalidPattern(format!(
                        "unknown {what} channel sentinel {other:?}"
                    )))
                }
            },
            Self::Subset(list) => list.clone(),
        };

        if channels.is_empty() {
            return Err(StegoError::InvalidPattern(format!(
                "{what} channel set is empty"
            )));
        }
        for (i, &ch) in channels.iter().enumerate() {
            if !mode.has_channel(ch) {
                return Err(StegoError::InvalidPattern(format!(
                    "{what} channel {} not present in mode {}",
                    ch.letter(),
                    mode.name()
                )));
            }
            if channels[..i].contains(&ch) {
                return Err(StegoError::InvalidPattern(format!(
                    "duplicate {what} channel {}",
                    ch.letter()
                )));
            }
        }
        Ok(channels)
    }
}

/// Header configuration nested inside a [`Pattern`].
///
/// The bit-placement fields apply exclusively to the header; the header is
/// always framed with byte-wise repetition only (no ECC, no compression),
/// its integrity guarded by the CRC-16 trailer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HeaderSpec {
    pub enabled: bool,
    /// Record the frame body length in the header.
    pub write_data_size: bool,
    /// Embed the canonical data-pattern descriptor in the header.
    pub write_pattern: bool,
    pub position: HeaderPosition,
    /// `"auto"` picks a discoverable channel (alpha, else blue, else the
    /// first channel) when the header is meant to be found without
    /// out-of-band knowledge; otherwise it mirrors the data channels.
    pub channels: ChannelSelect,
    pub bit_frequency: u8,
    pub byte_spacing: u32,
    pub repetitive_redundancy: u8,
}

impl Default for HeaderSpec {
    fn default() -> Self {
        Self {
            enabled: true,
            write_data_size: true,
            write_pattern: false,
            position: HeaderPosition::Start,
            channels: ChannelSelect::auto(),
            bit_frequency: 1,
            byte_spacing: 1,
            repetitive_redundancy: 5,
        }
    }
}

/// Bit-placement and framing configuration for one encode or decode run.
///
/// Field semantics follow the crate-level documentation; everything has a
/// sensible default so `Pattern::default()` round-trips a payload with
/// header, SHA-256 integrity and Reed-Solomon armor on any carrier large
/// enough to hold it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Pattern {
    pub channels: ChannelSelect,
    /// LSBs written per channel sample, 1..=8.
    pub bit_frequency: u8,
    /// Pixels between the start of consecutive byte runs, >= 1.
    pub byte_spacing: u32,
    /// Pixels skipped before the first data byte run.
    pub offset: u32,
    pub hash_check: HashCheck,
    pub compression: Compression,
    /// zlib level, 0..=9.
    pub compression_strength: u8,
    pub advanced_redundancy: AdvancedRedundancy,
    /// Fraction of each Reed-Solomon block reserved for parity, 0..=1.
    pub advanced_redundancy_correction_factor: f64,
    /// Copies of each repetition unit, >= 1. Odd values recommended: even
    /// factors can tie, and ties always vote toward zero.
    pub repetitive_redundancy: u8,
    pub repetitive_redundancy_mode: RepetitionMode,
    pub header: HeaderSpec,
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            channels: ChannelSelect::auto(),
            bit_frequency: 1,
            byte_spacing: 1,
            offset: 0,
            hash_check: HashCheck::Sha256,
            compression: Compression::None,
            compression_strength: 6,
            advanced_redundancy: AdvancedRedundancy::ReedSolomon,
            advanced_redundancy_correction_factor: 0.1,
            repetitive_redundancy: 1,
            repetitive_redundancy_mode: RepetitionMode::BytePerByte,
            header: HeaderSpec::default(),
        }
    }
}

/// Quantize a correction factor to Q0.16 for the descriptor.
fn quantize_factor(factor: f64) -> u16 {
    ((factor * 65536.0).round() as u32).min(65535) as u16
}

/// Reed-Solomon parity symbol count for a quantized correction factor.
///
/// Both encoder and decoder derive the parity count from the quantized
/// value, so a pattern that traveled through the descriptor produces the
/// same block geometry as the one that wrote it.
pub fn rs_parity_for(q016: u16) -> usize {
    ((q016 as f64 / 65536.0) * 255.0).round() as usize
}

impl Pattern {
    /// Parse a pattern from its JSON form. Unknown keys are rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| StegoError::InvalidPattern(format!("pattern json: {e}")))
    }

    /// Reconstruct a pattern from a canonical 16-byte descriptor.
    ///
    /// The channel mask cannot carry declared order, so the subset comes
    /// back in canonical R, G, B, A, L order. The header block is not part
    /// of the descriptor and comes back as the default.
    pub fn from_descriptor(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != DESCRIPTOR_LEN {
            return Err(StegoError::InvalidPattern(format!(
                "descriptor is {} bytes, expected {DESCRIPTOR_LEN}",
                bytes.len()
            )));
        }
        let mask = bytes[0];
        let channels: Vec<Channel> = CANONICAL_CHANNELS
            .iter()
            .copied()
            .filter(|c| mask & c.mask_bit() != 0)
            .collect();
        if channels.is_empty() {
            return Err(StegoError::InvalidPattern(
                "descriptor channel mask is empty".into(),
            ));
        }
        let q016 = u16::from_le_bytes([bytes[12], bytes[13]]);
        Ok(Self {
            channels: ChannelSelect::Subset(channels),
            bit_frequency: bytes[1],
            byte_spacing: u16::from_le_bytes([bytes[2], bytes[3]]) as u32,
            offset: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            hash_check: HashCheck::from_byte(bytes[8])?,
            compression: Compression::from_byte(bytes[9])?,
            compression_strength: bytes[10],
            advanced_redundancy: AdvancedRedundancy::from_byte(bytes[11])?,
            advanced_redundancy_correction_factor: q016 as f64 / 65536.0,
            repetitive_redundancy: bytes[14],
            repetitive_redundancy_mode: RepetitionMode::from_byte(bytes[15])?,
            header: HeaderSpec::default(),
        })
    }

    /// Validate the pattern and normalize it against a carrier mode.
    ///
    /// # Errors
    /// [`StegoError::InvalidPattern`] on any range violation, unknown
    /// sentinel, or channel absent from `mode`. This is the single
    /// pre-flight gate — nothing downstream re-validates.
    pub fn resolve(&self, mode: ImageMode) -> Result<ResolvedPattern> {
        let channels = self.channels.resolve(mode, "data")?;
        validate_placement(self.bit_frequency, self.byte_spacing, "data")?;

        if self.compression_strength > 9 {
            return Err(StegoError::InvalidPattern(format!(
                "compression strength {} out of range 0..=9",
                self.compression_strength
            )));
        }

        let factor = self.advanced_redundancy_correction_factor;
        if !factor.is_finite() || !(0.0..=1.0).contains(&factor) {
            return Err(StegoError::InvalidPattern(format!(
                "correction factor {factor} out of range 0..=1"
            )));
        }
        let rs_q016 = match self.advanced_redundancy {
            AdvancedRedundancy::None => 0,
            AdvancedRedundancy::ReedSolomon => quantize_factor(factor),
        };
        let rs_parity = rs_parity_for(rs_q016);
        if rs_parity > 254 {
            return Err(StegoError::InvalidPattern(format!(
                "correction factor {factor} leaves no data symbols per block"
            )));
        }

        if self.repetitive_redundancy < 1 {
            return Err(StegoError::InvalidPattern(
                "repetitive redundancy must be >= 1".into(),
            ));
        }
        if self.repetitive_redundancy > 1 && self.repetitive_redundancy % 2 == 0 {
            debug!(
                "even repetition factor {} permits voting ties (resolved toward 0)",
                self.repetitive_redundancy
            );
        }

        let header = if self.header.enabled
            && (self.header.write_data_size || self.header.write_pattern)
        {
            Some(self.resolve_header(mode, &channels)?)
        } else {
            None
        };

        let channel_indices = channels
            .iter()
            .map(|&c| mode.channel_index(c).expect("channel checked against mode"))
            .collect();

        Ok(ResolvedPattern {
            mode,
            channels,
            channel_indices,
            bit_frequency: self.bit_frequency,
            byte_spacing: self.byte_spacing,
            offset: self.offset,
            hash_check: self.hash_check,
            compression: self.compression,
            compression_strength: self.compression_strength,
            advanced_redundancy: self.advanced_redundancy,
            rs_q016,
            rs_parity,
            repetitive_redundancy: self.repetitive_redundancy,
            repetitive_redundancy_mode: self.repetitive_redundancy_mode,
            header,
        })
    }

    fn resolve_header(&self, mode: ImageMode, data_channels: &[Channel]) -> Result<ResolvedHeader> {
        let hs = &self.header;
        validate_placement(hs.bit_frequency, hs.byte_spacing, "header")?;
        if hs.repetitive_redundancy < 1 {
            return Err(StegoError::InvalidPattern(
                "header repetitive redundancy must be >= 1".into(),
            ));
        }

        // "auto" places a discoverable header in the most conventional
        // channel (alpha, else blue, else first); a header not meant to be
        // discovered hides in the same channels as the data.
        let discoverable = hs.write_data_size
            && (hs.write_pattern || hs.position == HeaderPosition::Start);
        let channels = match &hs.channels {
            ChannelSelect::Sentinel(word) if word.eq_ignore_ascii_case("auto") => {
                if discoverable {
                    if mode.has_channel(Channel::A) {
                        vec![Channel::A]
                    } else if mode.has_channel(Channel::B) {
                        vec![Channel::B]
                    } else {
                        vec![mode.channels()[0]]
                    }
                } else {
                    data_channels.to_vec()
                }
            }
            other => other.resolve(mode, "header")?,
        };

        let channel_indices = channels
            .iter()
            .map(|&c| mode.channel_index(c).expect("channel checked against mode"))
            .collect();

        Ok(ResolvedHeader {
            channels,
            channel_indices,
            bit_frequency: hs.bit_frequency,
            byte_spacing: hs.byte_spacing,
            repetitive_redundancy: hs.repetitive_redundancy,
            position: hs.position,
            write_data_size: hs.write_data_size,
            write_pattern: hs.write_pattern,
        })
    }
}

fn validate_placement(bit_frequency: u8, byte_spacing: u32, what: &str) -> Result<()> {
    if !(1..=8).contains(&bit_frequency) {
        return Err(StegoError::InvalidPattern(format!(
            "{what} bit frequency {bit_frequency} out of range 1..=8"
        )));
    }
    if byte_spacing < 1 || byte_spacing > u16::MAX as u32 {
        return Err(StegoError::InvalidPattern(format!(
            "{what} byte spacing {byte_spacing} out of range 1..=65535"
        )));
    }
    Ok(())
}

/// A [`Pattern`] validated and normalized against a concrete carrier mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPattern {
    pub mode: ImageMode,
    /// Data channels in declared order.
    pub channels: Vec<Channel>,
    /// Index of each data channel within the pixel tuple.
    pub channel_indices: Vec<usize>,
    pub bit_frequency: u8,
    pub byte_spacing: u32,
    pub offset: u32,
    pub hash_check: HashCheck,
    pub compression: Compression,
    pub compression_strength: u8,
    pub advanced_redundancy: AdvancedRedundancy,
    /// Correction factor quantized to Q0.16 (descriptor form).
    pub rs_q016: u16,
    /// Parity symbols per 255-byte Reed-Solomon block (0 when ECC is off).
    pub rs_parity: usize,
    pub repetitive_redundancy: u8,
    pub repetitive_redundancy_mode: RepetitionMode,
    /// Present when the header is enabled and has something to say.
    pub header: Option<ResolvedHeader>,
}

impl ResolvedPattern {
    /// Carrier bits contributed by one visited pixel.
    pub fn slots_per_pixel(&self) -> usize {
        self.channels.len() * self.bit_frequency as usize
    }

    /// Pack the data-placement and framing fields into the canonical
    /// 16-byte little-endian descriptor.
    pub fn descriptor(&self) -> [u8; DESCRIPTOR_LEN] {
        let mut out = [0u8; DESCRIPTOR_LEN];
        out[0] = self.channels.iter().fold(0, |m, c| m | c.mask_bit());
        out[1] = self.bit_frequency;
        out[2..4].copy_from_slice(&(self.byte_spacing as u16).to_le_bytes());
        out[4..8].copy_from_slice(&self.offset.to_le_bytes());
        out[8] = self.hash_check.to_byte();
        out[9] = self.compression.to_byte();
        out[10] = self.compression_strength;
        out[11] = self.advanced_redundancy.to_byte();
        out[12..14].copy_from_slice(&self.rs_q016.to_le_bytes());
        out[14] = self.repetitive_redundancy;
        out[15] = self.repetitive_redundancy_mode.to_byte();
        out
    }
}

/// Resolved header placement and framing.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedHeader {
    pub channels: Vec<Channel>,
    pub channel_indices: Vec<usize>,
    pub bit_frequency: u8,
    pub byte_spacing: u32,
    pub repetitive_redundancy: u8,
    pub position: HeaderPosition,
    pub write_data_size: bool,
    pub write_pattern: bool,
}
