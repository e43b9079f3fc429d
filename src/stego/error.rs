// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pixveil

//! Error types for the steganography pipeline.
//!
//! [`StegoError`] covers all failure modes from pattern validation through
//! header parsing and payload recovery. Validation errors are raised before
//! any pixel is touched; corruption discovered during decode carries the
//! best-effort recovered bytes so callers can present partial results.

use core::fmt;

/// Errors that can occur during steganographic encoding or decoding.
#[derive(Debug)]
pub enum StegoError {
    /// Pattern parameters are out of range or inconsistent with the carrier.
    InvalidPattern(String),
    /// The carrier image mode or sample buffer is not usable.
    UnsupportedImage(String),
    /// The framed payload does not fit the carrier under this pattern.
    CapacityExceeded {
        /// Framed bytes that would have to be embedded.
        required: usize,
        /// Bytes the (image, pattern) pair can actually hold.
        available: usize,
    },
    /// No valid header was found at any probed position (bad magic or CRC).
    HeaderCorrupt,
    /// Hash verification failed after redundancy recovery.
    IntegrityFailure {
        /// Best-effort recovered frame body, for forensic use.
        recovered: Vec<u8>,
    },
    /// Reed-Solomon correction capacity was exhausted and no hash is
    /// configured to absorb the failure.
    Uncorrectable {
        /// Partially corrected frame body.
        recovered: Vec<u8>,
    },
    /// An I/O error from a collaborator (compression streams).
    Io(std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, StegoError>;

impl StegoError {
    /// Process exit code for CLI wrappers.
    ///
    /// `0` is reserved for success; everything not individually mapped
    /// reports `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidPattern(_) => 2,
            Self::CapacityExceeded { .. } => 3,
            Self::HeaderCorrupt => 4,
            Self::IntegrityFailure { .. } => 5,
            Self::UnsupportedImage(_) => 6,
            Self::Uncorrectable { .. } | Self::Io(_) => 1,
        }
    }
}

impl fmt::Display for StegoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern(msg) => write!(f, "invalid pattern: {msg}"),
            Self::UnsupportedImage(msg) => write!(f, "unsupported image: {msg}"),
            Self::CapacityExceeded { required, available } => write!(
                f,
                "payload exceeds capacity ({required}/{available} bytes)"
            ),
            Self::HeaderCorrupt => write!(f, "header magic or CRC mismatch"),
            Self::IntegrityFailure { recovered } => write!(
                f,
                "integrity check failed ({} bytes recovered)",
                recovered.len()
            ),
            Self::Uncorrectable { recovered } => write!(
                f,
                "too many errors to correct ({} bytes recovered)",
                recovered.len()
            ),
            Self::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for StegoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StegoError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_cli_contract() {
        assert_eq!(StegoError::InvalidPattern("x".into()).exit_code(), 2);
        assert_eq!(
            StegoError::CapacityExceeded { required: 9, available: 1 }.exit_code(),
            3
        );
        assert_eq!(StegoError::HeaderCorrupt.exit_code(), 4);
        assert_eq!(
            StegoError::IntegrityFailure { recovered: vec![] }.exit_code(),
            5
        );
        assert_eq!(StegoError::UnsupportedImage("x".into()).exit_code(), 6);
        assert_eq!(
            StegoError::Uncorrectable { recovered: vec![] }.exit_code(),
            1
        );
    }

    #[test]
    fn display_mentions_counts() {
        let e = StegoError::CapacityExceeded { required: 12, available: 4 };
        assert!(e.to_string().contains("12/4"));
    }
}
