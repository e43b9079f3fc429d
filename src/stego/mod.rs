// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pixveil

//! Steganographic encoding and decoding.
//!
//! The pipeline, outside in:
//!
//! - [`pattern`] validates the caller's configuration against the carrier
//!   and fixes every knob the rest of the run depends on.
//! - [`framing`] turns the payload into the frame body (compression, hash)
//!   and armors it ([`ecc`], [`repetition`]).
//! - [`slots`] maps the framed stream onto (pixel, channel, bit) positions;
//!   [`bits`] does the LSB surgery on individual samples.
//! - [`header`] makes a carrier self-describing, so decoding can work from
//!   the image alone.
//! - [`pipeline`] orchestrates both directions.
//!
//! Every run is a pure function of (pattern, image, payload): no globals,
//! no locks, safe to run concurrently with distinct pixel buffers.

pub mod bits;
pub mod ecc;
pub mod error;
pub mod framing;
pub mod header;
pub mod pattern;
pub mod payload;
pub mod pipeline;
pub mod repetition;
pub mod slots;

pub use error::{Result, StegoError};
pub use pattern::{
    AdvancedRedundancy, ChannelSelect, Compression, HashCheck, HeaderPosition, HeaderSpec,
    Pattern, RepetitionMode, ResolvedPattern,
};
pub use payload::{decode_payload, encode_payload, Payload};
pub use pipeline::{decode, encode, DecodeOptions, Encoded};
