// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pixveil

//! # pixveil
//!
//! Pure-Rust steganography core for hiding data in lossless raster images.
//! A payload is framed (optional zlib compression, optional MD5/SHA-256
//! integrity hash, Reed-Solomon and repetition redundancy) and spread over
//! the least-significant bits of selected pixel channels, driven by a
//! deterministic, pattern-derived slot sequence that encoder and decoder
//! replay identically. An optional in-image header makes carriers
//! self-describing, so a receiver needs nothing but the image and the
//! header's (possibly default) placement pattern.
//!
//! Container parsing is out of scope: an I/O collaborator decodes PNG/BMP/
//! PGM/PPM to a [`PixelImage`] and serializes the result back. The core
//! refuses anything but `L`, `RGB` and `RGBA` sample layouts.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use pixveil::{decode, encode, DecodeOptions, Pattern, PixelImage};
//!
//! let cover: PixelImage = my_io::load("photo.png")?;
//! let stego = encode(&cover, &Pattern::default(), b"meet at dawn")?;
//! my_io::save("photo-out.png", &stego.image)?;
//!
//! let recovered = decode(&stego.image, &Pattern::default(), &DecodeOptions::default())?;
//! assert_eq!(recovered, b"meet at dawn");
//! ```

pub mod image;
pub mod stego;

pub use image::{Channel, ImageMode, PixelImage};
pub use stego::error::{Result, StegoError};
pub use stego::pattern::{
    AdvancedRedundancy, ChannelSelect, Compression, HashCheck, HeaderPosition, HeaderSpec,
    Pattern, RepetitionMode,
};
pub use stego::payload::{decode_payload, encode_payload, Payload};
pub use stego::pipeline::{decode, encode, DecodeOptions, Encoded};
