// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pixveil

//! Typed payload container.
//!
//! The codec itself moves raw bytes; this optional layer tags them so a
//! receiver knows whether it extracted a text message, a named file, or
//! opaque bytes:
//!
//! ```text
//! [1 byte] tag (0 text, 1 file, 2 bytes)
//! file only: [1 byte] name length (1-255), [N bytes] UTF-8 name
//! [M bytes] content
//! ```

use crate::stego::error::{Result, StegoError};

const TAG_TEXT: u8 = 0;
const TAG_FILE: u8 = 1;
const TAG_BYTES: u8 = 2;

/// What a payload carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A UTF-8 text message.
    Text(String),
    /// A named file.
    File { name: String, content: Vec<u8> },
    /// Opaque bytes.
    Bytes(Vec<u8>),
}

/// Serialize a payload into the byte stream the codec embeds.
///
/// # Errors
/// [`StegoError::InvalidPattern`] for a file name that is empty or longer
/// than 255 bytes.
pub fn encode_payload(payload: &Payload) -> Result<Vec<u8>> {
    match payload {
        Payload::Text(text) => {
            let mut out = Vec::with_capacity(1 + text.len());
            out.push(TAG_TEXT);
            out.extend_from_slice(text.as_bytes());
            Ok(out)
        }
        Payload::File { name, content } => {
            let name_len = name.as_bytes().len();
            if name_len == 0 || name_len > 255 {
                return Err(StegoError::InvalidPattern(format!(
                    "file name must be 1..=255 bytes, got {name_len}"
                )));
            }
            let mut out = Vec::with_capacity(2 + name_len + content.len());
            out.push(TAG_FILE);
            out.push(name_len as u8);
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(content);
            Ok(out)
        }
        Payload::Bytes(bytes) => {
            let mut out = Vec::with_capacity(1 + bytes.len());
            out.push(TAG_BYTES);
            out.extend_from_slice(bytes);
            Ok(out)
        }
    }
}

/// Parse a payload container extracted by the decoder.
///
/// # Errors
/// [`StegoError::IntegrityFailure`] with the raw bytes attached when the
/// tag is unknown or the structure is truncated — the data survived the
/// carrier but is not a container this layer understands.
pub fn decode_payload(bytes: &[u8]) -> Result<Payload> {
    let corrupt = || StegoError::IntegrityFailure { recovered: bytes.to_vec() };

    let (&tag, rest) = bytes.split_first().ok_or_else(corrupt)?;
    match tag {
        TAG_TEXT => {
            let text = std::str::from_utf8(rest).map_err(|_| corrupt())?;
            Ok(Payload::Text(text.to_string()))
        }
        TAG_FILE => {
            let (&name_len, rest) = rest.split_first().ok_or_else(corrupt)?;
            let name_len = name_len as usize;
            if name_len == 0 || rest.len() < name_len {
                return Err(corrupt());
            }
            let name = std::str::from_utf8(&rest[..name_len]).map_err(|_| corrupt())?;
            Ok(Payload::File {
                name: name.to_string(),
                content: rest[name_len..].to_vec(),
            })
        }
        TAG_BYTES => Ok(Payload::Bytes(rest.to_vec())),
        _ => Err(corrupt()),
    }
}
