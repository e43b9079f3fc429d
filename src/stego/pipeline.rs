// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pixveil

//! Encode/decode drivers.
//!
//! Encoding: frame the payload, place the header (when enabled) on its own
//! slot sequence, verify capacity, then stream bits into a clone of the
//! carrier. All validation happens before the first pixel write — a failed
//! encode leaves nothing half-embedded.
//!
//! Decoding mirrors it: probe for a header (start, then the two possible
//! end placements, then the configured position), reconcile what it says
//! with what the caller supplied, read the framed stream and run the
//! inverse pipeline. Without a header and without a length, a hash-guided
//! scan over candidate lengths is available as an explicit opt-in — it is
//! quadratic and meant as a salvage tool, not a code path.

use log::{debug, warn};

use crate::image::PixelImage;
use crate::stego::error::{Result, StegoError};
use crate::stego::framing;
use crate::stego::header;
use crate::stego::pattern::{HashCheck, HeaderPosition, Pattern, ResolvedHeader, ResolvedPattern};
use crate::stego::repetition;
use crate::stego::slots::{self, SlotLayout};

/// Result of a successful encode.
#[derive(Debug, Clone)]
pub struct Encoded {
    /// The stego image, ready for container serialization.
    pub image: PixelImage,
    /// Frame body length. A headerless decode must be told this value.
    pub body_len: usize,
    /// Bytes actually embedded in the data slot sequence.
    pub framed_len: usize,
}

/// Decoder knobs beyond the pattern itself.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Frame body length, for carriers without a (readable) header.
    pub data_len: Option<usize>,
    /// Trust the supplied pattern and length over whatever a header says,
    /// and keep going when no header can be read.
    pub enforce_provided_pattern: bool,
    /// Permit the hash-guided length scan when no length is known.
    pub allow_blind_scan: bool,
}

/// Hide `data` in a copy of `cover` under `pattern`.
///
/// # Errors
/// - [`StegoError::InvalidPattern`] / [`StegoError::UnsupportedImage`]
///   before anything else runs.
/// - [`StegoError::CapacityExceeded`] after framing, before any pixel
///   write; the cover is never touched.
pub fn encode(cover: &PixelImage, pattern: &Pattern, data: &[u8]) -> Result<Encoded> {
    let resolved = pattern.resolve(cover.mode())?;
    let (framed, body_len) = framing::frame_payload(&resolved, data)?;

    let pixels = cover.pixel_count();
    let header_part = match &resolved.header {
        Some(h) => {
            let bytes = header::build(&resolved, body_len)?;
            let framed_header = repetition::expand_bytes(&bytes, h.repetitive_redundancy as usize);
            let (start, extent) = place_header(cover, h, framed_header.len())?;
            debug!(
                "header: {} bytes ({} framed) at pixel {start}, {extent} px",
                bytes.len(),
                framed_header.len()
            );
            Some((h, framed_header, start, extent))
        }
        None => None,
    };

    let header_range = header_part.as_ref().map(|(_, _, s, e)| (*s, *s + *e));
    let (window_start, window_end) =
        data_window(resolved.offset as usize, pixels, header_range);
    let layout = SlotLayout::for_data(&resolved, window_start, window_end);
    let capacity = layout.capacity_bytes();
    if framed.len() > capacity {
        return Err(StegoError::CapacityExceeded { required: framed.len(), available: capacity });
    }

    let mut stego = cover.clone();
    if let Some((h, framed_header, start, _)) = &header_part {
        let header_layout = SlotLayout::for_header(h, *start, pixels);
        slots::write_bytes(&mut stego, &header_layout, framed_header)?;
    }
    slots::write_bytes(&mut stego, &layout, &framed)?;

    Ok(Encoded { image: stego, body_len, framed_len: framed.len() })
}

/// Recover the payload hidden in `stego`.
///
/// The supplied pattern is the starting point; a successfully parsed
/// header can override both the data pattern (descriptor) and the body
/// length, unless `enforce_provided_pattern` pins the caller's values.
pub fn decode(stego: &PixelImage, pattern: &Pattern, opts: &DecodeOptions) -> Result<Vec<u8>> {
    let resolved = pattern.resolve(stego.mode())?;

    let mut effective = resolved.clone();
    let mut body_len = opts.data_len;
    let mut header_range = None;

    if let Some(h) = &resolved.header {
        match probe_header(stego, h) {
            Some((info, start, extent)) => {
                debug!("header found at pixel {start} ({extent} px)");
                header_range = Some((start, start + extent));
                if let Some(found) = info.pattern {
                    if opts.enforce_provided_pattern {
                        debug!("embedded pattern ignored, provided pattern enforced");
                    } else {
                        effective = found.resolve(stego.mode())?;
                    }
                }
                if let Some(len) = info.body_len {
                    // The caller's length wins only when it exists and is
                    // explicitly enforced.
                    if !(opts.enforce_provided_pattern && body_len.is_some()) {
                        body_len = Some(len);
                    }
                }
            }
            None => {
                if !opts.enforce_provided_pattern {
                    return Err(StegoError::HeaderCorrupt);
                }
                warn!("no readable header; continuing with the provided pattern");
            }
        }
    }

    let pixels = stego.pixel_count();
    let (window_start, window_end) =
        data_window(effective.offset as usize, pixels, header_range);
    let layout = SlotLayout::for_data(&effective, window_start, window_end);

    match body_len {
        Some(len) => {
            let framed_len = framing::framed_len(&effective, len);
            let stream = slots::read_bytes(stego, &layout, framed_len)?;
            framing::unframe_payload(&effective, len, &stream)
        }
        None => blind_scan(stego, &effective, &layout, opts),
    }
}

/// Resolve where a header's slot sequence begins, and its pixel extent.
fn place_header(
    img: &PixelImage,
    h: &ResolvedHeader,
    framed_bytes: usize,
) -> Result<(usize, usize)> {
    let pixels = img.pixel_count();
    let probe = SlotLayout::for_header(h, 0, pixels);
    let extent = probe.pixels_for_bytes(framed_bytes);

    let start = match h.position {
        HeaderPosition::Start => 0,
        HeaderPosition::End => {
            pixels.checked_sub(extent).ok_or(StegoError::CapacityExceeded {
                required: framed_bytes,
                available: probe.capacity_bytes(),
            })?
        }
        HeaderPosition::Custom { x, y } => {
            if x >= img.width() || y >= img.height() {
                return Err(StegoError::InvalidPattern(format!(
                    "header position ({x}, {y}) outside {}x{} image",
                    img.width(),
                    img.height()
                )));
            }
            y as usize * img.width() as usize + x as usize
        }
    };

    if start + extent > pixels {
        return Err(StegoError::CapacityExceeded {
            required: framed_bytes,
            available: SlotLayout::for_header(h, start, pixels).capacity_bytes(),
        });
    }
    Ok((start, extent))
}

/// The contiguous pixel window available to the data slot sequence, with
/// the header's range excluded: data starts after a header that precedes
/// it and is capped before a header that follows it.
fn data_window(
    offset: usize,
    pixels: usize,
    header_range: Option<(usize, usize)>,
) -> (usize, usize) {
    match header_range {
        None => (offset, pixels),
        Some((h_start, h_end)) => {
            if h_end <= offset {
                (offset, pixels)
            } else if h_start <= offset {
                (h_end, pixels)
            } else {
                (offset, h_start)
            }
        }
    }
}

/// Try the documented probe order: start, both end placements (with and
/// without an embedded descriptor), then the configured custom position.
fn probe_header(
    img: &PixelImage,
    h: &ResolvedHeader,
) -> Option<(header::HeaderInfo, usize, usize)> {
    let pixels = img.pixel_count();
    let r = h.repetitive_redundancy as usize;
    let probe = SlotLayout::for_header(h, 0, pixels);

    let mut candidates: Vec<usize> = vec![0];
    for with_pattern in [false, true] {
        let extent = probe.pixels_for_bytes(header::header_len(with_pattern) * r);
        if extent <= pixels {
            candidates.push(pixels - extent);
        }
    }
    if let HeaderPosition::Custom { x, y } = h.position {
        let start = y as usize * img.width() as usize + x as usize;
        if start < pixels {
            candidates.push(start);
        }
    }

    let mut tried = Vec::with_capacity(candidates.len());
    for start in candidates {
        if tried.contains(&start) {
            continue;
        }
        tried.push(start);
        if let Some(found) = try_header_at(img, h, start) {
            return Some(found);
        }
    }
    None
}

/// Attempt a full header read at one position. `None` means "no header
/// here" — bad magic, bad CRC, or not enough pixels.
fn try_header_at(
    img: &PixelImage,
    h: &ResolvedHeader,
    start: usize,
) -> Option<(header::HeaderInfo, usize, usize)> {
    let layout = SlotLayout::for_header(h, start, img.pixel_count());
    let r = h.repetitive_redundancy as usize;

    let raw = slots::read_bytes(img, &layout, header::PRELUDE_LEN * r).ok()?;
    let prelude = repetition::collapse_bytes(&raw, header::PRELUDE_LEN, r);
    let (_, descriptor_len) = header::inspect_prelude(&prelude)?;

    let total = header::PRELUDE_LEN + descriptor_len + header::CRC_LEN;
    let raw = slots::read_bytes(img, &layout, total * r).ok()?;
    let bytes = repetition::collapse_bytes(&raw, total, r);
    let info = header::parse(&bytes).ok()?;
    Some((info, start, layout.pixels_for_bytes(total * r)))
}

/// Last-resort decode: scan candidate body lengths from the window
/// capacity downward until the configured hash verifies. Quadratic.
fn blind_scan(
    img: &PixelImage,
    pattern: &ResolvedPattern,
    layout: &SlotLayout,
    opts: &DecodeOptions,
) -> Result<Vec<u8>> {
    if pattern.hash_check == HashCheck::None {
        return Err(StegoError::InvalidPattern(
            "data length unknown and no hash configured to recover it".into(),
        ));
    }
    if !opts.allow_blind_scan {
        return Err(StegoError::InvalidPattern(
            "data length unknown; supply it or allow the blind scan".into(),
        ));
    }

    let capacity = layout.capacity_bytes();
    let stream = slots::read_bytes(img, layout, capacity)?;
    // A body can be as small as the digest alone (empty payload).
    let min_body = pattern.hash_check.digest_len();
    warn!("blind scan engaged over body lengths {min_body}..={capacity}");

    for candidate in (min_body..=capacity).rev() {
        let framed_len = framing::framed_len(pattern, candidate);
        if framed_len > stream.len() {
            continue;
        }
        if let Ok(payload) = framing::unframe_payload(pattern, candidate, &stream[..framed_len]) {
            debug!("blind scan settled on body length {candidate}");
            return Ok(payload);
        }
    }
    Err(StegoError::IntegrityFailure { recovered: Vec::new() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_excludes_header_range() {
        // Header before the data offset: untouched.
        assert_eq!(data_window(10, 100, Some((0, 10))), (10, 100));
        // Header covering the offset: data shifts past it.
        assert_eq!(data_window(4, 100, Some((0, 12))), (12, 100));
        assert_eq!(data_window(0, 100, Some((0, 12))), (12, 100));
        // Header behind the data: window capped.
        assert_eq!(data_window(0, 100, Some((88, 100))), (0, 88));
        assert_eq!(data_window(5, 100, Some((50, 60))), (5, 50));
        // No header.
        assert_eq!(data_window(7, 100, None), (7, 100));
    }
}
