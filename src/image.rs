// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pixveil

//! Carrier pixel model.
//!
//! The codec operates on a rectangular grid of per-pixel channel samples,
//! handed over by an external container codec (PNG, BMP, PGM/PPM, ...).
//! Samples are stored as `u16` so 16-bit carriers work; 8-bit carriers simply
//! never use the upper byte. The sample buffer is row-major and
//! pixel-contiguous: `samples[pixel * channels + channel]`.

use serde::{Deserialize, Serialize};

use crate::stego::error::{Result, StegoError};

/// A single image channel.
///
/// The discriminant order R, G, B, A, L is the canonical order used when a
/// channel set is reconstructed from a descriptor mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    R,
    G,
    B,
    A,
    L,
}

/// Canonical channel order for mask round-trips.
pub const CANONICAL_CHANNELS: [Channel; 5] =
    [Channel::R, Channel::G, Channel::B, Channel::A, Channel::L];

impl Channel {
    /// Bit for this channel in the descriptor channel mask.
    pub fn mask_bit(self) -> u8 {
        match self {
            Self::R => 0x01,
            Self::G => 0x02,
            Self::B => 0x04,
            Self::A => 0x08,
            Self::L => 0x10,
        }
    }

    /// Single-letter name, matching container mode strings.
    pub fn letter(self) -> char {
        match self {
            Self::R => 'R',
            Self::G => 'G',
            Self::B => 'B',
            Self::A => 'A',
            Self::L => 'L',
        }
    }
}

/// Supported carrier channel layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageMode {
    /// Single-channel grayscale.
    L,
    /// Three-channel color.
    Rgb,
    /// Four-channel color with alpha.
    Rgba,
}

impl ImageMode {
    /// Parse a container mode string. Anything but `L`, `RGB`, `RGBA` is
    /// refused — the codec does not guess channel semantics.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "L" => Ok(Self::L),
            "RGB" => Ok(Self::Rgb),
            "RGBA" => Ok(Self::Rgba),
            other => Err(StegoError::UnsupportedImage(format!(
                "mode {other:?} (supported: L, RGB, RGBA)"
            ))),
        }
    }

    /// Container mode string.
    pub fn name(self) -> &'static str {
        match self {
            Self::L => "L",
            Self::Rgb => "RGB",
            Self::Rgba => "RGBA",
        }
    }

    /// Channels of this mode, in sample order.
    pub fn channels(self) -> &'static [Channel] {
        match self {
            Self::L => &[Channel::L],
            Self::Rgb => &[Channel::R, Channel::G, Channel::B],
            Self::Rgba => &[Channel::R, Channel::G, Channel::B, Channel::A],
        }
    }

    /// Number of samples per pixel.
    pub fn channel_count(self) -> usize {
        self.channels().len()
    }

    /// Index of `channel` within a pixel tuple, if the mode carries it.
    pub fn channel_index(self, channel: Channel) -> Option<usize> {
        self.channels().iter().position(|&c| c == channel)
    }

    /// Whether the mode carries `channel`.
    pub fn has_channel(self, channel: Channel) -> bool {
        self.channel_index(channel).is_some()
    }
}

/// A decoded carrier image: mode, geometry, and the flat sample buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelImage {
    mode: ImageMode,
    width: u32,
    height: u32,
    samples: Vec<u16>,
}

impl PixelImage {
    /// Wrap a sample buffer produced by the container codec.
    ///
    /// # Errors
    /// [`StegoError::UnsupportedImage`] if the buffer length does not match
    /// `width * height * channels` or either dimension is zero.
    pub fn new(mode: ImageMode, width: u32, height: u32, samples: Vec<u16>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(StegoError::UnsupportedImage(format!(
                "empty image ({width}x{height})"
            )));
        }
        let expected = width as usize * height as usize * mode.channel_count();
        if samples.len() != expected {
            return Err(StegoError::UnsupportedImage(format!(
                "sample buffer has {} values, {}x{} {} needs {expected}",
                samples.len(),
                width,
                height,
                mode.name()
            )));
        }
        Ok(Self { mode, width, height, samples })
    }

    /// Build a uniform image, every sample set to `value`. Handy for
    /// synthetic carriers in tests and capacity probing.
    pub fn filled(mode: ImageMode, width: u32, height: u32, value: u16) -> Self {
        let len = width as usize * height as usize * mode.channel_count();
        Self { mode, width, height, samples: vec![value; len] }
    }

    pub fn mode(&self) -> ImageMode {
        self.mode
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total pixel count (`width * height`).
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// The flat sample buffer, row-major and pixel-contiguous.
    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// Consume the image, returning the sample buffer for serialization.
    pub fn into_samples(self) -> Vec<u16> {
        self.samples
    }

    /// Sample at (pixel index, channel index within the pixel tuple).
    #[inline]
    pub fn sample(&self, pixel: usize, channel: usize) -> u16 {
        self.samples[pixel * self.mode.channel_count() + channel]
    }

    #[inline]
    pub fn set_sample(&mut self, pixel: usize, channel: usize, value: u16) {
        let idx = pixel * self.mode.channel_count() + channel;
        self.samples[idx] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parsing() {
        assert_eq!(ImageMode::from_name("RGB").unwrap(), ImageMode::Rgb);
        assert_eq!(ImageMode::from_name("RGBA").unwrap(), ImageMode::Rgba);
        assert_eq!(ImageMode::from_name("L").unwrap(), ImageMode::L);
        assert!(matches!(
            ImageMode::from_name("CMYK"),
            Err(StegoError::UnsupportedImage(_))
        ));
        assert!(matches!(
            ImageMode::from_name("rgb"),
            Err(StegoError::UnsupportedImage(_))
        ));
    }

    #[test]
    fn channel_lookup() {
        assert_eq!(ImageMode::Rgba.channel_index(Channel::A), Some(3));
        assert_eq!(ImageMode::Rgb.channel_index(Channel::A), None);
        assert_eq!(ImageMode::L.channel_index(Channel::L), Some(0));
        assert!(ImageMode::Rgb.has_channel(Channel::B));
        assert!(!ImageMode::L.has_channel(Channel::R));
    }

    #[test]
    fn mask_bits_are_distinct() {
        let mut seen = 0u8;
        for ch in CANONICAL_CHANNELS {
            assert_eq!(seen & ch.mask_bit(), 0);
            seen |= ch.mask_bit();
        }
        assert_eq!(seen, 0x1F);
    }

    #[test]
    fn buffer_length_checked() {
        assert!(PixelImage::new(ImageMode::Rgb, 2, 2, vec![0; 12]).is_ok());
        assert!(matches!(
            PixelImage::new(ImageMode::Rgb, 2, 2, vec![0; 11]),
            Err(StegoError::UnsupportedImage(_))
        ));
        assert!(matches!(
            PixelImage::new(ImageMode::Rgb, 0, 2, vec![]),
            Err(StegoError::UnsupportedImage(_))
        ));
    }

    #[test]
    fn sample_addressing() {
        let mut img = PixelImage::filled(ImageMode::Rgb, 2, 1, 7);
        img.set_sample(1, 2, 42);
        assert_eq!(img.sample(1, 2), 42);
        assert_eq!(img.sample(0, 0), 7);
        assert_eq!(img.samples()[5], 42);
    }
}
