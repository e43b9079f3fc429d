// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pixveil

//! Header placement, discovery and fallback behavior.

use pixveil::{
    decode, encode, AdvancedRedundancy, Channel, ChannelSelect, DecodeOptions, HashCheck,
    HeaderPosition, HeaderSpec, ImageMode, Pattern, PixelImage, StegoError,
};

#[test]
fn default_pattern_is_self_describing() {
    let cover = PixelImage::filled(ImageMode::Rgba, 64, 64, 128);
    let pattern = Pattern::default();

    let out = encode(&cover, &pattern, b"header driven").unwrap();
    // No data_len supplied: the header carries it.
    let recovered = decode(&out.image, &pattern, &DecodeOptions::default()).unwrap();
    assert_eq!(recovered, b"header driven");
}

#[test]
fn embedded_pattern_survives_a_default_decode() {
    // Encode under a distinctly non-default data pattern, with the pattern
    // descriptor written into the header.
    let cover = PixelImage::filled(ImageMode::Rgba, 64, 64, 128);
    let pattern = Pattern {
        channels: ChannelSelect::Subset(vec![Channel::R, Channel::B]),
        bit_frequency: 2,
        byte_spacing: 2,
        hash_check: HashCheck::Md5,
        repetitive_redundancy: 3,
        header: HeaderSpec { write_pattern: true, ..HeaderSpec::default() },
        ..Pattern::default()
    };

    let out = encode(&cover, &pattern, b"discover me").unwrap();

    // The receiver knows nothing but the default pattern.
    let recovered = decode(&out.image, &Pattern::default(), &DecodeOptions::default()).unwrap();
    assert_eq!(recovered, b"discover me");
}

#[test]
fn header_at_image_end() {
    let cover = PixelImage::filled(ImageMode::Rgb, 32, 32, 91);
    let pattern = Pattern {
        hash_check: HashCheck::None,
        advanced_redundancy: AdvancedRedundancy::None,
        header: HeaderSpec {
            position: HeaderPosition::End,
            ..HeaderSpec::default()
        },
        ..Pattern::default()
    };

    let out = encode(&cover, &pattern, b"tail header").unwrap();
    let recovered = decode(&out.image, &pattern, &DecodeOptions::default()).unwrap();
    assert_eq!(recovered, b"tail header");
}

#[test]
fn header_at_custom_position() {
    let cover = PixelImage::filled(ImageMode::Rgb, 32, 32, 128);
    let pattern = Pattern {
        hash_check: HashCheck::None,
        advanced_redundancy: AdvancedRedundancy::None,
        header: HeaderSpec {
            position: HeaderPosition::Custom { x: 0, y: 16 },
            write_pattern: true,
            repetitive_redundancy: 1,
            ..HeaderSpec::default()
        },
        ..Pattern::default()
    };

    let out = encode(&cover, &pattern, b"custom spot").unwrap();
    let recovered = decode(&out.image, &pattern, &DecodeOptions::default()).unwrap();
    assert_eq!(recovered, b"custom spot");
}

#[test]
fn custom_position_outside_image_rejected() {
    let cover = PixelImage::filled(ImageMode::Rgb, 32, 32, 128);
    let pattern = Pattern {
        header: HeaderSpec {
            position: HeaderPosition::Custom { x: 50, y: 0 },
            ..HeaderSpec::default()
        },
        ..Pattern::default()
    };
    assert!(matches!(
        encode(&cover, &pattern, b"x"),
        Err(StegoError::InvalidPattern(_))
    ));
}

#[test]
fn corrupt_header_without_fallback_fails() {
    let cover = PixelImage::filled(ImageMode::Rgba, 64, 64, 128);
    let pattern = Pattern { offset: 560, ..Pattern::default() };
    let out = encode(&cover, &pattern, b"fallback").unwrap();

    // The default header lives in the alpha channel at the image start,
    // byte i of the framed header in pixels 8i..8i+8. Inverting the first
    // 24 alpha LSBs corrupts 3 of the 5 repetition copies of the magic's
    // first byte — beyond what voting can heal.
    let mut broken = out.image.clone();
    for pixel in 0..24 {
        let s = broken.sample(pixel, 3);
        broken.set_sample(pixel, 3, s ^ 1);
    }

    assert!(matches!(
        decode(&broken, &pattern, &DecodeOptions::default()),
        Err(StegoError::HeaderCorrupt)
    ));

    // With the provided pattern enforced and the length supplied
    // out-of-band, the data region (placed past the header at offset 560)
    // is still recoverable.
    let opts = DecodeOptions {
        data_len: Some(out.body_len),
        enforce_provided_pattern: true,
        allow_blind_scan: false,
    };
    assert_eq!(decode(&broken, &pattern, &opts).unwrap(), b"fallback");
}

#[test]
fn enforced_pattern_overrides_header_values() {
    let cover = PixelImage::filled(ImageMode::Rgba, 64, 64, 128);
    let pattern = Pattern::default();
    let out = encode(&cover, &pattern, b"enforced").unwrap();

    // Header present and readable, but the caller pins its own values.
    let opts = DecodeOptions {
        data_len: Some(out.body_len),
        enforce_provided_pattern: true,
        allow_blind_scan: false,
    };
    assert_eq!(decode(&out.image, &pattern, &opts).unwrap(), b"enforced");
}

#[test]
fn header_needs_room() {
    // The default header needs 560 pixels in a 16-pixel image.
    let cover = PixelImage::filled(ImageMode::Rgba, 4, 4, 128);
    assert!(matches!(
        encode(&cover, &Pattern::default(), b"x"),
        Err(StegoError::CapacityExceeded { .. })
    ));
}

#[test]
fn data_size_only_header_needs_its_pattern() {
    // write_pattern is off: the header reveals the length but the data
    // placement still comes from the caller, and a matching pattern
    // decodes while a disagreeing one does not return the payload.
    let cover = PixelImage::filled(ImageMode::Rgba, 64, 64, 128);
    let pattern = Pattern {
        bit_frequency: 2,
        hash_check: HashCheck::Sha256,
        ..Pattern::default()
    };
    let out = encode(&cover, &pattern, b"needs pattern").unwrap();

    assert_eq!(
        decode(&out.image, &pattern, &DecodeOptions::default()).unwrap(),
        b"needs pattern"
    );

    let wrong = Pattern { bit_frequency: 1, ..pattern.clone() };
    assert!(decode(&out.image, &wrong, &DecodeOptions::default()).is_err());
}
