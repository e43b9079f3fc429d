// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pixveil

//! Repetition coding with bit-wise majority voting.
//!
//! Each unit of the post-ECC stream is written `r` times consecutively:
//! a unit is one byte in byte-per-byte mode, or one ECC block (the whole
//! stream when ECC is off) in block mode. Extraction votes every bit
//! position across the `r` copies; a strict majority of ones yields 1, so
//! ties — possible only for even `r` — resolve to 0.

/// Expanded length of `len` input bytes under repetition factor `r`.
/// Identical for both unit granularities.
pub fn expanded_len(len: usize, r: usize) -> usize {
    len * r
}

/// Repeat every byte `r` times in a row.
pub fn expand_bytes(data: &[u8], r: usize) -> Vec<u8> {
    if r <= 1 {
        return data.to_vec();
    }
    let mut out = Vec::with_capacity(data.len() * r);
    for &byte in data {
        out.resize(out.len() + r, byte);
    }
    out
}

/// Repeat every unit `r` times in a row. `unit_lens` partitions `data`
/// exactly (the final ECC block may be shorter than the rest).
pub fn expand_units(data: &[u8], unit_lens: &[usize], r: usize) -> Vec<u8> {
    if r <= 1 {
        return data.to_vec();
    }
    debug_assert_eq!(unit_lens.iter().sum::<usize>(), data.len());
    let mut out = Vec::with_capacity(data.len() * r);
    let mut pos = 0;
    for &len in unit_lens {
        let unit = &data[pos..pos + len];
        for _ in 0..r {
            out.extend_from_slice(unit);
        }
        pos += len;
    }
    out
}

/// Bit-wise majority vote over `r` consecutive copies of one unit.
/// Copies past the end of `data` are skipped (a truncated tail read still
/// votes with whatever copies are present).
fn vote_unit(data: &[u8], start: usize, unit_len: usize, r: usize, out: &mut Vec<u8>) {
    for byte_idx in 0..unit_len {
        let mut ones = [0usize; 8];
        let mut copies = 0usize;
        for copy in 0..r {
            let idx = start + copy * unit_len + byte_idx;
            if idx >= data.len() {
                break;
            }
            copies += 1;
            let b = data[idx];
            for (bit, count) in ones.iter_mut().enumerate() {
                *count += ((b >> bit) & 1) as usize;
            }
        }
        let mut byte = 0u8;
        for (bit, &count) in ones.iter().enumerate() {
            if count * 2 > copies {
                byte |= 1 << bit;
            }
        }
        out.push(byte);
    }
}

/// Collapse a byte-per-byte repeated stream back to `out_len` bytes.
pub fn collapse_bytes(data: &[u8], out_len: usize, r: usize) -> Vec<u8> {
    if r <= 1 {
        return data[..out_len.min(data.len())].to_vec();
    }
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        vote_unit(data, i * r, 1, r, &mut out);
    }
    out
}

/// Collapse a unit-repeated stream back to its units.
pub fn collapse_units(data: &[u8], unit_lens: &[usize], r: usize) -> Vec<u8> {
    if r <= 1 {
        let total: usize = unit_lens.iter().sum();
        return data[..total.min(data.len())].to_vec();
    }
    let mut out = Vec::with_capacity(unit_lens.iter().sum());
    let mut pos = 0;
    for &len in unit_lens {
        vote_unit(data, pos, len, r, &mut out);
        pos += len * r;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_mode_layout() {
        assert_eq!(expand_bytes(&[0xAB, 0xCD], 3), vec![0xAB, 0xAB, 0xAB, 0xCD, 0xCD, 0xCD]);
        assert_eq!(expand_bytes(&[1, 2], 1), vec![1, 2]);
    }

    #[test]
    fn unit_mode_layout() {
        let data = [1u8, 2, 3, 4, 5];
        let out = expand_units(&data, &[3, 2], 2);
        assert_eq!(out, vec![1, 2, 3, 1, 2, 3, 4, 5, 4, 5]);
    }

    #[test]
    fn byte_mode_roundtrip_clean() {
        let data: Vec<u8> = (0..=255).collect();
        for r in [1usize, 2, 3, 5] {
            let expanded = expand_bytes(&data, r);
            assert_eq!(expanded.len(), expanded_len(data.len(), r));
            assert_eq!(collapse_bytes(&expanded, data.len(), r), data, "r={r}");
        }
    }

    #[test]
    fn unit_mode_roundtrip_clean() {
        let data: Vec<u8> = (0..100u8).collect();
        let units = [40usize, 40, 20];
        for r in [1usize, 3, 4] {
            let expanded = expand_units(&data, &units, r);
            assert_eq!(collapse_units(&expanded, &units, r), data, "r={r}");
        }
    }

    #[test]
    fn majority_heals_minority_corruption() {
        // r = 5: any 2 corrupted copies per byte lose the vote.
        let data = [0x41u8, 0x99];
        let mut expanded = expand_bytes(&data, 5);
        expanded[0] ^= 0xFF; // copies 0 and 3 of byte 0
        expanded[3] ^= 0x81;
        expanded[6] ^= 0x01; // copy 1 of byte 1
        assert_eq!(collapse_bytes(&expanded, 2, 5), data);
    }

    #[test]
    fn bitwise_vote_is_per_bit() {
        // Three copies, each corrupted in a different bit; every bit still
        // has a 2-of-3 majority.
        let data = [0b1010_1010u8];
        let mut expanded = expand_bytes(&data, 3);
        expanded[0] ^= 0b0000_0001;
        expanded[1] ^= 0b0001_0000;
        expanded[2] ^= 0b1000_0000;
        assert_eq!(collapse_bytes(&expanded, 1, 3), data);
    }

    #[test]
    fn even_r_ties_vote_zero() {
        // r = 2 with disagreeing copies: every disputed bit drops to 0.
        let expanded = [0b1111_0000u8, 0b1010_0000];
        assert_eq!(collapse_bytes(&expanded, 1, 2), vec![0b1010_0000]);
    }

    #[test]
    fn block_unit_corruption_heals() {
        // One unit of 4 bytes, repeated 3 times; corrupt one whole copy.
        let data = [1u8, 2, 3, 4];
        let mut expanded = expand_units(&data, &[4], 3);
        for b in &mut expanded[4..8] {
            *b = !*b;
        }
        assert_eq!(collapse_units(&expanded, &[4], 3), data);
    }
}
