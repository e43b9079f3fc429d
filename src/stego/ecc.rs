// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/pixveil

//! Reed-Solomon error correction over GF(2^8).
//!
//! Implements systematic RS(255, 255-nsym) with the primitive polynomial
//! 0x11D (x^8+x^4+x^3+x^2+1) and Berlekamp-Massey decoding with Chien search
//! and the Forney algorithm. The parity count comes from the pattern's
//! correction factor, so any even or odd value in 0..=254 must work; the
//! generator polynomial is built once per stream, not per block. Payloads
//! shorter than a full block use shortened codes (virtual zero padding at
//! the block front).
//!
//! Decoding never aborts the stream: a block whose correction capacity is
//! exhausted is passed through uncorrected and counted, and the caller
//! decides whether that surfaces as an integrity failure or as
//! best-effort bytes.

use log::warn;
use std::sync::OnceLock;

/// Primitive polynomial for GF(2^8).
const PRIM_POLY: u16 = 0x11D;

/// Full Reed-Solomon block length (data + parity symbols).
pub const BLOCK_LEN: usize = 255;

// --- GF(2^8) arithmetic ---

/// Log/exp tables; exp is doubled for wrap-free modular indexing.
struct Field {
    exp: [u8; 512],
    log: [u8; 256],
}

fn field() -> &'static Field {
    static FIELD: OnceLock<Field> = OnceLock::new();
    FIELD.get_or_init(|| {
        let mut exp = [0u8; 512];
        let mut log = [0u8; 256];
        let mut x: u16 = 1;
        for i in 0..255u16 {
            exp[i as usize] = x as u8;
            exp[(i + 255) as usize] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & 0x100 != 0 {
                x ^= PRIM_POLY;
            }
        }
        exp[510] = exp[0];
        exp[511] = exp[1];
        Field { exp, log }
    })
}

#[inline]
fn gf_mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let f = field();
    f.exp[f.log[a as usize] as usize + f.log[b as usize] as usize]
}

/// Multiplicative inverse; `a` must be nonzero.
#[inline]
fn gf_inv(a: u8) -> u8 {
    debug_assert_ne!(a, 0);
    let f = field();
    f.exp[255 - f.log[a as usize] as usize]
}

/// α^i for i in 0..255.
#[inline]
fn alpha_pow(i: usize) -> u8 {
    field().exp[i % 255]
}

/// α^-i.
#[inline]
fn alpha_pow_neg(i: usize) -> u8 {
    field().exp[(255 - (i % 255)) % 255]
}

/// Evaluate a polynomial with poly[0] the highest-degree coefficient.
fn eval_desc(poly: &[u8], x: u8) -> u8 {
    poly.iter().fold(0, |acc, &c| gf_mul(acc, x) ^ c)
}

/// Evaluate a polynomial in ascending-power order.
fn eval_asc(poly: &[u8], x: u8) -> u8 {
    let mut acc = 0u8;
    let mut x_pow = 1u8;
    for &c in poly {
        acc ^= gf_mul(c, x_pow);
        x_pow = gf_mul(x_pow, x);
    }
    acc
}

/// Generator polynomial g(x) = prod_{i=0}^{parity-1} (x - α^i),
/// highest-degree coefficient first.
fn generator_poly(parity: usize) -> Vec<u8> {
    let mut g = vec![1u8];
    for i in 0..parity {
        let root = alpha_pow(i);
        let mut next = vec![0u8; g.len() + 1];
        for (j, &c) in g.iter().enumerate() {
            next[j] ^= c;
            next[j + 1] ^= gf_mul(c, root);
        }
        g = next;
    }
    g
}

// --- Block geometry ---

/// Data symbols per full block for a given parity count.
pub fn data_per_block(parity: usize) -> usize {
    BLOCK_LEN - parity
}

/// Encoded length of a `data_len`-byte stream under `parity`.
pub fn encoded_len(data_len: usize, parity: usize) -> usize {
    if parity == 0 {
        return data_len;
    }
    let k = data_per_block(parity);
    let full = data_len / k;
    let rem = data_len % k;
    full * BLOCK_LEN + if rem > 0 { rem + parity } else { 0 }
}

/// Encoded block sizes of a `data_len`-byte stream, in order. The final
/// block may be shortened. With parity 0 (ECC off) the whole stream is one
/// block — the unit the block-wise repetition code uses.
pub fn block_lens(data_len: usize, parity: usize) -> Vec<usize> {
    if data_len == 0 {
        return Vec::new();
    }
    if parity == 0 {
        return vec![data_len];
    }
    let k = data_per_block(parity);
    let full = data_len / k;
    let rem = data_len % k;
    let mut lens = vec![BLOCK_LEN; full];
    if rem > 0 {
        lens.push(rem + parity);
    }
    lens
}

// --- Encoding ---

/// Parity symbols for one data block (systematic LFSR division).
fn block_parity(data: &[u8], gpoly: &[u8], parity: usize) -> Vec<u8> {
    let mut reg = vec![0u8; parity];
    for &byte in data {
        let feedback = byte ^ reg[0];
        for j in 0..parity - 1 {
            reg[j] = reg[j + 1] ^ gf_mul(feedback, gpoly[j + 1]);
        }
        reg[parity - 1] = gf_mul(feedback, gpoly[parity]);
    }
    reg
}

/// RS-encode a stream, splitting into blocks of `255 - parity` data bytes.
/// Each block is emitted as data followed by its parity symbols; the final
/// block may be shortened. Parity 0 is the identity.
pub fn encode_blocks(data: &[u8], parity: usize) -> Vec<u8> {
    if parity == 0 {
        return data.to_vec();
    }
    let gpoly = generator_poly(parity);
    let k = data_per_block(parity);
    let mut out = Vec::with_capacity(encoded_len(data.len(), parity));
    for chunk in data.chunks(k) {
        out.extend_from_slice(chunk);
        out.extend_from_slice(&block_parity(chunk, &gpoly, parity));
    }
    out
}

// --- Decoding ---

/// Berlekamp-Massey: error locator sigma(x) in ascending-power order.
fn berlekamp_massey(syndromes: &[u8]) -> Vec<u8> {
    let n = syndromes.len();
    let mut c = vec![0u8; n + 1];
    c[0] = 1;
    let mut c_len = 1usize;
    let mut b = vec![0u8; n + 1];
    b[0] = 1;
    let mut b_len = 1usize;
    let mut ell = 0usize;
    let mut prev_delta = 1u8;
    let mut m = 1usize;

    for r in 0..n {
        let mut delta = syndromes[r];
        for i in 1..c_len {
            delta ^= gf_mul(c[i], syndromes[r - i]);
        }
        if delta == 0 {
            m += 1;
            continue;
        }

        let factor = gf_mul(delta, gf_inv(prev_delta));
        if 2 * ell <= r {
            let old_c = c.clone();
            let old_c_len = c_len;
            c_len = (b_len + m).max(c_len);
            for j in 0..b_len {
                c[j + m] ^= gf_mul(factor, b[j]);
            }
            b[..old_c_len].copy_from_slice(&old_c[..old_c_len]);
            for slot in b.iter_mut().skip(old_c_len) {
                *slot = 0;
            }
            b_len = old_c_len;
            ell = r + 1 - ell;
            prev_delta = delta;
            m = 1;
        } else {
            c_len = (b_len + m).max(c_len);
            for j in 0..b_len {
                c[j + m] ^= gf_mul(factor, b[j]);
            }
            m += 1;
        }
    }

    c[..c_len].to_vec()
}

/// Chien search over the full 255-symbol block. Returns (gf position,
/// array index) pairs, or `None` if the root count disagrees with the
/// locator degree.
fn chien_search(sigma: &[u8]) -> Option<Vec<(usize, usize)>> {
    let num_errors = sigma.len() - 1;
    let mut found = Vec::with_capacity(num_errors);
    for p in 0..BLOCK_LEN {
        let x = if p == 0 { 1 } else { alpha_pow_neg(p) };
        if eval_asc(sigma, x) == 0 {
            found.push((p, BLOCK_LEN - 1 - p));
        }
    }
    (found.len() == num_errors).then_some(found)
}

/// Forney error magnitudes for the located positions (FCR = 0).
fn forney(sigma: &[u8], syndromes: &[u8], found: &[(usize, usize)]) -> Vec<u8> {
    let two_t = syndromes.len();

    // Omega(x) = S(x) * sigma(x) mod x^{2t}, ascending power.
    let mut omega = vec![0u8; two_t];
    for (i, &sc) in sigma.iter().enumerate().take(two_t) {
        for (j, &sy) in syndromes.iter().enumerate() {
            if i + j < two_t {
                omega[i + j] ^= gf_mul(sc, sy);
            }
        }
    }

    // Formal derivative: in GF(2^m) only odd-power terms survive.
    let mut sigma_prime = vec![0u8; sigma.len().saturating_sub(1)];
    for i in (1..sigma.len()).step_by(2) {
        sigma_prime[i - 1] = sigma[i];
    }

    found
        .iter()
        .map(|&(gf_pos, _)| {
            let x = if gf_pos == 0 { 1 } else { alpha_pow(gf_pos) };
            let x_inv = if gf_pos == 0 { 1 } else { alpha_pow_neg(gf_pos) };
            let denom = eval_asc(&sigma_prime, x_inv);
            if denom == 0 {
                0
            } else {
                gf_mul(x, gf_mul(eval_asc(&omega, x_inv), gf_inv(denom)))
            }
        })
        .collect()
}

/// Correct one received block in place of its virtual 255-symbol form.
/// Returns the corrected data portion and the number of symbol errors,
/// or `None` when correction capacity is exhausted.
fn decode_block(received: &[u8], data_len: usize, parity: usize) -> Option<(Vec<u8>, usize)> {
    let padding = BLOCK_LEN - received.len();
    let mut block = vec![0u8; BLOCK_LEN];
    block[padding..].copy_from_slice(received);

    let mut syndromes = vec![0u8; parity];
    for (i, s) in syndromes.iter_mut().enumerate() {
        *s = eval_desc(&block, alpha_pow(i));
    }
    if syndromes.iter().all(|&s| s == 0) {
        return Some((received[..data_len].to_vec(), 0));
    }

    let sigma = berlekamp_massey(&syndromes);
    let num_errors = sigma.len() - 1;
    if num_errors > parity / 2 {
        return None;
    }

    let found = chien_search(&sigma)?;
    let magnitudes = forney(&sigma, &syndromes, &found);

    for (i, &(_, pos)) in found.iter().enumerate() {
        if pos < padding {
            // An "error" in the virtual padding of a shortened code means
            // the locator is bogus.
            return None;
        }
        block[pos] ^= magnitudes[i];
    }

    // Re-check: a miscorrection must not pass as success.
    for i in 0..parity {
        if eval_desc(&block, alpha_pow(i)) != 0 {
            return None;
        }
    }

    Some((block[padding..padding + data_len].to_vec(), num_errors))
}

/// Statistics from decoding a stream of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RsStats {
    /// Symbol errors corrected across all blocks.
    pub corrected: usize,
    /// Blocks whose correction capacity was exhausted.
    pub corrupt_blocks: usize,
    /// Blocks processed.
    pub blocks: usize,
}

/// Decode a stream produced by [`encode_blocks`].
///
/// Corrupt blocks are passed through uncorrected (their data portion as
/// received) and counted in [`RsStats::corrupt_blocks`]; the stream result
/// is always `data_len` bytes so hash verification can run over it.
pub fn decode_blocks(received: &[u8], data_len: usize, parity: usize) -> (Vec<u8>, RsStats) {
    if parity == 0 {
        let n = data_len.min(received.len());
        return (received[..n].to_vec(), RsStats::default());
    }

    let k = data_per_block(parity);
    let mut out = Vec::with_capacity(data_len);
    let mut stats = RsStats::default();
    let mut offset = 0;
    let mut remaining = data_len;

    while remaining > 0 {
        let chunk_data = remaining.min(k);
        let block_len = chunk_data + parity;
        let end = (offset + block_len).min(received.len());
        let block = &received[offset..end];
        stats.blocks += 1;

        if block.len() < block_len {
            // Truncated stream; keep whatever data bytes are present.
            stats.corrupt_blocks += 1;
            out.extend_from_slice(&block[..block.len().min(chunk_data)]);
            out.resize(out.len() + chunk_data.saturating_sub(block.len()), 0);
        } else {
            match decode_block(block, chunk_data, parity) {
                Some((data, errors)) => {
                    stats.corrected += errors;
                    out.extend_from_slice(&data);
                }
                None => {
                    stats.corrupt_blocks += 1;
                    out.extend_from_slice(&block[..chunk_data]);
                }
            }
        }

        offset += block_len;
        remaining -= chunk_data;
    }

    if stats.corrupt_blocks > 0 {
        warn!(
            "reed-solomon: {}/{} blocks beyond correction capacity",
            stats.corrupt_blocks, stats.blocks
        );
    }
    (out, stats)
}
