//! Reed-Solomon error correction over GF(2^8) as used by QR symbols, and the
//! block splitting/interleaving of the final codeword sequence (7.5 and 7.6).

use crate::config::{ECCLevel, Version};
use crate::tables::lookup_capacity;

// x^8 + x^4 + x^3 + x^2 + 1
const REDUCING_POLYNOMIAL: u16 = 0x11D;

struct GaloisTables {
    exp: [u8; 256],
    log: [u8; 256],
}

lazy_static! {
    static ref GF: GaloisTables = {
        let mut exp = [0u8; 256];
        let mut log = [0u8; 256];
        let mut value: u16 = 1;
        for (power, entry) in exp.iter_mut().enumerate().take(255) {
            *entry = value as u8;
            log[value as usize] = power as u8;
            value <<= 1;
            if value & 0x100 != 0 {
                value ^= REDUCING_POLYNOMIAL;
            }
        }
        exp[255] = exp[0];
        GaloisTables { exp, log }
    };
}

fn gf_mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let sum = GF.log[a as usize] as usize + GF.log[b as usize] as usize;
    GF.exp[sum % 255]
}

/// Coefficients of prod (x - a^i) for i in 0..degree, highest power first,
/// without the leading 1.
fn generator_polynomial(degree: usize) -> Vec<u8> {
    let mut coefficients = vec![0u8; degree];
    coefficients[degree - 1] = 1;

    let mut root: u8 = 1;
    for _ in 0..degree {
        for j in 0..degree {
            coefficients[j] = gf_mul(coefficients[j], root);
            if j + 1 < degree {
                coefficients[j] ^= coefficients[j + 1];
            }
        }
        root = gf_mul(root, 0x02);
    }
    coefficients
}

/// Compute the `ecc_len` error correction codewords for one block of data
/// codewords: the remainder of data(x) * x^ecc_len divided by the generator.
pub fn compute_ecc(data: &[u8], ecc_len: usize) -> Vec<u8> {
    let divisor = generator_polynomial(ecc_len);
    let mut remainder = vec![0u8; ecc_len];
    for &word in data {
        let factor = word ^ remainder[0];
        remainder.rotate_left(1);
        remainder[ecc_len - 1] = 0;
        for (r, &d) in remainder.iter_mut().zip(&divisor) {
            *r ^= gf_mul(d, factor);
        }
    }
    remainder
}

/// Split the data codewords into the blocks of the symbol configuration,
/// compute the error correction codewords of every block and interleave both.
///
/// Returns the interleaved data codewords and the interleaved error correction
/// codewords, in the order they are placed into the symbol.
pub fn construct_codewords(data: &[u8], version: Version, ecl: ECCLevel) -> (Vec<u8>, Vec<u8>) {
    let capacity = lookup_capacity(version, ecl);
    debug_assert_eq!(data.len(), capacity.data_codewords as usize, "data must fill the symbol exactly");

    let num_blocks = capacity.blocks as usize;
    let ecc_len = capacity.ecc_per_block as usize;
    // short blocks come first, the remaining ones carry one data codeword more
    let short_len = data.len() / num_blocks;
    let num_long = data.len() % num_blocks;
    let num_short = num_blocks - num_long;

    let mut blocks: Vec<&[u8]> = Vec::with_capacity(num_blocks);
    let mut rest = data;
    for i in 0..num_blocks {
        let len = if i < num_short { short_len } else { short_len + 1 };
        let (block, tail) = rest.split_at(len);
        blocks.push(block);
        rest = tail;
    }

    let ecc_blocks: Vec<Vec<u8>> = blocks.iter().map(|block| compute_ecc(block, ecc_len)).collect();

    let data_words = interleave(blocks.iter().copied(), short_len + 1, data.len());
    let ecc_words = interleave(ecc_blocks.iter().map(Vec::as_slice), ecc_len, ecc_len * num_blocks);
    (data_words, ecc_words)
}

/// Take the first codeword of every block, then the second of every block and
/// so on, skipping blocks that are already exhausted.
fn interleave<'a>(blocks: impl Iterator<Item = &'a [u8]> + Clone, max_len: usize, total: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(total);
    for i in 0..max_len {
        out.extend(blocks.clone().filter_map(|block| block.get(i)));
    }
    out
}
