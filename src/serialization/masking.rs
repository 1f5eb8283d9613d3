use super::*;

use image;
use itertools::Itertools;


/// Return the masking function for the given pattern index 0..8. The returned
/// function takes i,j (i row coord, j column coord) and says whether the
/// module there gets flipped.
fn get_masking_function(pattern_index: u8) -> fn(u32, u32) -> bool {
    match pattern_index & 0b111 {
        0b000 => | i,  j| { (i + j) % 2 == 0 },
        0b001 => | i, _j| { i % 2 == 0 },
        0b010 => |_i,  j| { j % 3 == 0 },
        0b011 => | i,  j| { (i + j) % 3 == 0 },
        0b100 => | i,  j| { (i / 2 + j / 3) % 2 == 0 },
        0b101 => | i,  j| { (i * j) % 2 + (i * j) % 3 == 0 },
        0b110 => | i,  j| { ((i * j) % 2 + (i * j) % 3) % 2 == 0 },
        _     => | i,  j| { ((i + j) % 2 + (i * j) % 3) % 2 == 0 },
    }
}


/// apply mask to given symbol's encoding region. The last parameter is the canvas
/// without content, to mark the encoding region inside the symbol.
pub fn apply_mask(symbol: &mut image::GrayImage, pattern: u8, marker: &image::GrayImage) {
    // get masking function
    let pattern_func = get_masking_function(pattern);

    // iterate over symbol
    for (x, y, pix) in symbol.enumerate_pixels_mut() {
        // check if we are in the encoding region. Ignore all other pixels
        if marker[(x, y)] == MARKER_ENCODING_REGION && pattern_func(y, x) {
            // flipping where the mask bit is set is a XOR between mask and value bits.
            *pix = if *pix == BIT_BLACK { BIT_WHITE } else { BIT_BLACK };
        }
    }
}

const PENALTY_N1: u32 = 3;
const PENALTY_N2: u32 = 3;
const PENALTY_N3: u32 = 40;
const PENALTY_N4: u32 = 10;

// dark-light-dark-dark-dark-light-dark with four light modules on either side
const FINDER_LIKE_BEFORE: [bool; 11] = [false, false, false, false, true, false, true, true, true, false, true];
const FINDER_LIKE_AFTER: [bool; 11] = [true, false, true, true, true, false, true, false, false, false, false];

/// Penalty for one row or column of modules (true is dark): runs of five or
/// more same colored modules, and finder-like patterns. Modules beyond the
/// symbol edge count as light.
fn line_penalty(line: &[bool]) -> u32 {
    let mut score = 0;

    for (run, _) in line.iter().dedup_with_count() {
        if run >= 5 {
            score += PENALTY_N1 + (run as u32 - 5);
        }
    }

    let padded: Vec<bool> = std::iter::repeat(false).take(4)
        .chain(line.iter().copied())
        .chain(std::iter::repeat(false).take(4))
        .collect();
    for window in padded.windows(11) {
        if window == FINDER_LIKE_BEFORE || window == FINDER_LIKE_AFTER {
            score += PENALTY_N3;
        }
    }

    score
}

/// Compute penalty score for a symbol with mask and format information applied.
fn compute_mask_penalty_score(masked_symbol: &image::GrayImage) -> u32 {
    let size = masked_symbol.width();
    let dark = |x: u32, y: u32| masked_symbol[(x, y)] == BIT_BLACK;

    // FIRST and THIRD feature: adjacent modules of same color and finder-like
    // patterns, along all rows and columns
    let mut score: u32 = (0..size)
        .map(|y| line_penalty(&(0..size).map(|x| dark(x, y)).collect::<Vec<_>>()))
        .sum();
    score += (0..size)
        .map(|x| line_penalty(&(0..size).map(|y| dark(x, y)).collect::<Vec<_>>()))
        .sum::<u32>();

    // SECOND FEATURE: penalties for 2x2 module blocks of same color
    for y in 0..size-1 {
        for x in 0..size-1 {
            let c = dark(x, y);
            if c == dark(x+1, y) && c == dark(x, y+1) && c == dark(x+1, y+1) {
                score += PENALTY_N2;
            }
        }
    }

    // FOURTH FEATURE: dark/light ratio balance
    {
        let total = (size * size) as u64;
        let num_dark_modules = masked_symbol.pixels().filter(|&&px| px == BIT_BLACK).count() as u64;
        // number of full 5% steps by which the ratio deviates from 50%
        let deviation = (num_dark_modules * 20).abs_diff(total * 10);
        let step = (deviation / total) as u32;
        score += PENALTY_N4 * step;
    }

    score
}

/// Compute best mask and apply it.
/// Will evaluate all eight masks for the given symbol, with the matching format
/// information drawn in, and return the code of the mask with the lowest
/// penalty together with the resulting masked symbol. Ties go to the lower code.
pub fn apply_best_mask(unmasked_symbol: &image::GrayImage, version: Version, ecl: ECCLevel) -> (u8, image::GrayImage) {
    let canvas = create_qr_canvas(version);
    (0..8)
        .map(|index| {
            let mut masked_copy = unmasked_symbol.clone();
            apply_mask(&mut masked_copy, index, &canvas);
            insert_format_info(&mut masked_copy, ecl, index);
            let score = compute_mask_penalty_score(&masked_copy);
            (index, masked_copy, score)
        })
        .min_by_key(|data| data.2)  // mask with lowest score is best
        .map(|(index, masked, _)| (index, masked))
        .unwrap_or_else(|| (0, unmasked_symbol.clone()))
}
