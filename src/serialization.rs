use bitstream_io::{BigEndian, BitRead, BitReader};
use image;

use std::cmp;
use std::io::{self, Cursor, Read};

use crate::config::{ECCLevel, Version};

// CONSTANTS
pub const MARKER_ENCODING_REGION: image::Luma<u8> = image::Luma([100u8]);
pub const MARKER_FORMAT_INFORMATION: image::Luma<u8> = image::Luma([120u8]);
pub const MARKER_VERSION_INFORMATION: image::Luma<u8> = image::Luma([140u8]);

pub const BIT_WHITE: image::Luma<u8> = image::Luma([255u8]);
pub const BIT_BLACK: image::Luma<u8> = image::Luma([0u8]);


pub mod masking;

/// Creates a finder pattern image (concentric squares
/// including the white separator around the finder
/// pattern)
fn create_finder_pattern() -> image::GrayImage {
    image::GrayImage::from_fn(9,9, |x, y| {
        let r = cmp::max((x as i32 - 4).abs(), (y as i32 - 4).abs());
        if r < 2 || r == 3 {
            BIT_BLACK
        } else {
            BIT_WHITE
        }
    })
}

/// Creates an alignment pattern image
fn create_alignment_pattern() -> image::GrayImage {
    image::GrayImage::from_fn(5, 5, |x, y| {
        let r = cmp::max((x as i32 - 2).abs(), (y as i32 - 2).abs());
        if r % 2 == 0 {
            BIT_BLACK
        } else {
            BIT_WHITE
        }
    })
}

/// Creates a vector with alignment coordinates, i.e. the
/// numbers from the row of the table E.1 in Annex E
fn create_alignment_pattern_coord_list(version: u8) -> Vec<i64> {
    let v = version as i64;
    let mut row = vec![6];
    match version {
        2..=6 => row.push((v - 2) * 4 + 18),
        7..=13 => {
            row.push((v - 7) * 2 + 22);
            row.push((v - 7) * 4 + 38);
        }
        14..=20 => {
            let a = ((v - 14) / 3) * 4 + 26;
            let b = (v - 14) * 4 + 66;
            row.extend_from_slice(&[a, (a + b) / 2, b]);
        }
        21..=27 => {
            let first = match version {
                21 | 24 => 28,
                22 => 26,
                23 | 26 => 30,
                25 => 32,
                _ => 34,
            };
            let b = ((v - 21) / 2) * 4 + 50;
            let d = (v - 21) * 4 + 94;
            row.extend_from_slice(&[first, b, (b + d) / 2, d]);
        }
        28..=34 => row.extend_from_slice(match version {
            28 => &[26, 50, 74, 98, 122],
            29 => &[30, 54, 78, 102, 126],
            30 => &[26, 52, 78, 104, 130],
            31 => &[30, 56, 82, 108, 134],
            32 => &[34, 60, 86, 112, 138],
            33 => &[30, 58, 86, 114, 142],
            _ => &[34, 62, 90, 118, 146],
        }),
        35..=40 => row.extend_from_slice(match version {
            35 => &[30, 54, 78, 102, 126, 150],
            36 => &[24, 50, 76, 102, 128, 154],
            37 => &[28, 54, 80, 106, 132, 158],
            38 => &[32, 58, 84, 110, 136, 162],
            39 => &[26, 54, 82, 110, 138, 166],
            _ => &[30, 58, 86, 114, 142, 170],
        }),
        // version 1 has no alignment patterns
        _ => return Vec::new(),
    }
    row
}


/// Creates a vector with alignment coordinate pairs (x,y),
/// from the entries returned by create_alignment_pattern_coord_list,
/// leaving out the three that would collide with the finder patterns.
fn get_alignment_pattern_points(version: u8) -> Vec<(i64, i64)> {
    let coords = create_alignment_pattern_coord_list(version);
    let last_coord_index = coords.len().saturating_sub(1);
    let mut points = Vec::new();
    for (i, &s) in coords.iter().enumerate() {
        for (j, &t) in coords.iter().enumerate() {
            if (i == 0 && j == 0) ||
               (i == 0 && j == last_coord_index) ||
               (i == last_coord_index && j == 0) {
                continue;
            }
            points.push((s, t));
        }
    }
    points
}

/// Return a basic QR image with all the functional patterns
/// painted in: the finder patterns, alignment patterns
/// and timing patterns. The canvas covers the symbol only, the
/// quiet zone is added when rendering.
///
/// During the assembly of the QR code pixel matrix
/// there are different value codes used as pixel values
/// to indicate pixels that will be filled in later.
/// As such those later stages can identify those pixels
/// easier. Final values are only 0 (black) and 255 (white).
/// All other values are codes, and are used in the following way:
///   100: the encoding region, which receives the binary code
///   120: marks the format information bits (stripes along finders),
///        2x 15 bits, plus the dark module
///   140: marks the version information bits (blocks near upper
///        right and lower left finder) 2x 18bits
///        (only present in codes of version 7 or up)
pub fn create_qr_canvas(version: Version) -> image::GrayImage {
    let s = version.dimensions();
    let last = s as i64;
    let mut mask = image::GrayImage::from_pixel(s, s, MARKER_ENCODING_REGION);

    // apply 3 finder patterns in top and left corners. their separators
    // hang over the symbol edge and get clipped
    let finder = create_finder_pattern();
    image::imageops::overlay(&mut mask, &finder, -1, -1);
    image::imageops::overlay(&mut mask, &finder, -1, last - 8);
    image::imageops::overlay(&mut mask, &finder, last - 8, -1);

    // mark timing patterns
    for i in 8..s-8 {
        let val = if i % 2 == 0 {BIT_BLACK} else {BIT_WHITE};
        mask[(6, i)] = val;
        mask[(i, 6)] = val;
    }

    // alignment patterns only for version >= 2
    let pattern = create_alignment_pattern();
    for (x, y) in get_alignment_pattern_points(version.number()) {
        // -2 from the pattern center offset
        image::imageops::overlay(&mut mask, &pattern, x - 2, y - 2);
    }

    // mark format bits
    for i in 0..6 {
        mask[(8, i)] = MARKER_FORMAT_INFORMATION;
        mask[(i, 8)] = MARKER_FORMAT_INFORMATION;
    }
    mask[(8, 7)] = MARKER_FORMAT_INFORMATION;
    mask[(7, 8)] = MARKER_FORMAT_INFORMATION;
    mask[(8, 8)] = MARKER_FORMAT_INFORMATION;
    for i in 0..8 {
        mask[(s-1-i, 8)] = MARKER_FORMAT_INFORMATION;
        mask[(8, s-1-i)] = MARKER_FORMAT_INFORMATION;
    }

    // mark version bits if applicable
    if version.number() >= 7 {
        for i in 0..6 {
            for j in 0..3 {
                mask[(i, s-9-j)] = MARKER_VERSION_INFORMATION;
                mask[(s-9-j, i)] = MARKER_VERSION_INFORMATION;
            }
        }
    }

    // return canvas
    mask
}


/// Insert the data into the encoding region of a QR canvas created by the create_qr_canvas function
///
/// Bits are placed in two module wide columns, starting in the lower right
/// corner and snaking upwards, then downwards in the next column pair, and so
/// on. The vertical timing pattern is skipped as a whole. Encoding region
/// cells left over after the last codeword are remainder bits and stay light.
pub fn insert_data_payload(canvas: &mut image::GrayImage, data_words: &[u8], ecc_words: &[u8]) -> io::Result<()> {
    let size = canvas.width() as i64;
    let total_bits = (data_words.len() + ecc_words.len()) * 8;

    let codewords = Cursor::new(data_words).chain(Cursor::new(ecc_words));
    let mut reader = BitReader::endian(codewords, BigEndian);
    let mut bits_written = 0;

    let mut x_right = size - 1;
    while x_right >= 1 {
        if x_right == 6 {
            x_right = 5;
        }
        let upward = ((x_right + 1) & 2) == 0;
        for step in 0..size {
            let y_cur = if upward { size - 1 - step } else { step };
            for x_cur in [x_right, x_right - 1] {
                let pix = &mut canvas[(x_cur as u32, y_cur as u32)];
                if *pix != MARKER_ENCODING_REGION {
                    continue;
                }
                *pix = if bits_written < total_bits {
                    bits_written += 1;
                    if reader.read_bit()? { BIT_BLACK } else { BIT_WHITE }
                } else {
                    BIT_WHITE
                };
            }
        }
        x_right -= 2;
    }

    if bits_written < total_bits {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "codewords exceed the encoding region"));
    }
    Ok(())
}

//-------------------------------------------------------------------
// FORMAT & VERSION INFO BITS
//-------------------------------------------------------------------
// lookup tables for the added 10 ECC bits plus XORing. See table C.1 in
// Annex C of the standard. The value of the 5 data bits is the index into
// the lookup table.

const FORMAT_INFOS_QR: [u16; 32] = [
    0x5412, 0x5125, 0x5e7c, 0x5b4b, 0x45f9, 0x40ce, 0x4f97, 0x4aa0, 0x77c4, 0x72f3, 0x7daa, 0x789d, 0x662f, 0x6318,
    0x6c41, 0x6976, 0x1689, 0x13be, 0x1ce7, 0x19d0, 0x0762, 0x0255, 0x0d0c, 0x083b, 0x355f, 0x3068, 0x3f31, 0x3a06,
    0x24b4, 0x2183, 0x2eda, 0x2bed,
];

// lookup table for version info bits, works similar to format info
static VERSION_INFOS: [u32; 34] = [
    0x07c94, 0x085bc, 0x09a99, 0x0a4d3, 0x0bbf6, 0x0c762, 0x0d847, 0x0e60d, 0x0f928, 0x10b78, 0x1145d, 0x12a17,
    0x13532, 0x149a6, 0x15683, 0x168c9, 0x177ec, 0x18ec4, 0x191e1, 0x1afab, 0x1b08e, 0x1cc1a, 0x1d33f, 0x1ed75,
    0x1f250, 0x209d5, 0x216f0, 0x228ba, 0x2379f, 0x24b0b, 0x2542e, 0x26a64, 0x27541, 0x28c69,
];


// coordinates in the QR symbol where to write format and version bits, most
// significant bit first. negative values count from the right/bottom edge.
static VERSION_INFO_COORDS_BL: [(i16, i16); 18] = [
    (5, -9), (5, -10), (5, -11),
    (4, -9), (4, -10), (4, -11),
    (3, -9), (3, -10), (3, -11),
    (2, -9), (2, -10), (2, -11),
    (1, -9), (1, -10), (1, -11),
    (0, -9), (0, -10), (0, -11),
];

static VERSION_INFO_COORDS_TR: [(i16, i16); 18] = [
    (-9, 5), (-10, 5), (-11, 5),
    (-9, 4), (-10, 4), (-11, 4),
    (-9, 3), (-10, 3), (-11, 3),
    (-9, 2), (-10, 2), (-11, 2),
    (-9, 1), (-10, 1), (-11, 1),
    (-9, 0), (-10, 0), (-11, 0),
];

static FORMAT_INFO_COORDS_QR_MAIN: [(i16, i16); 15] = [
    (0, 8), (1, 8), (2, 8), (3, 8), (4, 8), (5, 8), (7, 8), (8, 8),
    (8, 7), (8, 5), (8, 4), (8, 3), (8, 2), (8, 1), (8, 0),
];

static FORMAT_INFO_COORDS_QR_SIDE: [(i16, i16); 15] = [
    (8, -1), (8, -2), (8, -3), (8, -4), (8, -5), (8, -6), (8, -7), (-8, 8),
    (-7, 8), (-6, 8), (-5, 8), (-4, 8), (-3, 8), (-2, 8), (-1, 8),
];

// helper function to write format or version bits to given coordinates in QR code
// bits are the bits actually to be written (big-endian order), num_bits is how many
// bits to write. Obviously this function supports writing only up to 32 bits at a time
fn insert_bits_at(symbol: &mut image::GrayImage, bits: u32, num_bits: u32, coords: &[(i16, i16)]) {
    let mut mask = 1 << (num_bits - 1);
    let symbol_size = symbol.width() as i16;

    for &(xoff, yoff) in coords {
        let color = if (mask & bits) == 0 { BIT_WHITE } else { BIT_BLACK };
        let x = if xoff < 0 { xoff + symbol_size } else { xoff };
        let y = if yoff < 0 { yoff + symbol_size } else { yoff };
        symbol[(x as u32, y as u32)] = color;
        mask >>= 1;
    }
}


/// compute the 15bits long format bits "format info" specifier, which contains
/// information about the used mask and ECCLevel
fn compute_format_info_bits(ecl: ECCLevel, mask_pattern: u8) -> u16 {
    let data_bits = ((ecl.format_bits() << 3) | (mask_pattern & 0b111)) as usize;
    FORMAT_INFOS_QR[data_bits]
}

/// Compute and write format bits into symbol, together with the dark module
/// next to the lower left finder
pub fn insert_format_info(symbol: &mut image::GrayImage, ecl: ECCLevel, mask_pattern: u8) {
    let format_bits = compute_format_info_bits(ecl, mask_pattern);

    insert_bits_at(symbol, format_bits as u32, 15, &FORMAT_INFO_COORDS_QR_MAIN);
    insert_bits_at(symbol, format_bits as u32, 15, &FORMAT_INFO_COORDS_QR_SIDE);
    let s = symbol.height();
    symbol[(8, s - 8)] = BIT_BLACK;
}

/// Compute and insert version info bits into symbol
/// Only does something for >= version 7 symbols.
pub fn insert_version_info(symbol: &mut image::GrayImage, version: Version) {
    let i = version.number();
    if i >= 7 {
        let version_bits = VERSION_INFOS[(i-7) as usize];

        insert_bits_at(symbol, version_bits, 18, &VERSION_INFO_COORDS_BL);
        insert_bits_at(symbol, version_bits, 18, &VERSION_INFO_COORDS_TR);
    }
}


//-------------------------------------------------------------------
// TESTS
//-------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;

    fn version(i: u8) -> Version {
        Version::new(i).unwrap()
    }

    fn count(canvas: &image::GrayImage, value: image::Luma<u8>) -> usize {
        canvas.pixels().filter(|&&px| px == value).count()
    }

    #[test]
    fn test_canvas_sizes() {
        assert_eq!(create_qr_canvas(version(1)).dimensions(), (21, 21));
        assert_eq!(create_qr_canvas(version(2)).dimensions(), (25, 25));
        assert_eq!(create_qr_canvas(version(40)).dimensions(), (177, 177));
    }

    #[test]
    fn test_encoding_region_matches_capacity() {
        // the free cells are exactly the codeword bits plus the remainder bits
        let remainder_bits = |v: u8| match v {
            2..=6 => 7,
            14..=20 | 28..=34 => 3,
            21..=27 => 4,
            _ => 0,
        };
        for v in 1..=40u8 {
            let canvas = create_qr_canvas(version(v));
            let capacity = crate::tables::lookup_capacity(version(v), ECCLevel::L);
            assert_eq!(count(&canvas, MARKER_ENCODING_REGION),
                       capacity.codewords as usize * 8 + remainder_bits(v),
                       "version {}", v);
        }
    }

    #[test]
    fn test_reserved_areas() {
        let canvas = create_qr_canvas(version(1));
        assert_eq!(count(&canvas, MARKER_FORMAT_INFORMATION), 31);
        assert_eq!(count(&canvas, MARKER_VERSION_INFORMATION), 0);

        let canvas = create_qr_canvas(version(7));
        assert_eq!(count(&canvas, MARKER_VERSION_INFORMATION), 36);
    }

    #[test]
    fn test_finder_and_timing() {
        let canvas = create_qr_canvas(version(1));
        // finder corners and centers
        assert_eq!(canvas[(0, 0)], BIT_BLACK);
        assert_eq!(canvas[(3, 3)], BIT_BLACK);
        assert_eq!(canvas[(1, 1)], BIT_WHITE);
        assert_eq!(canvas[(20, 0)], BIT_BLACK);
        assert_eq!(canvas[(0, 20)], BIT_BLACK);
        // separators
        assert_eq!(canvas[(7, 7)], BIT_WHITE);
        assert_eq!(canvas[(13, 7)], BIT_WHITE);
        // timing
        assert_eq!(canvas[(6, 8)], BIT_BLACK);
        assert_eq!(canvas[(6, 9)], BIT_WHITE);
        assert_eq!(canvas[(12, 6)], BIT_BLACK);
    }

    #[test]
    fn test_alignment_pattern() {
        let canvas = create_qr_canvas(version(2));
        assert_eq!(canvas[(18, 18)], BIT_BLACK);
        assert_eq!(canvas[(17, 18)], BIT_WHITE);
        assert_eq!(canvas[(16, 16)], BIT_BLACK);
    }

    #[test]
    fn test_table_e1() {
        assert_eq!(create_alignment_pattern_coord_list(1), Vec::<i64>::new());
        assert_eq!(create_alignment_pattern_coord_list(3), [6, 22]);
        assert_eq!(create_alignment_pattern_coord_list(10), [6, 28, 50]);
        assert_eq!(create_alignment_pattern_coord_list(15), [6, 26, 48, 70]);
        assert_eq!(create_alignment_pattern_coord_list(20), [6, 34, 62, 90]);
        assert_eq!(create_alignment_pattern_coord_list(22), [6, 26, 50, 74, 98]);
        assert_eq!(create_alignment_pattern_coord_list(27), [6, 34, 62, 90, 118]);
        assert_eq!(create_alignment_pattern_coord_list(33), [6, 30, 58, 86, 114, 142]);
        assert_eq!(create_alignment_pattern_coord_list(40), [6, 30, 58, 86, 114, 142, 170]);
        assert_eq!(get_alignment_pattern_points(7).len(), 6);
    }

    #[test]
    fn test_payload_fills_encoding_region() {
        let mut canvas = create_qr_canvas(version(1));
        insert_data_payload(&mut canvas, &[0xFF; 19], &[0x00; 7]).unwrap();
        assert_eq!(count(&canvas, MARKER_ENCODING_REGION), 0);
        // first bit lands in the lower right corner, the column pair is filled
        // right then left
        assert_eq!(canvas[(20, 20)], BIT_BLACK);
        assert_eq!(canvas[(19, 20)], BIT_BLACK);
        assert_eq!(count(&canvas, BIT_BLACK) - count(&create_qr_canvas(version(1)), BIT_BLACK), 19 * 8);
    }

    #[test]
    fn test_payload_too_large() {
        let mut canvas = create_qr_canvas(version(1));
        assert!(insert_data_payload(&mut canvas, &[0u8; 19], &[0u8; 8]).is_err());
    }

    #[test]
    fn test_format_info() {
        let mut canvas = create_qr_canvas(version(1));
        // M with mask 0 is 101010000010010
        insert_format_info(&mut canvas, ECCLevel::M, 0);
        assert_eq!(count(&canvas, MARKER_FORMAT_INFORMATION), 0);
        assert_eq!(canvas[(0, 8)], BIT_BLACK);
        assert_eq!(canvas[(1, 8)], BIT_WHITE);
        assert_eq!(canvas[(8, 0)], BIT_WHITE);
        assert_eq!(canvas[(8, 1)], BIT_BLACK);
        assert_eq!(canvas[(8, 20)], BIT_BLACK);
        assert_eq!(canvas[(20, 8)], BIT_WHITE);
        assert_eq!(canvas[(8, 13)], BIT_BLACK);
    }

    #[test]
    fn test_version_info() {
        let mut canvas = create_qr_canvas(version(7));
        insert_version_info(&mut canvas, version(7));
        assert_eq!(count(&canvas, MARKER_VERSION_INFORMATION), 0);
        // 0x07c94 = 000111 110010 010100, least significant bit at (0, s-11)
        let s = canvas.width();
        assert_eq!(canvas[(0, s - 11)], BIT_WHITE);
        assert_eq!(canvas[(1, s - 11)], BIT_WHITE);
        assert_eq!(canvas[(0, s - 10)], BIT_WHITE);
        assert_eq!(canvas[(5, s - 9)], BIT_WHITE);
        assert_eq!(canvas[(0, s - 9)], BIT_BLACK);
        assert_eq!(canvas[(4, s - 9)], BIT_BLACK);
        assert_eq!(canvas[(s - 9, 4)], BIT_BLACK);
        assert_eq!(canvas[(s - 11, 5)], BIT_WHITE);
    }
}
