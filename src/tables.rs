//! Contains lookup tables and other computation functions that provide reference
//! data needed for encoding a QR code, such as the capacity of each
//! code configuration in different encodings, etc.

use crate::config::{ECCLevel, Encoding, SymbolConfig, Version};

use std::collections::HashMap;
use std::ops::Index;

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub struct SymbolCapacity {
    pub codewords: u32,         // total number of codewords in this symbol type (depends only on version)
    pub data_codewords: u32,    // of those codewords, how many carry data (as opposed to ecc)
    pub data_bits: u32,         // how many data bits?
    pub blocks: u32,            // number of error correction blocks the codewords are split into
    pub ecc_per_block: u32,     // ecc codewords appended to every block

    chars_numeric: u32,         // data capacity measured in digits when using numeric encoding
    chars_alphanum: u32,        // data capacity measured in alphanum chars when usign alphanum encoding
    chars_bytes: u32,           // data capacity measured in bytes when using bytes encoding
}

impl Index<Encoding> for SymbolCapacity {
    type Output = u32;

    fn index(&self, ty: Encoding) -> &Self::Output {
        match ty {
            Encoding::Numeric => &self.chars_numeric,
            Encoding::Alphanumeric => &self.chars_alphanum,
            Encoding::Bytes => &self.chars_bytes,
        }
    }
}

impl SymbolCapacity {
    fn new(version: Version, blocks: u32, ecc_per_block: u32) -> SymbolCapacity {
        let codewords = num_raw_data_modules(version) / 8;
        let data_codewords = codewords - blocks * ecc_per_block;
        let data_bits = data_codewords * 8;
        SymbolCapacity {
            codewords,
            data_codewords,
            data_bits,
            blocks,
            ecc_per_block,
            chars_numeric: max_chars(version, data_bits, Encoding::Numeric),
            chars_alphanum: max_chars(version, data_bits, Encoding::Alphanumeric),
            chars_bytes: max_chars(version, data_bits, Encoding::Bytes),
        }
    }

    pub fn ecc_words(&self) -> u32 {
        self.codewords - self.data_codewords
    }
}

/// Number of modules left for codewords once every function pattern, format
/// and version area is taken out. Includes the remainder bits, which is why
/// the codeword count is this divided by eight, rounded down.
fn num_raw_data_modules(version: Version) -> u32 {
    let v = version.number() as u32;
    let mut modules = (16 * v + 128) * v + 64;
    if v >= 2 {
        let num_align = v / 7 + 2;
        modules -= (25 * num_align - 10) * num_align - 55;
        if v >= 7 {
            modules -= 36;
        }
    }
    modules
}

/// Largest character count of the given encoding whose segment fits into `data_bits`.
fn max_chars(version: Version, data_bits: u32, ec: Encoding) -> u32 {
    let header = 4 + ec.num_char_count_bits(version) as usize;
    let available = (data_bits as usize).saturating_sub(header);
    let count_limit = (1usize << ec.num_char_count_bits(version)) - 1;
    let chars = match ec {
        Encoding::Numeric => available / 10 * 3 + match available % 10 {
            7..=9 => 2,
            4..=6 => 1,
            _ => 0,
        },
        Encoding::Alphanumeric => available / 11 * 2 + if available % 11 >= 6 { 1 } else { 0 },
        Encoding::Bytes => available / 8,
    };
    chars.min(count_limit) as u32
}


macro_rules! define_capacity_table {
    {$(
        $version:expr =>
        $blocks_l:expr, $ecc_l:expr;
        $blocks_m:expr, $ecc_m:expr;
        $blocks_q:expr, $ecc_q:expr;
        $blocks_h:expr, $ecc_h:expr;
    )*} => {
        lazy_static! {
            pub static ref SYMBOL_CAPACITY_TABLE: HashMap<SymbolConfig, SymbolCapacity> = {
                let mut table = HashMap::new();
                $(
                    let version = Version($version);
                    for &(ecc, blocks, per_block) in &[
                        (ECCLevel::L, $blocks_l, $ecc_l),
                        (ECCLevel::M, $blocks_m, $ecc_m),
                        (ECCLevel::Q, $blocks_q, $ecc_q),
                        (ECCLevel::H, $blocks_h, $ecc_h),
                    ] {
                        table.insert(SymbolConfig::new(version, ecc), SymbolCapacity::new(version, blocks, per_block));
                    }
                )*
                table
            };
        }
    }
}


// version => (blocks, ecc codewords per block) for L; M; Q; H
// See table 9 of ISO/IEC 18004.
define_capacity_table!(
     1 =>  1, 7;   1, 10;   1, 13;   1, 17;
     2 =>  1, 10;  1, 16;   1, 22;   1, 28;
     3 =>  1, 15;  1, 26;   2, 18;   2, 22;
     4 =>  1, 20;  2, 18;   2, 26;   4, 16;
     5 =>  1, 26;  2, 24;   4, 18;   4, 22;
     6 =>  2, 18;  4, 16;   4, 24;   4, 28;
     7 =>  2, 20;  4, 18;   6, 18;   5, 26;
     8 =>  2, 24;  4, 22;   6, 22;   6, 26;
     9 =>  2, 30;  5, 22;   8, 20;   8, 24;
    10 =>  4, 18;  5, 26;   8, 24;   8, 28;
    11 =>  4, 20;  5, 30;   8, 28;  11, 24;
    12 =>  4, 24;  8, 22;  10, 26;  11, 28;
    13 =>  4, 26;  9, 22;  12, 24;  16, 22;
    14 =>  4, 30;  9, 24;  16, 20;  16, 24;
    15 =>  6, 22; 10, 24;  12, 30;  18, 24;
    16 =>  6, 24; 10, 28;  17, 24;  16, 30;
    17 =>  6, 28; 11, 28;  16, 28;  19, 28;
    18 =>  6, 30; 13, 26;  18, 28;  21, 28;
    19 =>  7, 28; 14, 26;  21, 26;  25, 26;
    20 =>  8, 28; 16, 26;  20, 30;  25, 28;
    21 =>  8, 28; 17, 26;  23, 28;  25, 30;
    22 =>  9, 28; 17, 28;  23, 30;  34, 24;
    23 =>  9, 30; 18, 28;  25, 30;  30, 30;
    24 => 10, 30; 20, 28;  27, 30;  32, 30;
    25 => 12, 26; 21, 28;  29, 30;  35, 30;
    26 => 12, 28; 23, 28;  34, 28;  37, 30;
    27 => 12, 30; 25, 28;  34, 30;  40, 30;
    28 => 13, 30; 26, 28;  35, 30;  42, 30;
    29 => 14, 30; 28, 28;  38, 30;  45, 30;
    30 => 15, 30; 29, 28;  40, 30;  48, 30;
    31 => 16, 30; 31, 28;  43, 30;  51, 30;
    32 => 17, 30; 33, 28;  45, 30;  54, 30;
    33 => 18, 30; 35, 28;  48, 30;  57, 30;
    34 => 19, 30; 37, 28;  51, 30;  60, 30;
    35 => 19, 30; 38, 28;  53, 30;  63, 30;
    36 => 20, 30; 40, 28;  56, 30;  66, 30;
    37 => 21, 30; 43, 28;  59, 30;  70, 30;
    38 => 22, 30; 45, 28;  62, 30;  74, 30;
    39 => 24, 30; 47, 28;  65, 30;  77, 30;
    40 => 25, 30; 49, 28;  68, 30;  81, 30;
);

/// Convenience function that just indexes into the static table
pub fn lookup_capacity(version: Version, ecc: ECCLevel) -> SymbolCapacity {
    SYMBOL_CAPACITY_TABLE[&SymbolConfig::new(version, ecc)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capacity(decl: &str) -> SymbolCapacity {
        let config: SymbolConfig = decl.parse().unwrap();
        lookup_capacity(config.version(), config.ecc_level())
    }

    #[test]
    fn test_table() {
        assert_eq!(capacity("1-H").data_codewords, 9);
        assert_eq!(capacity("1-H")[Encoding::Bytes], 7);
        assert_eq!(capacity("1-Q").ecc_words(), 13);
        assert_eq!(capacity("1-L")[Encoding::Numeric], 41);
        assert_eq!(capacity("1-L")[Encoding::Alphanumeric], 25);
        assert_eq!(capacity("5-Q").data_codewords, 62);
        assert_eq!(capacity("7-M").codewords, 196);
    }

    #[test]
    fn test_largest_symbols() {
        assert_eq!(capacity("40-L").codewords, 3706);
        assert_eq!(capacity("40-L")[Encoding::Bytes], 2953);
        assert_eq!(capacity("40-L")[Encoding::Numeric], 7089);
        assert_eq!(capacity("40-L")[Encoding::Alphanumeric], 4296);
        assert_eq!(capacity("40-H")[Encoding::Bytes], 1273);
        assert_eq!(capacity("40-M")[Encoding::Bytes], 2331);
    }

    #[test]
    fn test_every_configuration_present() {
        assert_eq!(SYMBOL_CAPACITY_TABLE.len(), 160);
        for version in Version::MIN.and_larger() {
            for &ecc in &[ECCLevel::L, ECCLevel::M, ECCLevel::Q, ECCLevel::H] {
                let cap = lookup_capacity(version, ecc);
                assert_eq!(cap.ecc_words(), cap.blocks * cap.ecc_per_block);
                // every block carries at least one data codeword
                assert!(cap.data_codewords / cap.blocks > 0);
            }
        }
    }
}
