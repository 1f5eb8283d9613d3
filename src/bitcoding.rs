use crate::config::{ECCLevel, Encoding, Version};
use crate::tables::lookup_capacity;

use std::io;

use bitstream_io::{BigEndian, BitWrite, BitWriter};

pub type QrBitWriter<'a> = BitWriter<&'a mut Vec<u8>, BigEndian>;

// alternating pad codewords filling up unused data capacity (7.4.10)
const PAD_CODEWORDS: [u8; 2] = [0b1110_1100, 0b0001_0001];


fn write_mode_indicator(stream: &mut QrBitWriter, ec: Encoding) -> io::Result<()> {
    stream.write(4, ec.mode_indicator())
}

fn write_charcount_indicator(stream: &mut QrBitWriter, count: u32, version: Version, ec: Encoding) -> io::Result<()> {
    stream.write(ec.num_char_count_bits(version), count)
}

/// Write a terminator bit sequence to the stream. The terminator is four
/// zero bits, or fewer when the symbol capacity is reached before that.
pub fn write_terminator(stream: &mut QrBitWriter, remaining_bits: usize) -> io::Result<()> {
    let bits = remaining_bits.min(4) as u32;
    if bits > 0 {
        stream.write(bits, 0u32)?;
    }
    Ok(())
}

fn encode_numeric_data(stream: &mut QrBitWriter, input: &[u8]) -> io::Result<()> {
    // group into three digits and treat them as a decimal number between 0 and 999,
    // encode that number in 10 binary digits. a trailing pair takes 7 bits, a
    // single digit 4.
    for triplet in input.chunks(3) {
        let code = triplet
            .iter()
            .fold(0u32, |acc, &l| acc * 10 + (l - b'0') as u32);
        let bits = match triplet.len() {
            3 => 10,
            2 => 7,
            _ => 4,
        };
        stream.write(bits, code)?;
    }
    Ok(())
}


fn map_alphanumeric(in_char: u8) -> u32 {
    match in_char {
        b'0'..=b'9' => (in_char - b'0') as u32,        // a digit in [0-9] maps to that value
        b'A'..=b'Z' => (in_char - b'A') as u32 + 10,   // capital letters in [A-Z] map to the next 26 values
        b' ' => 36,
        b'$' => 37,
        b'%' => 38,
        b'*' => 39,
        b'+' => 40,
        b'-' => 41,
        b'.' => 42,
        b'/' => 43,
        _ => 44,   // colon, the only remaining member of the set
    }
}

fn encode_alphanumeric_data(stream: &mut QrBitWriter, input: &[u8]) -> io::Result<()> {
    // group into two chars, multiply the first by 45 and add the second one.
    // encode that number in 11 binary digits, a remaining single char in 6.
    for pair in input.chunks(2) {
        match *pair {
            [first, second] => {
                stream.write(11, map_alphanumeric(first) * 45 + map_alphanumeric(second))?
            }
            [single] => stream.write(6, map_alphanumeric(single))?,
            _ => unreachable!("chunks(2) yields one or two elements"),
        }
    }
    Ok(())
}

fn encode_byte_data(stream: &mut QrBitWriter, input: &[u8]) -> io::Result<()> {
    // bytes are written as they are; readers assume ISO8859-1 or UTF-8
    for &l in input {
        stream.write(8, l)?;
    }
    Ok(())
}

/// Number of bits `encode_data_segment` produces for `num_chars` characters.
pub fn segment_bit_length(num_chars: usize, ec: Encoding, version: Version) -> usize {
    4 + ec.num_char_count_bits(version) as usize + ec.num_encoded_bits(num_chars)
}

/// Whether the character count can be represented in the count indicator of
/// the given version at all.
pub fn char_count_fits(num_chars: usize, ec: Encoding, version: Version) -> bool {
    num_chars < (1usize << ec.num_char_count_bits(version))
}

/// Write `input` as a single segment in the given encoding, preceded by its
/// mode and character count indicators. The caller has to make sure every
/// byte is representable in `ec`, see [`Encoding::detect`].
pub fn encode_data_segment(stream: &mut QrBitWriter, input: &[u8], ec: Encoding, version: Version) -> io::Result<()> {
    write_mode_indicator(stream, ec)?;
    write_charcount_indicator(stream, input.len() as u32, version, ec)?;
    match ec {
        Encoding::Numeric => encode_numeric_data(stream, input),
        Encoding::Alphanumeric => encode_alphanumeric_data(stream, input),
        Encoding::Bytes => encode_byte_data(stream, input),
    }
}

/// Encode `input` and complete it to the exact number of data codewords of
/// the symbol: terminator, zero padding to the next byte boundary, then
/// alternating pad codewords.
pub fn build_data_codewords(input: &[u8], ec: Encoding, version: Version, ecl: ECCLevel) -> io::Result<Vec<u8>> {
    let capacity = lookup_capacity(version, ecl);
    let used_bits = segment_bit_length(input.len(), ec, version);
    if !char_count_fits(input.len(), ec, version) || used_bits > capacity.data_bits as usize {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "segment exceeds symbol capacity"));
    }

    let mut data = Vec::with_capacity(capacity.data_codewords as usize);
    {
        let mut stream = QrBitWriter::new(&mut data);
        encode_data_segment(&mut stream, input, ec, version)?;
        write_terminator(&mut stream, capacity.data_bits as usize - used_bits)?;
        stream.byte_align()?;
    }
    finalize_bitstream(&mut data, capacity.data_codewords as usize);
    Ok(data)
}

/// Append pad codewords until `data` holds `data_codewords` bytes.
pub fn finalize_bitstream(data: &mut Vec<u8>, data_codewords: usize) {
    let missing = data_codewords.saturating_sub(data.len());
    data.extend(PAD_CODEWORDS.iter().cycle().take(missing));
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

    #[test]
    fn test_numeric_example_1() {
        let mut data: Vec<u8> = Vec::new();
        let (bits, value) = {
            let mut stream = QrBitWriter::new(&mut data);
            encode_data_segment(&mut stream, b"01234567", Encoding::Numeric, version(1)).unwrap();
            stream.into_unwritten()
        };
        assert_eq!(data, [0b0001_0000, 0b0010_0000, 0b0000_1100, 0b0101_0110, 0b0110_0001]);
        assert_eq!(bits, 1);  // one bit left over
        assert_eq!(value, 1); // that bit is a 1
        assert_eq!(segment_bit_length(8, Encoding::Numeric, version(1)), 41);
    }

    #[test]
    fn test_alphanumeric_example() {
        let mut data: Vec<u8> = Vec::new();
        let (bits, value) = {
            let mut stream = QrBitWriter::new(&mut data);
            encode_data_segment(&mut stream, b"AC-42", Encoding::Alphanumeric, version(1)).unwrap();
            stream.into_unwritten()
        };
        assert_eq!(data, [0b0010_0000, 0b0010_1001, 0b1100_1110, 0b1110_0111, 0b0010_0001]);
        assert_eq!(bits, 1);  // one bit left over
        assert_eq!(value, 0); // value of that bit is zero
        assert_eq!(segment_bit_length(5, Encoding::Alphanumeric, version(1)), 41);
    }

    #[test]
    fn test_byte_segment() {
        let mut data: Vec<u8> = Vec::new();
        {
            let mut stream = QrBitWriter::new(&mut data);
            encode_data_segment(&mut stream, b"a", Encoding::Bytes, version(10)).unwrap();
            stream.byte_align().unwrap();
        }
        // 0100, sixteen bit count of 1, 0x61, then four alignment zeros
        assert_eq!(data, [0b0100_0000, 0b0000_0000, 0b0001_0110, 0b0001_0000]);
    }

    #[test]
    fn test_padded_codewords() {
        // ISO/IEC 18004 Annex I: "01234567" in a 1-M symbol
        let data = build_data_codewords(b"01234567", Encoding::Numeric, version(1), ECCLevel::M).unwrap();
        assert_eq!(data, [0x10, 0x20, 0x0C, 0x56, 0x61, 0x80, 0xEC, 0x11,
                          0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11]);
    }

    #[test]
    fn test_short_terminator_at_capacity() {
        // 17 digits fill 1-H up to 4 + 10 + 57 = 71 of 72 bits, so only one
        // terminator bit fits
        let data = build_data_codewords(b"12345678901234567", Encoding::Numeric, version(1), ECCLevel::H).unwrap();
        assert_eq!(data.len(), 9);
        assert!(build_data_codewords(b"123456789012345678", Encoding::Numeric, version(1), ECCLevel::H).is_err());
    }

    #[test]
    fn test_count_indicator_limits() {
        assert!(char_count_fits(255, Encoding::Bytes, version(9)));
        assert!(!char_count_fits(256, Encoding::Bytes, version(9)));
        assert!(char_count_fits(256, Encoding::Bytes, version(10)));
    }
}
