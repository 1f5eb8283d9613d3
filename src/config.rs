//! Contains enums and structs that will also be exported as the public
//! API of this crate.
use itertools::Itertools;
use serde::Deserialize;
use std::cmp::{Ordering, PartialOrd};
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use crate::color::Color;
use crate::error::QrError;

//-------------------------------------------------------------------------------------------------

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub enum Encoding {
    Numeric,            // only digits allowed [0-9]
    Alphanumeric,       // digits, capital letters and nine other chars [0-9A-Z$%*+-./: ]
    Bytes,              // ISO8859-1 encoded or otherwise (7.3.5)
}

impl Encoding {
    /// The narrowest encoding that can represent every byte of `data`.
    pub fn detect(data: &[u8]) -> Encoding {
        data.iter()
            .map(|&b| Encoding::of_byte(b))
            .fold(Encoding::Numeric, Encoding::upper_bound)
    }

    fn of_byte(b: u8) -> Encoding {
        match b {
            b'0'..=b'9' => Encoding::Numeric,
            b'A'..=b'Z' | b' ' | b'$' | b'%' | b'*' | b'+' | b'-' | b'.' | b'/' | b':' => {
                Encoding::Alphanumeric
            }
            _ => Encoding::Bytes,
        }
    }

    /// The 4 bit mode indicator written in front of a segment.
    pub fn mode_indicator(self) -> u32 {
        match self {
            Encoding::Numeric => 0b0001,
            Encoding::Alphanumeric => 0b0010,
            Encoding::Bytes => 0b0100,
        }
    }

    /// Return the number of bits used in the given symbol version to encode the number of
    /// characters for the following encoded content.
    pub fn num_char_count_bits(self, version: Version) -> u32 {
        match version.number() {
            1..=9 => match self {
                Encoding::Numeric => 10,
                Encoding::Alphanumeric => 9,
                Encoding::Bytes => 8,
            },
            10..=26 => match self {
                Encoding::Numeric => 12,
                Encoding::Alphanumeric => 11,
                Encoding::Bytes => 16,
            },
            _ => match self {
                Encoding::Numeric => 14,
                Encoding::Alphanumeric => 13,
                Encoding::Bytes => 16,
            },
        }
    }

    /// Compute the number of bits needed to encode a sequence with the given length
    /// of characters.
    pub fn num_encoded_bits(self, num_chars: usize) -> usize {
        match self {
            Encoding::Numeric => (10 * num_chars + 2) / 3,
            Encoding::Alphanumeric => (11 * num_chars + 1) / 2,
            Encoding::Bytes => num_chars * 8,
        }
    }

    /// Compute the lowest common encoding of two encodings in the sense of the
    /// ordering defined below.
    pub fn upper_bound(self, other: Self) -> Self {
        match self.partial_cmp(&other) {
            Some(Ordering::Less) | Some(Ordering::Equal) => other,
            Some(Ordering::Greater) => self,
            None => Encoding::Bytes  // bytes is an upper bound for every encoding
        }
    }
}

impl PartialOrd for Encoding {
    /// Defines an ordering for encodings, it is `a <= b` if `b` contains a superset of
    /// all characters supported by `a`.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.rank().cmp(&other.rank()))
    }
}

impl Encoding {
    fn rank(self) -> u8 {
        match self {
            Encoding::Numeric => 0,
            Encoding::Alphanumeric => 1,
            Encoding::Bytes => 2,
        }
    }
}

//-------------------------------------------------------------------------------------------------

/// A standard QR symbol version, 1 through 40.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Debug, Deserialize)]
#[serde(try_from = "VersionRepr")]
pub struct Version(pub(crate) u8);

impl Version {
    pub const MIN: Version = Version(1);
    pub const MAX: Version = Version(40);

    pub fn new(number: u8) -> Result<Version, QrError> {
        if (Self::MIN.0..=Self::MAX.0).contains(&number) {
            Ok(Version(number))
        } else {
            Err(QrError::invalid_input(format!(
                "QR version must be between 1 and 40, got {}", number
            )))
        }
    }

    /// Simply return the version number
    pub fn number(self) -> u8 {
        self.0
    }

    /// Return the width & height of the symbol, not counting the quiet region
    pub fn dimensions(self) -> u32 {
        (self.0 as u32) * 4 + 17
    }

    /// Every version from `self` up to and including version 40.
    pub fn and_larger(self) -> impl Iterator<Item = Version> {
        (self.0..=Self::MAX.0).map(Version)
    }
}

impl Default for Version {
    fn default() -> Self {
        Version(4)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Version {
    type Err = QrError;

    /// Parse "1" through "40", or "auto" for the smallest version.
    fn from_str(decl: &str) -> Result<Version, QrError> {
        let decl = decl.trim();
        if decl.eq_ignore_ascii_case("auto") {
            return Ok(Version::MIN);
        }
        match decl.parse::<u8>() {
            Ok(i) => Version::new(i),
            Err(_) => Err(QrError::invalid_input(format!("unrecognized QR version {:?}", decl))),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VersionRepr {
    Number(u8),
    Name(String),
}

impl TryFrom<VersionRepr> for Version {
    type Error = QrError;

    fn try_from(repr: VersionRepr) -> Result<Self, Self::Error> {
        match repr {
            VersionRepr::Number(i) => Version::new(i),
            VersionRepr::Name(s) => s.parse(),
        }
    }
}

//-------------------------------------------------------------------------------------------------

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug, Deserialize)]
#[serde(try_from = "String")]
pub enum ECCLevel {
    L,      // allows recovery of  7% of the data
    M,      // allows recovery of 15% of the data
    Q,      // allows recovery of 25% of the data
    H       // allows recovery of 30% of the data
}

impl ECCLevel {
    /// The two bit level indicator stored in the format information.
    pub fn format_bits(self) -> u8 {
        match self {
            ECCLevel::L => 0b01,
            ECCLevel::M => 0b00,
            ECCLevel::Q => 0b11,
            ECCLevel::H => 0b10,
        }
    }
}

impl Default for ECCLevel {
    fn default() -> Self {
        ECCLevel::H
    }
}

impl FromStr for ECCLevel {
    type Err = QrError;

    fn from_str(desc: &str) -> Result<ECCLevel, QrError> {
        match desc.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(ECCLevel::L),
            "M" => Ok(ECCLevel::M),
            "Q" => Ok(ECCLevel::Q),
            "H" => Ok(ECCLevel::H),
            _ => Err(QrError::invalid_input(format!("unrecognized error correction level {:?}", desc))),
        }
    }
}

impl TryFrom<String> for ECCLevel {
    type Error = QrError;

    fn try_from(desc: String) -> Result<Self, Self::Error> {
        desc.parse()
    }
}

//-------------------------------------------------------------------------------------------------

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub struct SymbolConfig(Version, ECCLevel);

impl SymbolConfig {
    /// Constructor
    pub const fn new(v: Version, e: ECCLevel) -> SymbolConfig {
        SymbolConfig(v, e)
    }

    pub fn version(self) -> Version {
        self.0
    }

    pub fn ecc_level(self) -> ECCLevel {
        self.1
    }
}

impl FromStr for SymbolConfig {
    type Err = QrError;

    /// Parses the form commonly used in the standard, such as 1-H, 6-M, etc.
    fn from_str(decl: &str) -> Result<SymbolConfig, QrError> {
        let (v, e) = decl
            .split('-')
            .collect_tuple()
            .ok_or_else(|| QrError::invalid_input(format!("unrecognized symbol configuration {:?}", decl)))?;
        Ok(SymbolConfig::new(v.parse()?, e.parse()?))
    }
}

//-------------------------------------------------------------------------------------------------

/// A complete, immutable set of generation parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrConfig {
    /// Smallest version to use; larger versions are picked when the data needs them.
    pub version: Version,
    /// Quiet zone width in modules, on each side.
    pub border: u32,
    pub fill_color: Color,
    pub background_color: Color,
    /// Pixels per module side.
    pub module_size: u32,
    pub ecc_level: ECCLevel,
}

impl Default for QrConfig {
    fn default() -> Self {
        QrConfig {
            version: Version::default(),
            border: 4,
            fill_color: Color::BLACK,
            background_color: Color::WHITE,
            module_size: 10,
            ecc_level: ECCLevel::default(),
        }
    }
}

impl QrConfig {
    /// Overwrite every field that is set in `update`. The update is
    /// validated as a whole first, so on error nothing changes.
    pub fn apply(&mut self, update: ConfigUpdate) -> Result<(), QrError> {
        if update.module_size == Some(0) {
            return Err(QrError::invalid_input("module size must be at least one pixel"));
        }

        if let Some(version) = update.version {
            self.version = version;
        }
        if let Some(border) = update.border {
            self.border = border;
        }
        if let Some(fill) = update.fill_color {
            self.fill_color = fill;
        }
        if let Some(background) = update.background_color {
            self.background_color = background;
        }
        if let Some(module_size) = update.module_size {
            self.module_size = module_size;
        }
        if let Some(level) = update.ecc_level {
            self.ecc_level = level;
        }
        Ok(())
    }

    /// Consuming variant of [`QrConfig::apply`].
    pub fn with_update(mut self, update: ConfigUpdate) -> Result<QrConfig, QrError> {
        self.apply(update)?;
        Ok(self)
    }
}

/// Optional overrides for a [`QrConfig`]. Unset fields leave the current
/// value alone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigUpdate {
    pub version: Option<Version>,
    pub border: Option<u32>,
    pub fill_color: Option<Color>,
    pub background_color: Option<Color>,
    pub module_size: Option<u32>,
    pub ecc_level: Option<ECCLevel>,
}

impl ConfigUpdate {
    pub fn from_json(json: &str) -> Result<ConfigUpdate, serde_json::Error> {
        serde_json::from_str(json)
    }
}
