//! Resolution of user supplied color strings into RGB triples.
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::QrError;

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug, Deserialize)]
#[serde(from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

// CSS values for the names we recognize. Looked up case-insensitively.
static NAMED_COLORS: [(&str, Color); 18] = [
    ("black", Color::new(0, 0, 0)),
    ("white", Color::new(255, 255, 255)),
    ("red", Color::new(255, 0, 0)),
    ("green", Color::new(0, 128, 0)),
    ("lime", Color::new(0, 255, 0)),
    ("blue", Color::new(0, 0, 255)),
    ("yellow", Color::new(255, 255, 0)),
    ("cyan", Color::new(0, 255, 255)),
    ("magenta", Color::new(255, 0, 255)),
    ("gray", Color::new(128, 128, 128)),
    ("grey", Color::new(128, 128, 128)),
    ("silver", Color::new(192, 192, 192)),
    ("maroon", Color::new(128, 0, 0)),
    ("navy", Color::new(0, 0, 128)),
    ("olive", Color::new(128, 128, 0)),
    ("purple", Color::new(128, 0, 128)),
    ("teal", Color::new(0, 128, 128)),
    ("orange", Color::new(255, 165, 0)),
];

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b }
    }

    /// Resolve a color name or hex triple. Anything unrecognized becomes
    /// black, with a warning in the log.
    pub fn parse(desc: &str) -> Color {
        Color::parse_strict(desc).unwrap_or_else(|_| {
            warn!(color = desc, "unrecognized color, falling back to black");
            Color::BLACK
        })
    }

    /// Like [`Color::parse`], but unrecognized input is an error.
    ///
    /// Accepts the names in the fixed table, `#RRGGBB`, `#RGB`, `0xRRGGBB`
    /// and bare `RRGGBB`.
    pub fn parse_strict(desc: &str) -> Result<Color, QrError> {
        let trimmed = desc.trim();
        if let Some(&(_, color)) = NAMED_COLORS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
        {
            return Ok(color);
        }

        let hex = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        parse_hex_triple(hex).ok_or_else(|| QrError::InvalidColor(desc.to_owned()))
    }

    pub fn to_rgb(self) -> image::Rgb<u8> {
        image::Rgb([self.r, self.g, self.b])
    }
}

fn parse_hex_triple(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => {
            let value = u32::from_str_radix(hex, 16).ok()?;
            Some(Color::new((value >> 16) as u8, (value >> 8) as u8, value as u8))
        }
        // #RGB expands each digit, so #F80 is #FF8800
        3 => {
            let value = u16::from_str_radix(hex, 16).ok()?;
            let expand = |nibble: u16| (nibble as u8 & 0xF) * 0x11;
            Some(Color::new(expand(value >> 8), expand(value >> 4), expand(value)))
        }
        _ => None,
    }
}

impl FromStr for Color {
    type Err = QrError;

    fn from_str(desc: &str) -> Result<Color, QrError> {
        Color::parse_strict(desc)
    }
}

impl From<String> for Color {
    fn from(desc: String) -> Color {
        Color::parse(&desc)
    }
}

impl From<&str> for Color {
    fn from(desc: &str) -> Color {
        Color::parse(desc)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}
