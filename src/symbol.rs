//! Turning input bytes into a finished module grid.

use std::fmt;
use std::io;

use tracing::debug;

use crate::bitcoding::build_data_codewords;
use crate::config::{ECCLevel, Encoding, Version};
use crate::error::QrError;
use crate::rscoding::construct_codewords;
use crate::serialization::masking::apply_best_mask;
use crate::serialization::{create_qr_canvas, insert_data_payload, insert_version_info, BIT_BLACK, BIT_WHITE};
use crate::tables::lookup_capacity;

/// A finished QR symbol: a square matrix of dark (`true`) and light modules,
/// without quiet zone.
#[derive(Clone, PartialEq, Eq)]
pub struct ModuleGrid {
    size: u32,
    modules: Vec<bool>,
    version: Version,
    ecc_level: ECCLevel,
    mask_pattern: u8,
}

impl ModuleGrid {
    /// Modules per side, `17 + 4 * version`.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn ecc_level(&self) -> ECCLevel {
        self.ecc_level
    }

    /// Index 0..8 of the data mask applied to the symbol.
    pub fn mask_pattern(&self) -> u8 {
        self.mask_pattern
    }

    /// Whether the module at column `x`, row `y` is dark. Anything outside the
    /// symbol is light.
    pub fn is_dark(&self, x: u32, y: u32) -> bool {
        x < self.size && y < self.size && self.modules[(y * self.size + x) as usize]
    }

    /// Rows from top to bottom, each left to right.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.modules.chunks(self.size as usize)
    }
}

impl fmt::Debug for ModuleGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ModuleGrid {{ version: {}, ecc_level: {:?}, mask: {} }}",
                 self.version, self.ecc_level, self.mask_pattern)?;
        for row in self.rows() {
            let line: String = row.iter().map(|&dark| if dark { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Pick the smallest version, starting at `min_version`, that holds `len`
/// characters of the given encoding.
fn select_version(len: usize, ec: Encoding, min_version: Version, ecl: ECCLevel) -> Option<Version> {
    min_version
        .and_larger()
        .find(|&version| len <= lookup_capacity(version, ecl)[ec] as usize)
}

/// Encode `data` into a QR symbol of at least `min_version` at error
/// correction level `ecl`.
///
/// The data is written as one segment in the narrowest mode that covers all of
/// it. When `min_version` is too small the next larger version that fits is
/// used; data is never truncated.
pub fn encode(data: &[u8], min_version: Version, ecl: ECCLevel) -> Result<ModuleGrid, QrError> {
    if data.is_empty() {
        return Err(QrError::invalid_input("cannot encode empty data"));
    }

    let ec = Encoding::detect(data);
    let version = select_version(data.len(), ec, min_version, ecl)
        .ok_or(QrError::CapacityExceeded { len: data.len(), level: ecl })?;
    debug!(len = data.len(), ?ec, version = version.number(), ?ecl, "selected symbol version");

    let data_words = build_data_codewords(data, ec, version, ecl).map_err(|err| layout_error(version, err))?;
    let (data_words, ecc_words) = construct_codewords(&data_words, version, ecl);

    let mut canvas = create_qr_canvas(version);
    insert_data_payload(&mut canvas, &data_words, &ecc_words).map_err(|err| layout_error(version, err))?;
    insert_version_info(&mut canvas, version);

    let (mask_pattern, symbol) = apply_best_mask(&canvas, version, ecl);
    debug!(mask_pattern, "applied data mask");

    debug_assert!(symbol.pixels().all(|&px| px == BIT_BLACK || px == BIT_WHITE));
    let modules = symbol.pixels().map(|&px| px == BIT_BLACK).collect();

    Ok(ModuleGrid {
        size: version.dimensions(),
        modules,
        version,
        ecc_level: ecl,
        mask_pattern,
    })
}

// The bit streams only ever fail when the data outgrows the chosen version.
fn layout_error(version: Version, err: io::Error) -> QrError {
    QrError::invalid_input(format!("data does not fit QR version {}: {}", version, err))
}
