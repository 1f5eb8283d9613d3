//! QR code generation: encode text into a QR symbol and render it as a
//! colored PNG image with a configurable quiet zone.
//!
//! ```no_run
//! use qr_generator::{ConfigUpdate, QrGenerator};
//!
//! let mut generator = QrGenerator::new();
//! generator.set_properties(ConfigUpdate {
//!     module_size: Some(4),
//!     fill_color: Some("navy".into()),
//!     ..ConfigUpdate::default()
//! })?;
//! let path = generator.generate("https://example.com", None)?;
//! println!("QR code created at: {}", path.display());
//! # Ok::<(), qr_generator::QrError>(())
//! ```

#[macro_use]
extern crate lazy_static;

use std::path::{Path, PathBuf};

use image::RgbImage;

pub use color::Color;
pub use config::{ConfigUpdate, ECCLevel, Encoding, QrConfig, SymbolConfig, Version};
pub use error::QrError;
pub use render::{render, save_png};
pub use symbol::{encode, ModuleGrid};

mod bitcoding;
mod color;
mod config;
mod error;
mod render;
mod rscoding;
mod serialization;
mod symbol;
mod tables;

/// File name used when `generate` is not given an output path.
pub const DEFAULT_OUTPUT_FILE: &str = "qrcode.png";

/// Encode `data` with the parameters in `config` and render the image, without
/// touching the file system.
pub fn generate_image_with(config: &QrConfig, data: &str) -> Result<RgbImage, QrError> {
    let grid = encode(data.as_bytes(), config.version, config.ecc_level)?;
    render(&grid, config.border, config.module_size, config.fill_color, config.background_color)
}

/// Encode `data` with the parameters in `config`, render it and write the PNG
/// to `output` (or [`DEFAULT_OUTPUT_FILE`] when `output` is `None` or empty).
///
/// Returns the absolute path of the written file. Nothing is written when
/// encoding or rendering fails.
pub fn generate_with(config: &QrConfig, data: &str, output: Option<&Path>) -> Result<PathBuf, QrError> {
    let image = generate_image_with(config, data)?;
    save_png(&image, output_path(output))
}

fn output_path(output: Option<&Path>) -> &Path {
    match output {
        Some(path) if !path.as_os_str().is_empty() => path,
        _ => Path::new(DEFAULT_OUTPUT_FILE),
    }
}

/// Holds a configuration across several `generate` calls.
#[derive(Clone, Debug, Default)]
pub struct QrGenerator {
    config: QrConfig,
}

impl QrGenerator {
    /// A generator with the default configuration: version 4, a border of 4
    /// modules, black on white, 10 pixels per module, error correction H.
    pub fn new() -> QrGenerator {
        QrGenerator::default()
    }

    pub fn with_config(config: QrConfig) -> QrGenerator {
        QrGenerator { config }
    }

    pub fn config(&self) -> &QrConfig {
        &self.config
    }

    /// Override the fields set in `update`, keeping all others.
    pub fn set_properties(&mut self, update: ConfigUpdate) -> Result<(), QrError> {
        self.config.apply(update)
    }

    /// See [`generate_with`].
    pub fn generate(&self, data: &str, output: Option<&Path>) -> Result<PathBuf, QrError> {
        generate_with(&self.config, data, output)
    }

    /// See [`generate_image_with`].
    pub fn generate_image(&self, data: &str) -> Result<RgbImage, QrError> {
        generate_image_with(&self.config, data)
    }
}
