use std::fs;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use qr_generator::{Color, ConfigUpdate, ECCLevel, QrGenerator, Version};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEMO_DATA: &str = "https://example.com";

#[derive(Parser)]
#[command(name = "qr-generator")]
#[command(about = "Encode text into a QR code PNG", long_about = None)]
struct Cli {
    /// Text to encode
    #[arg(default_value = DEMO_DATA)]
    data: String,

    /// Output file
    #[arg(long, short = 'o', default_value = qr_generator::DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// JSON file with properties, applied before the flags below
    #[arg(long)]
    config: Option<PathBuf>,

    /// Smallest QR version to use, 1-40 or "auto"
    #[arg(long)]
    version: Option<Version>,

    /// Quiet zone width in modules
    #[arg(long)]
    border: Option<u32>,

    /// Module color, a name or hex triple
    #[arg(long)]
    fill_color: Option<Color>,

    /// Background color, a name or hex triple
    #[arg(long)]
    background_color: Option<Color>,

    /// Pixels per module
    #[arg(long)]
    module_size: Option<u32>,

    /// Error correction level: L, M, Q or H
    #[arg(long, short = 'e')]
    ecc_level: Option<ECCLevel>,
}

impl Cli {
    fn flag_overrides(&self) -> ConfigUpdate {
        ConfigUpdate {
            version: self.version,
            border: self.border,
            fill_color: self.fill_color,
            background_color: self.background_color,
            module_size: self.module_size,
            ecc_level: self.ecc_level,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut generator = QrGenerator::new();
    if let Some(path) = &cli.config {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let update = ConfigUpdate::from_json(&json)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        generator.set_properties(update)?;
    }
    generator.set_properties(cli.flag_overrides())?;
    info!(config = ?generator.config(), "generating QR code");

    let path = generator
        .generate(&cli.data, Some(&cli.output))
        .context("failed to generate QR code")?;
    println!("QR code created at: {}", path.display());
    Ok(())
}

/// Log to stderr, `info` unless `RUST_LOG` says otherwise
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_leave_config_alone() {
        let cli = Cli::try_parse_from(["qr-generator"]).unwrap();
        assert_eq!(cli.data, DEMO_DATA);
        assert_eq!(cli.output, PathBuf::from("qrcode.png"));
        assert_eq!(cli.flag_overrides(), ConfigUpdate::default());
    }

    #[test]
    fn test_flag_parsing() {
        let cli = Cli::try_parse_from([
            "qr-generator", "hello", "--version", "auto", "--fill-color", "#FF0000",
            "--module-size", "3", "-e", "q",
        ])
        .unwrap();
        let update = cli.flag_overrides();
        assert_eq!(update.version, Some(Version::MIN));
        assert_eq!(update.fill_color, Some(Color::new(255, 0, 0)));
        assert_eq!(update.module_size, Some(3));
        assert_eq!(update.ecc_level, Some(ECCLevel::Q));

        assert!(Cli::try_parse_from(["qr-generator", "--version", "41"]).is_err());
        assert!(Cli::try_parse_from(["qr-generator", "--fill-color", "blurple"]).is_err());
    }
}
