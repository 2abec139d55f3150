//! svg2png command line
//!
//! Converts an SVG file to PNG using headless Chromium.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `SVG2PNG_EXECUTABLE_PATH`: installed Chromium to use
//! - `SVG2PNG_FETCHER_REVISION`: Chromium revision to download instead
//! - `SVG2PNG_FETCHER_PATH`: download directory for that revision
//! - `RUST_LOG`: log level (default: info)
//!
//! A `--config` JSON file may supply any option; command line flags override it.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use svg2png::telemetry::{self, LogFormat};
use svg2png::{svg2png, ConvertError, FetchSpec, Size, Svg2PngOptions};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "svg2png", version)]
#[command(about = "Convert an SVG file to PNG images using headless Chromium")]
#[command(after_help = "Examples:
  svg2png -i sample.svg -o sample.png --width 256 --height 256 --executable-path /usr/bin/chromium
  svg2png -i sample.svg -o icon.png --size 256 --size 128x256 --fetcher-revision 782078 --fetcher-path ./chrome")]
struct Cli {
    /// Path of the input SVG file.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Path of the output PNG file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Width (px) of the output PNG file.
    #[arg(long)]
    width: Option<u32>,

    /// Height (px) of the output PNG file. Defaults to --width.
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Output size as WIDTHxHEIGHT or SIDE. Repeat for several outputs.
    #[arg(short, long = "size", value_name = "SIZE")]
    sizes: Vec<Size>,

    /// Installed Chromium to use. When valid, --fetcher-* is ignored.
    #[arg(long, env = "SVG2PNG_EXECUTABLE_PATH")]
    executable_path: Option<PathBuf>,

    /// Chromium revision to download.
    #[arg(long, env = "SVG2PNG_FETCHER_REVISION")]
    fetcher_revision: Option<String>,

    /// Directory to download Chromium into.
    #[arg(long, env = "SVG2PNG_FETCHER_PATH")]
    fetcher_path: Option<PathBuf>,

    /// JSON file with conversion options.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the conversion result as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Log format: text or json.
    #[arg(long, default_value = "text")]
    log_format: LogFormat,
}

impl Cli {
    /// Merges flags over the optional config file.
    fn into_options(self) -> Result<Svg2PngOptions> {
        let mut options = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?
            }
            None => Svg2PngOptions::default(),
        };

        if let Some(input) = self.input {
            options.input = input;
        }
        if let Some(output) = self.output {
            options.output = output;
        }

        let mut sizes = Vec::new();
        if let Some(width) = self.width {
            sizes.push(Size::new(width, self.height.unwrap_or(width)));
        }
        sizes.extend(self.sizes);
        if !sizes.is_empty() {
            options.sizes = sizes;
        }

        if let Some(executable_path) = self.executable_path {
            options.executable_path = Some(executable_path);
        }
        if self.fetcher_revision.is_some() || self.fetcher_path.is_some() {
            let mut fetcher = options.fetcher.take().unwrap_or_default();
            if let Some(revision) = self.fetcher_revision {
                fetcher.revision = revision;
            }
            if let Some(path) = self.fetcher_path {
                fetcher.download_dir = Some(path);
            }
            options.fetcher = Some(fetcher);
        }

        Ok(options)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.log_format);

    let json = cli.json;
    let options = cli.into_options()?;

    info!(input = %options.input.display(), "Starting svg2png");

    let result = match svg2png(options).await {
        Ok(result) => result,
        Err(e) => {
            if let ConvertError::Render { completed, .. } = &e {
                for path in completed {
                    info!(path = %path.display(), "Written before failure");
                }
            }
            error!("Conversion failed: {:#}", anyhow::Error::new(e));
            std::process::exit(1);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for path in &result.outputs {
            println!("{}", path.display());
        }
    }
    Ok(())
}
