//! svg2png library
//!
//! Converts an SVG document into one or more PNG files by rendering it in
//! headless Chromium.
//!
//! ## Module Overview
//!
//! - `converter`: session lifecycle and the per-size capture loop
//! - `capture`: viewport resize, SVG size normalization, and screenshot
//! - `engine`: rendering engine and session traits
//! - `chromium`: chromiumoxide-backed engine
//! - `fetch`: engine executable resolution and revision download
//! - `naming`: output file names for multi-size conversions
//! - `options`: option validation
//! - `shim`: host HTML document around the SVG
//! - `telemetry`: tracing setup and conversion logging
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use svg2png::{svg2png, Size, Svg2PngOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let options = Svg2PngOptions {
//!         input: "sample.svg".into(),
//!         output: "icon.png".into(),
//!         sizes: vec![Size::square(256), Size::new(128, 256)],
//!         executable_path: Some("/usr/bin/chromium".into()),
//!         fetcher: None,
//!     };
//!
//!     // Writes icon-256.png and icon-128x256.png
//!     let result = svg2png(options).await.unwrap();
//!     assert_eq!(result.outputs.len(), 2);
//! }
//! ```

pub mod capture;
pub mod chromium;
pub mod converter;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod naming;
pub mod options;
pub mod report;
pub mod shim;
pub mod size;
pub mod telemetry;

pub use chromium::ChromiumEngine;
pub use converter::Converter;
pub use error::{ConvertError, ConvertResult};
pub use fetch::{resolve_executable, ChromiumFetcher, FetchSpec};
pub use options::{validate_options, Svg2PngOptions, ValidatedOptions};
pub use report::{ConversionRequest, ConversionResult};
pub use size::Size;

/// Validates `options`, resolves a Chromium executable, and converts with a
/// fresh [`ChromiumEngine`].
pub async fn svg2png(options: Svg2PngOptions) -> ConvertResult<ConversionResult> {
    svg2png_with(options, ChromiumEngine::default(), &ChromiumFetcher).await
}

/// [`svg2png`] with a caller-supplied engine and revision fetcher.
pub async fn svg2png_with<E: engine::RenderEngine>(
    options: Svg2PngOptions,
    engine: E,
    fetcher: &dyn fetch::RevisionFetcher,
) -> ConvertResult<ConversionResult> {
    let validated = validate_options(options)?;
    let executable = resolve_executable(
        validated.executable_path.as_deref(),
        validated.fetcher.as_ref(),
        fetcher,
    )
    .await?;

    let request = ConversionRequest::new(
        validated.input,
        validated.output,
        validated.sizes,
        executable,
    );
    let result = Converter::new(engine).convert(&request).await?;
    telemetry::record_conversion(&result);
    Ok(result)
}
