//! Caller-facing options and their validation into a conversion plan.

use crate::error::{ConvertError, ConvertResult};
use crate::fetch::FetchSpec;
use crate::size::Size;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Options for one SVG to PNG conversion.
///
/// Also the shape of the CLI's `--config` JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Svg2PngOptions {
    /// Path of the input SVG file.
    pub input: PathBuf,
    /// Path of the output PNG file. Multi-size conversions suffix its stem.
    pub output: PathBuf,
    pub sizes: Vec<Size>,
    /// Installed Chromium to use. When set and valid, `fetcher` is ignored.
    pub executable_path: Option<PathBuf>,
    pub fetcher: Option<FetchSpec>,
}

/// Options after validation: paths checked and sizes cleaned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub sizes: Vec<Size>,
    pub executable_path: Option<PathBuf>,
    pub fetcher: Option<FetchSpec>,
}

/// Checks `options` before any engine work.
///
/// - the input must be an existing, readable UTF-8 file
/// - an empty output becomes the input path with a `.png` extension
/// - an output whose directory does not exist is moved next to the input,
///   keeping only its file name
/// - sizes with a zero dimension are dropped, duplicates keep their first
///   position, and at least one size must remain
pub fn validate_options(options: Svg2PngOptions) -> ConvertResult<ValidatedOptions> {
    check_input(&options.input)?;
    let output = resolve_output(&options.input, &options.output);
    let sizes = clean_sizes(&options.sizes);

    if sizes.is_empty() {
        return Err(ConvertError::invalid_request(
            "at least one size with non-zero width and height is required",
        ));
    }

    debug!(
        input = %options.input.display(),
        output = %output.display(),
        sizes = sizes.len(),
        "Options validated"
    );

    Ok(ValidatedOptions {
        input: options.input,
        output,
        sizes,
        executable_path: options.executable_path,
        fetcher: options.fetcher,
    })
}

fn check_input(input: &Path) -> ConvertResult<()> {
    if input.as_os_str().is_empty() {
        return Err(ConvertError::input(input, "no input file given"));
    }
    if !input.is_file() {
        return Err(ConvertError::input(input, "file does not exist"));
    }

    let svg = fs::read_to_string(input)
        .map_err(|e| ConvertError::input(input, format!("failed to read: {}", e)))?;

    // Chromium parses the SVG inline as HTML, which accepts documents usvg
    // rejects (no xmlns, HTML entities, zero intrinsic size).
    if let Err(e) = usvg::Tree::from_str(&svg, &usvg::Options::default()) {
        warn!(input = %input.display(), "SVG is not strictly valid, rendering anyway: {}", e);
    }
    Ok(())
}

fn resolve_output(input: &Path, output: &Path) -> PathBuf {
    if output.as_os_str().is_empty() {
        return input.with_extension("png");
    }

    let dir_exists = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.is_dir(),
        _ => true,
    };
    if dir_exists {
        return output.to_path_buf();
    }

    let file_name = output.file_name().map(PathBuf::from).unwrap_or_default();
    let fallback = match input.parent() {
        Some(dir) => dir.join(file_name),
        None => file_name,
    };
    info!(
        requested = %output.display(),
        output = %fallback.display(),
        "Output directory does not exist, writing next to the input"
    );
    fallback
}

fn clean_sizes(sizes: &[Size]) -> Vec<Size> {
    let mut seen = HashSet::new();
    sizes
        .iter()
        .copied()
        .filter(|size| size.is_valid() && seen.insert(*size))
        .collect()
}
