//! Output file naming for single- and multi-size conversions.

use crate::size::Size;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Computes the output path for the size at `index` out of `total_sizes`.
///
/// A single-size conversion writes to `base` unchanged. Otherwise the size is
/// appended to the file stem: `icon-256.png` for squares, `icon-128x256.png`
/// for everything else. The result depends only on `base`, `size` and
/// whether the request has more than one size.
pub fn resolve_path(base: &Path, size: Size, index: usize, total_sizes: usize) -> PathBuf {
    debug_assert!(index < total_sizes.max(1));

    if total_sizes <= 1 {
        return base.to_path_buf();
    }

    let suffix = if size.is_square() {
        size.width.to_string()
    } else {
        size.to_string()
    };

    // OsString keeps non-UTF-8 stems byte for byte
    let mut file_name = OsString::new();
    if let Some(stem) = base.file_stem() {
        file_name.push(stem);
    }
    file_name.push("-");
    file_name.push(&suffix);
    if let Some(ext) = base.extension() {
        file_name.push(".");
        file_name.push(ext);
    }

    match base.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}
