//! Host HTML document wrapped around raw SVG markup.

use crate::error::{ConvertError, ConvertResult};
use std::path::Path;
use tracing::debug;

/// Resets page margins and pins the SVG to the viewport origin so the
/// viewport size is exactly the rendered footprint.
const SHIM_STYLE: &str =
    "<style>html, body { margin: 0; padding: 0; } svg { position: absolute; top: 0; left: 0; }</style>";

/// Wraps SVG markup in the host document loaded into the renderer.
pub fn build_shim_document(svg_markup: &str) -> String {
    let mut html = String::with_capacity(svg_markup.len() + SHIM_STYLE.len() + 16);
    html.push_str("<!DOCTYPE html>");
    html.push_str(SHIM_STYLE);
    html.push_str(svg_markup);
    html
}

/// Reads the SVG at `path` and builds its shim document.
pub async fn load_shim_document(path: &Path) -> ConvertResult<String> {
    let svg = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConvertError::input(path, format!("failed to read SVG: {}", e)))?;

    debug!(path = %path.display(), bytes = svg.len(), "Loaded SVG source");
    Ok(build_shim_document(&svg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><rect width="10" height="10"/></svg>"#;

    #[test]
    fn test_shim_wraps_markup_verbatim() {
        let html = build_shim_document(SVG);
        assert!(html.starts_with("<!DOCTYPE html><style>"));
        assert!(html.ends_with(SVG));
    }

    #[test]
    fn test_shim_resets_margins_and_pins_svg() {
        let html = build_shim_document(SVG);
        assert!(html.contains("html, body { margin: 0; padding: 0; }"));
        assert!(html.contains("svg { position: absolute; top: 0; left: 0; }"));
        assert!(!html.contains("<script"));
    }

    #[tokio::test]
    async fn test_load_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SVG.as_bytes()).unwrap();

        let html = load_shim_document(file.path()).await.unwrap();
        assert_eq!(html, build_shim_document(SVG));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_shim_document(&dir.path().join("missing.svg")).await;
        assert!(matches!(result, Err(ConvertError::Input { .. })));
    }
}
