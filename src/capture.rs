//! Per-size capture against an already loaded shim document.

use crate::engine::{CommandOutcome, DocumentCommand, RenderSession};
use crate::error::CaptureStage;
use crate::size::Size;
use std::path::Path;
use tracing::{debug, trace};

/// Failure of one capture, tagged with the stage that failed.
#[derive(Debug)]
pub struct CaptureFailure {
    pub stage: CaptureStage,
    pub source: anyhow::Error,
}

/// Resizes the viewport, pins the SVG's width/height to `size`, and writes
/// a transparent-background PNG to `output`.
///
/// A document without an `<svg>` root is captured as-is.
pub async fn capture(
    session: &mut dyn RenderSession,
    size: Size,
    output: &Path,
) -> Result<(), CaptureFailure> {
    let fail = |stage| move |source| CaptureFailure { stage, source };

    session
        .set_viewport(size)
        .await
        .map_err(fail(CaptureStage::Viewport))?;

    for command in normalization_commands(size) {
        let outcome = session
            .apply(&command)
            .await
            .map_err(fail(CaptureStage::Normalize))?;

        if outcome == CommandOutcome::TargetMissing {
            debug!(size = %size, "No <svg> root in document, skipping size normalization");
            break;
        }
    }

    session
        .capture_png(output)
        .await
        .map_err(fail(CaptureStage::Screenshot))?;

    trace!(size = %size, path = %output.display(), "Captured");
    Ok(())
}

/// Explicit pixel width/height so the SVG fills the viewport instead of
/// falling back to its intrinsic or viewBox size.
fn normalization_commands(size: Size) -> [DocumentCommand; 2] {
    [
        DocumentCommand::set_root_svg_attribute("width", format!("{}px", size.width)),
        DocumentCommand::set_root_svg_attribute("height", format!("{}px", size.height)),
    ]
}
