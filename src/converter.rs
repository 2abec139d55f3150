//! SVG to PNG conversion through a headless rendering engine.

use crate::capture::{capture, CaptureFailure};
use crate::engine::{RenderEngine, RenderSession};
use crate::error::{CaptureStage, ConvertError, ConvertResult};
use crate::naming::resolve_path;
use crate::report::{ConversionRequest, ConversionResult};
use crate::shim::load_shim_document;
use std::collections::HashSet;
use tracing::{debug, info, warn, Instrument};

/// Drives one engine session per conversion.
///
/// Every call to [`Converter::convert`] launches its own session and closes
/// it before returning, on success and on failure alike. Calls may run
/// concurrently; they never share a session.
pub struct Converter<E> {
    engine: E,
}

impl<E: RenderEngine> Converter<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Renders `request.input_path` once per requested size.
    ///
    /// # Returns
    ///
    /// The written paths, index-aligned with `request.sizes`.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for an empty, zero-sized, or duplicated size list
    /// - `Input` if the SVG cannot be read (no engine is started)
    /// - `EngineLaunch` if the engine fails to start
    /// - `Render` if a capture fails; remaining sizes are skipped
    /// - `Teardown` if the engine fails to shut down after an otherwise
    ///   successful conversion
    pub async fn convert(&self, request: &ConversionRequest) -> ConvertResult<ConversionResult> {
        check_request(request)?;
        let html = load_shim_document(&request.input_path).await?;

        let result = ConversionResult::begin(&request.sizes);
        let span = tracing::info_span!("convert", session_id = %result.session_id);
        self.run(request, &html, result).instrument(span).await
    }

    async fn run(
        &self,
        request: &ConversionRequest,
        html: &str,
        result: ConversionResult,
    ) -> ConvertResult<ConversionResult> {
        info!(
            input = %request.input_path.display(),
            sizes = request.sizes.len(),
            "Starting conversion"
        );

        let mut session = self
            .engine
            .launch(&request.executable_path)
            .await
            .map_err(|source| ConvertError::EngineLaunch {
                executable: request.executable_path.clone(),
                source,
            })?;
        debug!(executable = %request.executable_path.display(), "Engine launched");

        let outcome = render_all(session.as_mut(), html, request, result).await;
        let teardown = session.close().await;

        match (outcome, teardown) {
            (Ok(result), Ok(())) => {
                let result = result.finish();
                debug!(outputs = result.outputs.len(), "Engine closed");
                Ok(result)
            }
            (Ok(_), Err(source)) => Err(ConvertError::Teardown { source }),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(teardown_err)) => {
                let teardown_err = format!("{:#}", teardown_err);
                warn!(error = %teardown_err, "Engine shutdown failed after error");
                Err(e)
            }
        }
    }
}

/// Loads the document once, then captures each size in order.
async fn render_all(
    session: &mut dyn RenderSession,
    html: &str,
    request: &ConversionRequest,
    mut result: ConversionResult,
) -> ConvertResult<ConversionResult> {
    session.load_document(html).await.map_err(|source| ConvertError::Render {
        size: request.sizes[0],
        path: resolve_path(&request.output_path, request.sizes[0], 0, request.sizes.len()),
        stage: CaptureStage::Load,
        completed: Vec::new(),
        source: source.context("failed to load shim document"),
    })?;

    let total = request.sizes.len();
    for (index, &size) in request.sizes.iter().enumerate() {
        let path = resolve_path(&request.output_path, size, index, total);

        if let Err(CaptureFailure { stage, source }) = capture(session, size, &path).await {
            return Err(ConvertError::Render {
                size,
                path,
                stage,
                completed: result.outputs,
                source,
            });
        }

        debug!(size = %size, path = %path.display(), "Wrote PNG");
        result.outputs.push(path);
    }

    Ok(result)
}

/// Rejects size lists that would produce missing or colliding outputs.
fn check_request(request: &ConversionRequest) -> ConvertResult<()> {
    if request.sizes.is_empty() {
        return Err(ConvertError::invalid_request("no output sizes requested"));
    }

    let mut seen = HashSet::with_capacity(request.sizes.len());
    for size in &request.sizes {
        if !size.is_valid() {
            return Err(ConvertError::invalid_request(format!(
                "size {} has a zero dimension",
                size
            )));
        }
        if !seen.insert(*size) {
            return Err(ConvertError::invalid_request(format!(
                "size {} requested more than once",
                size
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CommandOutcome, MockRenderEngine, MockRenderSession};
    use crate::size::Size;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"/>"#;

    fn svg_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SVG.as_bytes()).unwrap();
        file
    }

    /// Session that succeeds everywhere except the capture at `fail_at`.
    fn session(fail_at: Option<usize>, closes: Arc<AtomicUsize>) -> MockRenderSession {
        let mut session = MockRenderSession::new();
        session.expect_load_document().times(1).returning(|_| Ok(()));
        session.expect_set_viewport().returning(|_| Ok(()));
        session
            .expect_apply()
            .returning(|_| Ok(CommandOutcome::Applied));

        let captures = AtomicUsize::new(0);
        session.expect_capture_png().returning(move |_| {
            let n = captures.fetch_add(1, Ordering::SeqCst);
            if Some(n) == fail_at {
                Err(anyhow::anyhow!("capture failed"))
            } else {
                Ok(())
            }
        });
        session.expect_close().times(1).returning(move || {
            closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        session
    }

    fn engine_with(session: MockRenderSession, launches: Arc<AtomicUsize>) -> MockRenderEngine {
        let mut engine = MockRenderEngine::new();
        let mut slot = Some(session);
        engine.expect_launch().times(1).returning(move |_| {
            launches.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(slot.take().expect("launched twice")) as Box<dyn RenderSession>)
        });
        engine
    }

    fn request(input: &Path, output: &str, sizes: Vec<Size>) -> ConversionRequest {
        ConversionRequest::new(input, output, sizes, "/usr/bin/chromium")
    }

    #[tokio::test]
    async fn test_single_size_writes_to_output_path() {
        let input = svg_file();
        let closes = Arc::new(AtomicUsize::new(0));
        let launches = Arc::new(AtomicUsize::new(0));
        let converter = Converter::new(engine_with(session(None, closes.clone()), launches.clone()));

        let result = converter
            .convert(&request(input.path(), "sample.png", vec![Size::square(256)]))
            .await
            .unwrap();

        assert_eq!(result.outputs, vec![PathBuf::from("sample.png")]);
        assert_eq!(launches.load(Ordering::SeqCst), 1);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_multiple_sizes_are_suffixed_in_order() {
        let input = svg_file();
        let closes = Arc::new(AtomicUsize::new(0));
        let converter = Converter::new(engine_with(
            session(None, closes.clone()),
            Arc::new(AtomicUsize::new(0)),
        ));

        let sizes = vec![Size::square(256), Size::new(128, 256)];
        let result = converter
            .convert(&request(input.path(), "icon.png", sizes.clone()))
            .await
            .unwrap();

        assert_eq!(
            result.outputs,
            vec![PathBuf::from("icon-256.png"), PathBuf::from("icon-128x256.png")]
        );
        assert_eq!(result.sizes, sizes);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mid_sequence_failure_still_tears_down() {
        let input = svg_file();
        let closes = Arc::new(AtomicUsize::new(0));
        let launches = Arc::new(AtomicUsize::new(0));
        let converter = Converter::new(engine_with(session(Some(1), closes.clone()), launches.clone()));

        let sizes = vec![Size::square(16), Size::square(32), Size::square(64)];
        let err = converter
            .convert(&request(input.path(), "icon.png", sizes))
            .await
            .unwrap_err();

        match err {
            ConvertError::Render {
                size,
                path,
                stage,
                completed,
                ..
            } => {
                assert_eq!(size, Size::square(32));
                assert_eq!(path, PathBuf::from("icon-32.png"));
                assert_eq!(stage, CaptureStage::Screenshot);
                assert_eq!(completed, vec![PathBuf::from("icon-16.png")]);
            }
            other => panic!("expected render error, got {:?}", other),
        }
        assert_eq!(launches.load(Ordering::SeqCst), 1);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_launch_failure_is_reported() {
        let input = svg_file();
        let mut engine = MockRenderEngine::new();
        engine
            .expect_launch()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("no such file")));

        let err = Converter::new(engine)
            .convert(&request(input.path(), "a.png", vec![Size::square(8)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::EngineLaunch { .. }));
    }

    #[tokio::test]
    async fn test_missing_input_never_launches() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = MockRenderEngine::new();
        engine.expect_launch().never();

        let err = Converter::new(engine)
            .convert(&request(&dir.path().join("nope.svg"), "a.png", vec![Size::square(8)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Input { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_sizes_are_rejected() {
        let input = svg_file();
        let mut engine = MockRenderEngine::new();
        engine.expect_launch().never();

        let err = Converter::new(engine)
            .convert(&request(
                input.path(),
                "a.png",
                vec![Size::square(8), Size::new(8, 4), Size::square(8)],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_empty_sizes_are_rejected() {
        let input = svg_file();
        let mut engine = MockRenderEngine::new();
        engine.expect_launch().never();

        let err = Converter::new(engine)
            .convert(&request(input.path(), "a.png", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_teardown_error_surfaces_when_alone() {
        let input = svg_file();
        let mut session = MockRenderSession::new();
        session.expect_load_document().returning(|_| Ok(()));
        session.expect_set_viewport().returning(|_| Ok(()));
        session
            .expect_apply()
            .returning(|_| Ok(CommandOutcome::Applied));
        session.expect_capture_png().returning(|_| Ok(()));
        session
            .expect_close()
            .times(1)
            .returning(|| Err(anyhow::anyhow!("process hung")));

        let converter = Converter::new(engine_with(session, Arc::new(AtomicUsize::new(0))));
        let err = converter
            .convert(&request(input.path(), "a.png", vec![Size::square(8)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Teardown { .. }));
    }

    #[tokio::test]
    async fn test_teardown_error_does_not_mask_render_error() {
        let input = svg_file();
        let mut session = MockRenderSession::new();
        session.expect_load_document().returning(|_| Ok(()));
        session
            .expect_set_viewport()
            .returning(|_| Err(anyhow::anyhow!("target crashed")));
        session
            .expect_close()
            .times(1)
            .returning(|| Err(anyhow::anyhow!("process hung")));

        let converter = Converter::new(engine_with(session, Arc::new(AtomicUsize::new(0))));
        let err = converter
            .convert(&request(input.path(), "a.png", vec![Size::square(8)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Render {
                stage: CaptureStage::Viewport,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_document_load_failure_tears_down() {
        let input = svg_file();
        let mut session = MockRenderSession::new();
        session
            .expect_load_document()
            .returning(|_| Err(anyhow::anyhow!("navigation failed")));
        session.expect_set_viewport().never();
        session.expect_close().times(1).returning(|| Ok(()));

        let converter = Converter::new(engine_with(session, Arc::new(AtomicUsize::new(0))));
        let err = converter
            .convert(&request(input.path(), "a.png", vec![Size::square(8)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Render { .. }));
    }
}
