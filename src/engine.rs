//! Rendering engine abstraction.
//!
//! A [`RenderEngine`] launches [`RenderSession`]s. A session owns one engine
//! process and one page inside it; it is acquired with
//! [`RenderEngine::launch`] and must be released with
//! [`RenderSession::close`] exactly once.

use crate::size::Size;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// The fixed set of document mutations a session can be asked to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentCommand {
    /// Set `name` to `value` on the document's top-level `<svg>` element.
    SetRootSvgAttribute { name: String, value: String },
}

impl DocumentCommand {
    pub fn set_root_svg_attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::SetRootSvgAttribute {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Outcome of a [`DocumentCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// The command's target element does not exist in the loaded document.
    TargetMissing,
}

/// Starts rendering sessions against an engine binary.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RenderEngine: Send + Sync {
    async fn launch(&self, executable: &Path) -> Result<Box<dyn RenderSession>>;
}

/// One live engine process with a single page.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RenderSession: Send {
    /// Replaces the page content with `html`.
    async fn load_document(&mut self, html: &str) -> Result<()>;

    async fn set_viewport(&mut self, size: Size) -> Result<()>;

    async fn apply(&mut self, command: &DocumentCommand) -> Result<CommandOutcome>;

    /// Writes a PNG of the viewport to `path` with the page background omitted.
    async fn capture_png(&mut self, path: &Path) -> Result<()>;

    /// Closes the page and terminates the engine process.
    async fn close(&mut self) -> Result<()>;
}
