//! Error taxonomy for the conversion pipeline.

use crate::size::Size;
use std::path::PathBuf;
use thiserror::Error;

pub type ConvertResult<T> = Result<T, ConvertError>;

/// Stage of a per-size capture that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStage {
    Load,
    Viewport,
    Normalize,
    Screenshot,
}

impl std::fmt::Display for CaptureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureStage::Load => write!(f, "document load"),
            CaptureStage::Viewport => write!(f, "viewport resize"),
            CaptureStage::Normalize => write!(f, "svg size normalization"),
            CaptureStage::Screenshot => write!(f, "screenshot"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConvertError {
    /// The SVG source is missing, unreadable, or not UTF-8 text.
    #[error("input error for '{}': {message}", path.display())]
    Input { path: PathBuf, message: String },

    #[error("invalid conversion request: {0}")]
    InvalidRequest(String),

    #[error("no usable rendering engine: {0}")]
    ExecutableResolution(String),

    #[error("failed to launch rendering engine '{}'", executable.display())]
    EngineLaunch {
        executable: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// A capture failed. `completed` lists the outputs written before it.
    #[error("failed to render {size} to '{}' during {stage}", path.display())]
    Render {
        size: Size,
        path: PathBuf,
        stage: CaptureStage,
        completed: Vec<PathBuf>,
        #[source]
        source: anyhow::Error,
    },

    #[error("rendering engine did not shut down cleanly")]
    Teardown {
        #[source]
        source: anyhow::Error,
    },
}

impl ConvertError {
    pub fn input(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Input {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn executable_resolution(msg: impl Into<String>) -> Self {
        Self::ExecutableResolution(msg.into())
    }
}
