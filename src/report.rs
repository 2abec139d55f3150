//! Conversion request and result models.

use crate::size::Size;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A validated conversion job handed to the converter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub sizes: Vec<Size>,
    pub executable_path: PathBuf,
}

impl ConversionRequest {
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        sizes: Vec<Size>,
        executable_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            sizes,
            executable_path: executable_path.into(),
        }
    }
}

/// Outputs of a successful conversion, index-aligned with the requested sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    pub session_id: String,
    pub outputs: Vec<PathBuf>,
    pub sizes: Vec<Size>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ConversionResult {
    pub(crate) fn begin(sizes: &[Size]) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4().to_string(),
            outputs: Vec::with_capacity(sizes.len()),
            sizes: sizes.to_vec(),
            started_at: now,
            finished_at: now,
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    pub fn duration_ms(&self) -> i64 {
        self.finished_at
            .signed_duration_since(self.started_at)
            .num_milliseconds()
    }

    /// `(size, path)` pairs in request order.
    pub fn entries(&self) -> impl Iterator<Item = (Size, &PathBuf)> {
        self.sizes.iter().copied().zip(self.outputs.iter())
    }
}
