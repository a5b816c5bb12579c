use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::SubtransError;

/// Emitted once per completed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// 1-based index of the batch that just finished
    pub batch_index: usize,
    pub total_batches: usize,
    /// Rounded percentage, 100 on the last batch
    pub percent_complete: u8,
}

impl ProgressEvent {
    pub fn new(batch_index: usize, total_batches: usize) -> Self {
        let percent = if total_batches == 0 {
            100.0
        } else {
            (batch_index as f64 / total_batches as f64) * 100.0
        };

        Self {
            batch_index,
            total_batches,
            percent_complete: percent.round().clamp(0.0, 100.0) as u8,
        }
    }
}

/// Category of a failed run, kept next to the client-facing message so the
/// receiving side can rebuild a matching error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    Completion { attempts: u32 },
    Cancelled,
    Other,
}

impl FailureKind {
    pub fn of(error: &SubtransError) -> Self {
        match error {
            SubtransError::Validation(_) => Self::Validation,
            SubtransError::Completion { attempts, .. } => Self::Completion { attempts: *attempts },
            SubtransError::Cancelled => Self::Cancelled,
            _ => Self::Other,
        }
    }

    pub fn into_error(self, message: String) -> SubtransError {
        match self {
            Self::Validation => SubtransError::Validation(message),
            Self::Completion { attempts } => SubtransError::Completion { attempts, message },
            Self::Cancelled => SubtransError::Cancelled,
            Self::Other => SubtransError::Provider(message),
        }
    }
}

/// Everything a streaming consumer sees during one run: progress events in
/// batch order, then exactly one `Done` or `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    Progress(ProgressEvent),
    Done { srt: String },
    Error { message: String, kind: FailureKind },
}

impl PipelineEvent {
    pub fn failed(error: &SubtransError) -> Self {
        Self::Error {
            message: error.client_message(),
            kind: FailureKind::of(error),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Progress(_) => "progress",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }

    pub fn payload(&self) -> serde_json::Value {
        match self {
            Self::Progress(progress) => json!(progress),
            Self::Done { srt } => json!({ "srt": srt }),
            Self::Error { message, .. } => json!({ "message": message }),
        }
    }

    /// Render as a server-sent-events frame
    pub fn to_sse_frame(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.name(), self.payload())
    }
}

/// Writes events as SSE frames. The first failed write or flush means the
/// reader is gone: the run is cancelled and later events are dropped.
pub struct SseWriter<W> {
    writer: W,
    cancel: CancellationToken,
    open: bool,
}

impl<W: Write> SseWriter<W> {
    pub fn new(writer: W, cancel: CancellationToken) -> Self {
        Self { writer, cancel, open: true }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn send(&mut self, event: &PipelineEvent) {
        if !self.open {
            return;
        }

        let frame = event.to_sse_frame();
        let result = self
            .writer
            .write_all(frame.as_bytes())
            .and_then(|_| self.writer.flush());

        if let Err(e) = result {
            warn!("Event stream closed ({}), cancelling translation", e);
            self.open = false;
            self.cancel.cancel();
        }
    }
}
