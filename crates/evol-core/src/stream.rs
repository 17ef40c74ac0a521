//! Newline-delimited JSON progress stream.
//!
//! [`run_streaming`] starts a run on its own tokio task and yields its
//! progress events as frames, followed by exactly one terminal frame
//! (`completed` or `error`). Each stream owns the channel of its run.
//! Dropping the stream does not cancel the run.

use std::io::Write;
use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::EvolError;
use crate::pipeline::EvolPipeline;
use crate::progress::{progress_channel, ProgressEvent};
use crate::request::ValidatedRequest;
use crate::response::{generate, GenerateResponse};

/// One line of the progress stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamFrame {
    Progress { event: ProgressEvent },
    Completed { response: GenerateResponse },
    Error { message: String },
}

impl StreamFrame {
    /// Whether this frame ends the stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }

    /// Serialize as a single JSON line, without the newline.
    pub fn to_line(&self) -> Result<String, EvolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Start a run and stream its frames.
pub fn run_streaming(
    pipeline: EvolPipeline,
    request: ValidatedRequest,
) -> impl Stream<Item = StreamFrame> + Send + 'static {
    let (sink, receiver) = progress_channel();

    let run = tokio::spawn(async move { generate(&pipeline, request, Some(Arc::new(sink))).await });

    let progress = receiver
        .into_stream()
        .map(|event| StreamFrame::Progress { event });

    let terminal = stream::once(async move {
        match run.await {
            Ok(Ok(response)) => StreamFrame::Completed { response },
            Ok(Err(err)) => StreamFrame::Error {
                message: err.to_string(),
            },
            Err(join) => StreamFrame::Error {
                message: format!("Pipeline task failed: {}", join),
            },
        }
    });

    progress.chain(terminal)
}

/// Write frames as NDJSON, flushing after each line.
///
/// Returns the terminal frame.
///
/// # Errors
///
/// [`EvolError::Stream`] when the stream ends without a terminal frame.
pub async fn write_ndjson<S, W>(frames: S, out: &mut W) -> Result<StreamFrame, EvolError>
where
    S: Stream<Item = StreamFrame>,
    W: Write,
{
    futures::pin_mut!(frames);
    let mut lines = 0usize;

    while let Some(frame) = frames.next().await {
        writeln!(out, "{}", frame.to_line()?)?;
        out.flush()?;
        lines += 1;

        if frame.is_terminal() {
            debug!(lines, "Progress stream finished");
            return Ok(frame);
        }
    }

    Err(EvolError::Stream(format!(
        "stream ended after {} frames without a terminal frame",
        lines
    )))
}
