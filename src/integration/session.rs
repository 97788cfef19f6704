//! Background sessions: one pipeline per source on its own worker thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use tracing::{error, info, info_span};

use crate::error::{PipelineError, SourceError};

use super::pipeline::{SessionSummary, SpeedPipeline};
use super::{FrameSource, TextRecognizer, VehicleTracker, ViolationObserver};

/// Cooperative cancellation flag, checked between frames.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Handle to a running session.
pub struct SessionHandle {
    name: String,
    stop: StopSignal,
    worker: JoinHandle<Result<SessionSummary, PipelineError>>,
}

impl SessionHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Request the session to stop after the frame in progress.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the session to end.
    pub fn join(self) -> Result<SessionSummary, PipelineError> {
        self.worker
            .join()
            .map_err(|_| PipelineError::WorkerPanicked)?
    }
}

/// Start a session on a new named thread.
///
/// `open` runs on the worker; if it fails the session ends with
/// [`PipelineError::SourceUnavailable`] and nothing is processed.
pub fn spawn<S, F, T, R, O>(
    name: impl Into<String>,
    open: F,
    mut pipeline: SpeedPipeline<T, R, O>,
) -> Result<SessionHandle, PipelineError>
where
    S: FrameSource,
    F: FnOnce() -> Result<S, SourceError> + Send + 'static,
    T: VehicleTracker + Send + 'static,
    R: TextRecognizer + Send + 'static,
    O: ViolationObserver + 'static,
{
    let name = name.into();
    let stop = StopSignal::new();
    let worker_stop = stop.clone();
    let span_name = name.clone();

    let worker = thread::Builder::new()
        .name(format!("session-{name}"))
        .spawn(move || {
            let span = info_span!("session", name = %span_name);
            let _guard = span.enter();

            let mut source = open().map_err(|e| {
                error!(error = %e, "cannot open frame source");
                PipelineError::SourceUnavailable(e)
            })?;
            let result = pipeline.run(&mut source, &worker_stop);
            if let Err(e) = &result {
                error!(error = %e, "session aborted");
            }
            result
        })
        .map_err(PipelineError::Spawn)?;

    info!(session = %name, "session spawned");
    Ok(SessionHandle { name, stop, worker })
}
