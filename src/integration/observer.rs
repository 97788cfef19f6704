//! Caller-facing notification of issued events.

use std::path::PathBuf;
use std::sync::mpsc::Sender;

use tracing::debug;

use crate::evidence::EvidenceRecord;
use crate::tracker::TrackId;

/// Emitted once per issuance, after the evidence row has been written.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolationEvent {
    pub record_id: i64,
    pub track_id: TrackId,
    pub plate_text: String,
    pub speed_kmh: f64,
    pub image_path: PathBuf,
    pub document_path: Option<PathBuf>,
}

impl ViolationEvent {
    pub fn from_record(track_id: TrackId, record: &EvidenceRecord) -> Self {
        Self {
            record_id: record.id,
            track_id,
            plate_text: record.plate_text.clone(),
            speed_kmh: record.speed_kmh,
            image_path: record.image_path.clone(),
            document_path: record.document_path.clone(),
        }
    }
}

/// Receives issued events. Must not block the pipeline for long.
pub trait ViolationObserver: Send {
    fn on_violation(&mut self, event: &ViolationEvent);
}

impl ViolationObserver for Sender<ViolationEvent> {
    fn on_violation(&mut self, event: &ViolationEvent) {
        if self.send(event.clone()).is_err() {
            debug!(record_id = event.record_id, "event receiver dropped");
        }
    }
}

impl<F> ViolationObserver for F
where
    F: FnMut(&ViolationEvent) + Send,
{
    fn on_violation(&mut self, event: &ViolationEvent) {
        self(event)
    }
}
