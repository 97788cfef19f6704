//! Overspeed evidence pipeline.
//!
//! Consumes per-frame vehicle tracks from an external detector/tracker,
//! estimates each track's speed from successive positions, and issues at
//! most one evidence record per track that exceeds the configured limit:
//! a cropped vehicle image, the recognized plate text, a one-page document
//! and a durable row.

pub mod config;
pub mod error;
pub mod evidence;
pub mod integration;
pub mod plate;
pub mod tracker;

pub use config::PipelineConfig;
pub use error::{
    ConfigError, EvidenceError, PipelineError, RecognitionError, RenderError, SourceError,
    StoreError,
};
pub use evidence::{
    DocumentRenderer, EvidenceRecord, EvidenceStore, EvidenceWriter, SqliteEvidenceStore,
    SvgPageRenderer,
};
pub use integration::{
    DetectionBuilder, FrameSequence, FrameSource, RecognizedText, SessionHandle, SessionSummary,
    SpeedPipeline, StopSignal, TextRecognizer, TrackedDetection, VehicleTracker, ViolationEvent,
    ViolationObserver,
};
pub use plate::TextCandidate;
pub use tracker::{Position, Rect, TrackId, TrackLedger};
