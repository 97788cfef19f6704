//! Error types for the overspeed pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error coming out of an external collaborator (tracker, frame source).
pub type ExternalError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that end a processing session.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The frame source could not be opened.
    #[error("frame source unavailable: {0}")]
    SourceUnavailable(#[source] SourceError),

    /// Reading a frame failed after the source was opened.
    #[error("frame source failed: {0}")]
    Source(#[source] SourceError),

    /// The external detector/tracker failed on a frame.
    #[error("tracker failed on frame {frame}: {source}")]
    Tracker {
        frame: u64,
        #[source]
        source: ExternalError,
    },

    /// The session worker thread could not be started.
    #[error("cannot spawn session worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The session worker panicked.
    #[error("session worker panicked")]
    WorkerPanicked,
}

/// Failure of a frame source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source exists but cannot be opened (bad path, refused stream).
    #[error("cannot open {0}")]
    Open(String),

    /// A frame was read but could not be decoded into an image.
    #[error("decode error: {0}")]
    Decode(String),

    /// Reading from a file or socket backed source failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure of the external text recognizer. Always recovered locally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecognitionError {
    #[error("recognizer timed out")]
    Timeout,

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("recognizer engine error: {0}")]
    Engine(String),
}

/// Failure while assembling one piece of evidence.
#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error("cannot create evidence directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot save evidence image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot record evidence row: {0}")]
    Store(#[from] StoreError),
}

/// Failure of the durable row store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store connection lock poisoned")]
    Poisoned,
}

/// Failure while rendering the evidence document.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("evidence image has no pixels")]
    EmptyImage,

    #[error("cannot encode evidence image: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Failure while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
