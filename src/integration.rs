//! Integration module connecting the external tracker, recognizer and frame
//! source to the core pipeline.
//!
//! This module provides the traits those collaborators implement, the
//! per-frame [`SpeedPipeline`] and background [`session`]s.

mod builder;
mod detector;
mod observer;
mod pipeline;
mod recognizer;
pub mod session;
mod source;

pub use builder::DetectionBuilder;
pub use detector::{TrackedDetection, VehicleTracker};
pub use observer::{ViolationEvent, ViolationObserver};
pub use pipeline::{SessionSummary, SpeedPipeline};
pub use recognizer::{RecognizedText, TextRecognizer, recognize_candidates};
pub use session::{SessionHandle, StopSignal};
pub use source::{FrameSequence, FrameSource};
