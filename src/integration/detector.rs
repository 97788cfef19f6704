//! Trait for the external detector/tracker.

use image::RgbImage;

use crate::tracker::{Rect, TrackId};

/// One tracked object reported for a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedDetection {
    pub bbox: Rect,
    /// Identity assigned by the tracker, stable across frames of one session
    pub track_id: TrackId,
    /// Detector category (e.g. a COCO class index)
    pub class_id: u32,
    /// Detection confidence score
    pub score: f32,
}

impl TrackedDetection {
    pub fn new(bbox: Rect, track_id: TrackId, class_id: u32, score: f32) -> Self {
        Self {
            bbox,
            track_id,
            class_id,
            score,
        }
    }
}

/// Object detector combined with a multi-object tracker.
///
/// Implement this trait to connect any detection model and tracker to the
/// pipeline.
///
/// # Example
///
/// ```ignore
/// use overspeed_rs::{TrackedDetection, VehicleTracker};
///
/// struct MyTracker {
///     // Your model and tracker here
/// }
///
/// impl VehicleTracker for MyTracker {
///     type Error = std::io::Error;
///
///     fn track(&mut self, frame: &image::RgbImage) -> Result<Vec<TrackedDetection>, Self::Error> {
///         // Run inference and association
///         Ok(vec![])
///     }
/// }
/// ```
pub trait VehicleTracker {
    /// Error type for detection or tracking failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Detect and associate objects in `frame`.
    ///
    /// Track ids need only be unique within one session; they carry no
    /// meaning across source restarts.
    fn track(&mut self, frame: &RgbImage) -> Result<Vec<TrackedDetection>, Self::Error>;

    /// Ids the tracker has retired since the last call.
    ///
    /// Trackers that cannot report this rely on the pipeline's inactivity
    /// eviction instead.
    fn ended_tracks(&mut self) -> Vec<TrackId> {
        Vec::new()
    }
}
