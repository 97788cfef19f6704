//! SpeedPipeline: drives frames from the tracker through to evidence.

use image::{RgbImage, imageops};
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::evidence::{EvidenceRecord, EvidenceWriter};
use crate::plate;
use crate::tracker::{Rect, TrackLedger, speed};

use super::recognizer::recognize_candidates;
use super::session::StopSignal;
use super::{FrameSource, TextRecognizer, TrackedDetection, VehicleTracker, ViolationEvent, ViolationObserver};

/// Counters for one finished (or stopped) session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Frames pulled from the source and processed
    pub frames: u64,
    /// Evidence records written
    pub issued: u64,
    /// Overspeed events lost to evidence failures
    pub dropped: u64,
    /// Whether the session ended on a stop request
    pub stopped: bool,
}

/// Sequential per-source pipeline.
///
/// Owns the session's [`TrackLedger`]; frames are processed strictly in
/// order and failures inside one event never reach the frame loop.
pub struct SpeedPipeline<T: VehicleTracker, R: TextRecognizer, O: ViolationObserver> {
    config: PipelineConfig,
    tracker: T,
    recognizer: R,
    writer: EvidenceWriter,
    observer: O,
    ledger: TrackLedger,
    frame_index: u64,
    summary: SessionSummary,
}

impl<T: VehicleTracker, R: TextRecognizer, O: ViolationObserver> SpeedPipeline<T, R, O> {
    pub fn new(
        config: PipelineConfig,
        tracker: T,
        recognizer: R,
        writer: EvidenceWriter,
        observer: O,
    ) -> Self {
        Self {
            config,
            tracker,
            recognizer,
            writer,
            observer,
            ledger: TrackLedger::new(),
            frame_index: 0,
            summary: SessionSummary::default(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &TrackLedger {
        &self.ledger
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary
    }

    /// Get a mutable reference to the underlying tracker.
    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }

    /// Process one frame sampled at `sampling_rate` frames per second.
    ///
    /// Returns the evidence issued for this frame. Only a tracker failure is
    /// an error; evidence failures are logged and counted as dropped.
    pub fn process_frame(
        &mut self,
        frame: &RgbImage,
        sampling_rate: f64,
    ) -> Result<Vec<EvidenceRecord>, PipelineError> {
        let frame_index = self.frame_index;
        self.frame_index += 1;
        self.summary.frames += 1;

        let detections = self
            .tracker
            .track(frame)
            .map_err(|e| PipelineError::Tracker {
                frame: frame_index,
                source: Box::new(e),
            })?;
        for track_id in self.tracker.ended_tracks() {
            self.ledger.evict(track_id);
        }

        let mut issued = Vec::new();
        for det in detections {
            if !self.config.is_vehicle(det.class_id) {
                continue;
            }
            let position = det.bbox.center();
            let observation = self.ledger.observe(det.track_id, position, frame_index);
            let Some(prior) = observation.prior else {
                continue;
            };

            let speed_kmh = speed::estimate(
                &prior,
                &position,
                sampling_rate,
                self.config.meters_per_pixel,
            );
            debug!(track_id = det.track_id, frame = frame_index, speed_kmh, "speed sample");
            if speed_kmh <= self.config.speed_limit_kmh || self.ledger.is_issued(det.track_id) {
                continue;
            }

            if let Some(record) = self.issue(frame, &det, speed_kmh) {
                issued.push(record);
            }
        }

        self.ledger
            .evict_inactive(frame_index, self.config.inactivity_frames);
        Ok(issued)
    }

    /// Process frames from `source` until it is exhausted or `stop` is set.
    ///
    /// The stop flag is checked between frames only.
    pub fn run<S: FrameSource>(
        &mut self,
        source: &mut S,
        stop: &StopSignal,
    ) -> Result<SessionSummary, PipelineError> {
        let sampling_rate = source
            .fps()
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .unwrap_or(self.config.fallback_fps);
        info!(sampling_rate, limit_kmh = self.config.speed_limit_kmh, "session started");

        loop {
            if stop.is_stopped() {
                info!(frames = self.summary.frames, "session stop requested");
                self.summary.stopped = true;
                break;
            }
            let Some(frame) = source.next_frame().map_err(PipelineError::Source)? else {
                break;
            };
            self.process_frame(&frame, sampling_rate)?;
        }

        info!(
            frames = self.summary.frames,
            issued = self.summary.issued,
            dropped = self.summary.dropped,
            "session finished"
        );
        Ok(self.summary)
    }

    fn issue(
        &mut self,
        frame: &RgbImage,
        det: &TrackedDetection,
        speed_kmh: f64,
    ) -> Option<EvidenceRecord> {
        let Some(vehicle) = vehicle_crop(frame, &det.bbox, self.config.crop_padding_px) else {
            warn!(track_id = det.track_id, "vehicle box lies outside the frame, not issuing");
            return None;
        };
        if !self.ledger.mark_issued(det.track_id) {
            return None;
        }
        info!(track_id = det.track_id, speed_kmh, "overspeed detected");

        let region = plate::locate(&vehicle);
        let conditioned = plate::condition(&region);
        let outcome = recognize_candidates(
            &mut self.recognizer,
            &conditioned,
            &self.config.recognizer_languages,
        );
        let plate_text = plate::select_from(outcome);

        match self
            .writer
            .write_for_track(det.track_id, &plate_text, speed_kmh, &vehicle)
        {
            Ok(record) => {
                self.summary.issued += 1;
                self.observer
                    .on_violation(&ViolationEvent::from_record(det.track_id, &record));
                Some(record)
            }
            Err(e) => {
                self.summary.dropped += 1;
                warn!(track_id = det.track_id, error = %e, "overspeed event dropped");
                None
            }
        }
    }
}

/// Padded vehicle crop, or `None` when the box does not overlap the frame.
fn vehicle_crop(frame: &RgbImage, bbox: &Rect, padding: u32) -> Option<RgbImage> {
    let window = bbox.padded_window(padding, frame.width(), frame.height());
    if window.is_empty() {
        return None;
    }
    Some(imageops::crop_imm(frame, window.x, window.y, window.width, window.height).to_image())
}
