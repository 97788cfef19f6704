//! Trait for frame sources (video decoders, cameras, replays).

use std::collections::VecDeque;

use image::RgbImage;

use crate::error::SourceError;

/// Sequential supplier of frames for one session.
pub trait FrameSource {
    /// Native frame rate, if the source knows it.
    fn fps(&self) -> Option<f64>;

    /// Next frame, or `None` at end of stream. May block on I/O.
    fn next_frame(&mut self) -> Result<Option<RgbImage>, SourceError>;
}

/// Frames already decoded into memory, replayed in order.
#[derive(Debug, Clone, Default)]
pub struct FrameSequence {
    frames: VecDeque<RgbImage>,
    fps: Option<f64>,
}

impl FrameSequence {
    pub fn new(frames: impl IntoIterator<Item = RgbImage>, fps: Option<f64>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            fps,
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for FrameSequence {
    fn fps(&self) -> Option<f64> {
        self.fps
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>, SourceError> {
        Ok(self.frames.pop_front())
    }
}
