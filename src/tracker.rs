mod ledger;
mod rect;
pub mod speed;
mod track_state;

pub use ledger::{Observation, TrackLedger};
pub use rect::{PixelWindow, Rect};
pub use track_state::{TrackPhase, TrackState};

/// Identifier assigned by the external tracker, stable within one session.
pub type TrackId = u64;

/// Reference point of an object in pixel space.
pub type Position = nalgebra::Point2<f64>;
