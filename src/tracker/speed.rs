//! Speed estimation from successive track positions.

use crate::tracker::Position;

/// Meters per second to kilometers per hour.
const MPS_TO_KMH: f64 = 3.6;

/// Speed in km/h of an object that moved from `prev` to `curr` between two
/// consecutive frames sampled at `sampling_rate` frames per second.
///
/// The displacement is attributed to exactly one sampling interval, so the
/// estimate is only accurate when the tracker reports the object on every
/// frame. A dropped frame inflates the result.
pub fn estimate(prev: &Position, curr: &Position, sampling_rate: f64, meters_per_pixel: f64) -> f64 {
    let pixels = nalgebra::distance(prev, curr);
    pixels * meters_per_pixel * sampling_rate * MPS_TO_KMH
}
