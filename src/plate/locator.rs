//! Plate region heuristic.

use image::RgbImage;
use image::imageops;
use tracing::debug;

/// Fraction of the vehicle crop height above the plate band.
const PLATE_BAND_START: f64 = 0.6;

/// Cut the candidate plate region out of a vehicle crop.
///
/// The plate is assumed to sit in the bottom 40% of the vehicle box, across
/// the full width. This is a cheap approximation, not a plate detector; the
/// recognizer tolerates surrounding non-text content. A degenerate band
/// falls back to the whole crop.
pub fn locate(vehicle: &RgbImage) -> RgbImage {
    let (width, height) = vehicle.dimensions();
    let top = (f64::from(height) * PLATE_BAND_START) as u32;
    let band_height = height.saturating_sub(top);

    if width == 0 || band_height == 0 {
        debug!(width, height, "degenerate plate band, using full vehicle crop");
        return vehicle.clone();
    }

    imageops::crop_imm(vehicle, 0, top, width, band_height).to_image()
}
