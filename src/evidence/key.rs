use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local};

use crate::tracker::TrackId;

/// Plate text recorded when nothing usable was recognized.
pub const UNKNOWN_PLATE: &str = "UNKNOWN";

/// Process-wide sequence keeping keys distinct within the same second.
static KEY_SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn next_sequence() -> u64 {
    KEY_SEQUENCE.fetch_add(1, Ordering::SeqCst) + 1
}

/// Make plate text safe for use in a file name.
///
/// Whitespace becomes `_`, anything other than ASCII alphanumerics, `-` and
/// `_` is dropped, and an empty result becomes [`UNKNOWN_PLATE`].
pub fn sanitize_plate(plate: &str) -> String {
    let cleaned: String = plate
        .trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('_'),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .collect();
    if cleaned.is_empty() {
        UNKNOWN_PLATE.to_string()
    } else {
        cleaned
    }
}

/// File-name stem shared by the image and document of one issuance.
///
/// Second-resolution time and plate text alone collide when two events land
/// in the same second, so the key also carries the track id (when known) and
/// a process-wide sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceKey(String);

impl EvidenceKey {
    pub fn new(timestamp: &DateTime<Local>, plate: &str, track_id: Option<TrackId>) -> Self {
        let plate = sanitize_plate(plate);
        let stamp = timestamp.format("%Y%m%d_%H%M%S");
        let seq = next_sequence();
        let key = match track_id {
            Some(id) => format!("{plate}_{stamp}_t{id}_{seq:04}"),
            None => format!("{plate}_{stamp}_{seq:04}"),
        };
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn image_file_name(&self) -> String {
        format!("evidence_{}.jpg", self.0)
    }

    pub fn document_file_name(&self, extension: &str) -> String {
        format!("challan_{}.{extension}", self.0)
    }
}
