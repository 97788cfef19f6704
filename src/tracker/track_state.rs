use std::sync::atomic::{AtomicBool, Ordering};

use crate::tracker::{Position, TrackId};

/// Lifecycle phase of a track held by the ledger.
///
/// `Unseen` and `Evicted` are represented by the absence of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackPhase {
    /// Observed, no evidence issued yet
    #[default]
    Tracking,
    /// Evidence issued; permanent until the track is evicted
    Issued,
}

/// Per-track state owned by a [`TrackLedger`](crate::tracker::TrackLedger).
#[derive(Debug)]
pub struct TrackState {
    /// Identifier assigned by the external tracker
    pub track_id: TrackId,
    /// Most recent reference point
    pub last_position: Option<Position>,
    /// Frame index of the most recent observation
    pub last_seen_frame: u64,
    issued: AtomicBool,
}

impl TrackState {
    pub fn new(track_id: TrackId, frame: u64) -> Self {
        Self {
            track_id,
            last_position: None,
            last_seen_frame: frame,
            issued: AtomicBool::new(false),
        }
    }

    pub fn phase(&self) -> TrackPhase {
        if self.is_issued() {
            TrackPhase::Issued
        } else {
            TrackPhase::Tracking
        }
    }

    pub fn is_issued(&self) -> bool {
        self.issued.load(Ordering::Acquire)
    }

    /// Flip `issued` to true. Returns true only for the call that flipped it.
    pub fn mark_issued(&self) -> bool {
        self.issued
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
