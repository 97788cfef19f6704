//! Per-session bookkeeping of tracked objects.

use std::collections::HashMap;

use tracing::debug;

use crate::tracker::track_state::{TrackPhase, TrackState};
use crate::tracker::{Position, TrackId};

/// Result of recording one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Position recorded for this track on its previous observation
    pub prior: Option<Position>,
}

impl Observation {
    pub fn has_prior(&self) -> bool {
        self.prior.is_some()
    }
}

/// Last known position and issuance status of every live track in one
/// session.
///
/// Track ids are only meaningful within the tracking session that produced
/// them, so a ledger must never be shared between sources. Entries are
/// removed explicitly with [`evict`](Self::evict) or once they go stale via
/// [`evict_inactive`](Self::evict_inactive).
#[derive(Debug, Default)]
pub struct TrackLedger {
    tracks: HashMap<TrackId, TrackState>,
}

impl TrackLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `position` as the current position of `track_id` seen on
    /// `frame`, returning the position it replaced.
    pub fn observe(&mut self, track_id: TrackId, position: Position, frame: u64) -> Observation {
        let state = self
            .tracks
            .entry(track_id)
            .or_insert_with(|| TrackState::new(track_id, frame));
        let prior = state.last_position.replace(position);
        state.last_seen_frame = frame;
        Observation { prior }
    }

    /// Claim issuance for `track_id`.
    ///
    /// Returns true for exactly one caller per track lifetime, even when
    /// called concurrently through a shared reference. Unknown tracks are
    /// never claimed.
    pub fn mark_issued(&self, track_id: TrackId) -> bool {
        self.tracks
            .get(&track_id)
            .is_some_and(TrackState::mark_issued)
    }

    pub fn is_issued(&self, track_id: TrackId) -> bool {
        self.tracks
            .get(&track_id)
            .is_some_and(TrackState::is_issued)
    }

    /// `None` when the track is unseen or was evicted.
    pub fn phase(&self, track_id: TrackId) -> Option<TrackPhase> {
        self.tracks.get(&track_id).map(TrackState::phase)
    }

    /// Forget `track_id`. Returns whether an entry existed.
    pub fn evict(&mut self, track_id: TrackId) -> bool {
        let removed = self.tracks.remove(&track_id).is_some();
        if removed {
            debug!(track_id, "track evicted");
        }
        removed
    }

    /// Evict every track not observed for more than `window` frames before
    /// `current_frame`.
    pub fn evict_inactive(&mut self, current_frame: u64, window: u64) -> Vec<TrackId> {
        let mut evicted = Vec::new();
        self.tracks.retain(|&track_id, state| {
            let idle = current_frame.saturating_sub(state.last_seen_frame);
            if idle > window {
                evicted.push(track_id);
                false
            } else {
                true
            }
        });
        if !evicted.is_empty() {
            debug!(?evicted, current_frame, "inactive tracks evicted");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
