//! Assembly of image, document and row for one issuance.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use image::{ImageFormat, RgbImage};
use tracing::{info, warn};

use crate::error::EvidenceError;
use crate::evidence::document::{DocumentRenderer, EvidenceDocument};
use crate::evidence::key::{EvidenceKey, UNKNOWN_PLATE};
use crate::evidence::store::{EvidenceRecord, EvidenceStore, NewEvidence};
use crate::tracker::TrackId;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes the evidence triple for an issuance.
///
/// Steps run in order: image, document, row. A failed image aborts the
/// event. A failed document is logged and the row is written without one.
/// A failed row removes the image and document again.
#[derive(Clone)]
pub struct EvidenceWriter {
    dir: PathBuf,
    store: Arc<dyn EvidenceStore>,
    renderer: Arc<dyn DocumentRenderer>,
}

impl EvidenceWriter {
    /// Create a writer, creating `dir` if it does not exist yet.
    pub fn new(
        dir: impl Into<PathBuf>,
        store: Arc<dyn EvidenceStore>,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Result<Self, EvidenceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| EvidenceError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            store,
            renderer,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(
        &self,
        plate_text: &str,
        speed_kmh: f64,
        vehicle: &RgbImage,
    ) -> Result<EvidenceRecord, EvidenceError> {
        self.write_at(Local::now(), None, plate_text, speed_kmh, vehicle)
    }

    /// Same as [`write`](Self::write), with the track id folded into the key.
    pub fn write_for_track(
        &self,
        track_id: TrackId,
        plate_text: &str,
        speed_kmh: f64,
        vehicle: &RgbImage,
    ) -> Result<EvidenceRecord, EvidenceError> {
        self.write_at(Local::now(), Some(track_id), plate_text, speed_kmh, vehicle)
    }

    pub fn write_at(
        &self,
        now: DateTime<Local>,
        track_id: Option<TrackId>,
        plate_text: &str,
        speed_kmh: f64,
        vehicle: &RgbImage,
    ) -> Result<EvidenceRecord, EvidenceError> {
        let key = EvidenceKey::new(&now, plate_text, track_id);
        let plate_text = if plate_text.is_empty() {
            UNKNOWN_PLATE
        } else {
            plate_text
        };
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();

        let image_path = self.dir.join(key.image_file_name());
        vehicle
            .save_with_format(&image_path, ImageFormat::Jpeg)
            .map_err(|source| {
                let _ = fs::remove_file(&image_path);
                EvidenceError::Image {
                    path: image_path.clone(),
                    source,
                }
            })?;

        let document = EvidenceDocument {
            timestamp: &timestamp,
            plate_text,
            speed_kmh,
            image: vehicle,
        };
        let document_path = self
            .dir
            .join(key.document_file_name(self.renderer.extension()));
        let document_path = match self.renderer.render(&document, &document_path) {
            Ok(()) => Some(document_path),
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "evidence document not rendered");
                // Best effort: do not leave a half-written document behind.
                let _ = fs::remove_file(&document_path);
                None
            }
        };

        let row = NewEvidence {
            timestamp,
            plate_text: plate_text.to_string(),
            speed_kmh,
            image_path,
            document_path,
        };
        let id = match self.store.insert(&row) {
            Ok(id) => id,
            Err(e) => {
                let _ = fs::remove_file(&row.image_path);
                if let Some(document_path) = &row.document_path {
                    let _ = fs::remove_file(document_path);
                }
                return Err(e.into());
            }
        };
        info!(
            id,
            plate = %row.plate_text,
            speed_kmh = row.speed_kmh,
            "evidence recorded"
        );
        Ok(row.into_record(id))
    }
}
