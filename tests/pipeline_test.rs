use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use image::{GrayImage, Rgb, RgbImage};
use overspeed_rs::evidence::NewEvidence;
use overspeed_rs::{
    DetectionBuilder, EvidenceStore, EvidenceWriter, FrameSequence, FrameSource, PipelineConfig,
    PipelineError, RecognitionError, RecognizedText, SourceError, SpeedPipeline,
    SqliteEvidenceStore, StopSignal, StoreError, SvgPageRenderer, TextRecognizer,
    TrackedDetection, VehicleTracker, ViolationEvent,
};

struct ScriptedTracker {
    frames: VecDeque<Vec<TrackedDetection>>,
}

impl VehicleTracker for ScriptedTracker {
    type Error = Infallible;

    fn track(&mut self, _frame: &RgbImage) -> Result<Vec<TrackedDetection>, Self::Error> {
        Ok(self.frames.pop_front().unwrap_or_default())
    }
}

struct PlateReader;

impl TextRecognizer for PlateReader {
    fn recognize(
        &mut self,
        region: &GrayImage,
        _languages: &[String],
    ) -> Result<Vec<RecognizedText>, RecognitionError> {
        assert!(region.width() > 0 && region.height() > 0);
        Ok(vec![
            RecognizedText::new("IND", 0.4),
            RecognizedText::new("KA 05 MN 2024", 0.6),
        ])
    }
}

/// Rejects the first `failures` inserts, then delegates.
struct FlakyStore {
    inner: SqliteEvidenceStore,
    failures: AtomicUsize,
}

impl EvidenceStore for FlakyStore {
    fn insert(&self, row: &NewEvidence) -> Result<i64, StoreError> {
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StoreError::Poisoned);
        }
        self.inner.insert(row)
    }
}

/// Yields `good` frames, then fails.
struct DroppingCamera {
    good: usize,
}

impl FrameSource for DroppingCamera {
    fn fps(&self) -> Option<f64> {
        Some(25.0)
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>, SourceError> {
        if self.good == 0 {
            return Err(SourceError::Decode("corrupt packet".into()));
        }
        self.good -= 1;
        Ok(Some(frame()))
    }
}

fn config(dir: &std::path::Path) -> PipelineConfig {
    PipelineConfig {
        speed_limit_kmh: 80.0,
        meters_per_pixel: 0.05,
        vehicle_classes: vec![2, 3, 5, 7],
        evidence_dir: dir.join("challans"),
        database_path: dir.join("challans.db"),
        recognizer_languages: vec!["en".into()],
        inactivity_frames: 5,
        fallback_fps: 25.0,
        crop_padding_px: 10,
    }
}

fn car(track_id: u64, cx: f32, cy: f32) -> TrackedDetection {
    DetectionBuilder::new()
        .xywh(cx, cy, 60.0, 40.0)
        .track_id(track_id)
        .class_id(2)
        .score(0.88)
        .build()
}

fn frame() -> RgbImage {
    RgbImage::from_fn(640, 360, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
}

#[test]
fn test_overspeed_track_issued_exactly_once() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config(dir.path());
    let store = Arc::new(SqliteEvidenceStore::open(&config.database_path).unwrap());
    let writer = EvidenceWriter::new(
        &config.evidence_dir,
        store.clone(),
        Arc::new(SvgPageRenderer),
    )
    .unwrap();
    let (tx, rx) = mpsc::channel::<ViolationEvent>();

    // Track 7 moves 60 px per frame: 60 * 0.05 m * 25 fps * 3.6 = 270 km/h
    let script = vec![
        vec![car(7, 100.0, 100.0)],
        vec![car(7, 100.0, 160.0)],
        vec![car(7, 100.0, 220.0)],
        vec![car(7, 100.0, 280.0)],
    ];
    let tracker = ScriptedTracker {
        frames: script.into(),
    };
    let mut pipeline = SpeedPipeline::new(config.clone(), tracker, PlateReader, writer, tx);

    let mut source = FrameSequence::new(vec![frame(); 4], Some(25.0));
    let summary = pipeline.run(&mut source, &StopSignal::new()).unwrap();
    assert_eq!(summary.frames, 4);
    assert_eq!(summary.issued, 1);
    assert_eq!(summary.dropped, 0);

    let events: Vec<_> = rx.try_iter().collect();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.track_id, 7);
    assert!((event.speed_kmh - 270.0).abs() < 1e-6);
    // "KA 05 MN 2024" scores 13 * 0.6, beating "IND" at 3 * 0.4
    assert_eq!(event.plate_text, "KA 05 MN 2024");
    assert!(image::open(&event.image_path).is_ok());
    let document = std::fs::read_to_string(event.document_path.as_ref().unwrap()).unwrap();
    assert!(document.contains("Detected Plate: KA 05 MN 2024"));
    assert!(document.contains("Recorded Speed: 270.0 km/h"));

    let rows = store.recent(10).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, event.record_id);
    assert_eq!(rows[0].image_path, event.image_path);
    assert!(pipeline.ledger().is_issued(7));
}

#[test]
fn test_evicted_track_id_reused_as_fresh_track() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config(dir.path());
    let store = Arc::new(SqliteEvidenceStore::open_in_memory().unwrap());
    let writer = EvidenceWriter::new(
        &config.evidence_dir,
        store.clone(),
        Arc::new(SvgPageRenderer),
    )
    .unwrap();

    let mut script = vec![vec![car(7, 100.0, 100.0)], vec![car(7, 100.0, 160.0)]];
    // Unobserved for longer than the 5-frame window
    script.extend(std::iter::repeat_with(Vec::new).take(6));
    // A new vehicle reuses id 7 far from the old position
    script.push(vec![car(7, 500.0, 100.0)]);
    script.push(vec![car(7, 500.0, 160.0)]);

    let tracker = ScriptedTracker {
        frames: script.into(),
    };
    let mut pipeline = SpeedPipeline::new(config, tracker, PlateReader, writer, |_: &ViolationEvent| {});

    let f = frame();
    pipeline.process_frame(&f, 25.0).unwrap();
    assert_eq!(pipeline.process_frame(&f, 25.0).unwrap().len(), 1);
    assert!(pipeline.ledger().is_issued(7));

    for _ in 0..6 {
        assert!(pipeline.process_frame(&f, 25.0).unwrap().is_empty());
    }
    assert!(!pipeline.ledger().is_issued(7));
    assert!(pipeline.ledger().is_empty());

    // First sighting of the new track 7 has no prior, so no jump from the
    // old position is measured.
    assert!(pipeline.process_frame(&f, 25.0).unwrap().is_empty());
    assert!(!pipeline.ledger().is_issued(7));
    assert_eq!(pipeline.process_frame(&f, 25.0).unwrap().len(), 1);

    assert_eq!(store.count().unwrap(), 2);
}

#[test]
fn test_empty_crop_skipped_without_marking() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config(dir.path());
    let store = Arc::new(SqliteEvidenceStore::open_in_memory().unwrap());
    let writer = EvidenceWriter::new(
        &config.evidence_dir,
        store.clone(),
        Arc::new(SvgPageRenderer),
    )
    .unwrap();

    // Track 1 drifts out of the frame; its crop is empty and it is skipped.
    // Track 2 overspeeds in the same frame and is still issued.
    let script = vec![
        vec![car(1, 600.0, 100.0), car(2, 200.0, 100.0)],
        vec![car(1, 760.0, 100.0), car(2, 200.0, 160.0)],
    ];
    let tracker = ScriptedTracker {
        frames: script.into(),
    };
    let mut pipeline = SpeedPipeline::new(config, tracker, PlateReader, writer, |_: &ViolationEvent| {});

    let f = frame();
    pipeline.process_frame(&f, 25.0).unwrap();
    let issued = pipeline.process_frame(&f, 25.0).unwrap();
    assert_eq!(issued.len(), 1);
    assert!(pipeline.ledger().is_issued(2));
    assert!(!pipeline.ledger().is_issued(1));
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn test_failed_evidence_stays_within_one_event() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config(dir.path());
    let store = Arc::new(FlakyStore {
        inner: SqliteEvidenceStore::open_in_memory().unwrap(),
        failures: AtomicUsize::new(1),
    });
    let writer = EvidenceWriter::new(
        &config.evidence_dir,
        store.clone(),
        Arc::new(SvgPageRenderer),
    )
    .unwrap();

    // Both tracks overspeed on the second frame; track 1 hits the failing insert.
    let script = vec![
        vec![car(1, 100.0, 100.0), car(2, 300.0, 100.0)],
        vec![car(1, 100.0, 160.0), car(2, 300.0, 160.0)],
        vec![car(1, 100.0, 220.0), car(2, 300.0, 220.0)],
    ];
    let tracker = ScriptedTracker {
        frames: script.into(),
    };
    let (tx, rx) = mpsc::channel::<ViolationEvent>();
    let mut pipeline = SpeedPipeline::new(config, tracker, PlateReader, writer, tx);

    let mut source = FrameSequence::new(vec![frame(); 3], Some(25.0));
    let summary = pipeline.run(&mut source, &StopSignal::new()).unwrap();
    assert_eq!(summary.frames, 3);
    assert_eq!(summary.issued, 1);
    assert_eq!(summary.dropped, 1);

    // The dropped event is not retried on the third frame
    assert!(pipeline.ledger().is_issued(1));
    assert!(pipeline.ledger().is_issued(2));

    let events: Vec<_> = rx.try_iter().collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].track_id, 2);
    assert_eq!(store.inner.count().unwrap(), 1);
}

#[test]
fn test_frame_read_failure_ends_run() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config(dir.path());
    let store = Arc::new(SqliteEvidenceStore::open_in_memory().unwrap());
    let writer = EvidenceWriter::new(
        &config.evidence_dir,
        store.clone(),
        Arc::new(SvgPageRenderer),
    )
    .unwrap();
    let script = vec![
        vec![car(7, 100.0, 100.0)],
        vec![car(7, 100.0, 160.0)],
        vec![car(7, 100.0, 220.0)],
    ];
    let tracker = ScriptedTracker {
        frames: script.into(),
    };
    let mut pipeline =
        SpeedPipeline::new(config, tracker, PlateReader, writer, |_: &ViolationEvent| {});

    let mut camera = DroppingCamera { good: 2 };
    let err = pipeline.run(&mut camera, &StopSignal::new()).unwrap_err();
    assert!(matches!(err, PipelineError::Source(SourceError::Decode(_))));

    // Evidence issued before the failure is kept
    assert_eq!(pipeline.summary().frames, 2);
    assert_eq!(pipeline.summary().issued, 1);
    assert_eq!(store.count().unwrap(), 1);
}
