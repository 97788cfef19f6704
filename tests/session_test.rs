use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use image::{GrayImage, Rgb, RgbImage};
use overspeed_rs::integration::session;
use overspeed_rs::{
    DetectionBuilder, EvidenceWriter, FrameSequence, PipelineConfig, PipelineError,
    RecognitionError, RecognizedText, SourceError, SpeedPipeline, SqliteEvidenceStore,
    SvgPageRenderer, TextRecognizer, TrackedDetection, VehicleTracker, ViolationEvent,
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

struct CountingRecognizer {
    calls: usize,
}

impl TextRecognizer for CountingRecognizer {
    fn recognize(
        &mut self,
        _region: &GrayImage,
        _languages: &[String],
    ) -> Result<Vec<RecognizedText>, RecognitionError> {
        self.calls += 1;
        Ok(vec![RecognizedText::new(format!("TN{:02}", self.calls), 0.9)])
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
        inactivity_frames: 30,
        fallback_fps: 25.0,
        crop_padding_px: 10,
    }
}

fn truck(track_id: u64, cx: f32, cy: f32) -> TrackedDetection {
    DetectionBuilder::new()
        .xywh(cx, cy, 80.0, 50.0)
        .track_id(track_id)
        .class_id(7)
        .score(0.75)
        .build()
}

/// Two tracks that both overspeed on the second frame.
fn overspeed_script() -> Vec<Vec<TrackedDetection>> {
    vec![
        vec![truck(1, 100.0, 100.0), truck(2, 300.0, 100.0)],
        vec![truck(1, 100.0, 160.0), truck(2, 300.0, 170.0)],
        vec![truck(1, 100.0, 220.0), truck(2, 300.0, 240.0)],
    ]
}

fn frames(n: usize) -> Vec<RgbImage> {
    vec![RgbImage::from_pixel(480, 320, Rgb([40, 80, 120])); n]
}

#[test]
fn test_concurrent_sessions_share_store() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config(dir.path());
    let store = Arc::new(SqliteEvidenceStore::open(&config.database_path).unwrap());
    let recognizer = Arc::new(Mutex::new(CountingRecognizer { calls: 0 }));
    let (tx, rx) = mpsc::channel::<ViolationEvent>();

    let mut handles = Vec::new();
    for name in ["north-gate", "south-gate"] {
        let writer = EvidenceWriter::new(
            &config.evidence_dir,
            store.clone(),
            Arc::new(SvgPageRenderer),
        )
        .unwrap();
        let tracker = ScriptedTracker {
            frames: overspeed_script().into(),
        };
        let pipeline =
            SpeedPipeline::new(config.clone(), tracker, recognizer.clone(), writer, tx.clone());
        let handle = session::spawn(
            name,
            || Ok(FrameSequence::new(frames(3), Some(25.0))),
            pipeline,
        )
        .unwrap();
        assert_eq!(handle.name(), name);
        handles.push(handle);
    }
    drop(tx);

    for handle in handles {
        let summary = handle.join().unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.issued, 2);
        assert_eq!(summary.dropped, 0);
    }

    // Track ids repeat across sessions; each session keeps its own ledger.
    let events: Vec<_> = rx.iter().collect();
    assert_eq!(events.len(), 4);
    assert_eq!(events.iter().filter(|e| e.track_id == 1).count(), 2);

    let rows = store.recent(10).unwrap();
    assert_eq!(rows.len(), 4);
    let mut images: Vec<_> = rows.iter().map(|r| r.image_path.clone()).collect();
    images.sort();
    images.dedup();
    assert_eq!(images.len(), 4, "evidence files must not collide");
    assert!(images.iter().all(|p| p.exists()));
    assert_eq!(recognizer.lock().unwrap().calls, 4);
}

#[test]
fn test_unavailable_source_ends_session() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config(dir.path());
    let store = Arc::new(SqliteEvidenceStore::open_in_memory().unwrap());
    let writer = EvidenceWriter::new(
        &config.evidence_dir,
        store.clone(),
        Arc::new(SvgPageRenderer),
    )
    .unwrap();
    let tracker = ScriptedTracker {
        frames: overspeed_script().into(),
    };
    let pipeline = SpeedPipeline::new(
        config,
        tracker,
        CountingRecognizer { calls: 0 },
        writer,
        |_: &ViolationEvent| {},
    );

    let handle = session::spawn(
        "missing-camera",
        || -> Result<FrameSequence, SourceError> {
            Err(SourceError::Open("rtsp://10.0.0.9/stream".into()))
        },
        pipeline,
    )
    .unwrap();

    let err = handle.join().unwrap_err();
    assert!(matches!(
        err,
        PipelineError::SourceUnavailable(SourceError::Open(_))
    ));
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_stopped_session_reports_stop() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config(dir.path());
    let store = Arc::new(SqliteEvidenceStore::open_in_memory().unwrap());
    let writer = EvidenceWriter::new(
        &config.evidence_dir,
        store,
        Arc::new(SvgPageRenderer),
    )
    .unwrap();
    let tracker = ScriptedTracker {
        frames: VecDeque::new(),
    };
    let pipeline = SpeedPipeline::new(
        config,
        tracker,
        CountingRecognizer { calls: 0 },
        writer,
        |_: &ViolationEvent| {},
    );

    let (ready_tx, ready_rx) = mpsc::channel::<()>();
    let (go_tx, go_rx) = mpsc::channel::<()>();
    let handle = session::spawn(
        "stoppable",
        move || {
            // Hold the session until the test has requested a stop.
            ready_tx.send(()).unwrap();
            go_rx.recv().unwrap();
            Ok(FrameSequence::new(frames(100), Some(25.0)))
        },
        pipeline,
    )
    .unwrap();

    ready_rx.recv().unwrap();
    let stop = handle.stop_signal();
    assert!(!stop.is_stopped());
    handle.stop();
    assert!(stop.is_stopped());
    assert!(!handle.is_finished());
    go_tx.send(()).unwrap();

    while !handle.is_finished() {
        std::thread::yield_now();
    }
    let summary = handle.join().unwrap();
    assert!(summary.stopped);
    assert_eq!(summary.frames, 0);
}
