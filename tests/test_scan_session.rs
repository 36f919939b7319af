mod common;
use common::*;

use image::DynamicImage;
use labelscan::{LatestScan, ScanMessage, ScanSession, TuningForm};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

struct FakeRecognizer {
    lines: Vec<TextLine>,
    calls: Arc<AtomicUsize>,
}

impl FakeRecognizer {
    fn new(raw: &[(&str, u32)]) -> Self {
        Self {
            lines: lines(raw),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl TextRecognizer for FakeRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextLine>, ScanError> {
        assert_eq!((image.width(), image.height()), (800, 200));
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.lines.clone())
    }
}

struct FailingRecognizer;

impl TextRecognizer for FailingRecognizer {
    fn recognize(&self, _image: &DynamicImage) -> Result<Vec<TextLine>, ScanError> {
        Err(ScanError::Ocr("model unavailable".to_string()))
    }
}

/// Turns off the line height filter while the run is in flight.
struct TuningEditor {
    store: TuningStore,
}

impl TextRecognizer for TuningEditor {
    fn recognize(&self, _image: &DynamicImage) -> Result<Vec<TextLine>, ScanError> {
        let mut form = TuningForm::from_params(&self.store.snapshot());
        form.use_line_height = false;
        self.store.apply(&form);
        Ok(lines(&[("ROLL_111", 100), ("ZZZZZZZZZZZZ", 20)]))
    }
}

fn capture() -> DynamicImage {
    frame_with_label(1000, 800, 260, 300, 480, 200)
}

fn region() -> CropRegion {
    CropRegion::for_view(1000, 800, Rotation::Deg0)
}

#[tokio::test]
async fn test_scan_classifies_recognized_lines() {
    let recognizer = FakeRecognizer::new(&[("ROLL_12345", 100), ("CUSTOMER ACME", 100)]);
    let calls = recognizer.calls.clone();
    let session = ScanSession::new(recognizer, TuningStore::default());

    let outcome = session.scan(capture(), region()).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.generation, 1);
    assert!(outcome.quad.is_some());
    assert_eq!(outcome.lines.len(), 2);
    assert_eq!(outcome.fields.roll, "12345");
    assert_eq!(outcome.fields.customer, "CUSTOMER_ACME");
    assert!(session.is_current(outcome.generation));
}

#[tokio::test]
async fn test_recognizer_failure_propagates() {
    let session = ScanSession::new(FailingRecognizer, TuningStore::default());
    let result = session.scan(capture(), region()).await;
    assert!(matches!(result, Err(ScanError::Ocr(_))));
}

#[tokio::test]
async fn test_run_uses_snapshot_taken_at_start() {
    let store = TuningStore::default();
    let session = ScanSession::new(
        TuningEditor {
            store: store.clone(),
        },
        store.clone(),
    );

    let outcome = session.scan(capture(), region()).await.unwrap();

    // The short line is still filtered by the snapshot the run started with
    assert_eq!(outcome.fields.roll, "111");
    assert_eq!(outcome.fields.customer, "");
    assert!(!store.snapshot().use_line_height);
}

#[tokio::test]
async fn test_newer_scan_supersedes_older() {
    let session = ScanSession::new(
        FakeRecognizer::new(&[("LOT 77", 100)]),
        TuningStore::default(),
    );
    let (tx, mut rx) = mpsc::channel(4);

    let (first, first_handle) = session.spawn_scan(capture(), region(), tx.clone());
    let (second, second_handle) = session.spawn_scan(capture(), region(), tx);
    assert!(second > first);
    assert!(!session.is_current(first));
    assert!(session.is_current(second));

    first_handle.await.unwrap();
    second_handle.await.unwrap();

    let mut latest = LatestScan::new();
    let mut shown = Vec::new();
    while let Some(message) = rx.recv().await {
        if let Some(result) = latest.accept(message) {
            shown.push(result.unwrap().generation);
        }
    }

    assert_eq!(latest.latest(), second);
    assert_eq!(shown.last(), Some(&second));
}

#[test]
fn test_latest_scan_discards_stale_generations() {
    let mut latest = LatestScan::new();
    let message = |generation| ScanMessage {
        generation,
        result: Err(ScanError::Ocr(format!("run {generation}"))),
    };

    assert!(latest.accept(message(2)).is_some());
    assert!(latest.accept(message(1)).is_none());
    assert!(latest.accept(message(2)).is_none());
    assert!(latest.accept(message(3)).is_some());
    assert_eq!(latest.latest(), 3);
}
