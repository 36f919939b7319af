//! Per-frame scan runs with stale-result detection.
//!
//! Every run takes a generation number and a tuning snapshot up front.
//! Runs are never cancelled; a consumer compares generations to drop
//! results that a newer capture has superseded.

use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::classify::classify;
use crate::error::ScanError;
use crate::geometry::CropRegion;
use crate::models::{ClassifiedFields, Quad, TextLine};
use crate::pipeline::Pipeline;
use crate::tuning::TuningStore;

/// The external text recognizer.
pub trait TextRecognizer: Send + Sync {
    /// Recognize lines of text in `image`, each with its pixel height.
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextLine>, ScanError>;
}

/// Result of one completed run.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub generation: u64,
    /// Desaturated label image that went to the recognizer
    pub image: DynamicImage,
    pub quad: Option<Quad>,
    pub lines: Vec<TextLine>,
    pub fields: ClassifiedFields,
}

/// A run result tagged with the generation it belongs to.
#[derive(Debug)]
pub struct ScanMessage {
    pub generation: u64,
    pub result: Result<ScanOutcome, ScanError>,
}

/// Drives scan runs against a shared tuning store and recognizer.
pub struct ScanSession<R: TextRecognizer + 'static> {
    recognizer: Arc<R>,
    tuning: TuningStore,
    generation: Arc<AtomicU64>,
    debug_dir: Option<PathBuf>,
}

impl<R: TextRecognizer + 'static> Clone for ScanSession<R> {
    fn clone(&self) -> Self {
        Self {
            recognizer: self.recognizer.clone(),
            tuning: self.tuning.clone(),
            generation: self.generation.clone(),
            debug_dir: self.debug_dir.clone(),
        }
    }
}

impl<R: TextRecognizer + 'static> ScanSession<R> {
    pub fn new(recognizer: R, tuning: TuningStore) -> Self {
        Self {
            recognizer: Arc::new(recognizer),
            tuning,
            generation: Arc::new(AtomicU64::new(0)),
            debug_dir: None,
        }
    }

    /// Save step images of every run into `dir` (must be empty or absent).
    pub fn with_debug(mut self, dir: PathBuf) -> Self {
        self.debug_dir = Some(dir);
        self
    }

    pub fn tuning(&self) -> &TuningStore {
        &self.tuning
    }

    /// Generation of the most recently started run.
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Whether a run of `generation` is still the latest one.
    pub fn is_current(&self, generation: u64) -> bool {
        self.current_generation() == generation
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Run crop → detect → grayscale → recognize → classify for one frame.
    ///
    /// Recognizer failures are returned unchanged. The outcome carries its
    /// generation; check [`ScanSession::is_current`] before displaying it.
    #[instrument(skip(self, frame), fields(width = frame.width(), height = frame.height()))]
    pub async fn scan(&self, frame: DynamicImage, region: CropRegion) -> Result<ScanOutcome, ScanError> {
        let generation = self.next_generation();
        self.run(generation, frame, region).await
    }

    async fn run(
        &self,
        generation: u64,
        frame: DynamicImage,
        region: CropRegion,
    ) -> Result<ScanOutcome, ScanError> {
        let tuning = self.tuning.snapshot();
        debug!(generation, "Starting scan run");

        let mut pipeline = Pipeline::standard(region);
        if let Some(dir) = &self.debug_dir {
            pipeline = pipeline.with_debug(dir.join(format!("run_{generation:04}")))?;
        }

        let run_tuning = tuning.clone();
        let processed =
            tokio::task::spawn_blocking(move || pipeline.run(frame, run_tuning)).await??;

        if !self.is_current(generation) {
            debug!(generation, latest = self.current_generation(), "Run superseded before recognition");
        }

        let recognizer = self.recognizer.clone();
        let image = processed.image;
        let (image, lines) = tokio::task::spawn_blocking(move || {
            let lines = recognizer.recognize(&image);
            (image, lines)
        })
        .await?;
        let lines = lines?;

        let fields = classify(&lines, &tuning);
        info!(generation, roll = %fields.roll, customer = %fields.customer, "Scan run finished");

        Ok(ScanOutcome {
            generation,
            image,
            quad: processed.quad,
            lines,
            fields,
        })
    }

    /// Start a run in the background and deliver its result on `tx`.
    ///
    /// The generation is taken before this returns, so a later call always
    /// supersedes an earlier one.
    pub fn spawn_scan(
        &self,
        frame: DynamicImage,
        region: CropRegion,
        tx: mpsc::Sender<ScanMessage>,
    ) -> (u64, JoinHandle<()>) {
        let generation = self.next_generation();
        let session = self.clone();
        let handle = tokio::spawn(async move {
            let result = session.run(generation, frame, region).await;
            if tx.send(ScanMessage { generation, result }).await.is_err() {
                warn!(generation, "Scan result receiver dropped");
            }
        });
        (generation, handle)
    }
}

/// Keeps only results that are newer than anything accepted so far.
#[derive(Debug, Default)]
pub struct LatestScan {
    latest: u64,
}

impl LatestScan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the newest accepted message, 0 before any.
    pub fn latest(&self) -> u64 {
        self.latest
    }

    /// Accept a message unless an equal or newer generation was already seen.
    pub fn accept(&mut self, message: ScanMessage) -> Option<Result<ScanOutcome, ScanError>> {
        if message.generation <= self.latest {
            debug!(
                generation = message.generation,
                latest = self.latest,
                "Discarding stale scan result"
            );
            return None;
        }
        self.latest = message.generation;
        Some(message.result)
    }
}
