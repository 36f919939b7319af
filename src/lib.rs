pub mod classify;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod models;
pub mod pipeline;
pub mod scan;
pub mod tuning;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use classify::classify;
pub use detection::{LabelDetector, Rectified};
pub use error::ScanError;
pub use geometry::{CropRegion, PixelRect, RectF, Rotation};
pub use models::{ClassifiedFields, Quad, TextLine};
pub use pipeline::{DebugConfig, FrameData, Pipeline, PipelineContext, PipelineStep};
pub use scan::{LatestScan, ScanMessage, ScanOutcome, ScanSession, TextRecognizer};
pub use tuning::{TuningForm, TuningParameters, TuningStore};
