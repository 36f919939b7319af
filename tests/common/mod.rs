mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from labelscan for tests
#[allow(unused_imports)]
pub use labelscan::{
    ClassifiedFields, CropRegion, LabelDetector, Pipeline, Quad, Rotation, ScanError, TextLine,
    TextRecognizer, TuningParameters, TuningStore,
};
