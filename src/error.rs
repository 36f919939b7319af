use thiserror::Error;

/// Errors surfaced at the library boundary.
///
/// Detection and classification misses are not errors; they resolve to
/// fallback values inside their stages.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The text recognizer reported a failure. Propagated unchanged.
    #[error("text recognition failed: {0}")]
    Ocr(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid tuning file: {0}")]
    Config(String),

    #[error("background worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Pipeline(#[from] anyhow::Error),
}

impl From<toml::de::Error> for ScanError {
    fn from(err: toml::de::Error) -> Self {
        ScanError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ScanError {
    fn from(err: toml::ser::Error) -> Self {
        ScanError::Config(err.to_string())
    }
}
