//! `ocrs` text recognizer (feature `ocr`).

use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use rten::Model;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ScanError;
use crate::models::TextLine;
use crate::scan::TextRecognizer;

fn ocr_error(err: impl std::fmt::Display) -> ScanError {
    ScanError::Ocr(err.to_string())
}

/// Default model directory, `~/.cache/ocrs`
pub fn default_model_dir() -> Result<PathBuf, ScanError> {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| ocr_error("neither HOME nor USERPROFILE is set"))?;
    Ok(Path::new(&home_dir).join(".cache/ocrs"))
}

/// Recognizer backed by the `ocrs` detection and recognition models
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    /// Load `text-detection.rten` and `text-recognition.rten` from `model_dir`
    pub fn load(model_dir: &Path) -> Result<Self, ScanError> {
        let detection_model_path = model_dir.join("text-detection.rten");
        let recognition_model_path = model_dir.join("text-recognition.rten");

        if !detection_model_path.exists() || !recognition_model_path.exists() {
            return Err(ocr_error(format!(
                "OCR models not found. Expected locations:\n  - {}\n  - {}",
                detection_model_path.display(),
                recognition_model_path.display()
            )));
        }

        let detection_model = Model::load_file(&detection_model_path).map_err(ocr_error)?;
        let recognition_model = Model::load_file(&recognition_model_path).map_err(ocr_error)?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(ocr_error)?;

        Ok(Self { engine })
    }
}

impl TextRecognizer for OcrsRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextLine>, ScanError> {
        let img = image.to_rgb8();
        let source = ImageSource::from_bytes(img.as_raw(), img.dimensions()).map_err(ocr_error)?;
        let input = self.engine.prepare_input(source).map_err(ocr_error)?;

        let words = self.engine.detect_words(&input).map_err(ocr_error)?;
        let line_rects = self.engine.find_text_lines(&input, &words);
        let recognized = self.engine.recognize_text(&input, &line_rects).map_err(ocr_error)?;

        let lines: Vec<TextLine> = recognized
            .into_iter()
            .flatten()
            .map(|line| {
                let height = line.bounding_rect().height().max(0) as u32;
                TextLine::new(line.to_string().trim(), height)
            })
            .filter(|line| !line.text.is_empty())
            .collect();

        debug!(lines = lines.len(), "Recognized text lines");
        Ok(lines)
    }
}
