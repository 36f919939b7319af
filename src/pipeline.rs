use anyhow::Result;
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::geometry::{CropRegion, PixelRect};
use crate::models::Quad;
use crate::tuning::TuningParameters;

/// The frame as it moves through the pipeline
#[derive(Clone)]
pub struct FrameData {
    /// Current image (cropped, warped or desaturated depending on the step)
    pub image: DynamicImage,

    /// Pixel area of the captured frame, the anchor for the area filter
    pub full_area: u64,

    /// Crop applied to the captured frame (None means full frame)
    pub crop: Option<PixelRect>,

    /// Label quad found by detection, in crop coordinates
    pub quad: Option<Quad>,
}

impl FrameData {
    /// Wrap a captured frame
    pub fn from_image(image: DynamicImage) -> Self {
        let full_area = image.width() as u64 * image.height() as u64;
        Self {
            image,
            full_area,
            crop: None,
            quad: None,
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

/// Context available to all pipeline steps for one run
#[derive(Clone)]
pub struct PipelineContext {
    /// Tuning snapshot taken when the run started
    pub tuning: Arc<TuningParameters>,
    pub debug: Option<DebugConfig>,
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Transform the frame
    fn process(&self, frame: FrameData, context: &PipelineContext) -> Result<FrameData>;

    /// Human-readable name, also used for debug file names
    fn name(&self) -> &str;
}

/// Composable pipeline builder
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    debug: Option<DebugConfig>,
}

fn save_debug_image(config: &DebugConfig, file_name: &str, image: &DynamicImage) -> Result<()> {
    let path = config.output_dir.join(file_name);
    image
        .save(&path)
        .map_err(|e| anyhow::anyhow!("Failed to save debug image {}: {}", path.display(), e))?;
    debug!(path = %path.display(), "Saved debug image");
    Ok(())
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard chain: crop to the view box, find and warp the label,
    /// then desaturate for the recognizer.
    pub fn standard(region: CropRegion) -> Self {
        use crate::detection::steps::*;

        Self::new()
            .add_step(Arc::new(CropStep { region }))
            .add_step(Arc::new(LabelDetectionStep))
            .add_step(Arc::new(GrayscaleStep))
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Insert a step at `index`, shifting later steps back
    pub fn insert_step(mut self, index: usize, step: Arc<dyn PipelineStep>) -> Self {
        let index = index.min(self.steps.len());
        self.steps.insert(index, step);
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step on a captured frame with one tuning snapshot
    pub fn run(&self, input: DynamicImage, tuning: Arc<TuningParameters>) -> Result<FrameData> {
        let context = PipelineContext {
            tuning,
            debug: self.debug.clone(),
        };

        if let Some(debug_config) = &context.debug {
            save_debug_image(debug_config, "00_input.png", &input)?;
        }

        let mut frame = FrameData::from_image(input);

        for (step_idx, step) in self.steps.iter().enumerate() {
            debug!(step = step.name(), "Running step");
            frame = step.process(frame, &context)?;

            if let Some(debug_config) = &context.debug {
                let file_name = format!(
                    "{:02}_{}.png",
                    step_idx + 1,
                    step.name().to_lowercase().replace(' ', "_")
                );
                save_debug_image(debug_config, &file_name, &frame.image)?;
            }
        }

        info!(
            width = frame.image.width(),
            height = frame.image.height(),
            rectified = frame.quad.is_some(),
            "Pipeline finished"
        );
        Ok(frame)
    }

    /// Run only the first `num_steps` steps (useful for debugging)
    pub fn run_partial(
        &self,
        input: DynamicImage,
        tuning: Arc<TuningParameters>,
        num_steps: usize,
    ) -> Result<FrameData> {
        let context = PipelineContext { tuning, debug: None };
        let mut frame = FrameData::from_image(input);
        for step in self.steps.iter().take(num_steps) {
            frame = step.process(frame, &context)?;
        }
        Ok(frame)
    }
}
