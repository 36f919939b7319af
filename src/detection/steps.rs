use anyhow::Result;
use tracing::{debug, warn};

use crate::detection::{crop, preprocessing, LabelDetector};
use crate::geometry::CropRegion;
use crate::pipeline::{FrameData, PipelineContext, PipelineStep};

/// Cut the view-space crop box out of the captured frame
pub struct CropStep {
    pub region: CropRegion,
}

impl PipelineStep for CropStep {
    fn process(&self, mut frame: FrameData, _context: &PipelineContext) -> Result<FrameData> {
        let (width, height) = (frame.image.width(), frame.image.height());
        let rect = self.region.to_pixel_rect(width, height);

        match rect.crop(&frame.image) {
            Some(cropped) => {
                debug!(?rect, frame_width = width, frame_height = height, "Cropped frame");
                frame.image = cropped;
                frame.crop = Some(rect);
            }
            None => warn!(?rect, "Empty crop box, keeping full frame"),
        }
        Ok(frame)
    }

    fn name(&self) -> &str {
        "Crop"
    }
}

/// Trim the crop towards the label aspect ratio
pub struct RefineCropStep;

impl PipelineStep for RefineCropStep {
    fn process(&self, mut frame: FrameData, _context: &PipelineContext) -> Result<FrameData> {
        frame.image = crop::refine_crop(&frame.image);
        Ok(frame)
    }

    fn name(&self) -> &str {
        "Refine Crop"
    }
}

/// Find the label quad and warp it to the output size
pub struct LabelDetectionStep;

impl PipelineStep for LabelDetectionStep {
    fn process(&self, mut frame: FrameData, context: &PipelineContext) -> Result<FrameData> {
        let detector = LabelDetector::new(context.tuning.clone());
        let rectified = detector.rectify(&frame.image, frame.full_area);
        frame.image = rectified.image;
        frame.quad = rectified.quad;
        Ok(frame)
    }

    fn name(&self) -> &str {
        "Label Detection"
    }
}

/// Desaturate the image for the recognizer
pub struct GrayscaleStep;

impl PipelineStep for GrayscaleStep {
    fn process(&self, mut frame: FrameData, _context: &PipelineContext) -> Result<FrameData> {
        frame.image = preprocessing::to_grayscale(&frame.image);
        Ok(frame)
    }

    fn name(&self) -> &str {
        "Grayscale Conversion"
    }
}
