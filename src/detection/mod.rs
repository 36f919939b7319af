pub mod contours;
pub mod crop;
pub mod preprocessing;
pub mod quad;
pub mod steps;
pub mod warp;

use image::{DynamicImage, GrayImage};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::models::Quad;
use crate::tuning::TuningParameters;

/// Output of [`LabelDetector::rectify`].
#[derive(Debug, Clone)]
pub struct Rectified {
    /// Warped label, or the untouched input when nothing was found
    pub image: DynamicImage,
    /// The quad that was warped, if any
    pub quad: Option<Quad>,
}

impl Rectified {
    pub fn is_fallback(&self) -> bool {
        self.quad.is_none()
    }
}

/// Finds the label quadrilateral in a cropped frame and straightens it.
pub struct LabelDetector {
    params: Arc<TuningParameters>,
}

impl LabelDetector {
    /// Create a detector bound to one tuning snapshot
    pub fn new(params: Arc<TuningParameters>) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TuningParameters {
        &self.params
    }

    /// Binary edge map: luminance, optional blur, Canny, optional dilation
    pub fn edge_map(&self, img: &DynamicImage) -> GrayImage {
        let params = &self.params;
        let mut gray = preprocessing::to_luma(img);

        if params.use_blur {
            gray = preprocessing::apply_blur(&gray, params.odd_blur_kernel());
        }

        let mut edges = preprocessing::detect_edges(&gray, params.canny_low, params.canny_high);

        if params.use_dilate {
            edges = preprocessing::dilate_edges(&edges, params.dilate_kernel);
        }
        edges
    }

    /// Every convex four-vertex outline in scan order, before area/ratio filtering
    pub fn candidates(&self, img: &DynamicImage) -> Vec<Quad> {
        let edges = self.edge_map(img);
        let outlines = contours::find_external_contours(&edges);
        let epsilon = self.params.use_epsilon.then_some(self.params.epsilon);

        debug!(contours = outlines.len(), ?epsilon, "Approximating contours");

        outlines
            .iter()
            .filter_map(|outline| {
                let polygon = contours::approximate_polygon(outline, epsilon);
                if polygon.len() == 4 && contours::is_convex(&polygon) {
                    quad::quad_from_polygon(&polygon)
                } else {
                    None
                }
            })
            .collect()
    }

    /// First candidate in scan order that passes the enabled filters.
    ///
    /// `full_area` is the pixel area of the original, uncropped frame.
    #[instrument(skip(self, img), fields(width = img.width(), height = img.height()))]
    pub fn detect(&self, img: &DynamicImage, full_area: u64) -> Option<Quad> {
        let candidates = self.candidates(img);
        debug!(candidates = candidates.len(), "Found quadrilateral candidates");

        for (i, candidate) in candidates.iter().enumerate() {
            match quad::check_quad(candidate, full_area, &self.params) {
                Ok(()) => {
                    debug!(
                        index = i,
                        width = candidate.width(),
                        height = candidate.height(),
                        ratio = candidate.aspect_ratio(),
                        "Accepted quad"
                    );
                    return Some(*candidate);
                }
                Err(reason) => {
                    debug!(
                        index = i,
                        ?reason,
                        area = candidate.bbox_area(),
                        ratio = candidate.aspect_ratio(),
                        "Rejected quad"
                    );
                }
            }
        }
        None
    }

    /// Detect the label and warp it to the configured output size.
    ///
    /// Falls back to the input image when no acceptable quad exists.
    pub fn rectify(&self, img: &DynamicImage, full_area: u64) -> Rectified {
        let Some(quad) = self.detect(img, full_area) else {
            info!("No label quad found, keeping cropped frame");
            return Rectified {
                image: img.clone(),
                quad: None,
            };
        };

        let (width, height) = (self.params.output_width, self.params.output_height);
        match warp::warp_quad(img, &quad, width, height) {
            Some(image) => {
                info!(width, height, "Label rectified");
                Rectified {
                    image,
                    quad: Some(quad),
                }
            }
            None => Rectified {
                image: img.clone(),
                quad: None,
            },
        }
    }
}
