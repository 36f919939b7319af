//! Tunable detection and classification parameters.
//!
//! A [`TuningStore`] hands out immutable snapshots; edits go through
//! [`TuningStore::apply`], which builds a complete replacement value.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ScanError;

/// Knobs for the label detector and the line classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningParameters {
    /// Smoothing kernel size in pixels (applied as the next odd value)
    pub blur_kernel: u32,
    pub use_blur: bool,
    /// Low hysteresis threshold of the edge detector
    pub canny_low: f32,
    /// High hysteresis threshold of the edge detector
    pub canny_high: f32,
    /// Side of the square dilation element
    pub dilate_kernel: u32,
    pub use_dilate: bool,
    /// Polygon approximation tolerance in pixels
    pub epsilon: f64,
    pub use_epsilon: bool,
    /// Minimum candidate bounding-box area as a fraction of the full frame
    pub min_area_ratio: f32,
    pub use_min_area: bool,
    /// Expected label width/height
    pub target_ratio: f32,
    /// Accepted deviation from `target_ratio`, as a fraction of it
    pub ratio_tolerance: f32,
    pub use_ratio: bool,
    pub output_width: u32,
    pub output_height: u32,
    /// Fraction (0-1) of the tallest line height a line must reach to be kept
    pub line_height_percent: f64,
    pub use_line_height: bool,
}

impl Default for TuningParameters {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            use_blur: true,
            canny_low: 50.0,
            canny_high: 150.0,
            dilate_kernel: 3,
            use_dilate: true,
            epsilon: 10.0,
            use_epsilon: true,
            min_area_ratio: 0.1,
            use_min_area: true,
            target_ratio: 8.5 / 3.625,
            ratio_tolerance: 0.1,
            use_ratio: true,
            output_width: 800,
            output_height: 200,
            line_height_percent: 0.6,
            use_line_height: true,
        }
    }
}

fn positive_f32(value: f32) -> Option<f32> {
    (value.is_finite() && value > 0.0).then_some(value)
}

fn positive_f64(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

fn positive_u32(value: u32) -> Option<u32> {
    (value > 0).then_some(value)
}

/// Parse a text field, rejecting anything that is not a positive number.
fn parse_positive<T>(text: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    text.trim()
        .parse::<T>()
        .ok()
        .filter(|value| *value > T::default())
}

impl TuningParameters {
    /// Blur kernel rounded up to an odd size.
    pub fn odd_blur_kernel(&self) -> u32 {
        if self.blur_kernel % 2 == 0 {
            self.blur_kernel + 1
        } else {
            self.blur_kernel
        }
    }

    /// Replace non-positive or non-finite numbers with their defaults.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let mut fixed = 0;
        let mut pick_f32 = |value: f32, fallback: f32| {
            positive_f32(value).unwrap_or_else(|| {
                fixed += 1;
                fallback
            })
        };
        let canny_low = pick_f32(self.canny_low, defaults.canny_low);
        let canny_high = pick_f32(self.canny_high, defaults.canny_high);
        let min_area_ratio = pick_f32(self.min_area_ratio, defaults.min_area_ratio);
        let target_ratio = pick_f32(self.target_ratio, defaults.target_ratio);
        let ratio_tolerance = pick_f32(self.ratio_tolerance, defaults.ratio_tolerance);

        let mut pick_u32 = |value: u32, fallback: u32| {
            positive_u32(value).unwrap_or_else(|| {
                fixed += 1;
                fallback
            })
        };
        let blur_kernel = pick_u32(self.blur_kernel, defaults.blur_kernel);
        let dilate_kernel = pick_u32(self.dilate_kernel, defaults.dilate_kernel);
        let output_width = pick_u32(self.output_width, defaults.output_width);
        let output_height = pick_u32(self.output_height, defaults.output_height);

        let mut pick_f64 = |value: f64, fallback: f64| {
            positive_f64(value).unwrap_or_else(|| {
                fixed += 1;
                fallback
            })
        };
        let epsilon = pick_f64(self.epsilon, defaults.epsilon);
        let line_height_percent = pick_f64(self.line_height_percent, defaults.line_height_percent);

        if fixed > 0 {
            warn!(fields = fixed, "Replaced invalid tuning values with defaults");
        }

        Self {
            blur_kernel,
            canny_low,
            canny_high,
            dilate_kernel,
            epsilon,
            min_area_ratio,
            target_ratio,
            ratio_tolerance,
            output_width,
            output_height,
            line_height_percent,
            ..self
        }
    }

    /// Build the snapshot that results from applying `form` on top of `self`.
    ///
    /// Values behind a disabled checkbox are left untouched. Text fields that
    /// do not parse to a positive number keep their prior value.
    pub fn with_form(&self, form: &TuningForm) -> Self {
        let mut next = self.clone();

        next.use_blur = form.use_blur;
        if form.use_blur {
            if let Some(kernel) = positive_f32(form.blur_kernel) {
                let mut kernel = kernel as u32;
                if kernel % 2 == 0 {
                    kernel += 1;
                }
                next.blur_kernel = kernel;
            }
        }

        if let Some(low) = positive_f32(form.canny_low) {
            next.canny_low = low;
        }
        if let Some(high) = positive_f32(form.canny_high) {
            next.canny_high = high;
        }

        next.use_dilate = form.use_dilate;
        if form.use_dilate {
            if let Some(kernel) = positive_f32(form.dilate_kernel).map(|k| k as u32) {
                next.dilate_kernel = positive_u32(kernel).unwrap_or(next.dilate_kernel);
            }
        }

        next.use_epsilon = form.use_epsilon;
        if form.use_epsilon {
            if let Some(epsilon) = positive_f64(form.epsilon) {
                next.epsilon = epsilon;
            }
        }

        next.use_min_area = form.use_min_area;
        if form.use_min_area {
            if let Some(ratio) = positive_f32(form.min_area_ratio) {
                next.min_area_ratio = ratio;
            }
        }

        next.use_ratio = form.use_ratio;
        if form.use_ratio {
            if let Some(tolerance) = positive_f32(form.ratio_tolerance) {
                next.ratio_tolerance = tolerance;
            }
            match parse_positive::<f32>(&form.target_ratio_text) {
                Some(ratio) if ratio.is_finite() => next.target_ratio = ratio,
                _ => debug!(text = %form.target_ratio_text, "Ignoring target ratio text"),
            }
        }

        match parse_positive::<u32>(&form.output_width_text) {
            Some(width) => next.output_width = width,
            None => debug!(text = %form.output_width_text, "Ignoring output width text"),
        }
        match parse_positive::<u32>(&form.output_height_text) {
            Some(height) => next.output_height = height,
            None => debug!(text = %form.output_height_text, "Ignoring output height text"),
        }

        next.use_line_height = form.use_line_height;
        if form.use_line_height {
            if let Some(percent) = positive_f64(form.line_height_percent) {
                next.line_height_percent = percent;
            }
        }

        next
    }
}

/// Field values as edited in a configuration form.
///
/// Sliders carry numbers; the target ratio and output size are free text.
#[derive(Debug, Clone, PartialEq)]
pub struct TuningForm {
    pub use_blur: bool,
    pub blur_kernel: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    pub use_dilate: bool,
    pub dilate_kernel: f32,
    pub use_epsilon: bool,
    pub epsilon: f64,
    pub use_min_area: bool,
    pub min_area_ratio: f32,
    pub use_ratio: bool,
    pub ratio_tolerance: f32,
    pub target_ratio_text: String,
    pub output_width_text: String,
    pub output_height_text: String,
    pub use_line_height: bool,
    pub line_height_percent: f64,
}

impl TuningForm {
    /// Pre-fill a form with the values of a snapshot.
    pub fn from_params(params: &TuningParameters) -> Self {
        Self {
            use_blur: params.use_blur,
            blur_kernel: params.blur_kernel as f32,
            canny_low: params.canny_low,
            canny_high: params.canny_high,
            use_dilate: params.use_dilate,
            dilate_kernel: params.dilate_kernel as f32,
            use_epsilon: params.use_epsilon,
            epsilon: params.epsilon,
            use_min_area: params.use_min_area,
            min_area_ratio: params.min_area_ratio,
            use_ratio: params.use_ratio,
            ratio_tolerance: params.ratio_tolerance,
            target_ratio_text: params.target_ratio.to_string(),
            output_width_text: params.output_width.to_string(),
            output_height_text: params.output_height.to_string(),
            use_line_height: params.use_line_height,
            line_height_percent: params.line_height_percent,
        }
    }
}

/// Shared holder of the current tuning snapshot.
///
/// Cloning the store shares the same underlying value.
#[derive(Debug, Clone, Default)]
pub struct TuningStore {
    current: Arc<RwLock<Arc<TuningParameters>>>,
}

impl TuningStore {
    pub fn new(params: TuningParameters) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(params))),
        }
    }

    /// The current snapshot. Later edits never show through it.
    pub fn snapshot(&self) -> Arc<TuningParameters> {
        self.current.read().clone()
    }

    /// Apply a form edit and return the new snapshot.
    pub fn apply(&self, form: &TuningForm) -> Arc<TuningParameters> {
        let mut guard = self.current.write();
        let next = Arc::new(guard.with_form(form));
        *guard = next.clone();
        debug!(?next, "Applied tuning edit");
        next
    }

    /// Swap in a whole new snapshot, e.g. one loaded from disk.
    pub fn replace(&self, params: TuningParameters) -> Arc<TuningParameters> {
        let next = Arc::new(params);
        *self.current.write() = next.clone();
        next
    }
}

/// Load tuning values from a TOML file. Missing keys take their defaults.
pub fn load_tuning(path: &Path) -> Result<TuningParameters, ScanError> {
    let content = std::fs::read_to_string(path)?;
    let params: TuningParameters = toml::from_str(&content)?;
    Ok(params.sanitized())
}

/// Save tuning values to a TOML file.
pub fn save_tuning(params: &TuningParameters, path: &Path) -> Result<(), ScanError> {
    let content = toml::to_string_pretty(params)?;
    std::fs::write(path, content)?;
    Ok(())
}
