use image::DynamicImage;
use tracing::debug;

use crate::geometry::LABEL_ASPECT;

/// Relative ratio deviation under which [`refine_crop`] leaves an image alone.
pub const REFINE_TOLERANCE: f32 = 0.15;

/// Trim an image centrally towards the label aspect ratio.
///
/// Images already within [`REFINE_TOLERANCE`] of the label ratio are
/// returned unchanged. Wider images lose width, taller ones lose height.
pub fn refine_crop(src: &DynamicImage) -> DynamicImage {
    let (width, height) = (src.width(), src.height());
    if width == 0 || height == 0 {
        return src.clone();
    }
    let ratio = width as f32 / height as f32;
    let diff = (ratio - LABEL_ASPECT).abs() / LABEL_ASPECT;
    if diff <= REFINE_TOLERANCE {
        return src.clone();
    }

    if ratio > LABEL_ASPECT {
        let target_width = ((height as f32 * LABEL_ASPECT).round() as u32).clamp(1, width);
        let left = (width - target_width) / 2;
        debug!(from = width, to = target_width, "Refine crop trims width");
        src.crop_imm(left, 0, target_width, height)
    } else {
        let target_height = ((width as f32 / LABEL_ASPECT).round() as u32).clamp(1, height);
        let top = (height - target_height) / 2;
        debug!(from = height, to = target_height, "Refine crop trims height");
        src.crop_imm(0, top, width, target_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn blank(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
    }

    #[test]
    fn test_close_ratio_is_untouched() {
        let out = refine_crop(&blank(340, 150));
        assert_eq!((out.width(), out.height()), (340, 150));
    }

    #[test]
    fn test_wide_image_is_narrowed() {
        let out = refine_crop(&blank(600, 150));
        assert_eq!(out.height(), 150);
        assert_eq!(out.width(), 340);
    }

    #[test]
    fn test_tall_image_is_shortened() {
        let out = refine_crop(&blank(340, 340));
        assert_eq!(out.width(), 340);
        assert_eq!(out.height(), 150);
    }
}
