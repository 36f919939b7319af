use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use tracing::warn;

use crate::models::Quad;

/// Resample the region inside `quad` onto a `width` x `height` rectangle.
///
/// Returns `None` when the corners do not define a projective transform
/// (e.g. three of them are collinear) or the target size is empty.
pub fn warp_quad(img: &DynamicImage, quad: &Quad, width: u32, height: u32) -> Option<DynamicImage> {
    if width == 0 || height == 0 {
        return None;
    }
    let (w, h) = (width as f32, height as f32);
    let dest = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];

    let projection = match Projection::from_control_points(quad.control_points(), dest) {
        Some(p) => p,
        None => {
            warn!(?quad, "Degenerate quad, no projective transform");
            return None;
        }
    };

    let source = img.to_rgba8();
    let mut output = RgbaImage::new(width, height);
    warp_into(
        &source,
        &projection,
        Interpolation::Bilinear,
        Rgba([255, 255, 255, 255]),
        &mut output,
    );
    Some(DynamicImage::ImageRgba8(output))
}
