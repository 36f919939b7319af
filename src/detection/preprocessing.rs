use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;

/// Single-channel luminance of an image, used as detector input
pub fn to_luma(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Desaturate an image, keeping per-pixel intensity, alpha and dimensions
pub fn to_grayscale(img: &DynamicImage) -> DynamicImage {
    let luma = img.to_luma8();
    let rgba = img.to_rgba8();
    let gray = RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        let l = luma.get_pixel(x, y)[0];
        let a = rgba.get_pixel(x, y)[3];
        Rgba([l, l, l, a])
    });
    DynamicImage::ImageRgba8(gray)
}

/// Gaussian sigma for an odd kernel size, matching the usual
/// `0.3 * ((k - 1) / 2 - 1) + 0.8` rule.
pub fn sigma_for_kernel(kernel: u32) -> f32 {
    let k = kernel.max(1) as f32;
    0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8
}

/// Smooth with a Gaussian sized by `kernel` (forced odd)
pub fn apply_blur(img: &GrayImage, kernel: u32) -> GrayImage {
    let kernel = if kernel % 2 == 0 { kernel + 1 } else { kernel };
    gaussian_blur_f32(img, sigma_for_kernel(kernel))
}

/// Detect edges using Canny edge detector
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    canny(img, low_threshold, high_threshold)
}

/// Thicken edges with a square structuring element of side `kernel`
pub fn dilate_edges(edges: &GrayImage, kernel: u32) -> GrayImage {
    let radius = (kernel / 2).min(u8::MAX as u32) as u8;
    if radius == 0 {
        return edges.clone();
    }
    dilate(edges, Norm::LInf, radius)
}
