#![allow(dead_code)]

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use labelscan::TextLine;
use std::sync::Arc;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const INK: Rgb<u8> = Rgb([20, 20, 20]);

/// A white frame of the given size with nothing on it.
pub fn blank_frame(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, WHITE))
}

/// A white frame with one dark axis-aligned label.
pub fn frame_with_label(width: u32, height: u32, x: i32, y: i32, w: u32, h: u32) -> DynamicImage {
    let mut img = RgbImage::from_pixel(width, height, WHITE);
    draw_filled_rect_mut(&mut img, Rect::at(x, y).of_size(w, h), INK);
    DynamicImage::ImageRgb8(img)
}

/// A white frame with one dark label drawn as an arbitrary polygon.
pub fn frame_with_polygon(width: u32, height: u32, corners: &[(i32, i32)]) -> DynamicImage {
    let mut img = RgbImage::from_pixel(width, height, WHITE);
    let points: Vec<Point<i32>> = corners.iter().map(|&(x, y)| Point::new(x, y)).collect();
    draw_polygon_mut(&mut img, &points, INK);
    DynamicImage::ImageRgb8(img)
}

/// Build text lines from `(text, height)` pairs.
pub fn lines(raw: &[(&str, u32)]) -> Vec<TextLine> {
    raw.iter().map(|&(text, height)| TextLine::new(text, height)).collect()
}

pub fn default_params() -> Arc<labelscan::TuningParameters> {
    Arc::new(labelscan::TuningParameters::default())
}

pub fn near(actual: f32, expected: f32, tolerance: f32) -> bool {
    (actual - expected).abs() <= tolerance
}
