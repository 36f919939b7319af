//! Crop-box geometry in view space and its mapping into image pixels.
//!
//! Everything here is a pure function of explicit widths, heights and
//! rotations; nothing depends on a rendering surface.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Width:height of a shipment label.
pub const LABEL_ASPECT: f32 = 34.0 / 15.0;

/// Crop box size as a fraction of the smaller view dimension.
pub const BOX_FRACTION: f32 = 0.7;

/// Device rotation, normalized to a right angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Normalize any integer angle. Angles that are not right angles map to 0°.
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => Rotation::Deg90,
            180 => Rotation::Deg180,
            270 => Rotation::Deg270,
            _ => Rotation::Deg0,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    pub fn is_landscape(self) -> bool {
        matches!(self, Rotation::Deg0 | Rotation::Deg180)
    }
}

/// Rectangle in floating point view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectF {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl RectF {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }

    /// Axis-aligned bounds of this rectangle rotated about `(cx, cy)`.
    pub fn rotated_bounds(&self, rotation: Rotation, cx: f32, cy: f32) -> RectF {
        let (sin, cos) = (rotation.degrees() as f32).to_radians().sin_cos();
        let corners = [
            (self.left, self.top),
            (self.right, self.top),
            (self.right, self.bottom),
            (self.left, self.bottom),
        ];

        let mut bounds = RectF::new(f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        for (x, y) in corners {
            let dx = x - cx;
            let dy = y - cy;
            let rx = cx + dx * cos - dy * sin;
            let ry = cy + dx * sin + dy * cos;
            bounds.left = bounds.left.min(rx);
            bounds.top = bounds.top.min(ry);
            bounds.right = bounds.right.max(rx);
            bounds.bottom = bounds.bottom.max(ry);
        }
        bounds
    }
}

/// Rectangle in integer image pixels; `right`/`bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PixelRect {
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Cut this rectangle out of `img`, or `None` when it is empty.
    pub fn crop(&self, img: &DynamicImage) -> Option<DynamicImage> {
        if self.is_empty() {
            return None;
        }
        Some(img.crop_imm(self.left, self.top, self.width(), self.height()))
    }
}

/// Centered crop box for a view of the given size.
///
/// The box is landscape at 0°/180° and portrait at 90°/270°, with its long
/// side equal to [`BOX_FRACTION`] of the smaller view dimension.
pub fn calculate_box_rect(view_width: u32, view_height: u32, rotation: Rotation) -> RectF {
    let box_size = BOX_FRACTION * view_width.min(view_height) as f32;
    let short = box_size / LABEL_ASPECT;
    let (box_width, box_height) = if rotation.is_landscape() {
        (box_size, short)
    } else {
        (short, box_size)
    };
    let left = (view_width as f32 - box_width) / 2.0;
    let top = (view_height as f32 - box_height) / 2.0;
    RectF::new(left, top, left + box_width, top + box_height)
}

/// Scale a view-space rectangle into the pixel space of a target image.
///
/// X and Y scale independently by `target / view`. The result is truncated
/// to whole pixels and clamped inside the target.
pub fn scale_rect(
    rect: &RectF,
    view_width: u32,
    view_height: u32,
    target_width: u32,
    target_height: u32,
) -> PixelRect {
    if view_width == 0 || view_height == 0 {
        return PixelRect { left: 0, top: 0, right: 0, bottom: 0 };
    }
    let scale_x = target_width as f32 / view_width as f32;
    let scale_y = target_height as f32 / view_height as f32;

    let clamp = |value: f32, max: u32| -> u32 { (value.max(0.0) as u32).min(max) };

    let left = clamp(rect.left * scale_x, target_width);
    let top = clamp(rect.top * scale_y, target_height);
    let right = clamp(rect.right * scale_x, target_width).max(left);
    let bottom = clamp(rect.bottom * scale_y, target_height).max(top);

    PixelRect { left, top, right, bottom }
}

/// A crop box together with the view it was laid out in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub rect: RectF,
    pub view_width: u32,
    pub view_height: u32,
    pub rotation: Rotation,
}

impl CropRegion {
    /// Lay out the standard centered box for a view.
    pub fn for_view(view_width: u32, view_height: u32, rotation: Rotation) -> Self {
        Self {
            rect: calculate_box_rect(view_width, view_height, rotation),
            view_width,
            view_height,
            rotation,
        }
    }

    /// The box as displayed: rotated about the view centre.
    pub fn crop_rect(&self) -> RectF {
        let cx = self.view_width as f32 / 2.0;
        let cy = self.view_height as f32 / 2.0;
        self.rect.rotated_bounds(self.rotation, cx, cy)
    }

    /// Map the displayed box into pixels of an image of any size.
    pub fn to_pixel_rect(&self, image_width: u32, image_height: u32) -> PixelRect {
        scale_rect(
            &self.crop_rect(),
            self.view_width,
            self.view_height,
            image_width,
            image_height,
        )
    }
}
