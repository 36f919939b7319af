use imageproc::point::Point;
use serde::{Deserialize, Serialize};

/// One line reported by the text recognizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// Bounding-box height in pixels
    pub height: u32,
}

impl TextLine {
    pub fn new(text: impl Into<String>, height: u32) -> Self {
        Self {
            text: text.into(),
            height,
        }
    }
}

/// The two semantic fields read off a label. Either may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedFields {
    pub roll: String,
    pub customer: String,
}

/// Four label corners in canonical order: top-left, top-right,
/// bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub corners: [Point<f32>; 4],
}

impl Quad {
    /// Build a quad from corners in any order.
    pub fn from_points(points: [Point<f32>; 4]) -> Self {
        Self {
            corners: sort_corners(points),
        }
    }

    pub fn top_left(&self) -> Point<f32> {
        self.corners[0]
    }

    pub fn top_right(&self) -> Point<f32> {
        self.corners[1]
    }

    pub fn bottom_right(&self) -> Point<f32> {
        self.corners[2]
    }

    pub fn bottom_left(&self) -> Point<f32> {
        self.corners[3]
    }

    /// Axis-aligned bounds as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        self.corners.iter().fold(
            (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
            |(min_x, min_y, max_x, max_y), p| {
                (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
            },
        )
    }

    pub fn width(&self) -> f32 {
        let (min_x, _, max_x, _) = self.bounds();
        max_x - min_x
    }

    pub fn height(&self) -> f32 {
        let (_, min_y, _, max_y) = self.bounds();
        max_y - min_y
    }

    pub fn bbox_area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn aspect_ratio(&self) -> f32 {
        let h = self.height();
        if h == 0.0 {
            return 0.0;
        }
        self.width() / h
    }

    /// Corners as `(x, y)` pairs, for building projections.
    pub fn control_points(&self) -> [(f32, f32); 4] {
        self.corners.map(|p| (p.x, p.y))
    }
}

/// Order four points as top-left, top-right, bottom-right, bottom-left.
///
/// The two points highest in the image form the top pair, ordered left to
/// right; the remaining two form the bottom pair, ordered right to left.
pub fn sort_corners(points: [Point<f32>; 4]) -> [Point<f32>; 4] {
    let mut by_y = points;
    by_y.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

    let mut top = [by_y[0], by_y[1]];
    let mut bottom = [by_y[2], by_y[3]];
    top.sort_by(|a, b| a.x.total_cmp(&b.x));
    bottom.sort_by(|a, b| a.x.total_cmp(&b.x));

    [top[0], top[1], bottom[1], bottom[0]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_scrambled_rectangle() {
        let sorted = sort_corners([
            Point::new(100.0, 50.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, 50.0),
            Point::new(100.0, 0.0),
        ]);
        assert_eq!(
            sorted,
            [
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(100.0, 50.0),
                Point::new(0.0, 50.0),
            ]
        );
    }

    #[test]
    fn test_quad_bounds() {
        let quad = Quad::from_points([
            Point::new(10.0, 12.0),
            Point::new(90.0, 8.0),
            Point::new(95.0, 48.0),
            Point::new(12.0, 50.0),
        ]);
        assert_eq!(quad.width(), 85.0);
        assert_eq!(quad.height(), 42.0);
        assert_eq!(quad.top_left(), Point::new(10.0, 12.0));
        assert_eq!(quad.bottom_left(), Point::new(12.0, 50.0));
    }
}
