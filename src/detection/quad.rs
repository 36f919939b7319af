use imageproc::point::Point;

use crate::models::Quad;
use crate::tuning::TuningParameters;

/// Why a candidate quad was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooSmall,
    WrongRatio,
}

/// Convert a four-vertex polygon into a canonical quad.
pub fn quad_from_polygon(polygon: &[Point<i32>]) -> Option<Quad> {
    let corners: [Point<i32>; 4] = polygon.try_into().ok()?;
    Some(Quad::from_points(
        corners.map(|p| Point::new(p.x as f32, p.y as f32)),
    ))
}

/// Check a candidate against the enabled area and ratio filters.
///
/// `full_area` is the pixel area of the uncropped frame, so the area
/// threshold tracks absolute label size regardless of pre-cropping.
/// A disabled filter is skipped outright.
pub fn check_quad(quad: &Quad, full_area: u64, params: &TuningParameters) -> Result<(), Rejection> {
    if params.use_min_area {
        let min_area = full_area as f64 * params.min_area_ratio as f64;
        if (quad.bbox_area() as f64) <= min_area {
            return Err(Rejection::TooSmall);
        }
    }
    if params.use_ratio {
        let ratio = quad.aspect_ratio();
        if (ratio - params.target_ratio).abs() >= params.ratio_tolerance * params.target_ratio {
            return Err(Rejection::WrongRatio);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_quad(w: f32, h: f32) -> Quad {
        Quad::from_points([
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ])
    }

    #[test]
    fn test_ratio_filter() {
        let params = TuningParameters::default();
        assert_eq!(check_quad(&rect_quad(235.0, 100.0), 10_000, &params), Ok(()));
        assert_eq!(
            check_quad(&rect_quad(100.0, 100.0), 10_000, &params),
            Err(Rejection::WrongRatio)
        );
    }

    #[test]
    fn test_disabled_ratio_filter_is_bypassed() {
        let params = TuningParameters {
            use_ratio: false,
            ratio_tolerance: 0.0,
            ..TuningParameters::default()
        };
        assert_eq!(check_quad(&rect_quad(100.0, 100.0), 10_000, &params), Ok(()));
    }

    #[test]
    fn test_area_uses_full_frame() {
        let params = TuningParameters::default();
        // 235x100 = 23_500, threshold is 10% of the full frame
        assert_eq!(check_quad(&rect_quad(235.0, 100.0), 200_000, &params), Ok(()));
        assert_eq!(
            check_quad(&rect_quad(235.0, 100.0), 300_000, &params),
            Err(Rejection::TooSmall)
        );
    }

    #[test]
    fn test_area_checked_without_ratio() {
        let params = TuningParameters {
            use_ratio: false,
            ..TuningParameters::default()
        };
        assert_eq!(
            check_quad(&rect_quad(50.0, 50.0), 1_000_000, &params),
            Err(Rejection::TooSmall)
        );
    }

    #[test]
    fn test_polygon_must_have_four_points() {
        let tri = [Point::new(0, 0), Point::new(4, 0), Point::new(0, 4)];
        assert!(quad_from_polygon(&tri).is_none());
    }
}
