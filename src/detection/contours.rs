use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;

/// Outer borders of connected edge regions that are not nested in any other
/// border, in the tracer's scan order (top to bottom, left to right).
pub fn find_external_contours(edges: &GrayImage) -> Vec<Vec<Point<i32>>> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| c.points)
        .collect()
}

/// Approximate a closed contour as a polygon.
///
/// A positive `epsilon` runs Douglas-Peucker with that tolerance. `None`
/// keeps the exact outline and only drops collinear points.
pub fn approximate_polygon(contour: &[Point<i32>], epsilon: Option<f64>) -> Vec<Point<i32>> {
    if contour.len() < 3 {
        return dedup_closed(contour.to_vec());
    }
    let approx = match epsilon {
        Some(eps) if eps > 0.0 => approximate_polygon_dp(contour, eps, true),
        _ => contour.to_vec(),
    };
    drop_collinear(dedup_closed(approx))
}

/// Remove consecutive duplicates, including a closing copy of the first point.
fn dedup_closed(mut points: Vec<Point<i32>>) -> Vec<Point<i32>> {
    points.dedup();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

fn cross(o: Point<i32>, a: Point<i32>, b: Point<i32>) -> i64 {
    let (ax, ay) = ((a.x - o.x) as i64, (a.y - o.y) as i64);
    let (bx, by) = ((b.x - o.x) as i64, (b.y - o.y) as i64);
    ax * by - ay * bx
}

fn drop_collinear(points: Vec<Point<i32>>) -> Vec<Point<i32>> {
    if points.len() < 3 {
        return points;
    }
    let mut kept = points;
    loop {
        let n = kept.len();
        if n < 3 {
            return kept;
        }
        let position = (0..n).position(|i| {
            let prev = kept[(i + n - 1) % n];
            let next = kept[(i + 1) % n];
            cross(prev, kept[i], next) == 0
        });
        match position {
            Some(i) => {
                kept.remove(i);
            }
            None => return kept,
        }
    }
}

/// True when the polygon turns the same way at every vertex.
pub fn is_convex(polygon: &[Point<i32>]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0i64;
    for i in 0..n {
        let turn = cross(polygon[i], polygon[(i + 1) % n], polygon[(i + 2) % n]);
        if turn == 0 {
            continue;
        }
        if sign == 0 {
            sign = turn.signum();
        } else if turn.signum() != sign {
            return false;
        }
    }
    sign != 0
}
