//! Planar geometry helpers for floor plans.
//!
//! Polygons are ordered vertex loops on the floor plane (x, z). The closing
//! edge from the last vertex back to the first is implicit.

use crate::types::{EPSILON_GENERAL, Rect, Vec2};

/// Ray-casting parity test.
///
/// Points exactly on an edge may land on either side; callers that care use
/// [`distance_to_boundary`] with a tolerance.
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.z > point.z) != (b.z > point.z) {
            let x_cross = (b.x - a.x) * (point.z - a.z) / (b.z - a.z) + a.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Signed shoelace area; positive for counter-clockwise loops (x right, z up).
pub fn signed_area(polygon: &[Vec2]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let sum: f64 = edges(polygon).map(|(a, b)| a.cross(&b)).sum();
    sum / 2.0
}

/// Absolute polygon area via the shoelace formula.
///
/// # Example
/// ```
/// use space_planner::geometry::polygon_area;
/// use space_planner::types::Vec2;
///
/// let square = [
///     Vec2::new(0.0, 0.0),
///     Vec2::new(2.0, 0.0),
///     Vec2::new(2.0, 2.0),
///     Vec2::new(0.0, 2.0),
/// ];
/// assert!((polygon_area(&square) - 4.0).abs() < 1e-9);
/// ```
pub fn polygon_area(polygon: &[Vec2]) -> f64 {
    signed_area(polygon).abs()
}

/// Sum of all edge lengths, including the closing edge.
pub fn polygon_perimeter(polygon: &[Vec2]) -> f64 {
    if polygon.len() < 2 {
        return 0.0;
    }
    edges(polygon).map(|(a, b)| a.distance_to(&b)).sum()
}

/// Area-weighted centroid; falls back to the vertex mean for degenerate loops.
pub fn polygon_centroid(polygon: &[Vec2]) -> Vec2 {
    if polygon.is_empty() {
        return Vec2::zero();
    }

    let area = signed_area(polygon);
    if area.abs() <= EPSILON_GENERAL {
        let sum = polygon.iter().fold(Vec2::zero(), |acc, p| acc + *p);
        return sum * (1.0 / polygon.len() as f64);
    }

    let (mut cx, mut cz) = (0.0, 0.0);
    for (a, b) in edges(polygon) {
        let cross = a.cross(&b);
        cx += (a.x + b.x) * cross;
        cz += (a.z + b.z) * cross;
    }
    let factor = 1.0 / (6.0 * area);
    Vec2::new(cx * factor, cz * factor)
}

/// Axis-aligned bounds from vertex extrema.
pub fn bounding_rect(polygon: &[Vec2]) -> Rect {
    let mut min = Vec2::new(f64::INFINITY, f64::INFINITY);
    let mut max = Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in polygon {
        min.x = min.x.min(p.x);
        min.z = min.z.min(p.z);
        max.x = max.x.max(p.x);
        max.z = max.z.max(p.z);
    }
    if polygon.is_empty() {
        return Rect::new(Vec2::zero(), Vec2::zero());
    }
    Rect::new(min, max)
}

/// Shortest distance from `point` to the segment `a`–`b`.
pub fn distance_point_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f64 {
    point.distance_to(&closest_point_on_segment(point, a, b))
}

/// Closest point to `point` on the segment `a`–`b`.
pub fn closest_point_on_segment(point: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.dot(&ab);
    if len_sq <= EPSILON_GENERAL * EPSILON_GENERAL {
        return a;
    }
    let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Shortest distance between two segments (0 if they cross).
pub fn segment_to_segment_distance(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> f64 {
    if segments_intersect(a0, a1, b0, b1) {
        return 0.0;
    }
    distance_point_to_segment(a0, b0, b1)
        .min(distance_point_to_segment(a1, b0, b1))
        .min(distance_point_to_segment(b0, a0, a1))
        .min(distance_point_to_segment(b1, a0, a1))
}

fn segments_intersect(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> bool {
    let d1 = (a1 - a0).cross(&(b0 - a0));
    let d2 = (a1 - a0).cross(&(b1 - a0));
    let d3 = (b1 - b0).cross(&(a0 - b0));
    let d4 = (b1 - b0).cross(&(a1 - b0));
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

/// Distance from `point` to the nearest polygon edge.
pub fn distance_to_boundary(point: Vec2, polygon: &[Vec2]) -> f64 {
    edges(polygon)
        .map(|(a, b)| distance_point_to_segment(point, a, b))
        .fold(f64::INFINITY, f64::min)
}

/// Inward-facing unit normal of the edge `a`–`b` for a loop with the given
/// orientation (`ccw = true` for counter-clockwise loops).
pub fn inward_normal(a: Vec2, b: Vec2, ccw: bool) -> Vec2 {
    let dir = (b - a).normalized();
    if ccw {
        dir.perpendicular()
    } else {
        -dir.perpendicular()
    }
}

/// Iterates over `(start, end)` pairs of every edge, including the closing edge.
pub fn edges(polygon: &[Vec2]) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
    let n = polygon.len();
    (0..n).map(move |i| (polygon[i], polygon[(i + 1) % n]))
}

/// Calculates the overlap of two intervals in one dimension.
///
/// # Example
/// ```
/// use space_planner::geometry::overlap_1d;
///
/// assert_eq!(overlap_1d(0.0, 5.0, 3.0, 8.0), 2.0);
/// ```
pub fn overlap_1d(a1: f64, a2: f64, b1: f64, b2: f64) -> f64 {
    (a2.min(b2) - a1.max(b1)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rectangle(w: f64, d: f64) -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(w, 0.0),
            Vec2::new(w, d),
            Vec2::new(0.0, d),
        ]
    }

    fn l_shape() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 2.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(2.0, 4.0),
            Vec2::new(0.0, 4.0),
        ]
    }

    #[test]
    fn test_area_and_perimeter() {
        let room = rectangle(5.0, 4.0);
        assert!((polygon_area(&room) - 20.0).abs() < EPSILON_GENERAL);
        assert!((polygon_perimeter(&room) - 18.0).abs() < EPSILON_GENERAL);
        assert!((polygon_area(&l_shape()) - 12.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_area_is_orientation_independent() {
        let mut room = rectangle(3.0, 2.0);
        assert!(signed_area(&room) > 0.0);
        room.reverse();
        assert!(signed_area(&room) < 0.0);
        assert!((polygon_area(&room) - 6.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_point_in_polygon_handles_concave_rooms() {
        let room = l_shape();
        assert!(point_in_polygon(Vec2::new(1.0, 1.0), &room));
        assert!(point_in_polygon(Vec2::new(1.0, 3.0), &room));
        assert!(!point_in_polygon(Vec2::new(3.0, 3.0), &room));
        assert!(!point_in_polygon(Vec2::new(-1.0, 1.0), &room));
    }

    #[test]
    fn test_centroid_of_rectangle() {
        let c = polygon_centroid(&rectangle(4.0, 2.0));
        assert!((c.x - 2.0).abs() < EPSILON_GENERAL);
        assert!((c.z - 1.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_point_to_segment_distance() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(4.0, 0.0);
        assert!((distance_point_to_segment(Vec2::new(2.0, 3.0), a, b) - 3.0).abs() < 1e-9);
        assert!((distance_point_to_segment(Vec2::new(7.0, 4.0), a, b) - 5.0).abs() < 1e-9);
        assert!((distance_point_to_segment(Vec2::new(1.0, 1.0), a, a) - 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_segment_distance_detects_crossing() {
        let d = segment_to_segment_distance(
            Vec2::new(0.0, -1.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
        );
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_inward_normal_points_inside() {
        let room = rectangle(4.0, 4.0);
        let ccw = signed_area(&room) > 0.0;
        for (a, b) in edges(&room) {
            let mid = (a + b) * 0.5;
            let probe = mid + inward_normal(a, b, ccw) * 0.1;
            assert!(point_in_polygon(probe, &room));
        }
    }

    #[test]
    fn test_distance_to_boundary() {
        let room = rectangle(5.0, 4.0);
        assert!((distance_to_boundary(Vec2::new(1.0, 2.0), &room) - 1.0).abs() < 1e-9);
    }
}
