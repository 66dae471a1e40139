//! Planar geometry for card outlines: points, quadrilaterals, polygon
//! measures and Douglas–Peucker simplification of closed contours.

use serde::Serialize;

/// A 2-D point in frame-pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<imageproc::point::Point<i32>> for Point {
    fn from(p: imageproc::point::Point<i32>) -> Self {
        Self::new(p.x as f32, p.y as f32)
    }
}

/// Four corners of a card outline.
///
/// Points are kept in detector order until [`Quadrilateral::ordered`] puts
/// them in canonical order: top-left, top-right, bottom-right, bottom-left.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Quadrilateral {
    pub points: [Point; 4],
}

impl Quadrilateral {
    pub const fn new(points: [Point; 4]) -> Self {
        Self { points }
    }

    /// Canonical ordering: min(x+y) is top-left, max(x+y) bottom-right,
    /// min(y-x) top-right and max(y-x) bottom-left.
    pub fn ordered(&self) -> Quadrilateral {
        let pts = &self.points;
        let sum = |p: &Point| p.x + p.y;
        let diff = |p: &Point| p.y - p.x;

        let tl = *pick(pts, sum, std::cmp::Ordering::Less);
        let br = *pick(pts, sum, std::cmp::Ordering::Greater);
        let tr = *pick(pts, diff, std::cmp::Ordering::Less);
        let bl = *pick(pts, diff, std::cmp::Ordering::Greater);

        Quadrilateral::new([tl, tr, br, bl])
    }

    /// Whether all four corners are distinct and no two edges cross.
    pub fn is_simple(&self) -> bool {
        let p = &self.points;
        for i in 0..4 {
            for j in (i + 1)..4 {
                if p[i].distance(&p[j]) < f32::EPSILON {
                    return false;
                }
            }
        }
        !segments_intersect(p[0], p[1], p[2], p[3]) && !segments_intersect(p[1], p[2], p[3], p[0])
    }
}

/// First point minimizing (or maximizing) `key`; ties keep the earliest.
fn pick<F>(pts: &[Point; 4], key: F, want: std::cmp::Ordering) -> &Point
where
    F: Fn(&Point) -> f32,
{
    let mut best = &pts[0];
    for p in &pts[1..] {
        if key(p).partial_cmp(&key(best)) == Some(want) {
            best = p;
        }
    }
    best
}

fn cross(o: Point, a: Point, b: Point) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Proper intersection of segments ab and cd.
fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

/// Absolute polygon area by the shoelace formula.
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0f64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice += p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
    }
    (twice / 2.0).abs()
}

/// Perimeter of a closed polygon.
pub fn closed_arc_length(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.distance(b) as f64)
        .sum()
}

fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let len = a.distance(&b) as f64;
    if len < f64::EPSILON {
        return p.distance(&a) as f64;
    }
    (cross(a, b, p) as f64).abs() / len
}

/// Douglas–Peucker on an open chain. Emits every kept vertex except the
/// final endpoint, so consecutive chains concatenate without duplicates.
fn simplify_open(chain: &[Point], epsilon: f64, out: &mut Vec<Point>) {
    if chain.len() < 3 {
        out.extend_from_slice(&chain[..chain.len().saturating_sub(1)]);
        return;
    }
    let first = chain[0];
    let last = chain[chain.len() - 1];

    let (index, dmax) = chain[1..chain.len() - 1]
        .iter()
        .enumerate()
        .map(|(i, p)| (i + 1, perpendicular_distance(*p, first, last)))
        .fold((0, 0.0), |acc, cur| if cur.1 > acc.1 { cur } else { acc });

    if dmax > epsilon {
        simplify_open(&chain[..=index], epsilon, out);
        simplify_open(&chain[index..], epsilon, out);
    } else {
        out.push(first);
    }
}

/// Simplifies a closed contour to a polygon whose vertices lie within
/// `epsilon` of the original boundary.
///
/// The contour is split at two mutually distant points (corners for any
/// convex outline) and each half is simplified independently.
pub fn approximate_closed_polygon(contour: &[Point], epsilon: f64) -> Vec<Point> {
    if contour.len() < 3 {
        return contour.to_vec();
    }

    let farthest_from = |origin: Point| {
        contour
            .iter()
            .enumerate()
            .map(|(i, p)| (i, origin.distance(p)))
            .fold((0, 0.0f32), |acc, cur| if cur.1 > acc.1 { cur } else { acc })
            .0
    };
    let a = farthest_from(contour[0]);
    let b = farthest_from(contour[a]);
    if a == b {
        return vec![contour[a]];
    }
    let (start, end) = if a < b { (a, b) } else { (b, a) };

    let first_half: Vec<Point> = contour[start..=end].to_vec();
    let second_half: Vec<Point> = contour[end..]
        .iter()
        .chain(contour[..=start].iter())
        .copied()
        .collect();

    let mut polygon = Vec::new();
    simplify_open(&first_half, epsilon, &mut polygon);
    simplify_open(&second_half, epsilon, &mut polygon);
    polygon
}
