// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar computational geometry used by the editing engine.

use nalgebra::Vector2;
use topogeo_geometry::Coord;

/// Squared distance between two coordinates.
#[inline]
pub fn dist_sq(a: &Coord, b: &Coord) -> f64 {
    (a - b).norm_squared()
}

/// Closest point to `p` on segment `a`-`b`, as `(t, point)` with `t` in
/// `[0, 1]`.
pub fn project_on_segment(p: &Coord, a: &Coord, b: &Coord) -> (f64, Coord) {
    let ab: Vector2<f64> = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return (0.0, *a);
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (t, a + ab * t)
}

/// Where a polyline passes closest to a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Index of the segment `coords[segment]`-`coords[segment + 1]`.
    pub segment: usize,
    /// Parameter along that segment.
    pub t: f64,
    pub point: Coord,
    pub dist_sq: f64,
}

/// Projects `p` onto the polyline `coords`.
pub fn project_on_polyline(p: &Coord, coords: &[Coord]) -> Option<Projection> {
    let mut best: Option<Projection> = None;
    for (segment, w) in coords.windows(2).enumerate() {
        let (t, point) = project_on_segment(p, &w[0], &w[1]);
        let d = dist_sq(p, &point);
        if best.map_or(true, |b| d < b.dist_sq) {
            best = Some(Projection {
                segment,
                t,
                point,
                dist_sq: d,
            });
        }
    }
    best
}

fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Proper crossing of segments `a`-`b` and `c`-`d`.
///
/// Returns the parameters along both segments and the crossing point.
/// Parallel and collinear segments never cross; touching at an endpoint
/// counts as a crossing.
pub fn segment_intersection(
    a: &Coord,
    b: &Coord,
    c: &Coord,
    d: &Coord,
) -> Option<(f64, f64, Coord)> {
    let r = b - a;
    let s = d - c;
    let denom = cross(&r, &s);
    if denom == 0.0 {
        return None;
    }
    let qp = c - a;
    let t = cross(&qp, &s) / denom;
    let u = cross(&qp, &r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some((t, u, a + r * t))
    } else {
        None
    }
}

/// Signed area of a ring (positive when counter-clockwise).
pub fn ring_signed_area(ring: &[Coord]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let a = &ring[i];
        let b = &ring[(i + 1) % ring.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Even-odd test of `p` against a ring. Points on the boundary may go
/// either way.
pub fn point_in_ring(p: &Coord, ring: &[Coord]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (&ring[i], &ring[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// `true` if `p` is inside `exterior` and outside every ring of `holes`.
pub fn point_in_area(p: &Coord, exterior: &[Coord], holes: &[Vec<Coord>]) -> bool {
    point_in_ring(p, exterior) && !holes.iter().any(|h| point_in_ring(p, h))
}

/// Removes consecutive coordinates closer than `tolerance`.
pub fn dedup_coords(coords: &mut Vec<Coord>, tolerance: f64) {
    let tol_sq = tolerance * tolerance;
    coords.dedup_by(|b, a| dist_sq(a, b) <= tol_sq);
}

/// Compares two polylines vertex by vertex, in either direction.
pub fn same_polyline(a: &[Coord], b: &[Coord], tolerance: f64) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let tol_sq = tolerance * tolerance;
    let forward = a.iter().zip(b).all(|(p, q)| dist_sq(p, q) <= tol_sq);
    forward || a.iter().zip(b.iter().rev()).all(|(p, q)| dist_sq(p, q) <= tol_sq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn c(x: f64, y: f64) -> Coord {
        Coord::new(x, y)
    }

    #[test]
    fn projection_clamps_to_segment() {
        let (t, p) = project_on_segment(&c(5.0, 3.0), &c(0.0, 0.0), &c(10.0, 0.0));
        assert_relative_eq!(t, 0.5);
        assert_eq!(p, c(5.0, 0.0));

        let (t, p) = project_on_segment(&c(-4.0, 1.0), &c(0.0, 0.0), &c(10.0, 0.0));
        assert_eq!(t, 0.0);
        assert_eq!(p, c(0.0, 0.0));
    }

    #[test]
    fn polyline_projection_picks_nearest_segment() {
        let line = [c(0.0, 0.0), c(10.0, 0.0), c(10.0, 10.0)];
        let proj = project_on_polyline(&c(11.0, 6.0), &line).unwrap();
        assert_eq!(proj.segment, 1);
        assert_eq!(proj.point, c(10.0, 6.0));
        assert_relative_eq!(proj.dist_sq, 1.0);
    }

    #[test]
    fn crossing_segments() {
        let hit = segment_intersection(&c(0.0, 0.0), &c(10.0, 10.0), &c(0.0, 10.0), &c(10.0, 0.0));
        let (t, u, p) = hit.unwrap();
        assert_relative_eq!(t, 0.5);
        assert_relative_eq!(u, 0.5);
        assert_relative_eq!(p.x, 5.0);
        assert_relative_eq!(p.y, 5.0);

        assert!(
            segment_intersection(&c(0.0, 0.0), &c(10.0, 0.0), &c(0.0, 1.0), &c(10.0, 1.0))
                .is_none()
        );
        assert!(
            segment_intersection(&c(0.0, 0.0), &c(1.0, 0.0), &c(2.0, -1.0), &c(2.0, 1.0))
                .is_none()
        );
    }

    #[test]
    fn ring_area_and_containment() {
        let square = [c(0.0, 0.0), c(4.0, 0.0), c(4.0, 4.0), c(0.0, 4.0), c(0.0, 0.0)];
        assert_relative_eq!(ring_signed_area(&square), 16.0);
        assert!(point_in_ring(&c(2.0, 2.0), &square));
        assert!(!point_in_ring(&c(5.0, 2.0), &square));

        let hole = vec![c(1.0, 1.0), c(3.0, 1.0), c(3.0, 3.0), c(1.0, 3.0), c(1.0, 1.0)];
        assert!(!point_in_area(&c(2.0, 2.0), &square, &[hole.clone()]));
        assert!(point_in_area(&c(0.5, 0.5), &square, &[hole]));
    }

    #[test]
    fn polyline_comparison_ignores_direction() {
        let a = [c(0.0, 0.0), c(1.0, 0.0), c(1.0, 1.0)];
        let b = [c(1.0, 1.0), c(1.0, 0.0), c(0.0, 0.0)];
        assert!(same_polyline(&a, &b, 0.0));
        assert!(!same_polyline(&a, &b[..2], 0.0));
    }

    #[test]
    fn dedup_drops_close_neighbours() {
        let mut coords = vec![c(0.0, 0.0), c(0.0, 0.0), c(0.001, 0.0), c(1.0, 0.0)];
        dedup_coords(&mut coords, 0.01);
        assert_eq!(coords, vec![c(0.0, 0.0), c(1.0, 0.0)]);
    }
}
