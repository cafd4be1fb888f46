// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lazy explosion of geometries into single-part components.
//!
//! [`Geometry::dump`] walks multi-part geometries and (nested) collections
//! depth-first, yielding every atomic component in document order together
//! with its 1-based path. Empty components are yielded too; callers that
//! only want drawable parts filter on [`Part::is_empty`].

use smallvec::SmallVec;

use crate::types::{Geometry, LineString, Point, Polygon, ShapeClass};

/// 1-based position of a component inside its parent geometry. Empty for a
/// geometry that is already single-part.
pub type DumpPath = SmallVec<[usize; 4]>;

/// A borrowed single-part component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Part<'a> {
    Point(&'a Point),
    LineString(&'a LineString),
    Polygon(&'a Polygon),
    CircularString(&'a LineString),
    Triangle(&'a Polygon),
}

impl<'a> Part<'a> {
    pub fn dimension(&self) -> u8 {
        match self {
            Part::Point(_) => 0,
            Part::LineString(_) | Part::CircularString(_) => 1,
            Part::Polygon(_) | Part::Triangle(_) => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Part::Point(p) => p.is_empty(),
            Part::LineString(l) | Part::CircularString(l) => l.is_empty(),
            Part::Polygon(p) | Part::Triangle(p) => p.is_empty(),
        }
    }

    pub fn shape_class(&self) -> ShapeClass {
        match self {
            Part::Point(_) => ShapeClass::Point,
            Part::LineString(_) => ShapeClass::LineString,
            Part::Polygon(_) => ShapeClass::Polygon,
            Part::CircularString(_) => ShapeClass::CircularString,
            Part::Triangle(_) => ShapeClass::Triangle,
        }
    }

    /// Returns `true` for points, linestrings and polygons: the only parts a
    /// planar node/edge/face topology can represent.
    pub fn is_planar_primitive(&self) -> bool {
        matches!(self, Part::Point(_) | Part::LineString(_) | Part::Polygon(_))
    }
}

/// A component yielded by [`Dump`].
#[derive(Debug, Clone, PartialEq)]
pub struct DumpItem<'a> {
    pub path: DumpPath,
    pub part: Part<'a>,
}

enum Pending<'a> {
    Geometry(&'a Geometry),
    Part(Part<'a>),
}

/// Depth-first iterator over the atomic components of a geometry.
///
/// The iterator is single-pass; call [`Geometry::dump`] again to restart.
pub struct Dump<'a> {
    stack: Vec<(DumpPath, Pending<'a>)>,
}

impl<'a> Dump<'a> {
    fn new(geometry: &'a Geometry) -> Self {
        Self {
            stack: vec![(DumpPath::new(), Pending::Geometry(geometry))],
        }
    }

    /// Pushes children in reverse so they pop in document order.
    fn push_children<I>(&mut self, path: &DumpPath, children: I)
    where
        I: DoubleEndedIterator<Item = Pending<'a>> + ExactSizeIterator,
    {
        for (i, child) in children.enumerate().rev() {
            let mut child_path = path.clone();
            child_path.push(i + 1);
            self.stack.push((child_path, child));
        }
    }
}

impl<'a> Iterator for Dump<'a> {
    type Item = DumpItem<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((path, pending)) = self.stack.pop() {
            let geometry = match pending {
                Pending::Part(part) => return Some(DumpItem { path, part }),
                Pending::Geometry(geometry) => geometry,
            };

            let part = match geometry {
                Geometry::Point(p) => Part::Point(p),
                Geometry::LineString(l) => Part::LineString(l),
                Geometry::Polygon(p) => Part::Polygon(p),
                Geometry::CircularString(l) => Part::CircularString(l),
                Geometry::Triangle(p) => Part::Triangle(p),
                Geometry::MultiPoint(points) => {
                    self.push_children(&path, points.iter().map(|p| Pending::Part(Part::Point(p))));
                    continue;
                }
                Geometry::MultiLineString(lines) => {
                    self.push_children(
                        &path,
                        lines.iter().map(|l| Pending::Part(Part::LineString(l))),
                    );
                    continue;
                }
                Geometry::MultiPolygon(polygons) => {
                    self.push_children(
                        &path,
                        polygons.iter().map(|p| Pending::Part(Part::Polygon(p))),
                    );
                    continue;
                }
                Geometry::GeometryCollection(members) => {
                    self.push_children(&path, members.iter().map(Pending::Geometry));
                    continue;
                }
            };
            return Some(DumpItem { path, part });
        }
        None
    }
}

impl Geometry {
    /// Explodes the geometry into its single-part components.
    pub fn dump(&self) -> Dump<'_> {
        Dump::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_part_has_empty_path() {
        let geom = Geometry::Point(Point::new(1.0, 2.0));
        let items: Vec<_> = geom.dump().collect();
        assert_eq!(items.len(), 1);
        assert!(items[0].path.is_empty());
        assert_eq!(items[0].part.dimension(), 0);
    }

    #[test]
    fn multipoint_yields_points_in_order() {
        let geom = Geometry::MultiPoint(vec![
            Point::new(0.0, 0.0),
            Point::empty(),
            Point::new(2.0, 2.0),
        ]);
        let items: Vec<_> = geom.dump().collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].path.as_slice(), &[1]);
        assert_eq!(items[2].path.as_slice(), &[3]);
        assert!(items[1].part.is_empty());
        assert_eq!(items[2].part, Part::Point(&Point::new(2.0, 2.0)));
    }

    #[test]
    fn nested_collections_are_flattened_depth_first() {
        let line = LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0)]);
        let geom = Geometry::GeometryCollection(vec![
            Geometry::Point(Point::new(9.0, 9.0)),
            Geometry::GeometryCollection(vec![
                Geometry::MultiLineString(vec![line.clone(), line.clone()]),
                Geometry::Point(Point::new(5.0, 5.0)),
            ]),
            Geometry::GeometryCollection(Vec::new()),
        ]);

        let paths: Vec<Vec<usize>> = geom.dump().map(|item| item.path.to_vec()).collect();
        assert_eq!(
            paths,
            vec![vec![1], vec![2, 1, 1], vec![2, 1, 2], vec![2, 2]]
        );

        let dims: Vec<u8> = geom.dump().map(|item| item.part.dimension()).collect();
        assert_eq!(dims, vec![0, 1, 1, 0]);
    }

    #[test]
    fn curved_parts_are_not_planar_primitives() {
        let arc = LineString::from_xy(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        let geom = Geometry::GeometryCollection(vec![Geometry::CircularString(arc)]);
        let item = geom.dump().next().unwrap();
        assert!(!item.part.is_planar_primitive());
        assert_eq!(item.part.shape_class(), ShapeClass::CircularString);
    }

    #[test]
    fn points_lines_and_polygons_are_planar_primitives() {
        let line = LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0)]);
        let ring = LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        let geom = Geometry::GeometryCollection(vec![
            Geometry::Point(Point::new(0.0, 0.0)),
            Geometry::LineString(line),
            Geometry::Polygon(Polygon::new(ring.clone(), Vec::new())),
            Geometry::Triangle(Polygon::new(ring, Vec::new())),
        ]);

        let flags: Vec<bool> = geom.dump().map(|item| item.part.is_planar_primitive()).collect();
        assert_eq!(flags, vec![true, true, true, false]);
    }

    #[test]
    fn structurally_identical_parts_are_not_deduplicated() {
        let p = Point::new(1.0, 1.0);
        let geom = Geometry::MultiPoint(vec![p, p]);
        assert_eq!(geom.dump().count(), 2);
    }
}
