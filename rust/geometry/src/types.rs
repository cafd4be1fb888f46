// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry model and introspection.

use nalgebra::Point2;

/// A planar coordinate.
pub type Coord = Point2<f64>;

/// A single point, possibly empty (`POINT EMPTY`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point(pub Option<Coord>);

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self(Some(Coord::new(x, y)))
    }

    pub fn empty() -> Self {
        Self(None)
    }

    pub fn coord(&self) -> Option<Coord> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

/// An ordered sequence of coordinates. Empty when it has no coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineString {
    pub coords: Vec<Coord>,
}

impl LineString {
    pub fn new(coords: Vec<Coord>) -> Self {
        Self { coords }
    }

    /// Builds a linestring from `(x, y)` pairs.
    pub fn from_xy(xy: &[(f64, f64)]) -> Self {
        Self {
            coords: xy.iter().map(|&(x, y)| Coord::new(x, y)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Returns `true` if the first and last coordinates are identical.
    pub fn is_closed(&self) -> bool {
        match (self.coords.first(), self.coords.last()) {
            (Some(first), Some(last)) => self.coords.len() > 1 && first == last,
            _ => false,
        }
    }
}

/// A polygon: one exterior ring and zero or more interior rings (holes).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    pub exterior: LineString,
    pub interiors: Vec<LineString>,
}

impl Polygon {
    pub fn new(exterior: LineString, interiors: Vec<LineString>) -> Self {
        Self {
            exterior,
            interiors,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.exterior.is_empty()
    }

    /// Iterates over the exterior ring followed by the interior rings.
    pub fn rings(&self) -> impl Iterator<Item = &LineString> {
        std::iter::once(&self.exterior).chain(self.interiors.iter())
    }
}

/// Shape class of a geometry, as reported by `GeometryType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeClass {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    CircularString,
    Triangle,
}

impl ShapeClass {
    /// Returns the upper-case WKT type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeClass::Point => "POINT",
            ShapeClass::LineString => "LINESTRING",
            ShapeClass::Polygon => "POLYGON",
            ShapeClass::MultiPoint => "MULTIPOINT",
            ShapeClass::MultiLineString => "MULTILINESTRING",
            ShapeClass::MultiPolygon => "MULTIPOLYGON",
            ShapeClass::GeometryCollection => "GEOMETRYCOLLECTION",
            ShapeClass::CircularString => "CIRCULARSTRING",
            ShapeClass::Triangle => "TRIANGLE",
        }
    }
}

impl std::fmt::Display for ShapeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any simple-feature geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    LineString(LineString),
    Polygon(Polygon),
    MultiPoint(Vec<Point>),
    MultiLineString(Vec<LineString>),
    MultiPolygon(Vec<Polygon>),
    GeometryCollection(Vec<Geometry>),
    CircularString(LineString),
    Triangle(Polygon),
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: Coord,
    pub max: Coord,
}

impl Extent {
    fn from_coord(c: &Coord) -> Self {
        Self { min: *c, max: *c }
    }

    fn expand(&mut self, c: &Coord) {
        self.min.x = self.min.x.min(c.x);
        self.min.y = self.min.y.min(c.y);
        self.max.x = self.max.x.max(c.x);
        self.max.y = self.max.y.max(c.y);
    }

    /// Largest absolute value among the four box ordinates.
    pub fn max_abs_ordinate(&self) -> f64 {
        self.min
            .x
            .abs()
            .max(self.min.y.abs())
            .max(self.max.x.abs())
            .max(self.max.y.abs())
    }
}

impl Geometry {
    pub fn shape_class(&self) -> ShapeClass {
        match self {
            Geometry::Point(_) => ShapeClass::Point,
            Geometry::LineString(_) => ShapeClass::LineString,
            Geometry::Polygon(_) => ShapeClass::Polygon,
            Geometry::MultiPoint(_) => ShapeClass::MultiPoint,
            Geometry::MultiLineString(_) => ShapeClass::MultiLineString,
            Geometry::MultiPolygon(_) => ShapeClass::MultiPolygon,
            Geometry::GeometryCollection(_) => ShapeClass::GeometryCollection,
            Geometry::CircularString(_) => ShapeClass::CircularString,
            Geometry::Triangle(_) => ShapeClass::Triangle,
        }
    }

    /// Topological dimension: 0 for puntal, 1 for lineal, 2 for areal.
    ///
    /// A collection reports the highest dimension among its members, or 0
    /// when it has none.
    pub fn dimension(&self) -> u8 {
        match self {
            Geometry::Point(_) | Geometry::MultiPoint(_) => 0,
            Geometry::LineString(_) | Geometry::MultiLineString(_) | Geometry::CircularString(_) => 1,
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) | Geometry::Triangle(_) => 2,
            Geometry::GeometryCollection(members) => {
                members.iter().map(Geometry::dimension).max().unwrap_or(0)
            }
        }
    }

    /// A geometry is empty when none of its components hold a coordinate.
    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point(p) => p.is_empty(),
            Geometry::LineString(l) | Geometry::CircularString(l) => l.is_empty(),
            Geometry::Polygon(p) | Geometry::Triangle(p) => p.is_empty(),
            Geometry::MultiPoint(points) => points.iter().all(Point::is_empty),
            Geometry::MultiLineString(lines) => lines.iter().all(LineString::is_empty),
            Geometry::MultiPolygon(polygons) => polygons.iter().all(Polygon::is_empty),
            Geometry::GeometryCollection(members) => members.iter().all(Geometry::is_empty),
        }
    }

    /// Calls `f` for every coordinate of the geometry, in document order.
    pub fn for_each_coord(&self, f: &mut impl FnMut(&Coord)) {
        fn line(l: &LineString, f: &mut impl FnMut(&Coord)) {
            for c in &l.coords {
                f(c);
            }
        }
        fn polygon(p: &Polygon, f: &mut impl FnMut(&Coord)) {
            for ring in p.rings() {
                line(ring, f);
            }
        }

        match self {
            Geometry::Point(p) => {
                if let Some(c) = &p.0 {
                    f(c);
                }
            }
            Geometry::LineString(l) | Geometry::CircularString(l) => line(l, f),
            Geometry::Polygon(p) | Geometry::Triangle(p) => polygon(p, f),
            Geometry::MultiPoint(points) => {
                for c in points.iter().filter_map(|p| p.0.as_ref()) {
                    f(c);
                }
            }
            Geometry::MultiLineString(lines) => {
                for l in lines {
                    line(l, f);
                }
            }
            Geometry::MultiPolygon(polygons) => {
                for p in polygons {
                    polygon(p, f);
                }
            }
            Geometry::GeometryCollection(members) => {
                for m in members {
                    m.for_each_coord(f);
                }
            }
        }
    }

    /// Bounding box of all coordinates, or `None` for an empty geometry.
    pub fn extent(&self) -> Option<Extent> {
        let mut extent: Option<Extent> = None;
        self.for_each_coord(&mut |c| match extent.as_mut() {
            Some(e) => e.expand(c),
            None => extent = Some(Extent::from_coord(c)),
        });
        extent
    }
}

impl From<Point> for Geometry {
    fn from(p: Point) -> Self {
        Geometry::Point(p)
    }
}

impl From<LineString> for Geometry {
    fn from(l: LineString) -> Self {
        Geometry::LineString(l)
    }
}

impl From<Polygon> for Geometry {
    fn from(p: Polygon) -> Self {
        Geometry::Polygon(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Polygon {
        Polygon::new(
            LineString::from_xy(&[
                (x0, y0),
                (x0 + size, y0),
                (x0 + size, y0 + size),
                (x0, y0 + size),
                (x0, y0),
            ]),
            Vec::new(),
        )
    }

    #[test]
    fn shape_class_names() {
        assert_eq!(ShapeClass::Point.as_str(), "POINT");
        assert_eq!(ShapeClass::MultiLineString.as_str(), "MULTILINESTRING");
        assert_eq!(ShapeClass::GeometryCollection.to_string(), "GEOMETRYCOLLECTION");
    }

    #[test]
    fn dimension_of_collection_is_highest_member() {
        let geom = Geometry::GeometryCollection(vec![
            Point::new(0.0, 0.0).into(),
            LineString::from_xy(&[(0.0, 0.0), (1.0, 1.0)]).into(),
        ]);
        assert_eq!(geom.dimension(), 1);
        assert_eq!(Geometry::GeometryCollection(Vec::new()).dimension(), 0);
        assert_eq!(Geometry::MultiPolygon(vec![square(0.0, 0.0, 1.0)]).dimension(), 2);
    }

    #[test]
    fn emptiness() {
        assert!(Geometry::Point(Point::empty()).is_empty());
        assert!(Geometry::MultiPoint(vec![Point::empty(), Point::empty()]).is_empty());
        assert!(!Geometry::MultiPoint(vec![Point::empty(), Point::new(1.0, 1.0)]).is_empty());
        assert!(Geometry::GeometryCollection(Vec::new()).is_empty());
        assert!(!Geometry::Polygon(square(0.0, 0.0, 1.0)).is_empty());
    }

    #[test]
    fn extent_covers_all_coordinates() {
        let geom = Geometry::GeometryCollection(vec![
            Point::new(-5.0, 2.0).into(),
            Geometry::Polygon(square(1.0, 1.0, 3.0)),
        ]);
        let extent = geom.extent().unwrap();
        assert_eq!(extent.min, Coord::new(-5.0, 1.0));
        assert_eq!(extent.max, Coord::new(4.0, 4.0));
        assert_eq!(extent.max_abs_ordinate(), 5.0);

        assert!(Geometry::Point(Point::empty()).extent().is_none());
    }

    #[test]
    fn closed_ring_detection() {
        assert!(square(0.0, 0.0, 1.0).exterior.is_closed());
        assert!(!LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0)]).is_closed());
        assert!(!LineString::default().is_closed());
    }
}
