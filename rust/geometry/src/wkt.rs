// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Well-Known Text reader (nom) and writer (`Display`).
//!
//! Only 2D coordinates are accepted. Keywords are case-insensitive; the
//! writer emits upper-case keywords and the shortest round-tripping decimal
//! representation of each ordinate.

use std::fmt;
use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, digit1, multispace0, multispace1, one_of},
    combinator::{map, map_res, opt, recognize, value, verify},
    multi::separated_list1,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::error::{Error, Result};
use crate::types::{Coord, Geometry, LineString, Point, Polygon};

/// Parse number: 1, -1.5, .5, 2., 1e-3
fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            alt((
                recognize(pair(digit1, opt(pair(char('.'), opt(digit1))))),
                recognize(pair(char('.'), digit1)),
            )),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        fast_float::parse::<f64, _>,
    )(input)
}

/// Parse coordinate: `x y`
fn coord(input: &str) -> IResult<&str, Coord> {
    map(
        tuple((number, multispace1, number)),
        |(x, _, y)| Coord::new(x, y),
    )(input)
}

fn empty(input: &str) -> IResult<&str, ()> {
    value((), preceded(multispace0, tag_no_case("EMPTY")))(input)
}

/// Parse a parenthesised, comma separated, non-empty list.
fn list<'a, O, F>(item: F) -> impl FnMut(&'a str) -> IResult<&'a str, Vec<O>>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(
        pair(multispace0, char('(')),
        separated_list1(char(','), delimited(multispace0, item, multispace0)),
        char(')'),
    )
}

/// `EMPTY` or a parenthesised list of `item`.
fn multi<'a, O, F>(item: F) -> impl FnMut(&'a str) -> IResult<&'a str, Vec<O>>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    alt((map(empty, |_| Vec::new()), list(item)))
}

fn point_text(input: &str) -> IResult<&str, Point> {
    alt((
        map(empty, |_| Point::empty()),
        map(
            delimited(
                pair(multispace0, char('(')),
                delimited(multispace0, coord, multispace0),
                char(')'),
            ),
            |c| Point(Some(c)),
        ),
    ))(input)
}

fn linestring_text(input: &str) -> IResult<&str, LineString> {
    alt((
        map(empty, |_| LineString::default()),
        map(list(coord), LineString::new),
    ))(input)
}

fn polygon_text(input: &str) -> IResult<&str, Polygon> {
    alt((
        map(empty, |_| Polygon::default()),
        map(
            verify(list(linestring_text), |rings: &Vec<LineString>| {
                rings.iter().all(LineString::is_closed)
            }),
            |mut rings| {
                // separated_list1 guarantees at least the exterior ring
                let exterior = rings.remove(0);
                Polygon::new(exterior, rings)
            },
        ),
    ))(input)
}

/// MULTIPOINT members may be written `(x y)`, bare `x y`, or `EMPTY`.
fn multipoint_member(input: &str) -> IResult<&str, Point> {
    alt((point_text, map(coord, |c| Point(Some(c)))))(input)
}

fn geometry(input: &str) -> IResult<&str, Geometry> {
    preceded(
        multispace0,
        alt((
            map(preceded(tag_no_case("POINT"), point_text), Geometry::Point),
            map(
                preceded(tag_no_case("LINESTRING"), linestring_text),
                Geometry::LineString,
            ),
            map(preceded(tag_no_case("POLYGON"), polygon_text), Geometry::Polygon),
            map(
                preceded(tag_no_case("MULTIPOINT"), multi(multipoint_member)),
                Geometry::MultiPoint,
            ),
            map(
                preceded(tag_no_case("MULTILINESTRING"), multi(linestring_text)),
                Geometry::MultiLineString,
            ),
            map(
                preceded(tag_no_case("MULTIPOLYGON"), multi(polygon_text)),
                Geometry::MultiPolygon,
            ),
            map(
                preceded(tag_no_case("GEOMETRYCOLLECTION"), multi(geometry)),
                Geometry::GeometryCollection,
            ),
            map(
                preceded(tag_no_case("CIRCULARSTRING"), linestring_text),
                Geometry::CircularString,
            ),
            map(preceded(tag_no_case("TRIANGLE"), polygon_text), Geometry::Triangle),
        )),
    )(input)
}

/// Parses a WKT string into a [`Geometry`].
///
/// The whole input must be consumed (trailing whitespace is allowed).
pub fn parse_wkt(input: &str) -> Result<Geometry> {
    match terminated(geometry, multispace0)(input) {
        Ok(("", geom)) => Ok(geom),
        Ok((rest, _)) => Err(Error::TrailingInput(input.len() - rest.len())),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(Error::InvalidWkt {
            offset: input.len() - e.input.len(),
            message: format!("{:?}", e.code),
        }),
        Err(nom::Err::Incomplete(_)) => Err(Error::InvalidWkt {
            offset: input.len(),
            message: "incomplete input".to_string(),
        }),
    }
}

impl FromStr for Geometry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_wkt(s)
    }
}

// =============================================================================
// Writer
// =============================================================================

fn write_coords(f: &mut fmt::Formatter<'_>, coords: &[Coord]) -> fmt::Result {
    f.write_str("(")?;
    for (i, c) in coords.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{} {}", c.x, c.y)?;
    }
    f.write_str(")")
}

fn write_line(f: &mut fmt::Formatter<'_>, line: &LineString) -> fmt::Result {
    if line.is_empty() {
        f.write_str(" EMPTY")
    } else {
        write_coords(f, &line.coords)
    }
}

fn write_polygon(f: &mut fmt::Formatter<'_>, polygon: &Polygon) -> fmt::Result {
    if polygon.is_empty() {
        return f.write_str(" EMPTY");
    }
    f.write_str("(")?;
    for (i, ring) in polygon.rings().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write_coords(f, &ring.coords)?;
    }
    f.write_str(")")
}

fn write_point(f: &mut fmt::Formatter<'_>, point: &Point) -> fmt::Result {
    match point.0 {
        Some(c) => write!(f, "({} {})", c.x, c.y),
        None => f.write_str(" EMPTY"),
    }
}

/// Writes `(a,b,c)` or ` EMPTY`, where each member is written by `member`.
fn write_members<T>(
    f: &mut fmt::Formatter<'_>,
    members: &[T],
    mut member: impl FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    if members.is_empty() {
        return f.write_str(" EMPTY");
    }
    f.write_str("(")?;
    for (i, m) in members.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        member(f, m)?;
    }
    f.write_str(")")
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.shape_class().as_str())?;
        match self {
            Geometry::Point(p) => write_point(f, p),
            Geometry::LineString(l) | Geometry::CircularString(l) => write_line(f, l),
            Geometry::Polygon(p) | Geometry::Triangle(p) => write_polygon(f, p),
            Geometry::MultiPoint(points) => write_members(f, points, |f, p| match p.0 {
                Some(_) => write_point(f, p),
                None => f.write_str("EMPTY"),
            }),
            Geometry::MultiLineString(lines) => write_members(f, lines, |f, l| {
                if l.is_empty() {
                    f.write_str("EMPTY")
                } else {
                    write_coords(f, &l.coords)
                }
            }),
            Geometry::MultiPolygon(polygons) => write_members(f, polygons, |f, p| {
                if p.is_empty() {
                    f.write_str("EMPTY")
                } else {
                    write_polygon(f, p)
                }
            }),
            Geometry::GeometryCollection(members) => {
                write_members(f, members, |f, g| write!(f, "{}", g))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parse_point() {
        let geom = parse_wkt("POINT(1.5 -2)").unwrap();
        assert_eq!(geom, Geometry::Point(Point::new(1.5, -2.0)));

        let geom = parse_wkt("  point ( 3e2  .5 ) ").unwrap();
        assert_eq!(geom, Geometry::Point(Point::new(300.0, 0.5)));
    }

    #[test]
    fn parse_empty_forms() {
        assert_eq!(parse_wkt("POINT EMPTY").unwrap(), Geometry::Point(Point::empty()));
        assert_eq!(
            parse_wkt("LINESTRING EMPTY").unwrap(),
            Geometry::LineString(LineString::default())
        );
        assert_eq!(
            parse_wkt("GEOMETRYCOLLECTION EMPTY").unwrap(),
            Geometry::GeometryCollection(Vec::new())
        );
    }

    #[test]
    fn parse_polygon_with_hole() {
        let geom =
            parse_wkt("POLYGON((0 0,10 0,10 10,0 10,0 0),(2 2,4 2,4 4,2 2))").unwrap();
        match geom {
            Geometry::Polygon(p) => {
                assert_eq!(p.exterior.coords.len(), 5);
                assert_eq!(p.interiors.len(), 1);
                assert_relative_eq!(p.interiors[0].coords[1].x, 4.0);
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn parse_multipoint_member_styles() {
        let bare = parse_wkt("MULTIPOINT(0 0, 1 1)").unwrap();
        let wrapped = parse_wkt("MULTIPOINT((0 0),(1 1))").unwrap();
        assert_eq!(bare, wrapped);

        let with_empty = parse_wkt("MULTIPOINT((0 0),EMPTY)").unwrap();
        assert_eq!(
            with_empty,
            Geometry::MultiPoint(vec![Point::new(0.0, 0.0), Point::empty()])
        );
    }

    #[test]
    fn parse_nested_collection() {
        let geom = parse_wkt(
            "GEOMETRYCOLLECTION(POINT(0 0),GEOMETRYCOLLECTION(LINESTRING(0 0,1 1)),MULTIPOLYGON(((0 0,1 0,1 1,0 0))))",
        )
        .unwrap();
        match &geom {
            Geometry::GeometryCollection(members) => assert_eq!(members.len(), 3),
            other => panic!("expected collection, got {:?}", other),
        }
        assert_eq!(geom.dump().count(), 3);
    }

    #[test]
    fn reject_malformed_input() {
        assert!(matches!(
            parse_wkt("POINT(1)"),
            Err(Error::InvalidWkt { .. })
        ));
        assert!(matches!(parse_wkt("HEXAGON(1 2)"), Err(Error::InvalidWkt { .. })));
        assert_eq!(parse_wkt("POINT(1 2) junk"), Err(Error::TrailingInput(11)));
    }

    #[test]
    fn reject_unclosed_rings() {
        assert!(matches!(
            parse_wkt("POLYGON((0 0,10 0,10 10))"),
            Err(Error::InvalidWkt { .. })
        ));
        assert!(matches!(
            parse_wkt("POLYGON((0 0,10 0,10 10,0 0),(2 2,4 2,4 4))"),
            Err(Error::InvalidWkt { .. })
        ));
        assert!(matches!(
            parse_wkt("MULTIPOLYGON(((0 0,1 0,1 1,0 0)),((5 5,6 5,6 6)))"),
            Err(Error::InvalidWkt { .. })
        ));
        assert!(parse_wkt("POLYGON((0 0,10 0,10 10,0 0))").is_ok());
    }

    #[test]
    fn writer_output() {
        let geom = Geometry::GeometryCollection(vec![
            Geometry::Point(Point::new(1.0, 2.5)),
            Geometry::LineString(LineString::from_xy(&[(0.0, 0.0), (1.0, 1.0)])),
            Geometry::MultiPoint(vec![Point::new(0.0, 0.0), Point::empty()]),
        ]);
        assert_eq!(
            geom.to_string(),
            "GEOMETRYCOLLECTION(POINT(1 2.5),LINESTRING(0 0,1 1),MULTIPOINT((0 0),EMPTY))"
        );
        assert_eq!(Geometry::Point(Point::empty()).to_string(), "POINT EMPTY");
    }

    #[test]
    fn written_text_reads_back() {
        let text = "MULTIPOLYGON(((0 0,4 0,4 4,0 4,0 0),(1 1,2 1,2 2,1 1)),((10 10,11 10,11 11,10 10)))";
        let geom = parse_wkt(text).unwrap();
        assert_eq!(geom.to_string(), text);
        assert_eq!(parse_wkt(&geom.to_string()).unwrap(), geom);
    }
}
