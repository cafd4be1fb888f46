// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # topogeo Geometry
//!
//! Simple-feature geometries as consumed by the topogeo conversion core.
//!
//! The crate covers exactly what topology registration needs from a
//! geometry library:
//!
//! - **Model**: points, linestrings, polygons, their multi variants,
//!   heterogeneous collections, plus the curve/surface classes that a
//!   planar topology cannot hold (circular strings, triangles).
//! - **Introspection**: shape class, dimension, emptiness and extent.
//! - **Dump**: a lazy, depth-first explosion of any geometry into its
//!   single-part components, with 1-based paths.
//! - **WKT**: a [nom](https://docs.rs/nom) based reader and a `Display`
//!   based writer.
//!
//! ## Quick Start
//!
//! ```
//! use topogeo_geometry::{Geometry, ShapeClass};
//!
//! let geom: Geometry = "MULTIPOINT((0 0),(1 1),EMPTY)".parse().unwrap();
//! assert_eq!(geom.shape_class(), ShapeClass::MultiPoint);
//!
//! let parts: Vec<_> = geom.dump().filter(|item| !item.part.is_empty()).collect();
//! assert_eq!(parts.len(), 2);
//! ```

pub mod dump;
pub mod error;
pub mod types;
pub mod wkt;

pub use dump::{Dump, DumpItem, DumpPath, Part};
pub use error::{Error, Result};
pub use types::{Coord, Extent, Geometry, LineString, Point, Polygon, ShapeClass};
pub use wkt::parse_wkt;
