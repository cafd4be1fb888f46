// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Primitive decomposition and dispatch to the editing engine.

use smallvec::SmallVec;
use topogeo_geometry::{Dump, DumpItem, Geometry, LineString, Part, Point, Polygon};
use tracing::debug;

use crate::error::{BackendError, Error, Result};

/// Element ids a single part resolved to. Usually exactly one.
pub type ElementIds = SmallVec<[crate::model::ElementId; 4]>;

/// Mutating access to the planar mesh of a topology.
///
/// Each call snaps the part to existing elements within `tolerance`,
/// creates or splits whatever is needed, and returns the elements that now
/// represent the part.
pub trait TopologyEditor {
    /// Returns the node at (or snapped to) `point`.
    fn add_point(
        &mut self,
        topology: &str,
        point: &Point,
        tolerance: f64,
    ) -> std::result::Result<crate::model::ElementId, BackendError>;

    /// Returns the edges covering `line`, in order along it.
    fn add_line(
        &mut self,
        topology: &str,
        line: &LineString,
        tolerance: f64,
    ) -> std::result::Result<ElementIds, BackendError>;

    /// Returns the faces covering `polygon`.
    fn add_polygon(
        &mut self,
        topology: &str,
        polygon: &Polygon,
        tolerance: f64,
    ) -> std::result::Result<ElementIds, BackendError>;
}

/// Lazy sequence of the non-empty single-part components of a geometry, in
/// document order.
pub struct Decompose<'a> {
    dump: Dump<'a>,
}

impl<'a> Decompose<'a> {
    pub fn new(geometry: &'a Geometry) -> Self {
        Self {
            dump: geometry.dump(),
        }
    }
}

impl<'a> Iterator for Decompose<'a> {
    type Item = DumpItem<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.dump.by_ref().find(|item| !item.part.is_empty())
    }
}

/// Shorthand for [`Decompose::new`].
pub fn decompose(geometry: &Geometry) -> Decompose<'_> {
    Decompose::new(geometry)
}

/// Formats a dump path as `{1,2}`, or `{}` for a single-part input.
pub(crate) fn format_path(item: &DumpItem<'_>) -> String {
    let inner: Vec<String> = item.path.iter().map(|i| i.to_string()).collect();
    format!("{{{}}}", inner.join(","))
}

/// Sends one part to the engine call matching its dimension.
///
/// Curved and triangular parts are refused; callers reject them during
/// classification so this only guards direct use.
pub fn register_primitive<E: TopologyEditor + ?Sized>(
    editor: &mut E,
    topology: &str,
    item: &DumpItem<'_>,
    tolerance: f64,
) -> Result<ElementIds> {
    let result = match item.part {
        Part::Point(point) => editor
            .add_point(topology, point, tolerance)
            .map(|id| ElementIds::from_elem(id, 1)),
        Part::LineString(line) => editor.add_line(topology, line, tolerance),
        Part::Polygon(polygon) => editor.add_polygon(topology, polygon, tolerance),
        Part::CircularString(_) | Part::Triangle(_) => {
            return Err(Error::UnsupportedShape(
                item.part.shape_class().as_str().to_string(),
            ));
        }
    };

    let ids = result.map_err(|source| Error::Editor {
        topology: topology.to_string(),
        dimension: item.part.dimension(),
        path: format_path(item),
        source,
    })?;

    debug!(
        topology,
        dimension = item.part.dimension(),
        path = %format_path(item),
        elements = ids.len(),
        "Registered primitive"
    );
    Ok(ids)
}
