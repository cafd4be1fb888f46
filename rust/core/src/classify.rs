// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Feature type classification and layer compatibility.
//!
//! | shape class                  | TopoGeometry type |
//! |------------------------------|-------------------|
//! | GEOMETRYCOLLECTION           | 4 (collection)    |
//! | POINT, MULTIPOINT            | 1 (puntal)        |
//! | LINESTRING, MULTILINESTRING  | 2 (lineal)        |
//! | POLYGON, MULTIPOLYGON        | 3 (areal)         |
//!
//! Everything else is unsupported.

use topogeo_geometry::{Geometry, ShapeClass};

use crate::error::{Error, Result};
use crate::model::{LayerInfo, TopoGeomType, TopologyInfo};

/// Maps a shape class to the TopoGeometry type that can represent it.
pub fn classify(shape: ShapeClass) -> Result<TopoGeomType> {
    match shape {
        ShapeClass::GeometryCollection => Ok(TopoGeomType::Collection),
        ShapeClass::Point | ShapeClass::MultiPoint => Ok(TopoGeomType::Puntal),
        ShapeClass::LineString | ShapeClass::MultiLineString => Ok(TopoGeomType::Lineal),
        ShapeClass::Polygon | ShapeClass::MultiPolygon => Ok(TopoGeomType::Areal),
        ShapeClass::CircularString | ShapeClass::Triangle => {
            Err(Error::UnsupportedShape(shape.as_str().to_string()))
        }
    }
}

/// Checks that `layer` can hold a TopoGeometry of type `kind`.
///
/// A layer whose feature class code is not recognised accepts nothing.
pub fn check_compatible(
    layer: &LayerInfo,
    topology: &TopologyInfo,
    kind: TopoGeomType,
) -> Result<()> {
    match layer.feature_class() {
        Some(class) if class.accepts(kind) => Ok(()),
        _ => Err(Error::IncompatibleType {
            layer_id: layer.layer_id,
            topology: topology.name.clone(),
            label: layer.type_label().into_owned(),
            kind,
        }),
    }
}

/// Classifies `geometry` and validates it against `layer`.
///
/// Collections are additionally scanned so that a curved or triangular
/// member is rejected here, before anything is written, instead of halfway
/// through primitive registration.
pub fn classify_for_layer(
    geometry: &Geometry,
    layer: &LayerInfo,
    topology: &TopologyInfo,
) -> Result<TopoGeomType> {
    let kind = classify(geometry.shape_class())?;
    check_compatible(layer, topology, kind)?;

    if kind == TopoGeomType::Collection {
        if let Some(item) = geometry.dump().find(|item| !item.part.is_planar_primitive()) {
            return Err(Error::UnsupportedShape(
                item.part.shape_class().as_str().to_string(),
            ));
        }
    }

    Ok(kind)
}
