// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry to TopoGeometry conversion.
//!
//! Both entry points validate everything (topology, layer, hierarchy,
//! shape class, layer compatibility) before the first mutation. Once
//! registration starts, each part's engine call is followed by its
//! relation inserts before the next part is touched, so a split performed
//! by a later part can see the rows written for earlier ones.
//!
//! A failure during registration returns immediately. Rows already written
//! stay in the store; the caller's transaction is expected to discard them.

use topogeo_geometry::Geometry;
use tracing::{debug, info};

use crate::catalog::{
    find_base_layer, find_topology_by_id, find_topology_by_name, LayerCatalog, TopologyCatalog,
};
use crate::classify::classify_for_layer;
use crate::decompose::{decompose, register_primitive, TopologyEditor};
use crate::error::{BackendError, ConversionTarget, Error, Result};
use crate::model::{ElementType, LayerId, RelationRow, TopoGeomType, TopoGeometry};
use crate::relation::{record, RelationStore};
use crate::tolerance::{resolve_tolerance, ToleranceEstimator};

/// Allocates new, empty TopoGeometries.
pub trait TopoGeometryFactory {
    /// Returns a TopoGeometry with a fresh id in `layer_id` and no relation
    /// rows.
    fn create_topo_geometry(
        &mut self,
        topology: &str,
        kind: TopoGeomType,
        layer_id: LayerId,
    ) -> std::result::Result<TopoGeometry, BackendError>;
}

/// Everything a conversion needs from its environment.
pub trait TopologySession:
    TopologyCatalog
    + LayerCatalog
    + ToleranceEstimator
    + TopologyEditor
    + TopoGeometryFactory
    + RelationStore
{
}

impl<T> TopologySession for T where
    T: TopologyCatalog
        + LayerCatalog
        + ToleranceEstimator
        + TopologyEditor
        + TopoGeometryFactory
        + RelationStore
        + ?Sized
{
}

/// Runs conversions against a borrowed session.
pub struct Converter<'s, S: TopologySession + ?Sized> {
    session: &'s mut S,
}

impl<'s, S: TopologySession + ?Sized> Converter<'s, S> {
    pub fn new(session: &'s mut S) -> Self {
        Self { session }
    }

    /// Creates a TopoGeometry in `layer_id` of `topology_name` and populates
    /// it with the primitives of `geometry`.
    ///
    /// A `tolerance` of 0 asks the session for a default.
    pub fn create_from_geometry(
        &mut self,
        geometry: &Geometry,
        topology_name: &str,
        layer_id: LayerId,
        tolerance: f64,
    ) -> Result<TopoGeometry> {
        let topology = find_topology_by_name(&*self.session, topology_name)?;
        let layer = find_base_layer(
            &*self.session,
            &topology,
            layer_id,
            ConversionTarget::NewTopoGeometry,
        )?;
        let kind = classify_for_layer(geometry, &layer, &topology)?;

        let topo_geometry = self
            .session
            .create_topo_geometry(&topology.name, kind, layer_id)
            .map_err(Error::backend("TopoGeometry creation"))?;
        debug!(
            topology = %topology.name,
            layer_id = %layer_id,
            topogeo_id = %topo_geometry.id,
            kind = kind.code(),
            "Created TopoGeometry"
        );

        self.extend_topo_geometry(geometry, topo_geometry, tolerance)
    }

    /// Adds the primitives of `geometry` to an existing TopoGeometry.
    ///
    /// The returned value carries the type code of `geometry`, replacing
    /// whatever `topo_geometry` had.
    pub fn extend_topo_geometry(
        &mut self,
        geometry: &Geometry,
        mut topo_geometry: TopoGeometry,
        tolerance: f64,
    ) -> Result<TopoGeometry> {
        let topology = find_topology_by_id(&*self.session, topo_geometry.topology_id)?;
        let layer = find_base_layer(
            &*self.session,
            &topology,
            topo_geometry.layer_id,
            ConversionTarget::ExistingTopoGeometry,
        )?;
        let tolerance = resolve_tolerance(tolerance, &*self.session, &topology, geometry)?;

        topo_geometry.kind = classify_for_layer(geometry, &layer, &topology)?;

        let mut parts = 0usize;
        let mut inserted = 0usize;
        for item in decompose(geometry) {
            let ids = register_primitive(&mut *self.session, &topology.name, &item, tolerance)?;
            let element_type = ElementType::from_dimension(item.part.dimension())
                .ok_or_else(|| Error::UnsupportedShape(item.part.shape_class().to_string()))?;

            for element_id in ids {
                let row = RelationRow {
                    topogeo_id: topo_geometry.id,
                    layer_id: topo_geometry.layer_id,
                    element_type,
                    element_id,
                };
                if record(&mut *self.session, &topology.name, row)? {
                    inserted += 1;
                }
            }
            parts += 1;
        }

        info!(
            topology = %topology.name,
            layer_id = %topo_geometry.layer_id,
            topogeo_id = %topo_geometry.id,
            parts,
            inserted,
            "Converted geometry"
        );
        Ok(topo_geometry)
    }
}

/// Creates a TopoGeometry from `geometry`. See
/// [`Converter::create_from_geometry`].
pub fn create_from_geometry<S: TopologySession + ?Sized>(
    session: &mut S,
    geometry: &Geometry,
    topology_name: &str,
    layer_id: LayerId,
    tolerance: f64,
) -> Result<TopoGeometry> {
    Converter::new(session).create_from_geometry(geometry, topology_name, layer_id, tolerance)
}

/// Adds `geometry` to `topo_geometry`. See
/// [`Converter::extend_topo_geometry`].
pub fn extend_topo_geometry<S: TopologySession + ?Sized>(
    session: &mut S,
    geometry: &Geometry,
    topo_geometry: TopoGeometry,
    tolerance: f64,
) -> Result<TopoGeometry> {
    Converter::new(session).extend_topo_geometry(geometry, topo_geometry, tolerance)
}
