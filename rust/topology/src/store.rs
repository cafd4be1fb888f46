// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory topology store.
//!
//! [`TopologyStore`] holds any number of named topologies, each with its
//! planar mesh, its layers and its relation table, and implements every
//! collaborator trait of `topogeo-core`, so it can be handed directly to
//! [`create_from_geometry`] and [`extend_topo_geometry`].
//!
//! Mutations take `&mut self`. [`TopologyStore::transaction`] restores the
//! previous state when its closure fails.

use std::collections::BTreeMap;

use topogeo_core::{
    create_from_geometry, extend_topo_geometry, topology_min_tolerance, BackendError,
    ElementId, ElementIds, ElementType, FeatureClass, LayerCatalog, LayerId, LayerInfo,
    RelationRow, RelationStore, TopoGeomId, TopoGeomType, TopoGeometry, TopoGeometryFactory,
    TopologyCatalog, TopologyEditor, TopologyId, TopologyInfo, ToleranceEstimator,
};
use topogeo_geometry::{Geometry, LineString, Point, Polygon};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::editing::PlanarMesh;
use crate::error::{Error, Result};
use crate::keys::PrimitiveKey;
use crate::relation::RelationTable;

const DEFAULT_SCHEMA: &str = "public";

/// One topology: its mesh, layers and associations.
#[derive(Debug, Clone)]
pub struct Topology {
    pub(crate) info: TopologyInfo,
    pub(crate) mesh: PlanarMesh,
    pub(crate) layers: BTreeMap<LayerId, LayerInfo>,
    pub(crate) relations: RelationTable,
    pub(crate) topogeo_seqs: BTreeMap<LayerId, u64>,
}

impl Topology {
    pub(crate) fn new(info: TopologyInfo, cell_size: f64) -> Self {
        Self {
            info,
            mesh: PlanarMesh::new(cell_size),
            layers: BTreeMap::new(),
            relations: RelationTable::new(),
            topogeo_seqs: BTreeMap::new(),
        }
    }

    pub fn info(&self) -> &TopologyInfo {
        &self.info
    }

    pub fn mesh(&self) -> &PlanarMesh {
        &self.mesh
    }

    pub fn layers(&self) -> impl Iterator<Item = &LayerInfo> {
        self.layers.values()
    }

    pub fn layer(&self, layer_id: LayerId) -> Option<&LayerInfo> {
        self.layers.get(&layer_id)
    }

    pub fn relations(&self) -> &RelationTable {
        &self.relations
    }

    /// Elements a TopoGeometry is made of, sorted by type and id.
    pub fn elements_of(&self, topo_geometry: &TopoGeometry) -> Vec<(ElementType, ElementId)> {
        let mut elements: Vec<(ElementType, ElementId)> = self
            .relations
            .rows_for(topo_geometry.layer_id, topo_geometry.id)
            .map(|r| (r.element_type, r.element_id))
            .collect();
        elements.sort_unstable();
        elements
    }

    fn next_layer_id(&self) -> LayerId {
        LayerId(self.layers.keys().next_back().map_or(1, |id| id.0 + 1))
    }

    /// Moves the engine's edge splits into the relation table.
    fn absorb_splits(&mut self) {
        for split in self.mesh.take_splits() {
            let added = self
                .relations
                .propagate_edge_split(split.original, split.new_edge);
            if added > 0 {
                debug!(
                    topology = %self.info.name,
                    edge = %split.original,
                    new_edge = %split.new_edge,
                    added,
                    "Propagated edge split to TopoGeometries"
                );
            }
        }
    }

    fn element_ids<K: Into<PrimitiveKey>>(&self, keys: Vec<K>) -> ElementIds {
        keys.into_iter()
            .filter_map(|k| self.mesh.arena().element_id(k.into()))
            .collect()
    }
}

/// In-memory store of named topologies.
#[derive(Debug, Clone)]
pub struct TopologyStore {
    config: StoreConfig,
    pub(crate) topologies: BTreeMap<String, Topology>,
    pub(crate) last_topology_id: u32,
}

impl Default for TopologyStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl TopologyStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            topologies: BTreeMap::new(),
            last_topology_id: 0,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ===== Catalog management =====

    /// Creates a topology with the configured default SRID and precision.
    pub fn create_topology(&mut self, name: &str) -> Result<TopologyId> {
        self.create_topology_with(name, self.config.default_srid, self.config.default_precision)
    }

    pub fn create_topology_with(
        &mut self,
        name: &str,
        srid: i32,
        precision: f64,
    ) -> Result<TopologyId> {
        if self.topologies.contains_key(name) {
            return Err(Error::DuplicateTopology(name.to_string()));
        }
        if precision.is_nan() || precision < 0.0 {
            return Err(Error::InvalidTolerance(precision));
        }

        self.last_topology_id += 1;
        let id = TopologyId(self.last_topology_id);
        let info = TopologyInfo {
            id,
            name: name.to_string(),
            srid,
            precision,
            has_z: false,
        };
        self.topologies
            .insert(name.to_string(), Topology::new(info, self.config.index_cell_size));
        info!(topology = name, id = %id, srid, precision, "Created topology");
        Ok(id)
    }

    /// Registers a layer built directly from primitives.
    ///
    /// `table` may be schema-qualified (`schema.table`).
    pub fn add_layer(
        &mut self,
        topology: &str,
        table: &str,
        column: &str,
        class: FeatureClass,
    ) -> Result<LayerId> {
        self.insert_layer(topology, table, column, class.code(), None)
    }

    /// Registers a layer whose TopoGeometries are built from those of
    /// `child`.
    pub fn add_hierarchical_layer(
        &mut self,
        topology: &str,
        table: &str,
        column: &str,
        class: FeatureClass,
        child: LayerId,
    ) -> Result<LayerId> {
        self.insert_layer(topology, table, column, class.code(), Some(child))
    }

    fn insert_layer(
        &mut self,
        topology: &str,
        table: &str,
        column: &str,
        feature_type: i32,
        child: Option<LayerId>,
    ) -> Result<LayerId> {
        let topo = self.topology_entry(topology)?;
        let level = match child {
            Some(child_id) => {
                let child_layer = topo.layers.get(&child_id).ok_or_else(|| Error::UnknownLayer {
                    layer_id: child_id,
                    topology: topology.to_string(),
                })?;
                child_layer.level + 1
            }
            None => 0,
        };
        let (schema_name, table_name) = table.split_once('.').unwrap_or((DEFAULT_SCHEMA, table));

        let layer_id = topo.next_layer_id();
        topo.layers.insert(
            layer_id,
            LayerInfo {
                topology_id: topo.info.id,
                layer_id,
                feature_type,
                level,
                child_id: child,
                schema_name: schema_name.to_string(),
                table_name: table_name.to_string(),
                feature_column: column.to_string(),
            },
        );
        debug!(topology, layer_id = %layer_id, feature_type, level, "Added layer");
        Ok(layer_id)
    }

    // ===== Access =====

    pub fn topology(&self, name: &str) -> Option<&Topology> {
        self.topologies.get(name)
    }

    pub fn topologies(&self) -> impl Iterator<Item = &Topology> {
        self.topologies.values()
    }

    fn topology_entry(&mut self, name: &str) -> Result<&mut Topology> {
        self.topologies
            .get_mut(name)
            .ok_or_else(|| Error::UnknownTopology(name.to_string()))
    }

    fn topology_with_id(&self, id: TopologyId) -> Option<&Topology> {
        self.topologies.values().find(|t| t.info.id == id)
    }

    // ===== Transactions =====

    /// Runs `f` against the store, restoring the previous state if it
    /// returns an error.
    pub fn transaction<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Self) -> std::result::Result<T, E>,
        E: std::fmt::Display,
    {
        let saved_topologies = self.topologies.clone();
        let saved_last_id = self.last_topology_id;
        match f(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(error = %err, "Rolling back topology store");
                self.topologies = saved_topologies;
                self.last_topology_id = saved_last_id;
                Err(err)
            }
        }
    }

    /// Converts `geometry` into a new TopoGeometry, all or nothing.
    pub fn to_topo_geom(
        &mut self,
        geometry: &Geometry,
        topology: &str,
        layer_id: LayerId,
        tolerance: f64,
    ) -> topogeo_core::Result<TopoGeometry> {
        self.transaction(|store| create_from_geometry(store, geometry, topology, layer_id, tolerance))
    }

    /// Adds `geometry` to an existing TopoGeometry, all or nothing.
    pub fn add_to_topo_geom(
        &mut self,
        geometry: &Geometry,
        topo_geometry: TopoGeometry,
        tolerance: f64,
    ) -> topogeo_core::Result<TopoGeometry> {
        self.transaction(|store| extend_topo_geometry(store, geometry, topo_geometry, tolerance))
    }
}

// ===== Collaborator traits =====

impl TopologyCatalog for TopologyStore {
    fn topology_by_name(
        &self,
        name: &str,
    ) -> std::result::Result<Option<TopologyInfo>, BackendError> {
        Ok(self.topologies.get(name).map(|t| t.info.clone()))
    }

    fn topology_by_id(
        &self,
        id: TopologyId,
    ) -> std::result::Result<Option<TopologyInfo>, BackendError> {
        Ok(self.topology_with_id(id).map(|t| t.info.clone()))
    }
}

impl LayerCatalog for TopologyStore {
    fn layer(
        &self,
        topology_id: TopologyId,
        layer_id: LayerId,
    ) -> std::result::Result<Option<LayerInfo>, BackendError> {
        Ok(self
            .topology_with_id(topology_id)
            .and_then(|t| t.layers.get(&layer_id))
            .cloned())
    }
}

impl ToleranceEstimator for TopologyStore {
    fn min_tolerance(
        &self,
        topology: &TopologyInfo,
        geometry: &Geometry,
    ) -> std::result::Result<f64, BackendError> {
        Ok(topology_min_tolerance(topology, geometry))
    }
}

impl TopologyEditor for TopologyStore {
    fn add_point(
        &mut self,
        topology: &str,
        point: &Point,
        tolerance: f64,
    ) -> std::result::Result<ElementId, BackendError> {
        let topo = self.topology_entry(topology)?;
        let coord = point.coord().ok_or(Error::EmptyPrimitive("point"))?;
        let node = topo.mesh.add_point(coord, tolerance)?;
        topo.absorb_splits();
        let id = topo
            .mesh
            .arena()
            .element_id(node.into())
            .ok_or(Error::NotFound(node.into()))?;
        Ok(id)
    }

    fn add_line(
        &mut self,
        topology: &str,
        line: &LineString,
        tolerance: f64,
    ) -> std::result::Result<ElementIds, BackendError> {
        let topo = self.topology_entry(topology)?;
        let edges = topo.mesh.add_line(&line.coords, tolerance)?;
        topo.absorb_splits();
        Ok(topo.element_ids(edges))
    }

    fn add_polygon(
        &mut self,
        topology: &str,
        polygon: &Polygon,
        tolerance: f64,
    ) -> std::result::Result<ElementIds, BackendError> {
        let topo = self.topology_entry(topology)?;
        let faces = topo.mesh.add_polygon(polygon, tolerance)?;
        topo.absorb_splits();
        Ok(topo.element_ids(faces))
    }
}

impl TopoGeometryFactory for TopologyStore {
    fn create_topo_geometry(
        &mut self,
        topology: &str,
        kind: TopoGeomType,
        layer_id: LayerId,
    ) -> std::result::Result<TopoGeometry, BackendError> {
        let topo = self.topology_entry(topology)?;
        let layer = topo.layers.get(&layer_id).ok_or_else(|| Error::UnknownLayer {
            layer_id,
            topology: topology.to_string(),
        })?;
        if !layer.feature_class().map_or(false, |c| c.accepts(kind)) {
            return Err(Error::LayerTypeMismatch {
                layer_id,
                topology: topology.to_string(),
                kind,
            }
            .into());
        }

        let seq = topo.topogeo_seqs.entry(layer_id).or_insert(0);
        *seq += 1;
        Ok(TopoGeometry {
            topology_id: topo.info.id,
            layer_id,
            id: TopoGeomId(*seq),
            kind,
        })
    }
}

impl RelationStore for TopologyStore {
    fn insert_relation(
        &mut self,
        topology: &str,
        row: RelationRow,
    ) -> std::result::Result<bool, BackendError> {
        let topo = self.topology_entry(topology)?;
        Ok(topo.relations.insert(row))
    }
}
