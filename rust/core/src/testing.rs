// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory session used by the unit tests of this crate.

use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};

use topogeo_geometry::{Geometry, LineString, Point, Polygon};

use crate::catalog::{LayerCatalog, TopologyCatalog};
use crate::convert::TopoGeometryFactory;
use crate::decompose::{ElementIds, TopologyEditor};
use crate::error::BackendError;
use crate::model::{
    ElementId, LayerId, LayerInfo, RelationRow, TopoGeomId, TopoGeomType, TopoGeometry,
    TopologyId, TopologyInfo,
};
use crate::relation::RelationStore;
use crate::tolerance::ToleranceEstimator;

/// One topology ("city", id 1) with one layer (id 1).
///
/// The engine hands out one id per distinct part, so converting the same
/// geometry twice resolves to the same elements.
pub(crate) struct FakeSession {
    pub topology: TopologyInfo,
    pub layer: LayerInfo,
    pub fail_catalog: bool,
    pub estimate: f64,
    pub estimator_calls: Cell<usize>,
    /// Engine call index (0-based) that fails.
    pub fail_engine_at: Option<usize>,
    /// Successful engine calls as (dimension, topology name).
    pub engine_calls: Vec<(u8, String)>,
    /// Tolerance passed to each successful engine call.
    pub tolerances: Vec<f64>,
    pub created: Vec<TopoGeometry>,
    pub rows: BTreeSet<RelationRow>,
    attempts: usize,
    elements: HashMap<String, ElementId>,
    next_topogeo: u64,
}

impl FakeSession {
    pub fn with_layer(feature_type: i32) -> Self {
        Self {
            topology: TopologyInfo {
                id: TopologyId(1),
                name: "city".to_string(),
                srid: 0,
                precision: 0.0,
                has_z: false,
            },
            layer: LayerInfo {
                topology_id: TopologyId(1),
                layer_id: LayerId(1),
                feature_type,
                level: 0,
                child_id: None,
                schema_name: "public".to_string(),
                table_name: "features".to_string(),
                feature_column: "topo".to_string(),
            },
            fail_catalog: false,
            estimate: 0.001,
            estimator_calls: Cell::new(0),
            fail_engine_at: None,
            engine_calls: Vec::new(),
            tolerances: Vec::new(),
            created: Vec::new(),
            rows: BTreeSet::new(),
            attempts: 0,
            elements: HashMap::new(),
            next_topogeo: 0,
        }
    }

    fn element(
        &mut self,
        dimension: u8,
        topology: &str,
        key: String,
        tolerance: f64,
    ) -> Result<ElementId, BackendError> {
        let attempt = self.attempts;
        self.attempts += 1;
        if self.fail_engine_at == Some(attempt) {
            return Err(format!("engine refused call {}", attempt).into());
        }
        self.engine_calls.push((dimension, topology.to_string()));
        self.tolerances.push(tolerance);

        let next = ElementId(self.elements.len() as u64 + 1);
        Ok(*self.elements.entry(key).or_insert(next))
    }
}

impl TopologyCatalog for FakeSession {
    fn topology_by_name(&self, name: &str) -> Result<Option<TopologyInfo>, BackendError> {
        if self.fail_catalog {
            return Err("catalog offline".into());
        }
        Ok((self.topology.name == name).then(|| self.topology.clone()))
    }

    fn topology_by_id(&self, id: TopologyId) -> Result<Option<TopologyInfo>, BackendError> {
        if self.fail_catalog {
            return Err("catalog offline".into());
        }
        Ok((self.topology.id == id).then(|| self.topology.clone()))
    }
}

impl LayerCatalog for FakeSession {
    fn layer(
        &self,
        topology_id: TopologyId,
        layer_id: LayerId,
    ) -> Result<Option<LayerInfo>, BackendError> {
        if self.fail_catalog {
            return Err("catalog offline".into());
        }
        let found = self.layer.topology_id == topology_id && self.layer.layer_id == layer_id;
        Ok(found.then(|| self.layer.clone()))
    }
}

impl ToleranceEstimator for FakeSession {
    fn min_tolerance(
        &self,
        _topology: &TopologyInfo,
        _geometry: &Geometry,
    ) -> Result<f64, BackendError> {
        self.estimator_calls.set(self.estimator_calls.get() + 1);
        Ok(self.estimate)
    }
}

impl TopologyEditor for FakeSession {
    fn add_point(
        &mut self,
        topology: &str,
        point: &Point,
        tolerance: f64,
    ) -> Result<ElementId, BackendError> {
        self.element(0, topology, format!("node {:?}", point), tolerance)
    }

    fn add_line(
        &mut self,
        topology: &str,
        line: &LineString,
        tolerance: f64,
    ) -> Result<ElementIds, BackendError> {
        let id = self.element(1, topology, format!("edge {:?}", line), tolerance)?;
        Ok(ElementIds::from_elem(id, 1))
    }

    fn add_polygon(
        &mut self,
        topology: &str,
        polygon: &Polygon,
        tolerance: f64,
    ) -> Result<ElementIds, BackendError> {
        let id = self.element(2, topology, format!("face {:?}", polygon), tolerance)?;
        Ok(ElementIds::from_elem(id, 1))
    }
}

impl TopoGeometryFactory for FakeSession {
    fn create_topo_geometry(
        &mut self,
        _topology: &str,
        kind: TopoGeomType,
        layer_id: LayerId,
    ) -> Result<TopoGeometry, BackendError> {
        self.next_topogeo += 1;
        let tg = TopoGeometry {
            topology_id: self.topology.id,
            layer_id,
            id: TopoGeomId(self.next_topogeo),
            kind,
        };
        self.created.push(tg);
        Ok(tg)
    }
}

impl RelationStore for FakeSession {
    fn insert_relation(&mut self, _topology: &str, row: RelationRow) -> Result<bool, BackendError> {
        Ok(self.rows.insert(row))
    }
}
