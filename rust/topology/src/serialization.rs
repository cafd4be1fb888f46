// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON serialization for topologies.
//!
//! A snapshot refers to primitives by their element ids, the same ids the
//! relation rows use, so a restored topology keeps every TopoGeometry
//! intact. Coordinates are written as `[x, y]` pairs.

use serde::{Deserialize, Serialize};
use topogeo_core::{ElementId, LayerId, LayerInfo, RelationRow, TopologyId, TopologyInfo};
use topogeo_geometry::Coord;
use tracing::info;

use crate::arena::PlanarArena;
use crate::editing::PlanarMesh;
use crate::error::{Error, Result};
use crate::keys::EdgeKey;
use crate::relation::RelationTable;
use crate::store::{Topology, TopologyStore};

/// Serializable representation of one topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub name: String,
    pub srid: i32,
    pub precision: f64,
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
    pub faces: Vec<FaceSnapshot>,
    pub layers: Vec<LayerInfo>,
    /// Last TopoGeometry id handed out per layer.
    #[serde(default)]
    pub sequences: Vec<LayerSequence>,
    pub relations: Vec<RelationRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: ElementId,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containing_face: Option<ElementId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub id: ElementId,
    pub start_node: ElementId,
    pub end_node: ElementId,
    pub coords: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceSnapshot {
    pub id: ElementId,
    pub exterior: Vec<ElementId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interiors: Vec<Vec<ElementId>>,
    pub exterior_ring: Vec<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interior_rings: Vec<Vec<[f64; 2]>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerSequence {
    pub layer_id: LayerId,
    pub last: u64,
}

fn pair(c: &Coord) -> [f64; 2] {
    [c.x, c.y]
}

fn pairs(coords: &[Coord]) -> Vec<[f64; 2]> {
    coords.iter().map(pair).collect()
}

fn coords(pairs: &[[f64; 2]]) -> Vec<Coord> {
    pairs.iter().map(|[x, y]| Coord::new(*x, *y)).collect()
}

impl TopologySnapshot {
    /// Serializes the snapshot to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserializes a snapshot from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }
}

impl Topology {
    /// Creates a serializable snapshot of the topology.
    pub fn to_snapshot(&self) -> TopologySnapshot {
        let arena = self.mesh.arena();
        let face_id = |k| arena.face(k).map(|f| f.id);
        let edge_ids = |ring: &[EdgeKey]| -> Vec<ElementId> {
            ring.iter().filter_map(|&k| arena.edge(k).map(|e| e.id)).collect()
        };

        let nodes = arena
            .nodes()
            .map(|(_, n)| NodeSnapshot {
                id: n.id,
                x: n.coord.x,
                y: n.coord.y,
                containing_face: n.containing_face.and_then(face_id),
            })
            .collect();

        let edges = arena
            .edges()
            .filter_map(|(_, e)| {
                Some(EdgeSnapshot {
                    id: e.id,
                    start_node: arena.node(e.start)?.id,
                    end_node: arena.node(e.end)?.id,
                    coords: pairs(&e.coords),
                })
            })
            .collect();

        let faces = arena
            .faces()
            .map(|(_, f)| FaceSnapshot {
                id: f.id,
                exterior: edge_ids(&f.exterior),
                interiors: f.interiors.iter().map(|r| edge_ids(r)).collect(),
                exterior_ring: pairs(&f.exterior_ring),
                interior_rings: f.interior_rings.iter().map(|r| pairs(r)).collect(),
            })
            .collect();

        TopologySnapshot {
            name: self.info.name.clone(),
            srid: self.info.srid,
            precision: self.info.precision,
            nodes,
            edges,
            faces,
            layers: self.layers.values().cloned().collect(),
            sequences: self
                .topogeo_seqs
                .iter()
                .map(|(&layer_id, &last)| LayerSequence { layer_id, last })
                .collect(),
            relations: self.relations.rows().copied().collect(),
        }
    }

    /// Serializes the topology to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        self.to_snapshot().to_json()
    }

    /// Reconstructs a topology from a snapshot, under a new topology id.
    pub(crate) fn from_snapshot(
        snap: &TopologySnapshot,
        id: TopologyId,
        cell_size: f64,
    ) -> Result<Self> {
        let arena = rebuild_arena(snap)?;

        let info = TopologyInfo {
            id,
            name: snap.name.clone(),
            srid: snap.srid,
            precision: snap.precision,
            has_z: false,
        };
        let mut topology = Topology::new(info, cell_size);
        topology.mesh = PlanarMesh::from_arena(arena, cell_size);
        for layer in &snap.layers {
            let layer = LayerInfo {
                topology_id: id,
                ..layer.clone()
            };
            topology.layers.insert(layer.layer_id, layer);
        }
        for seq in &snap.sequences {
            topology.topogeo_seqs.insert(seq.layer_id, seq.last);
        }
        let mut relations = RelationTable::new();
        for row in &snap.relations {
            relations.insert(*row);
        }
        topology.relations = relations;
        Ok(topology)
    }
}

fn unexpected_id(kind: &str, found: ElementId, expected: ElementId) -> Error {
    Error::Serialization(format!(
        "{} ids must be contiguous from 1: expected {}, found {}",
        kind, expected, found
    ))
}

fn missing(kind: &str, id: ElementId) -> Error {
    Error::Serialization(format!("reference to unknown {} {}", kind, id))
}

/// Re-inserts primitives in id order, so the arena hands out the same ids.
fn rebuild_arena(snap: &TopologySnapshot) -> Result<PlanarArena> {
    let mut arena = PlanarArena::new();

    for ns in &snap.nodes {
        let key = arena.add_node(Coord::new(ns.x, ns.y), None);
        let id = arena.nodes[key].id;
        if id != ns.id {
            return Err(unexpected_id("node", ns.id, id));
        }
    }

    for es in &snap.edges {
        let start = arena
            .node_by_id(es.start_node)
            .ok_or_else(|| missing("node", es.start_node))?;
        let end = arena
            .node_by_id(es.end_node)
            .ok_or_else(|| missing("node", es.end_node))?;
        let key = arena.add_edge(start, end, coords(&es.coords))?;
        let id = arena.edges[key].id;
        if id != es.id {
            return Err(unexpected_id("edge", es.id, id));
        }
    }

    let edge_keys = |arena: &PlanarArena, ids: &[ElementId]| -> Result<Vec<EdgeKey>> {
        ids.iter()
            .map(|&id| arena.edge_by_id(id).ok_or_else(|| missing("edge", id)))
            .collect()
    };
    for fs in &snap.faces {
        let exterior = edge_keys(&arena, &fs.exterior)?;
        let interiors = fs
            .interiors
            .iter()
            .map(|ring| edge_keys(&arena, ring))
            .collect::<Result<Vec<_>>>()?;
        let key = arena.add_face(
            exterior,
            interiors,
            coords(&fs.exterior_ring),
            fs.interior_rings.iter().map(|r| coords(r)).collect(),
        )?;
        let id = arena.faces[key].id;
        if id != fs.id {
            return Err(unexpected_id("face", fs.id, id));
        }
    }

    for ns in &snap.nodes {
        if let Some(face_id) = ns.containing_face {
            let face = arena
                .face_by_id(face_id)
                .ok_or_else(|| missing("face", face_id))?;
            if let Some(node) = arena.node_by_id(ns.id).and_then(|k| arena.nodes.get_mut(k)) {
                node.containing_face = Some(face);
            }
        }
    }

    Ok(arena)
}

impl TopologyStore {
    /// Snapshot of the named topology.
    pub fn snapshot(&self, name: &str) -> Result<TopologySnapshot> {
        self.topology(name)
            .map(Topology::to_snapshot)
            .ok_or_else(|| Error::UnknownTopology(name.to_string()))
    }

    /// Adds a topology rebuilt from `snapshot`, under a fresh topology id.
    pub fn restore(&mut self, snapshot: &TopologySnapshot) -> Result<TopologyId> {
        if self.topology(&snapshot.name).is_some() {
            return Err(Error::DuplicateTopology(snapshot.name.clone()));
        }
        let id = TopologyId(self.last_topology_id + 1);
        let topology = Topology::from_snapshot(snapshot, id, self.config().index_cell_size)?;
        self.last_topology_id = id.0;
        self.topologies.insert(snapshot.name.clone(), topology);
        info!(
            topology = %snapshot.name,
            id = %id,
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            faces = snapshot.faces.len(),
            "Restored topology"
        );
        Ok(id)
    }

    /// Restores a topology from JSON produced by [`Topology::to_json`].
    pub fn restore_json(&mut self, json: &str) -> Result<TopologyId> {
        let snapshot = TopologySnapshot::from_json(json)?;
        self.restore(&snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topogeo_core::FeatureClass;
    use topogeo_geometry::parse_wkt;

    fn populated_store() -> TopologyStore {
        let mut store = TopologyStore::default();
        store.create_topology("city").unwrap();
        let areal = store
            .add_layer("city", "parcels", "topo", FeatureClass::Areal)
            .unwrap();
        let puntal = store
            .add_layer("city", "trees", "topo", FeatureClass::Puntal)
            .unwrap();
        let polygon =
            parse_wkt("POLYGON((0 0,10 0,10 10,0 10,0 0),(2 2,4 2,4 4,2 4,2 2))").unwrap();
        store.to_topo_geom(&polygon, "city", areal, 0.01).unwrap();
        let point = parse_wkt("POINT(7 7)").unwrap();
        store.to_topo_geom(&point, "city", puntal, 0.01).unwrap();
        store
    }

    #[test]
    fn snapshot_uses_element_ids() {
        let store = populated_store();
        let snap = store.snapshot("city").unwrap();

        assert_eq!(snap.nodes.len(), 3);
        assert_eq!(snap.edges.len(), 2);
        assert_eq!(snap.faces.len(), 1);
        assert_eq!(snap.faces[0].exterior, vec![ElementId(1)]);
        assert_eq!(snap.faces[0].interiors, vec![vec![ElementId(2)]]);
        // The tree stands inside the parcel
        assert_eq!(snap.nodes[2].containing_face, Some(ElementId(1)));
        assert_eq!(snap.relations.len(), 2);
        assert_eq!(snap.edges[0].coords[1], [10.0, 0.0]);
    }

    #[test]
    fn roundtrip_through_json() {
        let store = populated_store();
        let json = store.topology("city").unwrap().to_json().unwrap();

        let mut other = TopologyStore::default();
        other.create_topology("scratch").unwrap();
        let id = other.restore_json(&json).unwrap();
        assert_eq!(id, TopologyId(2));

        let restored = other.topology("city").unwrap();
        assert_eq!(restored.info().id, TopologyId(2));
        assert!(restored.layers().all(|l| l.topology_id == TopologyId(2)));
        assert_eq!(restored.mesh().arena().node_count(), 3);
        assert_eq!(restored.mesh().arena().face_count(), 1);

        let again = restored.to_snapshot();
        let mut original = store.snapshot("city").unwrap();
        for layer in &mut original.layers {
            layer.topology_id = TopologyId(2);
        }
        assert_eq!(again, original);
    }

    #[test]
    fn restored_topology_keeps_numbering() {
        let store = populated_store();
        let snap = store.snapshot("city").unwrap();

        let mut other = TopologyStore::default();
        other.restore(&snap).unwrap();
        let layer = LayerId(2);
        let point = parse_wkt("POINT(8 8)").unwrap();
        let tg = other.to_topo_geom(&point, "city", layer, 0.01).unwrap();

        assert_eq!(tg.id.0, 2);
        let elements = other.topology("city").unwrap().elements_of(&tg);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].1, ElementId(4));
    }

    #[test]
    fn restore_rejects_duplicates_and_dangling_references() {
        let store = populated_store();
        let mut snap = store.snapshot("city").unwrap();

        let mut other = populated_store();
        assert!(matches!(
            other.restore(&snap),
            Err(Error::DuplicateTopology(_))
        ));

        snap.edges[0].start_node = ElementId(42);
        let mut fresh = TopologyStore::default();
        assert!(matches!(fresh.restore(&snap), Err(Error::Serialization(_))));
        assert!(fresh.topology("city").is_none());
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let mut store = TopologyStore::default();
        assert!(matches!(
            store.restore_json("{\"name\": 3}"),
            Err(Error::Serialization(_))
        ));
    }
}
