// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-based storage for planar topology primitives.
//!
//! The [`PlanarArena`] owns every node, edge and face of one topology. They
//! live in slot maps with generational keys; upward adjacency indices answer
//! "which edges end at this node" and "which faces does this edge bound"
//! without scanning.
//!
//! Each primitive also carries a sequential [`ElementId`], which is what
//! relation rows and snapshots refer to.

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;
use topogeo_core::ElementId;
use topogeo_geometry::Coord;

use crate::keys::*;

/// Data stored for a node.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub id: ElementId,
    pub coord: Coord,
    /// Face an isolated node lies in. `None` means the universe face.
    pub containing_face: Option<FaceKey>,
}

/// Data stored for an edge: a polyline from `start` to `end`.
///
/// `coords` includes both end points. A closed edge has `start == end`.
#[derive(Debug, Clone)]
pub struct EdgeData {
    pub id: ElementId,
    pub start: NodeKey,
    pub end: NodeKey,
    pub coords: Vec<Coord>,
}

/// Data stored for a face: its bounding edges and the rings they trace.
#[derive(Debug, Clone)]
pub struct FaceData {
    pub id: ElementId,
    /// Edges of the outer boundary, in no particular order.
    pub exterior: Vec<EdgeKey>,
    /// Edges of each hole.
    pub interiors: Vec<Vec<EdgeKey>>,
    /// Outer ring as registered, used for containment tests.
    pub exterior_ring: Vec<Coord>,
    pub interior_rings: Vec<Vec<Coord>>,
}

impl FaceData {
    /// Iterates over every bounding edge, holes included.
    pub fn boundary(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.exterior
            .iter()
            .chain(self.interiors.iter().flatten())
            .copied()
    }
}

/// A node split out of an existing edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeSplit {
    /// The edge that was shortened. It keeps its id.
    pub original: ElementId,
    /// The edge that now covers the remainder.
    pub new_edge: ElementId,
    pub node: ElementId,
}

/// The arena that owns all primitives of one topology and their adjacency.
#[derive(Debug, Clone, Default)]
pub struct PlanarArena {
    // Entity storage
    pub(crate) nodes: SlotMap<NodeKey, NodeData>,
    pub(crate) edges: SlotMap<EdgeKey, EdgeData>,
    pub(crate) faces: SlotMap<FaceKey, FaceData>,

    // Upward adjacency: child → parents
    pub(crate) node_to_edges: FxHashMap<NodeKey, FxHashSet<EdgeKey>>,
    pub(crate) edge_to_faces: FxHashMap<EdgeKey, FxHashSet<FaceKey>>,

    // Element id → key
    pub(crate) node_ids: FxHashMap<ElementId, NodeKey>,
    pub(crate) edge_ids: FxHashMap<ElementId, EdgeKey>,
    pub(crate) face_ids: FxHashMap<ElementId, FaceKey>,
    node_seq: IdSequence,
    edge_seq: IdSequence,
    face_seq: IdSequence,

    // Splits performed since the last `take_splits`
    pub(crate) splits: Vec<EdgeSplit>,
}

impl PlanarArena {
    /// Creates a new, empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Node operations ---

    /// Adds a node at `coord`, without any edge.
    pub fn add_node(&mut self, coord: Coord, containing_face: Option<FaceKey>) -> NodeKey {
        let id = self.node_seq.next();
        let key = self.nodes.insert(NodeData {
            id,
            coord,
            containing_face,
        });
        self.node_ids.insert(id, key);
        key
    }

    /// Returns the node data for the given key, or `None` if not found.
    pub fn node(&self, key: NodeKey) -> Option<&NodeData> {
        self.nodes.get(key)
    }

    pub fn node_by_id(&self, id: ElementId) -> Option<NodeKey> {
        self.node_ids.get(&id).copied()
    }

    /// Returns the number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Edges that start or end at `node`.
    pub fn node_edges(&self, node: NodeKey) -> impl Iterator<Item = EdgeKey> + '_ {
        self.node_to_edges
            .get(&node)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Returns `true` if no edge touches `node`.
    pub fn is_isolated(&self, node: NodeKey) -> bool {
        self.node_to_edges.get(&node).map_or(true, |s| s.is_empty())
    }

    // --- Edge operations ---

    /// Creates an edge between two existing nodes.
    ///
    /// The first and last entries of `coords` are replaced by the node
    /// positions so the edge always ends exactly on its nodes.
    pub fn add_edge(
        &mut self,
        start: NodeKey,
        end: NodeKey,
        mut coords: Vec<Coord>,
    ) -> crate::Result<EdgeKey> {
        let start_coord = self
            .nodes
            .get(start)
            .ok_or(crate::Error::NotFound(PrimitiveKey::Node(start)))?
            .coord;
        let end_coord = self
            .nodes
            .get(end)
            .ok_or(crate::Error::NotFound(PrimitiveKey::Node(end)))?
            .coord;
        if coords.len() < 2 {
            return Err(crate::Error::DegenerateEdge(coords.len()));
        }
        coords[0] = start_coord;
        if let Some(last) = coords.last_mut() {
            *last = end_coord;
        }

        let id = self.edge_seq.next();
        let key = self.edges.insert(EdgeData {
            id,
            start,
            end,
            coords,
        });
        self.edge_ids.insert(id, key);
        self.link_node_edge(start, key);
        self.link_node_edge(end, key);
        for node in [start, end] {
            if let Some(n) = self.nodes.get_mut(node) {
                n.containing_face = None;
            }
        }
        Ok(key)
    }

    /// Returns the edge data for the given key, or `None` if not found.
    pub fn edge(&self, key: EdgeKey) -> Option<&EdgeData> {
        self.edges.get(key)
    }

    pub fn edge_by_id(&self, id: ElementId) -> Option<EdgeKey> {
        self.edge_ids.get(&id).copied()
    }

    /// Returns the number of edges in the arena.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Faces bounded by `edge`.
    pub fn edge_faces(&self, edge: EdgeKey) -> impl Iterator<Item = FaceKey> + '_ {
        self.edge_to_faces
            .get(&edge)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    // --- Face operations ---

    /// Creates a face bounded by existing edges.
    pub fn add_face(
        &mut self,
        exterior: Vec<EdgeKey>,
        interiors: Vec<Vec<EdgeKey>>,
        exterior_ring: Vec<Coord>,
        interior_rings: Vec<Vec<Coord>>,
    ) -> crate::Result<FaceKey> {
        if exterior.is_empty() {
            return Err(crate::Error::DegenerateFace);
        }
        for &ek in exterior.iter().chain(interiors.iter().flatten()) {
            if !self.edges.contains_key(ek) {
                return Err(crate::Error::NotFound(PrimitiveKey::Edge(ek)));
            }
        }

        let id = self.face_seq.next();
        let key = self.faces.insert(FaceData {
            id,
            exterior,
            interiors,
            exterior_ring,
            interior_rings,
        });
        self.face_ids.insert(id, key);

        let boundary: Vec<EdgeKey> = self.faces[key].boundary().collect();
        for ek in boundary {
            self.link_edge_face(ek, key);
        }
        Ok(key)
    }

    /// Returns the face data for the given key, or `None` if not found.
    pub fn face(&self, key: FaceKey) -> Option<&FaceData> {
        self.faces.get(key)
    }

    pub fn face_by_id(&self, id: ElementId) -> Option<FaceKey> {
        self.face_ids.get(&id).copied()
    }

    /// Returns the number of faces in the arena.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Nodes in insertion order of their ids.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &NodeData)> {
        let mut all: Vec<_> = self.nodes.iter().collect();
        all.sort_by_key(|(_, n)| n.id);
        all.into_iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, &EdgeData)> {
        let mut all: Vec<_> = self.edges.iter().collect();
        all.sort_by_key(|(_, e)| e.id);
        all.into_iter()
    }

    pub fn faces(&self) -> impl Iterator<Item = (FaceKey, &FaceData)> {
        let mut all: Vec<_> = self.faces.iter().collect();
        all.sort_by_key(|(_, f)| f.id);
        all.into_iter()
    }

    // --- Entity existence checks ---

    /// Returns `true` if the given key references a live primitive.
    pub fn contains(&self, key: PrimitiveKey) -> bool {
        match key {
            PrimitiveKey::Node(k) => self.nodes.contains_key(k),
            PrimitiveKey::Edge(k) => self.edges.contains_key(k),
            PrimitiveKey::Face(k) => self.faces.contains_key(k),
        }
    }

    /// Element id of a primitive.
    pub fn element_id(&self, key: PrimitiveKey) -> Option<ElementId> {
        match key {
            PrimitiveKey::Node(k) => self.nodes.get(k).map(|n| n.id),
            PrimitiveKey::Edge(k) => self.edges.get(k).map(|e| e.id),
            PrimitiveKey::Face(k) => self.faces.get(k).map(|f| f.id),
        }
    }

    /// Drains the edge splits recorded since the previous call.
    pub fn take_splits(&mut self) -> Vec<EdgeSplit> {
        std::mem::take(&mut self.splits)
    }

    // --- Adjacency index helpers ---

    /// Register that an edge uses a node (upward adjacency).
    pub(crate) fn link_node_edge(&mut self, node: NodeKey, edge: EdgeKey) {
        self.node_to_edges.entry(node).or_default().insert(edge);
    }

    pub(crate) fn unlink_node_edge(&mut self, node: NodeKey, edge: EdgeKey) {
        if let Some(set) = self.node_to_edges.get_mut(&node) {
            set.remove(&edge);
        }
    }

    /// Register that a face uses an edge (upward adjacency).
    pub(crate) fn link_edge_face(&mut self, edge: EdgeKey, face: FaceKey) {
        self.edge_to_faces.entry(edge).or_default().insert(face);
    }
}
