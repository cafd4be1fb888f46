// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Snapping editor for the planar mesh.
//!
//! Every operation first snaps its input to what is already there (nodes,
//! then edges) within the given tolerance, and only then creates new
//! primitives:
//!
//! - a point becomes an existing node, a node splitting an existing edge, or
//!   a new isolated node;
//! - a line is cut wherever it meets the mesh and each piece becomes an
//!   existing edge with the same shape, or a new edge;
//! - a polygon's rings go through the line path, and the polygon becomes an
//!   existing face with the same boundary, or a new face.
//!
//! Edge splits keep the original edge's id on the first half and are
//! recorded in the arena so relation rows can follow them.
//!
//! Self-intersections of a new line are not noded, and an existing face is
//! never split by a new polygon.

use rustc_hash::FxHashSet;
use topogeo_core::ElementId;
use topogeo_geometry::{Coord, Polygon};
use tracing::{debug, trace};

use crate::arena::{EdgeSplit, PlanarArena};
use crate::error::{Error, Result};
use crate::geometry::*;
use crate::keys::*;
use crate::spatial::SpatialIndex;

/// Relative slack granted to computed crossing points, which are only
/// accurate to a few ulps.
const CROSSING_SLACK: f64 = 64.0 * f64::EPSILON;

/// The nodes, edges and faces of one topology, with their snapping index.
#[derive(Debug, Clone)]
pub struct PlanarMesh {
    pub(crate) arena: PlanarArena,
    pub(crate) index: SpatialIndex,
}

impl PlanarMesh {
    /// Creates an empty mesh whose index uses cells of `cell_size`.
    pub fn new(cell_size: f64) -> Self {
        Self {
            arena: PlanarArena::new(),
            index: SpatialIndex::new(cell_size),
        }
    }

    /// Wraps an existing arena, indexing its nodes.
    pub(crate) fn from_arena(arena: PlanarArena, cell_size: f64) -> Self {
        let index = SpatialIndex::from_arena(&arena, cell_size);
        Self { arena, index }
    }

    pub fn arena(&self) -> &PlanarArena {
        &self.arena
    }

    /// Drains the edge splits performed since the previous call.
    pub fn take_splits(&mut self) -> Vec<EdgeSplit> {
        self.arena.take_splits()
    }

    // ===== Points =====

    /// Returns the node representing `coord`.
    pub fn add_point(&mut self, coord: Coord, tolerance: f64) -> Result<NodeKey> {
        check_tolerance(tolerance)?;

        if let Some(node) = self.index.find_near(&self.arena, &coord, tolerance) {
            return Ok(node);
        }
        if let Some((edge, proj)) = self.nearest_edge(&coord, tolerance) {
            return self.split_edge(edge, proj);
        }

        let face = self.containing_face(&coord);
        let node = self.insert_node(coord, face);
        trace!(x = coord.x, y = coord.y, "Added isolated node");
        Ok(node)
    }

    fn insert_node(&mut self, coord: Coord, containing_face: Option<FaceKey>) -> NodeKey {
        let key = self.arena.add_node(coord, containing_face);
        self.index.insert(key, &coord);
        key
    }

    /// Edge passing closest to `coord`, if within `tolerance`.
    fn nearest_edge(&self, coord: &Coord, tolerance: f64) -> Option<(EdgeKey, Projection)> {
        let tol_sq = tolerance * tolerance;
        let mut best: Option<(EdgeKey, Projection)> = None;
        for (key, edge) in &self.arena.edges {
            if let Some(p) = project_on_polyline(coord, &edge.coords) {
                if p.dist_sq <= tol_sq && best.map_or(true, |(_, b)| p.dist_sq < b.dist_sq) {
                    best = Some((key, p));
                }
            }
        }
        best
    }

    /// Splits `edge` at the projected point and returns the new node.
    ///
    /// The original edge keeps the part from its start node to the new node;
    /// a new edge takes the remainder and joins every face the original
    /// bounds.
    fn split_edge(&mut self, edge: EdgeKey, proj: Projection) -> Result<NodeKey> {
        let data = self
            .arena
            .edges
            .get(edge)
            .cloned()
            .ok_or(Error::NotFound(PrimitiveKey::Edge(edge)))?;

        for end in [data.start, data.end] {
            if let Some(node) = self.arena.node(end) {
                if node.coord == proj.point {
                    return Ok(end);
                }
            }
        }

        let mut head = data.coords[..=proj.segment].to_vec();
        head.push(proj.point);
        dedup_coords(&mut head, 0.0);
        let mut tail = vec![proj.point];
        tail.extend_from_slice(&data.coords[proj.segment + 1..]);
        dedup_coords(&mut tail, 0.0);
        if head.len() < 2 || tail.len() < 2 {
            return Err(Error::DegenerateEdge(head.len().min(tail.len())));
        }

        let node = self.insert_node(proj.point, None);

        if data.start != data.end {
            self.arena.unlink_node_edge(data.end, edge);
        }
        self.arena.link_node_edge(node, edge);
        if let Some(e) = self.arena.edges.get_mut(edge) {
            e.end = node;
            e.coords = head;
        }

        let new_edge = self.arena.add_edge(node, data.end, tail)?;
        let faces: Vec<FaceKey> = self.arena.edge_faces(edge).collect();
        for face in faces {
            if let Some(f) = self.arena.faces.get_mut(face) {
                let ring = std::iter::once(&mut f.exterior)
                    .chain(f.interiors.iter_mut())
                    .find(|ring| ring.contains(&edge));
                if let Some(ring) = ring {
                    ring.push(new_edge);
                }
            }
            self.arena.link_edge_face(new_edge, face);
        }

        let split = EdgeSplit {
            original: data.id,
            new_edge: self.arena.edges[new_edge].id,
            node: self.arena.nodes[node].id,
        };
        debug!(
            edge = %split.original,
            new_edge = %split.new_edge,
            node = %split.node,
            "Split edge"
        );
        self.arena.splits.push(split);
        Ok(node)
    }

    /// Smallest face whose area contains `coord`.
    fn containing_face(&self, coord: &Coord) -> Option<FaceKey> {
        self.arena
            .faces
            .iter()
            .filter(|(_, f)| point_in_area(coord, &f.exterior_ring, &f.interior_rings))
            .map(|(k, f)| (k, ring_signed_area(&f.exterior_ring).abs()))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(k, _)| k)
    }

    // ===== Lines =====

    /// Returns the edges covering the polyline `coords`.
    ///
    /// A line that collapses to a single point within `tolerance` yields no
    /// edges.
    pub fn add_line(&mut self, coords: &[Coord], tolerance: f64) -> Result<Vec<EdgeKey>> {
        check_tolerance(tolerance)?;

        let mut snapped: Vec<Coord> = coords.iter().map(|c| self.snap_vertex(c, tolerance)).collect();
        dedup_coords(&mut snapped, tolerance);
        if snapped.len() < 2 {
            debug!(vertices = coords.len(), "Line collapsed to a point");
            return Ok(Vec::new());
        }

        let noded = self.node_line(&snapped, tolerance);

        // Each edge is tagged with the number of splits recorded when it
        // joined the result; only later splits concern it.
        let mut edges: Vec<(EdgeKey, usize)> = Vec::new();
        let mut piece: Vec<Coord> = Vec::new();
        let mut piece_start: Option<NodeKey> = None;
        for (coord, cut) in noded {
            if !cut {
                piece.push(coord);
                continue;
            }
            let slack = CROSSING_SLACK * coord.x.abs().max(coord.y.abs()).max(1.0);
            let node = self.add_point(coord, tolerance.max(slack))?;
            let node_coord = self.arena.nodes[node].coord;
            if let Some(start) = piece_start {
                piece.push(node_coord);
                let taken = std::mem::take(&mut piece);
                if let Some(edge) = self.edge_for_piece(start, node, taken, tolerance)? {
                    if !edges.iter().any(|&(e, _)| e == edge) {
                        edges.push((edge, self.arena.splits.len()));
                    }
                }
            }
            piece = vec![node_coord];
            piece_start = Some(node);
        }

        self.follow_splits(&mut edges);
        Ok(edges.into_iter().map(|(e, _)| e).collect())
    }

    fn snap_vertex(&self, coord: &Coord, tolerance: f64) -> Coord {
        if let Some(node) = self.index.find_near(&self.arena, coord, tolerance) {
            return self.arena.nodes[node].coord;
        }
        match self.nearest_edge(coord, tolerance) {
            Some((_, proj)) => proj.point,
            None => *coord,
        }
    }

    fn edge_passes_near(&self, edge: EdgeKey, coord: &Coord, tolerance: f64) -> bool {
        self.arena
            .edge(edge)
            .and_then(|e| project_on_polyline(coord, &e.coords))
            .map_or(false, |p| p.dist_sq <= tolerance * tolerance)
    }

    /// Whether interior vertex `i` of the line must become a node: it sits
    /// on a node, or on an edge the line does not follow on both sides.
    fn is_cut_vertex(&self, line: &[Coord], i: usize, tolerance: f64) -> bool {
        let v = &line[i];
        if self.index.find_near(&self.arena, v, tolerance).is_some() {
            return true;
        }
        let before = nalgebra::center(&line[i - 1], v);
        let after = nalgebra::center(v, &line[i + 1]);
        let mut on_edge = false;
        for edge in self.arena.edges.keys() {
            if !self.edge_passes_near(edge, v, tolerance) {
                continue;
            }
            on_edge = true;
            if self.edge_passes_near(edge, &before, tolerance)
                && self.edge_passes_near(edge, &after, tolerance)
            {
                return false;
            }
        }
        on_edge
    }

    /// Inserts the points where the line meets existing nodes and edges, and
    /// flags every vertex that must become a node.
    fn node_line(&self, snapped: &[Coord], tolerance: f64) -> Vec<(Coord, bool)> {
        let tol_sq = tolerance * tolerance;
        let last = snapped.len() - 1;
        let mut noded: Vec<(Coord, bool)> = Vec::with_capacity(snapped.len());

        for (i, w) in snapped.windows(2).enumerate() {
            let (a, b) = (&w[0], &w[1]);
            noded.push((*a, i == 0 || self.is_cut_vertex(snapped, i, tolerance)));

            let mut extra: Vec<(f64, Coord)> = Vec::new();
            for edge in self.arena.edges.values() {
                for s in edge.coords.windows(2) {
                    if let Some((t, _, p)) = segment_intersection(a, b, &s[0], &s[1]) {
                        if t > 0.0 && t < 1.0 {
                            extra.push((t, p));
                        }
                    }
                }
            }
            for node in self.arena.nodes.values() {
                let (t, q) = project_on_segment(&node.coord, a, b);
                if t > 0.0 && t < 1.0 && dist_sq(&q, &node.coord) <= tol_sq {
                    extra.push((t, node.coord));
                }
            }
            extra.sort_by(|x, y| x.0.total_cmp(&y.0));
            noded.extend(extra.into_iter().map(|(_, p)| (p, true)));
        }
        noded.push((snapped[last], true));

        // Merge coincident entries, keeping the cut flag of either
        let mut merged: Vec<(Coord, bool)> = Vec::with_capacity(noded.len());
        for (coord, cut) in noded {
            let coincident = merged
                .last()
                .map_or(false, |(prev, _)| dist_sq(prev, &coord) <= tol_sq);
            match merged.last_mut() {
                Some(last) if coincident => last.1 |= cut,
                _ => merged.push((coord, cut)),
            }
        }
        if let Some(end) = merged.last_mut() {
            end.1 = true;
        }
        merged
    }

    /// Finds or creates the edge for one piece of a line between two nodes.
    fn edge_for_piece(
        &mut self,
        start: NodeKey,
        end: NodeKey,
        mut coords: Vec<Coord>,
        tolerance: f64,
    ) -> Result<Option<EdgeKey>> {
        dedup_coords(&mut coords, 0.0);
        let min_len = if start == end { 4 } else { 2 };
        if coords.len() < min_len {
            return Ok(None);
        }

        let existing = self.arena.node_edges(start).find(|&ek| {
            self.arena.edge(ek).map_or(false, |e| {
                ((e.start == start && e.end == end) || (e.start == end && e.end == start))
                    && same_polyline(&e.coords, &coords, tolerance)
            })
        });
        if let Some(edge) = existing {
            return Ok(Some(edge));
        }

        let edge = self.arena.add_edge(start, end, coords)?;
        trace!(edge = %self.arena.edges[edge].id, "Added edge");
        Ok(Some(edge))
    }

    /// Adds the second half of every edge in `edges` split after it joined
    /// the list.
    fn follow_splits(&self, edges: &mut Vec<(EdgeKey, usize)>) {
        for (j, split) in self.arena.splits.iter().enumerate() {
            let original = self.arena.edge_by_id(split.original);
            let new_edge = self.arena.edge_by_id(split.new_edge);
            let (Some(original), Some(new_edge)) = (original, new_edge) else {
                continue;
            };
            let tracked = edges.iter().any(|&(e, since)| e == original && since <= j);
            if tracked && !edges.iter().any(|&(e, _)| e == new_edge) {
                edges.push((new_edge, j + 1));
            }
        }
    }

    // ===== Polygons =====

    /// Returns the faces covering `polygon`.
    ///
    /// A polygon whose exterior ring collapses yields no faces.
    pub fn add_polygon(&mut self, polygon: &Polygon, tolerance: f64) -> Result<Vec<FaceKey>> {
        check_tolerance(tolerance)?;
        if polygon.rings().any(|ring| !ring.is_empty() && !ring.is_closed()) {
            return Err(Error::OpenRing);
        }

        let exterior = self.add_line(&polygon.exterior.coords, tolerance)?;
        if exterior.is_empty() {
            debug!("Polygon collapsed");
            return Ok(Vec::new());
        }
        let mut exterior = self.tag(exterior);
        let mut interiors = Vec::with_capacity(polygon.interiors.len());
        let mut interior_rings = Vec::with_capacity(polygon.interiors.len());
        for ring in &polygon.interiors {
            let edges = self.add_line(&ring.coords, tolerance)?;
            if !edges.is_empty() {
                interiors.push(self.tag(edges));
                interior_rings.push(ring.coords.clone());
            }
        }

        // Holes touching the shell may have split shell edges
        self.follow_splits(&mut exterior);
        for ring in &mut interiors {
            self.follow_splits(ring);
        }
        let exterior: Vec<EdgeKey> = exterior.into_iter().map(|(e, _)| e).collect();
        let interiors: Vec<Vec<EdgeKey>> = interiors
            .into_iter()
            .map(|ring| ring.into_iter().map(|(e, _)| e).collect())
            .collect();

        if let Some(face) = self.find_face(&exterior, &interiors) {
            return Ok(vec![face]);
        }

        let face = self.arena.add_face(
            exterior,
            interiors,
            polygon.exterior.coords.clone(),
            interior_rings,
        )?;
        self.adopt_isolated_nodes(face);
        debug!(face = %self.arena.faces[face].id, "Added face");
        Ok(vec![face])
    }

    fn tag(&self, edges: Vec<EdgeKey>) -> Vec<(EdgeKey, usize)> {
        let mark = self.arena.splits.len();
        edges.into_iter().map(|e| (e, mark)).collect()
    }

    fn ring_ids(&self, ring: &[EdgeKey]) -> Vec<ElementId> {
        let mut ids: Vec<ElementId> = ring
            .iter()
            .filter_map(|&ek| self.arena.edge(ek).map(|e| e.id))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Existing face with exactly the same boundary edges.
    fn find_face(&self, exterior: &[EdgeKey], interiors: &[Vec<EdgeKey>]) -> Option<FaceKey> {
        let wanted_exterior = self.ring_ids(exterior);
        let mut wanted_interiors: Vec<Vec<ElementId>> =
            interiors.iter().map(|r| self.ring_ids(r)).collect();
        wanted_interiors.sort();

        let candidates: FxHashSet<FaceKey> = exterior
            .iter()
            .flat_map(|&ek| self.arena.edge_faces(ek))
            .collect();
        candidates.into_iter().find(|&fk| {
            self.arena.face(fk).map_or(false, |f| {
                let mut holes: Vec<Vec<ElementId>> =
                    f.interiors.iter().map(|r| self.ring_ids(r)).collect();
                holes.sort();
                self.ring_ids(&f.exterior) == wanted_exterior && holes == wanted_interiors
            })
        })
    }

    /// Moves isolated nodes lying inside `face` into it, unless they already
    /// sit in a smaller face.
    fn adopt_isolated_nodes(&mut self, face: FaceKey) {
        let Some(f) = self.arena.faces.get(face) else {
            return;
        };
        let area = ring_signed_area(&f.exterior_ring).abs();
        let inside: Vec<NodeKey> = self
            .arena
            .nodes
            .iter()
            .filter(|(k, n)| {
                self.arena.is_isolated(*k)
                    && point_in_area(&n.coord, &f.exterior_ring, &f.interior_rings)
                    && n.containing_face.map_or(true, |current| {
                        self.arena
                            .face(current)
                            .map_or(true, |c| ring_signed_area(&c.exterior_ring).abs() > area)
                    })
            })
            .map(|(k, _)| k)
            .collect();

        for node in inside {
            if let Some(n) = self.arena.nodes.get_mut(node) {
                n.containing_face = Some(face);
            }
        }
    }
}

fn check_tolerance(tolerance: f64) -> Result<()> {
    if tolerance >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidTolerance(tolerance))
    }
}
