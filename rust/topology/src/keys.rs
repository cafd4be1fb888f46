// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Primitive key types for arena-based storage.
//!
//! Keys are created by `slotmap::SlotMap` and are only meaningful inside the
//! arena that issued them. The stable, user-visible identity of a primitive
//! is its [`ElementId`], which the arena assigns sequentially per kind.

use slotmap::new_key_type;
use topogeo_core::{ElementId, ElementType};

new_key_type! {
    /// Key for a node (a point of the planar mesh).
    pub struct NodeKey;

    /// Key for an edge (a polyline between two nodes).
    pub struct EdgeKey;

    /// Key for a face (an area bounded by edges).
    pub struct FaceKey;
}

/// A key that can reference any primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKey {
    Node(NodeKey),
    Edge(EdgeKey),
    Face(FaceKey),
}

impl PrimitiveKey {
    pub fn element_type(&self) -> ElementType {
        match self {
            PrimitiveKey::Node(_) => ElementType::Node,
            PrimitiveKey::Edge(_) => ElementType::Edge,
            PrimitiveKey::Face(_) => ElementType::Face,
        }
    }
}

impl From<NodeKey> for PrimitiveKey {
    fn from(k: NodeKey) -> Self {
        PrimitiveKey::Node(k)
    }
}

impl From<EdgeKey> for PrimitiveKey {
    fn from(k: EdgeKey) -> Self {
        PrimitiveKey::Edge(k)
    }
}

impl From<FaceKey> for PrimitiveKey {
    fn from(k: FaceKey) -> Self {
        PrimitiveKey::Face(k)
    }
}

/// Per-kind sequence handing out element ids starting at 1.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct IdSequence {
    last: u64,
}

impl IdSequence {
    pub(crate) fn next(&mut self) -> ElementId {
        self.last += 1;
        ElementId(self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn primitive_key_element_types() {
        let mut nodes: SlotMap<NodeKey, ()> = SlotMap::with_key();
        let mut edges: SlotMap<EdgeKey, ()> = SlotMap::with_key();
        let mut faces: SlotMap<FaceKey, ()> = SlotMap::with_key();

        assert_eq!(
            PrimitiveKey::from(nodes.insert(())).element_type(),
            ElementType::Node
        );
        assert_eq!(
            PrimitiveKey::from(edges.insert(())).element_type(),
            ElementType::Edge
        );
        assert_eq!(
            PrimitiveKey::from(faces.insert(())).element_type(),
            ElementType::Face
        );
    }

    #[test]
    fn id_sequence_starts_at_one() {
        let mut seq = IdSequence::default();
        assert_eq!(seq.next(), ElementId(1));
        assert_eq!(seq.next(), ElementId(2));
    }
}
