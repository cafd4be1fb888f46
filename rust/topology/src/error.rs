// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for topology store operations.

use topogeo_core::{LayerId, TopoGeomType};

use crate::keys::PrimitiveKey;

/// Result type alias for topology store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during topology store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A referenced primitive was not found in the arena.
    #[error("topology primitive not found: {0:?}")]
    NotFound(PrimitiveKey),

    /// An edge needs at least two distinct vertices.
    #[error("edge has {0} distinct vertices, at least 2 required")]
    DegenerateEdge(usize),

    /// A face needs a non-empty exterior ring.
    #[error("face has no exterior edges")]
    DegenerateFace,

    /// A polygon ring does not end where it starts.
    #[error("polygon ring is not closed")]
    OpenRing,

    /// Snapping distances must be non-negative numbers.
    #[error("invalid tolerance {0}")]
    InvalidTolerance(f64),

    #[error("cannot add an empty {0} to the mesh")]
    EmptyPrimitive(&'static str),

    #[error("topology \"{0}\" already exists")]
    DuplicateTopology(String),

    #[error("no topology named \"{0}\"")]
    UnknownTopology(String),

    #[error("no layer with id \"{layer_id}\" in topology \"{topology}\"")]
    UnknownLayer { layer_id: LayerId, topology: String },

    /// A TopoGeometry was requested with a type its layer cannot hold.
    #[error("layer \"{layer_id}\" of topology \"{topology}\" cannot hold {} feature", .kind.feature_noun())]
    LayerTypeMismatch {
        layer_id: LayerId,
        topology: String,
        kind: TopoGeomType,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}
