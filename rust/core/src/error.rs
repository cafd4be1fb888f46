// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for geometry-to-TopoGeometry conversion.

use std::fmt;

use crate::model::{LayerId, TopoGeomType, TopologyId};

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a collaborator (catalog, store, editing engine).
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// How a topology was referenced when it could not be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyRef {
    Name(String),
    Id(TopologyId),
}

impl fmt::Display for TopologyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyRef::Name(name) => write!(f, "name \"{}\"", name),
            TopologyRef::Id(id) => write!(f, "id \"{}\"", id),
        }
    }
}

/// Which entry point hit a hierarchical layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionTarget {
    /// A new TopoGeometry is being created from the geometry.
    NewTopoGeometry,
    /// Primitives are being added to an existing TopoGeometry.
    ExistingTopoGeometry,
}

impl fmt::Display for ConversionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionTarget::NewTopoGeometry => f.write_str("to it"),
            ConversionTarget::ExistingTopoGeometry => f.write_str("a simple geometry to it"),
        }
    }
}

/// Errors that can occur while converting a geometry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No catalog entry matches the topology name or id.
    #[error("No topology with {0} in topology catalog")]
    TopologyNotFound(TopologyRef),

    /// The layer id has no entry under the topology.
    #[error("No layer with id \"{layer_id}\" in topology \"{topology}\"")]
    LayerNotFound { layer_id: LayerId, topology: String },

    /// The target layer is built from other TopoGeometries.
    #[error("Layer \"{layer_id}\" of topology \"{topology}\" is hierarchical, cannot convert {target}")]
    HierarchicalLayer {
        layer_id: LayerId,
        topology: String,
        target: ConversionTarget,
    },

    /// The geometry (or one of its parts) has no TopoGeometry counterpart.
    #[error("Unsupported feature type {0}")]
    UnsupportedShape(String),

    /// The geometry's kind does not fit the layer's feature class.
    #[error(
        "Layer \"{layer_id}\" of topology \"{topology}\" is {label}, cannot hold {} feature",
        .kind.feature_noun()
    )]
    IncompatibleType {
        layer_id: LayerId,
        topology: String,
        label: String,
        kind: TopoGeomType,
    },

    /// A catalog, estimator, factory or relation store call failed.
    #[error("{operation} failed: {source}")]
    Backend {
        operation: &'static str,
        source: BackendError,
    },

    /// The editing engine rejected a primitive.
    #[error(
        "Editing engine failed on {dimension}-dimensional primitive {path} of topology \"{topology}\": {source}"
    )]
    Editor {
        topology: String,
        dimension: u8,
        path: String,
        source: BackendError,
    },
}

impl Error {
    pub(crate) fn backend(operation: &'static str) -> impl FnOnce(BackendError) -> Self {
        move |source| Error::Backend { operation, source }
    }
}
