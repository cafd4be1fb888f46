// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # topogeo Topology
//!
//! In-memory planar topology store for TopoGeometry conversion.
//!
//! Each topology keeps its nodes, edges and faces in an arena with
//! generational keys and upward adjacency indices, next to its layer
//! catalog and the relation table linking TopoGeometries to primitives.
//! [`TopologyStore`] implements every collaborator trait `topogeo-core`
//! consumes:
//!
//! - **Catalogs**: topologies by name or id, layers by id
//! - **Editing engine**: tolerance snapping, edge splitting and face
//!   reuse in [`PlanarMesh`]
//! - **Factory**: TopoGeometry ids numbered per layer
//! - **Relations**: a duplicate-free table that follows edge splits
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use topogeo_core::FeatureClass;
//! use topogeo_geometry::parse_wkt;
//! use topogeo_topology::TopologyStore;
//!
//! let mut store = TopologyStore::default();
//! store.create_topology("city")?;
//! let layer = store.add_layer("city", "trees", "topo", FeatureClass::Puntal)?;
//!
//! let trees = parse_wkt("MULTIPOINT((0 0),(1 1),(2 2))")?;
//! let tg = store.to_topo_geom(&trees, "city", layer, 0.0)?;
//! ```

pub mod arena;
pub mod config;
pub mod editing;
pub mod error;
pub mod geometry;
pub mod keys;
pub mod relation;
pub mod serialization;
pub mod spatial;
pub mod store;

pub use arena::{EdgeData, EdgeSplit, FaceData, NodeData, PlanarArena};
pub use config::StoreConfig;
pub use editing::PlanarMesh;
pub use error::{Error, Result};
pub use keys::{EdgeKey, FaceKey, NodeKey, PrimitiveKey};
pub use relation::RelationTable;
pub use serialization::{
    EdgeSnapshot, FaceSnapshot, LayerSequence, NodeSnapshot, TopologySnapshot,
};
pub use spatial::SpatialIndex;
pub use store::{Topology, TopologyStore};
