// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # topogeo Core
//!
//! Converts simple geometries into TopoGeometries: features defined by
//! references to the nodes, edges and faces of a shared planar topology.
//!
//! ## Overview
//!
//! - **Catalog**: topology and layer lookups, with "not found" kept apart
//!   from backend failures
//! - **Classification**: shape class to TopoGeometry type, and layer
//!   compatibility
//! - **Tolerance**: explicit snapping distance, or an estimate
//! - **Decomposition**: lazy explosion into single parts and dispatch to the
//!   editing engine
//! - **Relations**: duplicate-free association rows
//!
//! Storage and mesh editing are supplied by the caller through the
//! [`TopologySession`] traits. `topogeo-topology` provides an in-memory
//! implementation.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use topogeo_core::{create_from_geometry, LayerId};
//! use topogeo_geometry::parse_wkt;
//!
//! let geom = parse_wkt("MULTIPOINT((0 0),(1 1),(2 2))")?;
//! let tg = create_from_geometry(&mut session, &geom, "city", LayerId(1), 0.0)?;
//! assert_eq!(tg.kind.code(), 1);
//! ```

pub mod catalog;
pub mod classify;
pub mod convert;
pub mod decompose;
pub mod error;
pub mod model;
pub mod relation;
pub mod tolerance;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{
    find_base_layer, find_layer, find_topology_by_id, find_topology_by_name, LayerCatalog,
    TopologyCatalog,
};
pub use classify::{check_compatible, classify, classify_for_layer};
pub use convert::{
    create_from_geometry, extend_topo_geometry, Converter, TopoGeometryFactory, TopologySession,
};
pub use decompose::{decompose, register_primitive, Decompose, ElementIds, TopologyEditor};
pub use error::{BackendError, ConversionTarget, Error, Result, TopologyRef};
pub use model::{
    ElementId, ElementType, FeatureClass, LayerId, LayerInfo, RelationRow, TopoGeomId,
    TopoGeomType, TopoGeometry, TopologyId, TopologyInfo,
};
pub use relation::{record, RelationStore};
pub use tolerance::{
    min_tolerance_for_extent, resolve_tolerance, topology_min_tolerance, PrecisionEstimator,
    ToleranceEstimator,
};
