// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topology and layer catalog lookups.
//!
//! Catalog backends answer `Ok(Some(_))` when an entry exists, `Ok(None)`
//! when it does not, and `Err(_)` when the lookup itself failed. The helpers
//! in this module turn absence into the caller-facing error kinds.

use tracing::debug;

use crate::error::{BackendError, ConversionTarget, Error, Result, TopologyRef};
use crate::model::{LayerId, LayerInfo, TopologyId, TopologyInfo};

/// Read-only access to topology metadata.
pub trait TopologyCatalog {
    fn topology_by_name(
        &self,
        name: &str,
    ) -> std::result::Result<Option<TopologyInfo>, BackendError>;

    fn topology_by_id(
        &self,
        id: TopologyId,
    ) -> std::result::Result<Option<TopologyInfo>, BackendError>;
}

/// Read-only access to layer metadata.
pub trait LayerCatalog {
    fn layer(
        &self,
        topology_id: TopologyId,
        layer_id: LayerId,
    ) -> std::result::Result<Option<LayerInfo>, BackendError>;
}

/// Resolves a topology by name.
pub fn find_topology_by_name<C: TopologyCatalog + ?Sized>(
    catalog: &C,
    name: &str,
) -> Result<TopologyInfo> {
    catalog
        .topology_by_name(name)
        .map_err(Error::backend("topology lookup"))?
        .ok_or_else(|| Error::TopologyNotFound(TopologyRef::Name(name.to_string())))
}

/// Resolves a topology by id.
pub fn find_topology_by_id<C: TopologyCatalog + ?Sized>(
    catalog: &C,
    id: TopologyId,
) -> Result<TopologyInfo> {
    catalog
        .topology_by_id(id)
        .map_err(Error::backend("topology lookup"))?
        .ok_or(Error::TopologyNotFound(TopologyRef::Id(id)))
}

/// Resolves a layer of `topology`.
pub fn find_layer<C: LayerCatalog + ?Sized>(
    catalog: &C,
    topology: &TopologyInfo,
    layer_id: LayerId,
) -> Result<LayerInfo> {
    catalog
        .layer(topology.id, layer_id)
        .map_err(Error::backend("layer lookup"))?
        .ok_or_else(|| Error::LayerNotFound {
            layer_id,
            topology: topology.name.clone(),
        })
}

/// Resolves a layer and rejects it if it is hierarchical.
///
/// Only base layers (level 0) can reference nodes, edges and faces directly.
/// `target` names the entry point in the rejection message.
pub fn find_base_layer<C: LayerCatalog + ?Sized>(
    catalog: &C,
    topology: &TopologyInfo,
    layer_id: LayerId,
    target: ConversionTarget,
) -> Result<LayerInfo> {
    let layer = find_layer(catalog, topology, layer_id)?;
    if layer.is_hierarchical() {
        return Err(Error::HierarchicalLayer {
            layer_id,
            topology: topology.name.clone(),
            target,
        });
    }

    debug!(
        topology = %topology.name,
        layer_id = %layer_id,
        feature_type = %layer.type_label(),
        "Resolved base layer"
    );
    Ok(layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSession;

    #[test]
    fn topology_lookup_by_name_and_id() {
        let session = FakeSession::with_layer(1);
        let topo = find_topology_by_name(&session, "city").unwrap();
        assert_eq!(topo.id, TopologyId(1));

        let same = find_topology_by_id(&session, TopologyId(1)).unwrap();
        assert_eq!(same, topo);
    }

    #[test]
    fn missing_topology_is_distinct_error() {
        let session = FakeSession::with_layer(1);
        match find_topology_by_name(&session, "nowhere") {
            Err(Error::TopologyNotFound(TopologyRef::Name(name))) => assert_eq!(name, "nowhere"),
            other => panic!("expected TopologyNotFound, got {:?}", other),
        }
        assert!(matches!(
            find_topology_by_id(&session, TopologyId(99)),
            Err(Error::TopologyNotFound(TopologyRef::Id(TopologyId(99))))
        ));
    }

    #[test]
    fn missing_layer_names_topology() {
        let session = FakeSession::with_layer(1);
        let topo = find_topology_by_name(&session, "city").unwrap();
        let err = find_layer(&session, &topo, LayerId(5)).unwrap_err();
        assert_eq!(err.to_string(), "No layer with id \"5\" in topology \"city\"");
    }

    #[test]
    fn hierarchical_layer_is_rejected() {
        let mut session = FakeSession::with_layer(4);
        session.layer.level = 1;
        let topo = find_topology_by_name(&session, "city").unwrap();
        assert!(find_layer(&session, &topo, LayerId(1)).is_ok());
        assert!(matches!(
            find_base_layer(&session, &topo, LayerId(1), ConversionTarget::NewTopoGeometry),
            Err(Error::HierarchicalLayer {
                target: ConversionTarget::NewTopoGeometry,
                ..
            })
        ));
    }

    #[test]
    fn backend_failure_is_not_absence() {
        let mut session = FakeSession::with_layer(1);
        session.fail_catalog = true;
        assert!(matches!(
            find_topology_by_name(&session, "city"),
            Err(Error::Backend { operation: "topology lookup", .. })
        ));
    }
}
