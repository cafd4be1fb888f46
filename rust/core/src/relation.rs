// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relation rows linking TopoGeometries to primitives.

use tracing::trace;

use crate::error::{BackendError, Error, Result};
use crate::model::RelationRow;

/// Storage for the relation table of each topology.
pub trait RelationStore {
    /// Atomically inserts `row` unless an identical row exists for the same
    /// TopoGeometry and layer. Returns `true` if a row was written.
    fn insert_relation(
        &mut self,
        topology: &str,
        row: RelationRow,
    ) -> std::result::Result<bool, BackendError>;
}

/// Records one association, ignoring duplicates.
pub fn record<R: RelationStore + ?Sized>(
    store: &mut R,
    topology: &str,
    row: RelationRow,
) -> Result<bool> {
    let inserted = store
        .insert_relation(topology, row)
        .map_err(Error::backend("relation insert"))?;
    trace!(
        topology,
        topogeo_id = %row.topogeo_id,
        element_type = %row.element_type,
        element_id = %row.element_id,
        inserted,
        "Recorded relation"
    );
    Ok(inserted)
}
