// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The association table of a topology.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use topogeo_core::{ElementId, ElementType, LayerId, RelationRow, TopoGeomId};

/// Set of `(topogeo, layer, element type, element)` rows, kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationTable {
    rows: BTreeSet<RelationRow>,
}

impl RelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `row`; returns `false` if it was already present.
    pub fn insert(&mut self, row: RelationRow) -> bool {
        self.rows.insert(row)
    }

    pub fn contains(&self, row: &RelationRow) -> bool {
        self.rows.contains(row)
    }

    pub fn rows(&self) -> impl Iterator<Item = &RelationRow> {
        self.rows.iter()
    }

    /// Rows of one TopoGeometry.
    pub fn rows_for(
        &self,
        layer_id: LayerId,
        topogeo_id: TopoGeomId,
    ) -> impl Iterator<Item = &RelationRow> {
        self.rows
            .iter()
            .filter(move |r| r.layer_id == layer_id && r.topogeo_id == topogeo_id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Gives every TopoGeometry referencing edge `original` a row for
    /// `new_edge` too, after `original` was split in two.
    ///
    /// Returns the number of rows added.
    pub fn propagate_edge_split(&mut self, original: ElementId, new_edge: ElementId) -> usize {
        let added: Vec<RelationRow> = self
            .rows
            .iter()
            .filter(|r| r.element_type == ElementType::Edge && r.element_id == original)
            .map(|r| RelationRow {
                element_id: new_edge,
                ..*r
            })
            .collect();
        added.into_iter().filter(|row| self.rows.insert(*row)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(topogeo: u64, element_type: ElementType, element: u64) -> RelationRow {
        RelationRow {
            topogeo_id: TopoGeomId(topogeo),
            layer_id: LayerId(1),
            element_type,
            element_id: ElementId(element),
        }
    }

    #[test]
    fn duplicate_rows_are_ignored() {
        let mut table = RelationTable::new();
        assert!(table.insert(row(1, ElementType::Node, 4)));
        assert!(!table.insert(row(1, ElementType::Node, 4)));
        assert!(table.insert(row(1, ElementType::Edge, 4)));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn rows_for_filters_by_topogeometry() {
        let mut table = RelationTable::new();
        table.insert(row(1, ElementType::Node, 1));
        table.insert(row(2, ElementType::Node, 2));
        table.insert(row(1, ElementType::Node, 3));

        let ids: Vec<u64> = table
            .rows_for(LayerId(1), TopoGeomId(1))
            .map(|r| r.element_id.0)
            .collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(table.rows_for(LayerId(2), TopoGeomId(1)).count(), 0);
    }

    #[test]
    fn split_reaches_every_holder_of_the_edge() {
        let mut table = RelationTable::new();
        table.insert(row(1, ElementType::Edge, 7));
        table.insert(row(2, ElementType::Edge, 7));
        table.insert(row(3, ElementType::Edge, 8));
        // A node with the same number is not an edge
        table.insert(row(4, ElementType::Node, 7));

        assert_eq!(table.propagate_edge_split(ElementId(7), ElementId(9)), 2);
        assert!(table.contains(&row(1, ElementType::Edge, 9)));
        assert!(table.contains(&row(2, ElementType::Edge, 9)));
        assert!(!table.contains(&row(4, ElementType::Node, 9)));

        // Already propagated
        assert_eq!(table.propagate_edge_split(ElementId(7), ElementId(9)), 0);
    }
}
