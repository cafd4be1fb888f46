// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identifiers, catalog records and relation rows.
//!
//! Catalog lookups return the immutable [`TopologyInfo`] and [`LayerInfo`]
//! records defined here. Numeric codes that are persisted (feature classes,
//! TopoGeometry types, element types) serialize as their integer code.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(
    /// Numeric id of a topology in the topology catalog.
    TopologyId(u32)
);
id_type!(
    /// Id of a layer, unique within its topology.
    LayerId(u32)
);
id_type!(
    /// Id of a TopoGeometry, unique within its layer.
    TopoGeomId(u64)
);
id_type!(
    /// Id of a node, edge or face, as handed out by the editing engine.
    ElementId(u64)
);

/// Declared feature class of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureClass {
    Puntal = 1,
    Lineal = 2,
    Areal = 3,
    Mixed = 4,
}

impl FeatureClass {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(FeatureClass::Puntal),
            2 => Some(FeatureClass::Lineal),
            3 => Some(FeatureClass::Areal),
            4 => Some(FeatureClass::Mixed),
            _ => None,
        }
    }

    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureClass::Puntal => "puntal",
            FeatureClass::Lineal => "lineal",
            FeatureClass::Areal => "areal",
            FeatureClass::Mixed => "mixed",
        }
    }

    /// A mixed layer holds anything; the others only their own kind.
    pub fn accepts(&self, kind: TopoGeomType) -> bool {
        match self {
            FeatureClass::Mixed => true,
            FeatureClass::Puntal => kind == TopoGeomType::Puntal,
            FeatureClass::Lineal => kind == TopoGeomType::Lineal,
            FeatureClass::Areal => kind == TopoGeomType::Areal,
        }
    }
}

/// Type code of a TopoGeometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TopoGeomType {
    Puntal = 1,
    Lineal = 2,
    Areal = 3,
    Collection = 4,
}

impl TopoGeomType {
    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(TopoGeomType::Puntal),
            2 => Some(TopoGeomType::Lineal),
            3 => Some(TopoGeomType::Areal),
            4 => Some(TopoGeomType::Collection),
            _ => None,
        }
    }

    /// Feature noun with its article, as used in compatibility errors.
    pub fn feature_noun(&self) -> &'static str {
        match self {
            TopoGeomType::Puntal => "a puntal",
            TopoGeomType::Lineal => "a lineal",
            TopoGeomType::Areal => "an areal",
            TopoGeomType::Collection => "a collection",
        }
    }
}

impl From<TopoGeomType> for u8 {
    fn from(t: TopoGeomType) -> Self {
        t.code()
    }
}

impl TryFrom<u8> for TopoGeomType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        TopoGeomType::from_code(code).ok_or_else(|| format!("invalid TopoGeometry type {}", code))
    }
}

/// Kind of topology primitive referenced by a relation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ElementType {
    Node = 1,
    Edge = 2,
    Face = 3,
}

impl ElementType {
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Maps a primitive's dimension (0, 1, 2) to the element that holds it.
    pub fn from_dimension(dimension: u8) -> Option<Self> {
        match dimension {
            0 => Some(ElementType::Node),
            1 => Some(ElementType::Edge),
            2 => Some(ElementType::Face),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Node => "node",
            ElementType::Edge => "edge",
            ElementType::Face => "face",
        }
    }
}

impl From<ElementType> for u8 {
    fn from(t: ElementType) -> Self {
        t.code()
    }
}

impl TryFrom<u8> for ElementType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(ElementType::Node),
            2 => Ok(ElementType::Edge),
            3 => Ok(ElementType::Face),
            _ => Err(format!("invalid element type {}", code)),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A topology catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyInfo {
    pub id: TopologyId,
    pub name: String,
    pub srid: i32,
    /// Baseline snapping distance; 0 means "derive from the input".
    pub precision: f64,
    pub has_z: bool,
}

/// A layer catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub topology_id: TopologyId,
    pub layer_id: LayerId,
    /// Raw feature class code. Codes outside 1..=4 are kept as-is.
    pub feature_type: i32,
    /// 0 for layers built from primitives, >0 for hierarchical layers.
    pub level: u32,
    pub child_id: Option<LayerId>,
    pub schema_name: String,
    pub table_name: String,
    pub feature_column: String,
}

impl LayerInfo {
    pub fn feature_class(&self) -> Option<FeatureClass> {
        FeatureClass::from_code(self.feature_type)
    }

    /// Human-readable feature class: `puntal`, `lineal`, `areal`, `mixed`,
    /// or `unexpected_N` for an unknown code.
    pub fn type_label(&self) -> Cow<'static, str> {
        match self.feature_class() {
            Some(class) => Cow::Borrowed(class.as_str()),
            None => Cow::Owned(format!("unexpected_{}", self.feature_type)),
        }
    }

    pub fn is_hierarchical(&self) -> bool {
        self.level > 0
    }
}

/// A feature defined by references to topology primitives.
///
/// The value itself only carries identity and type; its composition lives
/// in the relation rows of its topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopoGeometry {
    pub topology_id: TopologyId,
    pub layer_id: LayerId,
    pub id: TopoGeomId,
    #[serde(rename = "type")]
    pub kind: TopoGeomType,
}

/// One persisted association between a TopoGeometry and a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationRow {
    pub topogeo_id: TopoGeomId,
    pub layer_id: LayerId,
    pub element_type: ElementType,
    pub element_id: ElementId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(feature_type: i32) -> LayerInfo {
        LayerInfo {
            topology_id: TopologyId(1),
            layer_id: LayerId(1),
            feature_type,
            level: 0,
            child_id: None,
            schema_name: "public".to_string(),
            table_name: "roads".to_string(),
            feature_column: "topo".to_string(),
        }
    }

    #[test]
    fn layer_type_labels() {
        assert_eq!(layer(1).type_label(), "puntal");
        assert_eq!(layer(2).type_label(), "lineal");
        assert_eq!(layer(3).type_label(), "areal");
        assert_eq!(layer(4).type_label(), "mixed");
        assert_eq!(layer(7).type_label(), "unexpected_7");
        assert!(layer(7).feature_class().is_none());
    }

    #[test]
    fn mixed_class_accepts_everything() {
        for kind in [
            TopoGeomType::Puntal,
            TopoGeomType::Lineal,
            TopoGeomType::Areal,
            TopoGeomType::Collection,
        ] {
            assert!(FeatureClass::Mixed.accepts(kind));
        }
        assert!(FeatureClass::Lineal.accepts(TopoGeomType::Lineal));
        assert!(!FeatureClass::Lineal.accepts(TopoGeomType::Areal));
        assert!(!FeatureClass::Areal.accepts(TopoGeomType::Collection));
    }

    #[test]
    fn element_type_from_dimension() {
        assert_eq!(ElementType::from_dimension(0), Some(ElementType::Node));
        assert_eq!(ElementType::from_dimension(1), Some(ElementType::Edge));
        assert_eq!(ElementType::from_dimension(2), Some(ElementType::Face));
        assert_eq!(ElementType::from_dimension(3), None);
    }

    #[test]
    fn relation_row_serializes_codes() {
        let row = RelationRow {
            topogeo_id: TopoGeomId(7),
            layer_id: LayerId(2),
            element_type: ElementType::Edge,
            element_id: ElementId(42),
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"topogeo_id":7,"layer_id":2,"element_type":2,"element_id":42}"#
        );

        let tg = TopoGeometry {
            topology_id: TopologyId(1),
            layer_id: LayerId(2),
            id: TopoGeomId(3),
            kind: TopoGeomType::Collection,
        };
        let json = serde_json::to_string(&tg).unwrap();
        assert!(json.contains(r#""type":4"#));
        let back: TopoGeometry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tg);
    }
}
