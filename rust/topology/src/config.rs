// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Store configuration loaded from environment variables.

use serde::{Deserialize, Serialize};

/// Topology store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Cell size of the node snapping grid, in coordinate units.
    pub index_cell_size: f64,
    /// Precision given to topologies created without one.
    pub default_precision: f64,
    /// SRID given to topologies created without one.
    pub default_srid: i32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            index_cell_size: 1.0,
            default_precision: 0.0,
            default_srid: 0,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables keep their default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            index_cell_size: lookup("TOPOGEO_INDEX_CELL_SIZE")
                .and_then(|v| v.parse().ok())
                .filter(|v: &f64| *v > 0.0 && v.is_finite())
                .unwrap_or(defaults.index_cell_size),
            default_precision: lookup("TOPOGEO_DEFAULT_PRECISION")
                .and_then(|v| v.parse().ok())
                .filter(|v: &f64| *v >= 0.0)
                .unwrap_or(defaults.default_precision),
            default_srid: lookup("TOPOGEO_DEFAULT_SRID")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_srid),
        }
    }
}
