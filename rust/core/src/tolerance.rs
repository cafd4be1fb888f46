// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Snapping tolerance resolution.
//!
//! An explicit tolerance of `0` means "not given": the estimator is asked
//! instead. Any other value, including a negative one, is used verbatim.

use topogeo_geometry::Geometry;
use tracing::debug;

use crate::error::{BackendError, Error, Result};
use crate::model::TopologyInfo;

/// Decimal digits of an `f64` mantissa the minimum tolerance leaves intact.
const SIGNIFICANT_DIGITS: f64 = 15.0;

/// Scale applied on top of one unit in the last significant digit.
const TOLERANCE_FACTOR: f64 = 3.6;

/// Supplies a default snapping distance when the caller gives none.
pub trait ToleranceEstimator {
    /// Returns a strictly positive tolerance for `geometry` in `topology`.
    fn min_tolerance(
        &self,
        topology: &TopologyInfo,
        geometry: &Geometry,
    ) -> std::result::Result<f64, BackendError>;
}

/// Estimator that uses the topology precision, or the geometry's
/// magnitude when the topology has none.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecisionEstimator;

impl ToleranceEstimator for PrecisionEstimator {
    fn min_tolerance(
        &self,
        topology: &TopologyInfo,
        geometry: &Geometry,
    ) -> std::result::Result<f64, BackendError> {
        Ok(topology_min_tolerance(topology, geometry))
    }
}

/// Smallest distance still representable around the geometry's largest
/// ordinate.
///
/// An empty geometry, or one whose extent touches only zero ordinates, is
/// treated as having a largest ordinate of 1.
pub fn min_tolerance_for_extent(geometry: &Geometry) -> f64 {
    let max = geometry
        .extent()
        .map(|e| e.max_abs_ordinate())
        .filter(|m| *m > 0.0 && m.is_finite())
        .unwrap_or(1.0);
    TOLERANCE_FACTOR * 10f64.powf(-(SIGNIFICANT_DIGITS - max.log10()))
}

/// Topology precision if set, otherwise [`min_tolerance_for_extent`].
pub fn topology_min_tolerance(topology: &TopologyInfo, geometry: &Geometry) -> f64 {
    if topology.precision != 0.0 {
        topology.precision
    } else {
        min_tolerance_for_extent(geometry)
    }
}

/// Resolves the tolerance to pass to the editing engine.
///
/// The estimator is only consulted when `explicit` is zero.
pub fn resolve_tolerance<E: ToleranceEstimator + ?Sized>(
    explicit: f64,
    estimator: &E,
    topology: &TopologyInfo,
    geometry: &Geometry,
) -> Result<f64> {
    if explicit != 0.0 {
        debug!(topology = %topology.name, tolerance = explicit, "Using explicit tolerance");
        return Ok(explicit);
    }

    let estimated = estimator
        .min_tolerance(topology, geometry)
        .map_err(Error::backend("tolerance estimation"))?;
    debug!(topology = %topology.name, tolerance = estimated, "Using estimated tolerance");
    Ok(estimated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TopologyId;
    use approx::assert_relative_eq;
    use std::cell::Cell;
    use topogeo_geometry::parse_wkt;

    fn topology(precision: f64) -> TopologyInfo {
        TopologyInfo {
            id: TopologyId(1),
            name: "city".to_string(),
            srid: 0,
            precision,
            has_z: false,
        }
    }

    struct Counting {
        calls: Cell<usize>,
        value: f64,
    }

    impl ToleranceEstimator for Counting {
        fn min_tolerance(
            &self,
            _topology: &TopologyInfo,
            _geometry: &Geometry,
        ) -> std::result::Result<f64, BackendError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.value)
        }
    }

    #[test]
    fn explicit_tolerance_bypasses_estimator() {
        let est = Counting { calls: Cell::new(0), value: 0.5 };
        let geom = parse_wkt("POINT(1 1)").unwrap();
        let tol = resolve_tolerance(2.0, &est, &topology(0.0), &geom).unwrap();
        assert_eq!(tol, 2.0);
        assert_eq!(est.calls.get(), 0);
    }

    #[test]
    fn zero_tolerance_means_unset() {
        let est = Counting { calls: Cell::new(0), value: 0.5 };
        let geom = parse_wkt("POINT(1 1)").unwrap();
        let tol = resolve_tolerance(0.0, &est, &topology(0.0), &geom).unwrap();
        assert_eq!(tol, 0.5);
        assert_eq!(est.calls.get(), 1);
    }

    #[test]
    fn extent_heuristic_scales_with_magnitude() {
        let unit = parse_wkt("POINT(0 0)").unwrap();
        assert_relative_eq!(min_tolerance_for_extent(&unit), 3.6e-15, max_relative = 1e-9);

        let large = parse_wkt("LINESTRING(-1000 5,10 20)").unwrap();
        assert_relative_eq!(min_tolerance_for_extent(&large), 3.6e-12, max_relative = 1e-9);

        let empty = parse_wkt("POINT EMPTY").unwrap();
        assert!(min_tolerance_for_extent(&empty) > 0.0);
    }

    #[test]
    fn topology_precision_wins_over_heuristic() {
        let geom = parse_wkt("POINT(1000 1000)").unwrap();
        assert_eq!(topology_min_tolerance(&topology(0.01), &geom), 0.01);
        assert!(topology_min_tolerance(&topology(0.0), &geom) < 0.01);
        assert_eq!(
            PrecisionEstimator
                .min_tolerance(&topology(0.25), &geom)
                .unwrap(),
            0.25
        );
    }
}
