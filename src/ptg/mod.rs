//! Parameterized Trajectory Generators (PTGs)
//!
//! A PTG maps a discrete direction `k` and a normalized travel distance
//! `d ∈ [0, 1]` to a pose relative to the vehicle (the forward map), and a
//! relative position back to `(k, d)` (the inverse map). The coordinates
//! `(k, d)` form the trajectory-parameter space ("TP-space") the planner
//! works in.
//!
//! # Components
//!
//! - `circular_arc`: constant-curvature arcs of a differential-drive vehicle
//! - `ptg_set`: a set of generators plus the vehicle footprint

pub mod circular_arc;
pub mod ptg_set;

use std::f64::consts::PI;

use crate::common::Pose2D;

pub use circular_arc::CircularArcPtg;
pub use ptg_set::{PtgConfig, PtgSet, PtgSetConfig, VehicleShape};

/// A point in TP-space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TpPoint {
    /// Direction index, `0..direction_count()`
    pub k: usize,
    /// Normalized distance; exceeds 1 when the target lies beyond the
    /// reference distance
    pub d: f64,
    /// False when the target is only approximately reached (`d > 1`)
    pub exact: bool,
}

/// The trajectory-generator capability the planner relies on
pub trait TrajectoryGenerator: Send + Sync + std::fmt::Debug {
    /// Number of discretized directions `K`
    fn direction_count(&self) -> usize;

    /// Distance [m] corresponding to a normalized distance of 1
    fn ref_distance(&self) -> f64;

    /// Radius [m] around the vehicle reference point that must stay free
    fn max_clearance(&self) -> f64;

    /// Relative pose reached after travelling direction `k` for normalized
    /// distance `d`
    fn forward_map(&self, k: usize, d: f64) -> Pose2D;

    /// Best-effort TP-space coordinates of the relative position `(x, y)`,
    /// or `None` when no direction reaches it
    fn inverse_map(&self, x: f64, y: f64) -> Option<TpPoint>;

    fn description(&self) -> String;

    /// Direction angle in (-PI, PI) of index `k`
    fn index_to_alpha(&self, k: usize) -> f64 {
        let n = self.direction_count() as f64;
        PI * (-1.0 + 2.0 * (k as f64 + 0.5) / n)
    }

    /// Closest direction index to angle `alpha`
    fn alpha_to_index(&self, alpha: f64) -> usize {
        let n = self.direction_count();
        let k = (0.5 * (n as f64 * (1.0 + alpha / PI) - 1.0)).round();
        (k.max(0.0) as usize).min(n.saturating_sub(1))
    }

    /// `num_points` relative poses evenly spaced along direction `k` from
    /// `d = 0` to `d`, both ends included
    fn interpolate(&self, k: usize, d: f64, num_points: usize) -> Vec<Pose2D> {
        let n = num_points.max(2);
        (0..n)
            .map(|i| self.forward_map(k, d * i as f64 / (n - 1) as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_alpha_index_round_trip() {
        let ptg = CircularArcPtg::new(5.0, 31, 1.0, 0.3);
        for k in 0..ptg.direction_count() {
            let alpha = ptg.index_to_alpha(k);
            assert!(alpha > -PI && alpha < PI);
            assert_eq!(ptg.alpha_to_index(alpha), k);
        }
        assert_relative_eq!(ptg.index_to_alpha(15), 0.0, epsilon = 1e-12);
        assert_eq!(ptg.alpha_to_index(-10.0), 0);
        assert_eq!(ptg.alpha_to_index(10.0), 30);
    }

    #[test]
    fn test_interpolate_endpoints() {
        let ptg = CircularArcPtg::new(4.0, 11, 1.0, 0.3);
        let path = ptg.interpolate(3, 0.5, 5);
        assert_eq!(path.len(), 5);
        assert_eq!(path[0], Pose2D::origin());
        let end = ptg.forward_map(3, 0.5);
        assert_relative_eq!(path[4].x, end.x, epsilon = 1e-12);
        assert_relative_eq!(path[4].y, end.y, epsilon = 1e-12);
    }
}
