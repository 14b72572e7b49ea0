//! Circular-arc trajectory generator
//!
//! Each direction `k` is a constant-curvature arc driven forward by a
//! differential-drive vehicle. The direction angle `alpha ∈ (-PI, PI)` maps
//! linearly onto curvature, so `alpha = 0` is a straight line and
//! `|alpha| → PI` approaches the minimum turning radius. With an odd number
//! of directions the middle one is exactly straight.

use std::f64::consts::PI;

use crate::common::Pose2D;

use super::{TpPoint, TrajectoryGenerator};

const CURVATURE_EPS: f64 = 1e-9;

/// Constant-curvature arcs, forward motion only
#[derive(Debug, Clone)]
pub struct CircularArcPtg {
    ref_distance: f64,
    num_paths: usize,
    min_turning_radius: f64,
    clearance: f64,
}

impl CircularArcPtg {
    /// # Arguments
    /// * `ref_distance` - Arc length [m] of a normalized distance of 1
    /// * `num_paths` - Number of discrete directions
    /// * `min_turning_radius` - Tightest turning radius [m]
    /// * `clearance` - Vehicle circumscribed radius [m]
    pub fn new(ref_distance: f64, num_paths: usize, min_turning_radius: f64, clearance: f64) -> Self {
        Self {
            ref_distance,
            num_paths,
            min_turning_radius,
            clearance,
        }
    }

    pub fn min_turning_radius(&self) -> f64 {
        self.min_turning_radius
    }

    /// Signed curvature [1/m] of direction `k`
    pub fn curvature(&self, k: usize) -> f64 {
        self.alpha_to_curvature(self.index_to_alpha(k))
    }

    fn alpha_to_curvature(&self, alpha: f64) -> f64 {
        alpha / (PI * self.min_turning_radius)
    }

    fn curvature_to_alpha(&self, curvature: f64) -> f64 {
        curvature * PI * self.min_turning_radius
    }
}

/// Pose after driving arc length `s` along curvature `kappa` from the origin
fn arc_pose(kappa: f64, s: f64) -> Pose2D {
    if kappa.abs() < CURVATURE_EPS {
        return Pose2D::new(s, 0.0, 0.0);
    }
    let yaw = kappa * s;
    Pose2D::new(yaw.sin() / kappa, (1.0 - yaw.cos()) / kappa, yaw)
}

impl TrajectoryGenerator for CircularArcPtg {
    fn direction_count(&self) -> usize {
        self.num_paths
    }

    fn ref_distance(&self) -> f64 {
        self.ref_distance
    }

    fn max_clearance(&self) -> f64 {
        self.clearance
    }

    fn forward_map(&self, k: usize, d: f64) -> Pose2D {
        arc_pose(self.curvature(k), d * self.ref_distance)
    }

    fn inverse_map(&self, x: f64, y: f64) -> Option<TpPoint> {
        let r2 = x * x + y * y;
        if r2 < CURVATURE_EPS * CURVATURE_EPS {
            return Some(TpPoint {
                k: self.alpha_to_index(0.0),
                d: 0.0,
                exact: true,
            });
        }

        // The circle tangent to the x axis at the origin through (x, y)
        let kappa = 2.0 * y / r2;
        if kappa.abs() * self.min_turning_radius > 1.0 {
            return None;
        }

        let arc_length = if kappa.abs() < CURVATURE_EPS {
            if x <= 0.0 {
                return None;
            }
            r2.sqrt()
        } else {
            let mut theta = (x * kappa).atan2(1.0 - y * kappa);
            if kappa > 0.0 && theta < 0.0 {
                theta += 2.0 * PI;
            } else if kappa < 0.0 && theta > 0.0 {
                theta -= 2.0 * PI;
            }
            theta / kappa
        };

        let d = arc_length / self.ref_distance;
        Some(TpPoint {
            k: self.alpha_to_index(self.curvature_to_alpha(kappa)),
            d,
            exact: d <= 1.0,
        })
    }

    fn description(&self) -> String {
        format!(
            "CircularArc(K={}, ref={:.2}m, Rmin={:.2}m)",
            self.num_paths, self.ref_distance, self.min_turning_radius
        )
    }
}
