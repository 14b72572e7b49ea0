//! Pose distance metrics used to pick tree nodes
//!
//! Both metrics expose a cheap lower-bound test, `cannot_be_nearer_than`,
//! that lets the nearest-node scan skip the exact distance. The test must
//! never return `true` for a pair whose exact distance is below the bound.

use crate::common::{angle_distance, Pose2D};
use crate::ptg::TrajectoryGenerator;

/// A (possibly asymmetric) distance between two poses
pub trait DistanceMetric {
    /// `true` only if `distance(a, b) >= bound` is guaranteed
    fn cannot_be_nearer_than(&self, a: &Pose2D, b: &Pose2D, bound: f64) -> bool;

    /// Distance from `from` to `to`; `f64::INFINITY` when not connectable
    fn distance(&self, from: &Pose2D, to: &Pose2D) -> f64;
}

/// Squared SE(2) distance: `dx² + dy² + dyaw²`.
///
/// The angular term is folded in for tie-breaking; callers needing a pure
/// length must discount it.
#[derive(Debug, Default, Clone, Copy)]
pub struct Se2Metric;

impl DistanceMetric for Se2Metric {
    fn cannot_be_nearer_than(&self, a: &Pose2D, b: &Pose2D, bound: f64) -> bool {
        // The distance is squared, so compare squared axis differences
        let dx = a.x - b.x;
        let dy = a.y - b.y;
        dx * dx > bound || dy * dy > bound
    }

    fn distance(&self, a: &Pose2D, b: &Pose2D) -> f64 {
        (a.x - b.x).powi(2) + (a.y - b.y).powi(2) + angle_distance(a.yaw, b.yaw).powi(2)
    }
}

/// Arc length along one generator's manifold from `from` to `to`.
///
/// Not symmetric: `distance(a, b) != distance(b, a)` in general.
#[derive(Debug, Clone, Copy)]
pub struct PtgMetric<'a> {
    ptg: &'a dyn TrajectoryGenerator,
}

impl<'a> PtgMetric<'a> {
    pub fn new(ptg: &'a dyn TrajectoryGenerator) -> Self {
        Self { ptg }
    }

    pub fn ptg(&self) -> &'a dyn TrajectoryGenerator {
        self.ptg
    }
}

impl DistanceMetric for PtgMetric<'_> {
    fn cannot_be_nearer_than(&self, a: &Pose2D, b: &Pose2D, bound: f64) -> bool {
        // Arc length >= chord >= any per-axis difference
        (a.x - b.x).abs() > bound || (a.y - b.y).abs() > bound
    }

    fn distance(&self, from: &Pose2D, to: &Pose2D) -> f64 {
        let rel = from.inverse_compose(to);
        match self.ptg.inverse_map(rel.x, rel.y) {
            Some(tp) => tp.d * self.ptg.ref_distance(),
            None => f64::INFINITY,
        }
    }
}
