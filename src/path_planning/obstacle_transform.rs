//! Cartesian obstacles to TP-space
//!
//! For each direction of a generator, the TP-Obstacle is the normalized
//! distance the vehicle can travel along that direction before its
//! clearance circle touches an obstacle point. Obstacle-free directions
//! get 1.0.

use crate::common::{Obstacles, Point2D, Pose2D};
use crate::ptg::TrajectoryGenerator;

/// Keeps the points within a square window of half-width `max_distance`
/// around `reference` and re-expresses them in the reference frame.
pub fn clip_pointcloud(cloud: &Obstacles, reference: &Pose2D, max_distance: f64) -> Obstacles {
    let points = cloud
        .points
        .iter()
        .filter(|p| (p.x - reference.x).abs() <= max_distance && (p.y - reference.y).abs() <= max_distance)
        .map(|p| reference.inverse_transform_point(p))
        .collect();
    Obstacles::from_points(points)
}

/// Free normalized distance of every direction of `ptg`.
///
/// `local` must already be expressed in the vehicle frame, see
/// [`clip_pointcloud`].
pub fn compute_tp_obstacles(
    local: &Obstacles,
    ptg: &dyn TrajectoryGenerator,
    max_distance: f64,
    resolution: f64,
) -> Vec<f64> {
    let relevant = relevant_points(local, ptg, max_distance);
    (0..ptg.direction_count())
        .map(|k| free_distance_along(k, &relevant, ptg, resolution))
        .collect()
}

/// Free normalized distance of direction `k` only
pub fn compute_tp_obstacle_for_direction(
    k: usize,
    local: &Obstacles,
    ptg: &dyn TrajectoryGenerator,
    max_distance: f64,
    resolution: f64,
) -> f64 {
    let relevant = relevant_points(local, ptg, max_distance);
    free_distance_along(k, &relevant, ptg, resolution)
}

/// Points that can possibly touch the vehicle along some direction
fn relevant_points(local: &Obstacles, ptg: &dyn TrajectoryGenerator, max_distance: f64) -> Vec<Point2D> {
    let reach = (ptg.ref_distance() + ptg.max_clearance()).min(max_distance);
    let reach2 = reach * reach;
    local
        .points
        .iter()
        .filter(|p| p.x * p.x + p.y * p.y <= reach2)
        .copied()
        .collect()
}

fn free_distance_along(k: usize, points: &[Point2D], ptg: &dyn TrajectoryGenerator, resolution: f64) -> f64 {
    if points.is_empty() {
        return 1.0;
    }
    let clearance2 = ptg.max_clearance().powi(2);
    let steps = if resolution > 0.0 {
        ((ptg.ref_distance() / resolution).ceil() as usize).max(1)
    } else {
        1
    };

    for i in 0..=steps {
        let d = i as f64 / steps as f64;
        let pose = ptg.forward_map(k, d);
        let hit = points
            .iter()
            .any(|p| (p.x - pose.x).powi(2) + (p.y - pose.y).powi(2) <= clearance2);
        if hit {
            return if i == 0 { 0.0 } else { (i - 1) as f64 / steps as f64 };
        }
    }
    1.0
}
