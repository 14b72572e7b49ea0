//! TPS-RRT*: RRT* grown in trajectory-parameter space
//!
//! Each iteration samples a pose, picks the (PTG, tree node) pair with the
//! shortest arc to it, drives along that direction until the sample or the
//! first obstacle, inserts the new node and rewires nearby nodes through it
//! when that makes them cheaper.

use std::collections::HashSet;
use std::f64::consts::PI;
use std::time::{Duration, Instant};

use ordered_float::OrderedFloat;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Bernoulli, Distribution, Uniform};
use serde::Deserialize;
use tracing::{debug, info, trace};

use crate::common::{
    angle_distance, KinematicState, NullObserver, ObstacleSource, PlannerError, PlannerObserver,
    PlannerResult, Pose2D,
};
use crate::ptg::TrajectoryGenerator;

use super::distance_metric::{PtgMetric, Se2Metric};
use super::motion_tree::NodeId;
use super::obstacle_transform::{clip_pointcloud, compute_tp_obstacle_for_direction};
use super::planner_types::{MotionTreeSE2, MoveEdgeSE2, PlannerInput, PlannerOutput, TpsNode};

/// Timestamp passed to the obstacle source; planning works on one snapshot
const OBSTACLE_SNAPSHOT_TIME: f64 = 0.0;
const PROGRESS_EVERY: usize = 100;

/// Planner parameters. Every field has a default, so a configuration file
/// only needs the ones it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TpsRrtStarParams {
    /// Shortest accepted extension [m]
    pub min_step_length: f64,
    /// Step [m] used when walking a direction for collisions
    pub grid_resolution: f64,
    pub max_iterations: usize,
    /// Wall-clock budget [s]
    pub max_planning_time: Option<f64>,
    /// Probability of sampling the goal pose
    pub goal_bias: f64,
    pub goal_position_tolerance: f64,
    /// [rad]
    pub goal_heading_tolerance: f64,
    /// Rewire radius is `min(rewire_gamma * sqrt(ln n / n), max_rewire_radius)`
    pub rewire_gamma: f64,
    /// Defaults to the largest PTG reference distance
    pub max_rewire_radius: Option<f64>,
    pub rewire_position_tolerance: f64,
    /// [rad]
    pub rewire_heading_tolerance: f64,
    /// Candidate nodes tried per iteration before giving up on a sample
    pub max_extension_attempts: usize,
    pub seed: u64,
    /// Keep improving after the first solution
    pub search_until_max_iter: bool,
    pub save_edge_paths: bool,
    pub edge_path_points: usize,
}

impl Default for TpsRrtStarParams {
    fn default() -> Self {
        Self {
            min_step_length: 0.25,
            grid_resolution: 0.05,
            max_iterations: 3000,
            max_planning_time: None,
            goal_bias: 0.05,
            goal_position_tolerance: 0.25,
            goal_heading_tolerance: PI,
            rewire_gamma: 10.0,
            max_rewire_radius: None,
            rewire_position_tolerance: 0.05,
            rewire_heading_tolerance: 3.0_f64.to_radians(),
            max_extension_attempts: 10,
            seed: 0,
            search_until_max_iter: true,
            save_edge_paths: true,
            edge_path_points: 20,
        }
    }
}

impl TpsRrtStarParams {
    pub fn validate(&self) -> PlannerResult<()> {
        let positive = [
            ("min_step_length", self.min_step_length),
            ("grid_resolution", self.grid_resolution),
            ("goal_position_tolerance", self.goal_position_tolerance),
            ("rewire_position_tolerance", self.rewire_position_tolerance),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(PlannerError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.goal_bias) {
            return Err(PlannerError::InvalidParameter(format!(
                "goal_bias must lie in [0, 1], got {}",
                self.goal_bias
            )));
        }
        if !(self.rewire_gamma >= 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "rewire_gamma must not be negative, got {}",
                self.rewire_gamma
            )));
        }
        if self.max_extension_attempts == 0 {
            return Err(PlannerError::InvalidParameter(
                "max_extension_attempts must be at least 1".to_string(),
            ));
        }
        if let Some(t) = self.max_planning_time {
            if !(t > 0.0) {
                return Err(PlannerError::InvalidParameter(format!(
                    "max_planning_time must be positive, got {}",
                    t
                )));
            }
        }
        Ok(())
    }
}

/// The planner. Holds parameters and the observer receiving profiling
/// events; one instance can run several plans.
pub struct TpsRrtStar {
    pub params: TpsRrtStarParams,
    observer: Box<dyn PlannerObserver>,
}

impl TpsRrtStar {
    pub fn new(params: TpsRrtStarParams) -> Self {
        Self::with_observer(params, Box::new(NullObserver))
    }

    pub fn with_observer(params: TpsRrtStarParams, observer: Box<dyn PlannerObserver>) -> Self {
        Self { params, observer }
    }

    pub fn plan(&mut self, input: &PlannerInput) -> PlannerResult<PlannerOutput> {
        input.validate()?;
        self.params.validate()?;
        let source = input
            .obstacles
            .as_deref()
            .ok_or_else(|| PlannerError::InvalidInput("no obstacle source given".to_string()))?;

        info!(
            start = %input.state_start.pose,
            goal = %input.state_goal.pose,
            ptgs = input.ptgs.len(),
            max_iterations = self.params.max_iterations,
            "TPS-RRT* planning started"
        );
        for ptg in input.ptgs.iter() {
            debug!("using {}", ptg.description());
        }

        let observer = self.observer.as_mut();
        observer.section_started("plan");
        let t_start = Instant::now();

        let mut run = PlanningRun::new(&self.params, input, source)?;
        let budget = self.params.max_planning_time.map(Duration::from_secs_f64);
        let mut iterations = 0;

        while iterations < self.params.max_iterations {
            if budget.map_or(false, |b| t_start.elapsed() >= b) {
                debug!(iterations, "planning time budget exhausted");
                break;
            }
            iterations += 1;
            run.iterate(observer)?;

            if iterations % PROGRESS_EVERY == 0 {
                let best_cost = run.best.map(|(_, c)| c);
                observer.progress(iterations, run.tree.len(), best_cost);
                debug!(iterations, nodes = run.tree.len(), ?best_cost, "progress");
            }
            if run.best.is_some() && !self.params.search_until_max_iter {
                break;
            }
        }

        observer.section_finished("plan", t_start.elapsed());
        observer.finished();

        let output = run.into_output(iterations);
        info!(
            success = output.success,
            iterations,
            nodes = output.motion_tree.len(),
            best_cost = output.best_cost,
            elapsed_ms = t_start.elapsed().as_millis() as u64,
            "TPS-RRT* planning finished"
        );
        Ok(output)
    }
}

/// A PTG direction that connects one pose to another
#[derive(Debug, Clone, Copy)]
struct Connection {
    ptg_index: usize,
    k: usize,
    ptg_dist: f64,
    distance: f64,
}

/// State of one `plan` call
struct PlanningRun<'a> {
    params: &'a TpsRrtStarParams,
    input: &'a PlannerInput,
    source: &'a dyn ObstacleSource,
    tree: MotionTreeSE2,
    rng: ChaCha8Rng,
    x_dist: Uniform<f64>,
    y_dist: Uniform<f64>,
    yaw_dist: Uniform<f64>,
    goal_dist: Bernoulli,
    max_rewire_radius: f64,
    goal_nodes: Vec<NodeId>,
    best: Option<(NodeId, f64)>,
}

impl<'a> PlanningRun<'a> {
    fn new(
        params: &'a TpsRrtStarParams,
        input: &'a PlannerInput,
        source: &'a dyn ObstacleSource,
    ) -> PlannerResult<Self> {
        let goal_dist = Bernoulli::new(params.goal_bias)
            .map_err(|e| PlannerError::InvalidParameter(format!("goal_bias: {}", e)))?;
        let (lo, hi) = (&input.world_bbox_min, &input.world_bbox_max);

        let mut run = Self {
            params,
            input,
            source,
            tree: MotionTreeSE2::new(),
            rng: ChaCha8Rng::seed_from_u64(params.seed),
            x_dist: Uniform::new_inclusive(lo.x, hi.x),
            y_dist: Uniform::new_inclusive(lo.y, hi.y),
            yaw_dist: Uniform::new(-PI, PI),
            goal_dist,
            max_rewire_radius: params
                .max_rewire_radius
                .unwrap_or_else(|| input.ptgs.max_ref_distance()),
            goal_nodes: Vec::new(),
            best: None,
        };
        let root = run.tree.insert_root(TpsNode::new(input.state_start, 0.0))?;
        run.check_goal(root)?;
        Ok(run)
    }

    fn iterate(&mut self, observer: &mut dyn PlannerObserver) -> PlannerResult<()> {
        let sample = self.sample();

        observer.section_started("extend");
        let t = Instant::now();
        let extension = self.extend_towards(&sample);
        observer.section_finished("extend", t.elapsed());

        let (parent, node, edge) = match extension? {
            Some(ext) => ext,
            None => return Ok(()),
        };
        let new_id = self.tree.insert_node_and_edge(parent, node, edge)?;
        trace!(new_id, parent, pose = %node.state.pose, cost = node.cost, "node added");

        observer.section_started("rewire");
        let t = Instant::now();
        let rewired = self.rewire(new_id);
        observer.section_finished("rewire", t.elapsed());
        if rewired? > 0 {
            self.update_best();
        }

        self.check_goal(new_id)
    }

    fn sample(&mut self) -> Pose2D {
        if self.goal_dist.sample(&mut self.rng) {
            return self.input.state_goal.pose;
        }
        Pose2D::new(
            self.x_dist.sample(&mut self.rng),
            self.y_dist.sample(&mut self.rng),
            self.yaw_dist.sample(&mut self.rng),
        )
    }

    /// Finds a collision-free extension towards `sample`, trying up to
    /// `max_extension_attempts` source nodes.
    fn extend_towards(&self, sample: &Pose2D) -> PlannerResult<Option<(NodeId, TpsNode, MoveEdgeSE2)>> {
        let mut ignored: HashSet<NodeId> = HashSet::new();

        for _ in 0..self.params.max_extension_attempts {
            let mut candidates = Vec::with_capacity(self.input.ptgs.len());
            for (ptg_index, ptg) in self.input.ptgs.iter().enumerate() {
                let metric = PtgMetric::new(ptg);
                if let Some((node, d)) = self.tree.get_nearest_node(sample, &metric, Some(&ignored))? {
                    candidates.push((ptg_index, node, d));
                }
            }
            // First minimum wins, so ties go to the lowest PTG index
            let (ptg_index, source_id, _) = match candidates
                .into_iter()
                .filter(|c| c.2.is_finite())
                .min_by_key(|c| OrderedFloat(c.2))
            {
                Some(c) => c,
                None => return Ok(None),
            };

            let ptg = self.ptg(ptg_index)?;
            let source_node = *self.node(source_id)?;
            let source_pose = source_node.state.pose;
            let rel = source_pose.inverse_compose(sample);
            let tp = match ptg.inverse_map(rel.x, rel.y) {
                Some(tp) => tp,
                None => {
                    ignored.insert(source_id);
                    continue;
                }
            };

            let free = self.free_distance(ptg, &source_pose, tp.k);
            let ptg_dist = tp.d.min(free).min(1.0);
            let distance = ptg_dist * ptg.ref_distance();
            if distance <= 0.0 || distance < self.params.min_step_length {
                trace!(source_id, distance, "extension too short, node ignored");
                ignored.insert(source_id);
                continue;
            }

            let end_pose = source_pose.compose(&ptg.forward_map(tp.k, ptg_dist));
            if !self.input.bbox_contains(&end_pose) {
                trace!(source_id, pose = %end_pose, "extension leaves the world, node ignored");
                ignored.insert(source_id);
                continue;
            }

            let end = KinematicState::new(end_pose);
            let edge = self.make_edge(
                Connection {
                    ptg_index,
                    k: tp.k,
                    ptg_dist,
                    distance,
                },
                source_node.state,
                end,
            );
            return Ok(Some((source_id, TpsNode::new(end, source_node.cost + distance), edge)));
        }
        Ok(None)
    }

    /// Re-parents neighbors of `new_id` through it when that lowers their
    /// cost. Returns the number of re-parented nodes.
    fn rewire(&mut self, new_id: NodeId) -> PlannerResult<usize> {
        let n = self.tree.len() as f64;
        if n < 3.0 {
            return Ok(0);
        }
        let radius = (self.params.rewire_gamma * (n.ln() / n).sqrt()).min(self.max_rewire_radius);
        let new_node = *self.node(new_id)?;
        let neighbors = self
            .tree
            .get_nodes_within(&new_node, &Se2Metric, radius * radius);

        let mut rewired = 0;
        for nb in neighbors {
            if nb == new_id || self.tree.is_ancestor(nb, new_id) {
                continue;
            }
            let nb_node = *self.node(nb)?;
            let conn = match self.best_exact_connection(&new_node.state.pose, &nb_node.state.pose)? {
                Some(c) => c,
                None => continue,
            };
            let new_cost = new_node.cost + conn.distance;
            if new_cost >= nb_node.cost {
                continue;
            }

            // The discretized direction only lands close to the neighbour, so
            // its whole subtree moves rigidly onto the actual arrival pose
            let ptg = self.ptg(conn.ptg_index)?;
            let arrival = new_node.state.pose.compose(&ptg.forward_map(conn.k, conn.ptg_dist));
            let subtree = self.tree.descendants(nb);
            if !self.subtree_fits(nb, &subtree, &nb_node.state.pose, &arrival)? {
                trace!(node = nb, new_parent = new_id, "shifted subtree blocked, rewire skipped");
                continue;
            }

            let end = KinematicState {
                pose: arrival,
                ..nb_node.state
            };
            let edge = self.make_edge(conn, new_node.state, end);
            self.tree.reparent(nb, new_id, edge)?;
            self.move_subtree(nb, &subtree, &nb_node.state.pose, &arrival)?;
            let delta = nb_node.cost - new_cost;
            self.lower_cost(nb, delta)?;
            for &desc in &subtree {
                self.lower_cost(desc, delta)?;
            }
            trace!(node = nb, new_parent = new_id, saved = delta, "rewired");
            rewired += 1;
        }
        Ok(rewired)
    }

    /// Cheapest collision-free direction landing within the rewire
    /// tolerances of `to`, without extrapolating past the reference distance
    fn best_exact_connection(&self, from: &Pose2D, to: &Pose2D) -> PlannerResult<Option<Connection>> {
        let rel = from.inverse_compose(to);
        let mut best: Option<Connection> = None;

        for (ptg_index, ptg) in self.input.ptgs.iter().enumerate() {
            let tp = match ptg.inverse_map(rel.x, rel.y) {
                Some(tp) if tp.exact => tp,
                _ => continue,
            };
            let arrival = ptg.forward_map(tp.k, tp.d);
            let position_error = (arrival.x - rel.x).hypot(arrival.y - rel.y);
            let heading_error = angle_distance(arrival.yaw, rel.yaw).abs();
            if position_error > self.params.rewire_position_tolerance
                || heading_error > self.params.rewire_heading_tolerance
            {
                continue;
            }
            let distance = tp.d * ptg.ref_distance();
            if best.map_or(false, |b| b.distance <= distance) {
                continue;
            }
            if self.free_distance(ptg, from, tp.k) < tp.d {
                continue;
            }
            best = Some(Connection {
                ptg_index,
                k: tp.k,
                ptg_dist: tp.d,
                distance,
            });
        }
        Ok(best)
    }

    /// Whether the subtree of `root` stays inside the world, clear of
    /// obstacles and inside the goal region where it reached it, once moved
    /// rigidly from `from` to `to`
    fn subtree_fits(&self, root: NodeId, subtree: &[NodeId], from: &Pose2D, to: &Pose2D) -> PlannerResult<bool> {
        for &id in std::iter::once(&root).chain(subtree) {
            let pose = shift_pose(&self.node(id)?.state.pose, from, to);
            if !self.input.bbox_contains(&pose) {
                return Ok(false);
            }
            if self.goal_nodes.contains(&id) && !self.within_goal(&pose) {
                return Ok(false);
            }
            for edge in self.tree.edges_of(id) {
                let ptg = self.ptg(edge.data.ptg_index)?;
                let start = shift_pose(&edge.data.start.pose, from, to);
                if self.free_distance(ptg, &start, edge.data.k) < edge.data.ptg_dist {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Applies the rigid move checked by `subtree_fits`. The incoming edge
    /// of `root` already ends at `to`.
    fn move_subtree(&mut self, root: NodeId, subtree: &[NodeId], from: &Pose2D, to: &Pose2D) -> PlannerResult<()> {
        for &id in std::iter::once(&root).chain(subtree) {
            let data = self.tree.node_data_mut(id).ok_or(PlannerError::NodeNotFound(id))?;
            data.state.pose = if id == root {
                *to
            } else {
                shift_pose(&data.state.pose, from, to)
            };
            for edge in self.tree.edges_of_mut(id) {
                edge.data.start.pose = shift_pose(&edge.data.start.pose, from, to);
                edge.data.end.pose = shift_pose(&edge.data.end.pose, from, to);
            }
        }
        Ok(())
    }

    fn free_distance(&self, ptg: &dyn TrajectoryGenerator, from: &Pose2D, k: usize) -> f64 {
        let reach = ptg.ref_distance() + ptg.max_clearance();
        let obstacles = self.source.obstacles(OBSTACLE_SNAPSHOT_TIME);
        let local = clip_pointcloud(&obstacles, from, reach);
        compute_tp_obstacle_for_direction(k, &local, ptg, reach, self.params.grid_resolution)
    }

    fn make_edge(&self, conn: Connection, start: KinematicState, end: KinematicState) -> MoveEdgeSE2 {
        let interpolated_path = if self.params.save_edge_paths {
            self.input
                .ptgs
                .get(conn.ptg_index)
                .map(|ptg| ptg.interpolate(conn.k, conn.ptg_dist, self.params.edge_path_points))
        } else {
            None
        };
        MoveEdgeSE2 {
            ptg_index: conn.ptg_index,
            k: conn.k,
            ptg_dist: conn.ptg_dist,
            distance: conn.distance,
            start,
            end,
            interpolated_path,
            cost: conn.distance,
        }
    }

    fn lower_cost(&mut self, id: NodeId, delta: f64) -> PlannerResult<()> {
        let data = self.tree.node_data_mut(id).ok_or(PlannerError::NodeNotFound(id))?;
        data.cost -= delta;
        Ok(())
    }

    fn check_goal(&mut self, id: NodeId) -> PlannerResult<()> {
        let pose = self.node(id)?.state.pose;
        if self.within_goal(&pose) {
            self.goal_nodes.push(id);
            let previous = self.best.map(|(_, c)| c);
            self.update_best();
            if self.best.map(|(_, c)| c) != previous {
                debug!(node = id, cost = ?self.best.map(|(_, c)| c), "new best solution");
            }
        }
        Ok(())
    }

    fn within_goal(&self, pose: &Pose2D) -> bool {
        let goal = &self.input.state_goal.pose;
        let position_error = (pose.x - goal.x).hypot(pose.y - goal.y);
        let heading_error = angle_distance(pose.yaw, goal.yaw).abs();
        position_error <= self.params.goal_position_tolerance
            && heading_error <= self.params.goal_heading_tolerance
    }

    fn update_best(&mut self) {
        let tree = &self.tree;
        self.best = self
            .goal_nodes
            .iter()
            .filter_map(|&id| tree.node(id).map(|n| (id, n.data.cost)))
            .min_by_key(|&(id, cost)| (OrderedFloat(cost), id));
    }

    fn ptg(&self, index: usize) -> PlannerResult<&'a dyn TrajectoryGenerator> {
        self.input
            .ptgs
            .get(index)
            .ok_or_else(|| PlannerError::InvalidInput(format!("PTG index {} out of range", index)))
    }

    fn node(&self, id: NodeId) -> PlannerResult<&TpsNode> {
        self.tree
            .node(id)
            .map(|n| &n.data)
            .ok_or(PlannerError::NodeNotFound(id))
    }

    fn into_output(self, iterations: usize) -> PlannerOutput {
        PlannerOutput {
            success: self.best.is_some(),
            best_goal_node: self.best.map(|(id, _)| id),
            best_cost: self.best.map_or(f64::INFINITY, |(_, c)| c),
            motion_tree: self.tree,
            iterations,
        }
    }
}

/// `pose` moved by the rigid transform taking `from` onto `to`
fn shift_pose(pose: &Pose2D, from: &Pose2D, to: &Pose2D) -> Pose2D {
    to.compose(&from.inverse_compose(pose))
}
