//! Input, output and tree payload types of the TPS-RRT* planner

use std::sync::Arc;

use crate::common::{
    HasPose, KinematicState, ObstacleSource, Obstacles, Path2D, PlannerError, PlannerResult, Pose2D,
};
use crate::ptg::PtgSet;

use super::motion_tree::{MotionTree, NodeId, TreeNode};

/// Node payload: the reached state and its cost-to-come
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TpsNode {
    pub state: KinematicState,
    /// Accumulated arc length from the root [m]
    pub cost: f64,
}

impl TpsNode {
    pub fn new(state: KinematicState, cost: f64) -> Self {
        Self { state, cost }
    }
}

impl HasPose for TpsNode {
    fn pose(&self) -> &Pose2D {
        &self.state.pose
    }
}

/// One motion primitive: direction `k` of PTG `ptg_index` driven from
/// `start` for a normalized distance `ptg_dist`
#[derive(Debug, Clone, PartialEq)]
pub struct MoveEdgeSE2 {
    pub ptg_index: usize,
    pub k: usize,
    /// Normalized distance, in [0, 1]
    pub ptg_dist: f64,
    /// Travelled distance [m]
    pub distance: f64,
    pub start: KinematicState,
    pub end: KinematicState,
    /// Poses relative to `start`, from the origin to the edge end
    pub interpolated_path: Option<Vec<Pose2D>>,
    pub cost: f64,
}

impl MoveEdgeSE2 {
    /// The interpolated path in the world frame, if it was stored
    pub fn world_path(&self) -> Option<Vec<Pose2D>> {
        self.interpolated_path
            .as_ref()
            .map(|path| path.iter().map(|p| self.start.pose.compose(p)).collect())
    }
}

pub type MotionTreeSE2 = MotionTree<TpsNode, MoveEdgeSE2>;

/// Obstacle source returning the same cloud for every timestamp
#[derive(Debug, Clone)]
pub struct StaticObstacleSource {
    obstacles: Arc<Obstacles>,
}

impl StaticObstacleSource {
    pub fn new(obstacles: Obstacles) -> Self {
        Self {
            obstacles: Arc::new(obstacles),
        }
    }
}

impl ObstacleSource for StaticObstacleSource {
    fn obstacles(&self, _timestamp: f64) -> Arc<Obstacles> {
        Arc::clone(&self.obstacles)
    }
}

/// Everything a planning run needs
pub struct PlannerInput {
    pub state_start: KinematicState,
    pub state_goal: KinematicState,
    pub obstacles: Option<Arc<dyn ObstacleSource>>,
    /// Only x and y are used; yaw always spans the full circle
    pub world_bbox_min: Pose2D,
    pub world_bbox_max: Pose2D,
    pub ptgs: PtgSet,
}

impl PlannerInput {
    /// Input with a static obstacle cloud
    pub fn new(
        state_start: KinematicState,
        state_goal: KinematicState,
        obstacles: Obstacles,
        world_bbox_min: Pose2D,
        world_bbox_max: Pose2D,
        ptgs: PtgSet,
    ) -> Self {
        Self {
            state_start,
            state_goal,
            obstacles: Some(Arc::new(StaticObstacleSource::new(obstacles))),
            world_bbox_min,
            world_bbox_max,
            ptgs,
        }
    }

    /// True if the position of `pose` lies inside the world bounding box
    pub fn bbox_contains(&self, pose: &Pose2D) -> bool {
        pose.x >= self.world_bbox_min.x
            && pose.x <= self.world_bbox_max.x
            && pose.y >= self.world_bbox_min.y
            && pose.y <= self.world_bbox_max.y
    }

    pub fn validate(&self) -> PlannerResult<()> {
        if self.obstacles.is_none() {
            return Err(PlannerError::InvalidInput("no obstacle source given".to_string()));
        }
        if self.ptgs.is_empty() {
            return Err(PlannerError::InvalidInput("the PTG set is empty".to_string()));
        }
        let (lo, hi) = (&self.world_bbox_min, &self.world_bbox_max);
        if !(lo.x <= hi.x && lo.y <= hi.y) {
            return Err(PlannerError::InvalidInput(format!(
                "degenerate world bounding box {} .. {}",
                lo, hi
            )));
        }
        if !self.bbox_contains(&self.state_start.pose) {
            return Err(PlannerError::OutOfBounds {
                what: "start",
                pose: self.state_start.pose.to_string(),
            });
        }
        if !self.bbox_contains(&self.state_goal.pose) {
            return Err(PlannerError::OutOfBounds {
                what: "goal",
                pose: self.state_goal.pose.to_string(),
            });
        }
        Ok(())
    }
}

/// Result of a planning run
#[derive(Debug)]
pub struct PlannerOutput {
    pub success: bool,
    pub motion_tree: MotionTreeSE2,
    /// Cheapest node within goal tolerance, if any
    pub best_goal_node: Option<NodeId>,
    /// Cost-to-come of `best_goal_node`, infinite without a solution
    pub best_cost: f64,
    pub iterations: usize,
}

impl PlannerOutput {
    /// Nodes from the start to the best goal node; empty without a solution
    pub fn best_path(&self) -> PlannerResult<Vec<&TreeNode<TpsNode>>> {
        match self.best_goal_node {
            Some(goal) => self.motion_tree.backtrack_path(goal),
            None => Ok(Vec::new()),
        }
    }

    /// Vehicle positions along the best path, following the stored edge
    /// geometry where available
    pub fn best_path_points(&self) -> PlannerResult<Path2D> {
        let mut path = Path2D::new();
        for node in self.best_path()? {
            let edge_poses = self
                .motion_tree
                .edge_to_parent(node.id)
                .and_then(|e| e.data.world_path());
            match edge_poses {
                Some(poses) => poses.iter().for_each(|p| path.push(p.position())),
                None => path.push(node.data.state.pose.position()),
            }
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ptg::{CircularArcPtg, VehicleShape};

    fn input(start: Pose2D, goal: Pose2D) -> PlannerInput {
        let mut ptgs = PtgSet::new(VehicleShape::Radius(0.3));
        ptgs.push(Box::new(CircularArcPtg::new(5.0, 31, 1.0, 0.3)));
        PlannerInput::new(
            start.into(),
            goal.into(),
            Obstacles::new(),
            Pose2D::new(-1.0, -1.0, 0.0),
            Pose2D::new(6.0, 1.0, 0.0),
            ptgs,
        )
    }

    #[test]
    fn test_validate_accepts_good_input() {
        let inp = input(Pose2D::origin(), Pose2D::new(5.0, 0.0, 0.0));
        inp.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_out_of_bounds() {
        let inp = input(Pose2D::origin(), Pose2D::new(5.0, 3.0, 0.0));
        assert!(matches!(
            inp.validate(),
            Err(PlannerError::OutOfBounds { what: "goal", .. })
        ));
        let inp = input(Pose2D::new(-4.0, 0.0, 0.0), Pose2D::new(5.0, 0.0, 0.0));
        assert!(matches!(
            inp.validate(),
            Err(PlannerError::OutOfBounds { what: "start", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_missing_pieces() {
        let mut inp = input(Pose2D::origin(), Pose2D::new(5.0, 0.0, 0.0));
        inp.obstacles = None;
        assert!(matches!(inp.validate(), Err(PlannerError::InvalidInput(_))));

        let mut inp = input(Pose2D::origin(), Pose2D::new(5.0, 0.0, 0.0));
        inp.ptgs.ptgs.clear();
        assert!(matches!(inp.validate(), Err(PlannerError::InvalidInput(_))));
    }

    #[test]
    fn test_static_source_shares_cloud() {
        let source = StaticObstacleSource::new(Obstacles::from_xy(&[1.0], &[2.0]));
        let a = source.obstacles(0.0);
        let b = source.obstacles(42.0);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_edge_world_path() {
        let start = KinematicState::new(Pose2D::new(1.0, 1.0, std::f64::consts::FRAC_PI_2));
        let edge = MoveEdgeSE2 {
            ptg_index: 0,
            k: 15,
            ptg_dist: 0.5,
            distance: 2.0,
            start,
            end: KinematicState::new(Pose2D::new(1.0, 3.0, std::f64::consts::FRAC_PI_2)),
            interpolated_path: Some(vec![Pose2D::origin(), Pose2D::new(2.0, 0.0, 0.0)]),
            cost: 2.0,
        };
        let world = edge.world_path().unwrap();
        assert!((world[1].x - 1.0).abs() < 1e-12);
        assert!((world[1].y - 3.0).abs() < 1e-12);
    }
}
