//! TPS-RRT* planning: motion tree, metrics, obstacle transform, planner

pub mod distance_metric;
pub mod motion_tree;
pub mod obstacle_transform;
pub mod planner_types;
pub mod tps_rrt_star;

pub use distance_metric::{DistanceMetric, PtgMetric, Se2Metric};
pub use motion_tree::{EdgeRef, MotionTree, NodeId, TreeEdge, TreeNode};
pub use obstacle_transform::{clip_pointcloud, compute_tp_obstacle_for_direction, compute_tp_obstacles};
pub use planner_types::*;
pub use tps_rrt_star::{TpsRrtStar, TpsRrtStarParams};
