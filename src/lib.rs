//! tps_rrt - kinodynamic path planning with TPS-RRT*
//!
//! RRT* grown in the trajectory-parameter space of a set of Parameterized
//! Trajectory Generators (PTGs), so every tree edge is a motion the vehicle
//! can actually drive.

// Core modules
pub mod common;
pub mod config;
pub mod utils;

// Algorithm modules
pub mod path_planning;
pub mod ptg;

// Re-export common types for convenience
pub use common::{KinematicState, Obstacles, Point2D, Pose2D, Twist2D};
pub use common::{ObstacleSource, PlannerObserver};
pub use common::{PlannerError, PlannerResult};
pub use config::PlannerConfig;
pub use path_planning::{PlannerInput, PlannerOutput, TpsRrtStar, TpsRrtStarParams};
