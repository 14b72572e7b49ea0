//! Utility modules for tps_rrt

pub mod input;
pub mod profiler;
pub mod render_tree;
pub mod visualization;

pub use input::{load_obstacles_from_text_file, world_bbox_from};
pub use profiler::{SectionStats, TimeProfiler};
pub use render_tree::RenderOptions;
pub use visualization::{colors, PathStyle, Visualizer};
