//! Interactive plotting of planning results with gnuplot

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{Obstacles, Path2D, PlannerError, PlannerResult, Point2D, Pose2D};
use crate::path_planning::{MotionTreeSE2, PlannerInput, PlannerOutput};
use crate::ptg::{PtgSet, VehicleShape};

use super::render_tree::{edge_world_points, vehicle_outline};

/// Color palette for consistent styling
pub mod colors {
    pub const OBSTACLE: &str = "#000000";
    pub const START: &str = "#00C000";
    pub const GOAL: &str = "#0000FF";
    pub const PATH: &str = "#FF0000";
    pub const TREE: &str = "#B0B0B0";
    pub const VEHICLE: &str = "#00A0FF";
    pub const BBOX: &str = "#808080";
}

/// Style for path rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::new(colors::PATH, "Path")
    }
}

/// Main visualizer struct
pub struct Visualizer {
    figure: Figure,
    title: String,
    x_range: Option<(f64, f64)>,
    y_range: Option<(f64, f64)>,
    circle_segments: usize,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            figure: Figure::new(),
            title: String::new(),
            x_range: None,
            y_range: None,
            circle_segments: 24,
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    pub fn set_x_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.x_range = Some((min, max));
        self
    }

    pub fn set_y_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.y_range = Some((min, max));
        self
    }

    /// Plot a path
    pub fn plot_path(&mut self, path: &Path2D, style: &PathStyle) -> &mut Self {
        self.figure.axes2d().lines(
            &path.x_coords(),
            &path.y_coords(),
            &[
                Caption(&style.caption),
                Color(&style.color),
                LineWidth(style.line_width),
            ],
        );
        self
    }

    fn plot_polyline(&mut self, points: &[Point2D], color: &str, width: f64) -> &mut Self {
        let x: Vec<f64> = points.iter().map(|p| p.x).collect();
        let y: Vec<f64> = points.iter().map(|p| p.y).collect();
        self.figure
            .axes2d()
            .lines(&x, &y, &[Color(color), LineWidth(width)]);
        self
    }

    /// Plot obstacles
    pub fn plot_obstacles(&mut self, obstacles: &Obstacles) -> &mut Self {
        self.figure.axes2d().points(
            &obstacles.x_coords(),
            &obstacles.y_coords(),
            &[
                Caption("Obstacles"),
                Color(colors::OBSTACLE),
                PointSymbol('S'),
                PointSize(0.5),
            ],
        );
        self
    }

    /// Every edge of the tree, following the PTG arcs
    pub fn plot_motion_tree(&mut self, tree: &MotionTreeSE2, ptgs: &PtgSet) -> &mut Self {
        for (_, edge) in tree.edges() {
            let pts = edge_world_points(&edge.data, ptgs, 10);
            self.plot_polyline(&pts, colors::TREE, 0.5);
        }
        self
    }

    /// Vehicle footprint at `pose`
    pub fn plot_vehicle(&mut self, shape: &VehicleShape, pose: &Pose2D, color: &str) -> &mut Self {
        let outline = vehicle_outline(shape, pose, self.circle_segments);
        self.plot_polyline(&outline, color, 1.0)
    }

    /// Axis-aligned world box
    pub fn plot_bbox(&mut self, lo: &Pose2D, hi: &Pose2D) -> &mut Self {
        let corners = [
            Point2D::new(lo.x, lo.y),
            Point2D::new(hi.x, lo.y),
            Point2D::new(hi.x, hi.y),
            Point2D::new(lo.x, hi.y),
            Point2D::new(lo.x, lo.y),
        ];
        self.plot_polyline(&corners, colors::BBOX, 1.0)
    }

    /// Obstacles, tree, best path and start/goal footprints of a planning run
    pub fn plot_result(&mut self, input: &PlannerInput, output: &PlannerOutput) -> PlannerResult<&mut Self> {
        self.set_x_range(input.world_bbox_min.x, input.world_bbox_max.x);
        self.set_y_range(input.world_bbox_min.y, input.world_bbox_max.y);
        self.plot_bbox(&input.world_bbox_min, &input.world_bbox_max);
        if let Some(source) = input.obstacles.as_deref() {
            self.plot_obstacles(&source.obstacles(0.0));
        }
        self.plot_motion_tree(&output.motion_tree, &input.ptgs);
        if output.success {
            self.plot_path(&output.best_path_points()?, &PathStyle::default().with_line_width(3.0));
            for node in output.best_path()? {
                self.plot_vehicle(&input.ptgs.robot_shape, &node.data.state.pose, colors::VEHICLE);
            }
        }
        self.plot_vehicle(&input.ptgs.robot_shape, &input.state_start.pose, colors::START);
        self.plot_vehicle(&input.ptgs.robot_shape, &input.state_goal.pose, colors::GOAL);
        Ok(self)
    }

    /// Finalize and show the plot
    pub fn show(&mut self) -> PlannerResult<()> {
        self.apply_settings();
        self.figure
            .show()
            .map(|_| ())
            .map_err(|e| PlannerError::VisualizationError(e.to_string()))
    }

    /// Save plot to PNG file
    pub fn save_png(&mut self, path: &str, width: u32, height: u32) -> PlannerResult<()> {
        self.apply_settings();
        self.figure
            .save_to_png(path, width, height)
            .map_err(|e| PlannerError::VisualizationError(e.to_string()))
    }

    fn apply_settings(&mut self) {
        let axes = self.figure.axes2d();

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label("X [m]", &[]);
        axes.set_y_label("Y [m]", &[]);

        if let Some((min, max)) = self.x_range {
            axes.set_x_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some((min, max)) = self.y_range {
            axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        axes.set_aspect_ratio(AutoOption::Fix(1.0));
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_style() {
        let style = PathStyle::new(colors::TREE, "Tree").with_line_width(0.5);
        assert_eq!(style.line_width, 0.5);
        assert_eq!(style.color, colors::TREE);
        assert_eq!(PathStyle::default().caption, "Path");
    }

    #[test]
    fn test_visualizer_ranges() {
        let mut vis = Visualizer::new();
        vis.set_title("tree").set_x_range(-1.0, 5.0).set_y_range(-2.0, 2.0);
        assert_eq!(vis.x_range, Some((-1.0, 5.0)));
        assert_eq!(vis.y_range, Some((-2.0, 2.0)));
        assert_eq!(vis.title, "tree");
    }
}
