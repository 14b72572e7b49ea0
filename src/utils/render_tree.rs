//! SVG rendering of a planning result with plotlib

use std::path::Path;

use plotlib::page::Page;
use plotlib::repr::Plot;
use plotlib::style::{LineStyle, PointMarker, PointStyle};
use plotlib::view::ContinuousView;

use crate::common::{PlannerError, PlannerResult, Point2D, Pose2D};
use crate::path_planning::{MoveEdgeSE2, PlannerInput, PlannerOutput};
use crate::ptg::{PtgSet, VehicleShape};

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub draw_tree_edges: bool,
    /// Draw the vehicle footprint on every N-th node of the best path
    /// (0 disables it)
    pub vehicle_every_n: usize,
    pub circle_segments: usize,
    /// Points per edge when the edge has no stored path
    pub edge_points: usize,
    pub tree_colour: String,
    pub path_colour: String,
    pub vehicle_colour: String,
    pub obstacle_colour: String,
    pub bbox_colour: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            draw_tree_edges: true,
            vehicle_every_n: 3,
            circle_segments: 24,
            edge_points: 10,
            tree_colour: "#B0B0B0".to_string(),
            path_colour: "#FF0000".to_string(),
            vehicle_colour: "#00A0FF".to_string(),
            obstacle_colour: "#000000".to_string(),
            bbox_colour: "#808080".to_string(),
        }
    }
}

/// World-frame points along an edge: the stored path, or a fresh
/// interpolation through its PTG
pub fn edge_world_points(edge: &MoveEdgeSE2, ptgs: &PtgSet, num_points: usize) -> Vec<Point2D> {
    if let Some(poses) = edge.world_path() {
        return poses.iter().map(Pose2D::position).collect();
    }
    match ptgs.get(edge.ptg_index) {
        Some(ptg) => ptg
            .interpolate(edge.k, edge.ptg_dist, num_points)
            .iter()
            .map(|p| edge.start.pose.compose(p).position())
            .collect(),
        None => vec![edge.start.pose.position(), edge.end.pose.position()],
    }
}

/// Footprint outline placed at `pose`
pub fn vehicle_outline(shape: &VehicleShape, pose: &Pose2D, circle_segments: usize) -> Vec<Point2D> {
    let mut outline: Vec<Point2D> = shape
        .outline(circle_segments)
        .iter()
        .map(|p| pose.transform_point(p))
        .collect();
    match shape {
        VehicleShape::Polygon(_) => {}
        // A circle shows no heading, so close it back through the center
        VehicleShape::Radius(r) => {
            outline.push(pose.transform_point(&Point2D::new(*r, 0.0)));
            outline.push(pose.position());
        }
    }
    outline
}

fn to_tuples(points: &[Point2D]) -> Vec<(f64, f64)> {
    points.iter().map(|p| (p.x, p.y)).collect()
}

fn line(points: &[Point2D], colour: &str, width: f32) -> Plot {
    Plot::new(to_tuples(points)).line_style(LineStyle::new().colour(colour).width(width))
}

/// Builds the plot of obstacles, world box, tree, best path with vehicle
/// footprints, start and goal.
pub fn build_view(input: &PlannerInput, output: &PlannerOutput, options: &RenderOptions) -> PlannerResult<ContinuousView> {
    let (lo, hi) = (&input.world_bbox_min, &input.world_bbox_max);
    let mut view = ContinuousView::new()
        .x_range(lo.x, hi.x)
        .y_range(lo.y, hi.y)
        .x_label("x [m]")
        .y_label("y [m]");

    let bbox = [
        Point2D::new(lo.x, lo.y),
        Point2D::new(hi.x, lo.y),
        Point2D::new(hi.x, hi.y),
        Point2D::new(lo.x, hi.y),
        Point2D::new(lo.x, lo.y),
    ];
    view = view.add(line(&bbox, &options.bbox_colour, 1.0));

    if let Some(source) = input.obstacles.as_deref() {
        let obstacles = source.obstacles(0.0);
        if !obstacles.is_empty() {
            view = view.add(Plot::new(to_tuples(&obstacles.points)).point_style(
                PointStyle::new()
                    .marker(PointMarker::Square)
                    .colour(options.obstacle_colour.as_str())
                    .size(1.5),
            ));
        }
    }

    let tree = &output.motion_tree;
    if options.draw_tree_edges {
        for (_, edge) in tree.edges() {
            let pts = edge_world_points(&edge.data, &input.ptgs, options.edge_points);
            view = view.add(line(&pts, &options.tree_colour, 0.5));
        }
    }

    let path = output.best_path()?;
    for (i, node) in path.iter().enumerate() {
        if let Some(edge) = tree.edge_to_parent(node.id) {
            let pts = edge_world_points(&edge.data, &input.ptgs, options.edge_points);
            view = view.add(line(&pts, &options.path_colour, 2.0));
        }
        if options.vehicle_every_n > 0 && i % options.vehicle_every_n == 0 {
            let outline = vehicle_outline(&input.ptgs.robot_shape, &node.data.state.pose, options.circle_segments);
            view = view.add(line(&outline, &options.vehicle_colour, 1.0));
        }
    }

    for (pose, colour) in [
        (&input.state_start.pose, "#00C000"),
        (&input.state_goal.pose, "#0000FF"),
    ] {
        let outline = vehicle_outline(&input.ptgs.robot_shape, pose, options.circle_segments);
        view = view.add(line(&outline, colour, 2.0));
    }
    Ok(view)
}

/// Renders the result to an SVG file
pub fn save_svg<P: AsRef<Path>>(
    input: &PlannerInput,
    output: &PlannerOutput,
    options: &RenderOptions,
    path: P,
) -> PlannerResult<()> {
    let view = build_view(input, output, options)?;
    Page::single(&view)
        .save(path.as_ref())
        .map_err(|e| PlannerError::VisualizationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{KinematicState, Obstacles};
    use crate::path_planning::{TpsRrtStar, TpsRrtStarParams};
    use crate::ptg::CircularArcPtg;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_vehicle_outline_follows_pose() {
        let shape = VehicleShape::Polygon(vec![
            Point2D::new(1.0, 0.0),
            Point2D::new(0.0, 0.5),
            Point2D::new(0.0, -0.5),
        ]);
        let pose = Pose2D::new(2.0, 3.0, FRAC_PI_2);
        let outline = vehicle_outline(&shape, &pose, 8);
        assert_eq!(outline.len(), 4);
        assert_relative_eq!(outline[0].x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(outline[0].y, 4.0, epsilon = 1e-12);

        let circle = vehicle_outline(&VehicleShape::Radius(0.5), &pose, 8);
        assert_eq!(circle.len(), 11);
        assert_eq!(circle[10], pose.position());
    }

    #[test]
    fn test_edge_points_without_stored_path() {
        let mut ptgs = PtgSet::new(VehicleShape::Radius(0.2));
        ptgs.push(Box::new(CircularArcPtg::new(4.0, 31, 1.0, 0.2)));
        let start = KinematicState::new(Pose2D::new(1.0, 0.0, FRAC_PI_2));
        let edge = MoveEdgeSE2 {
            ptg_index: 0,
            k: 15,
            ptg_dist: 0.5,
            distance: 2.0,
            start,
            end: KinematicState::new(Pose2D::new(1.0, 2.0, FRAC_PI_2)),
            interpolated_path: None,
            cost: 2.0,
        };
        let pts = edge_world_points(&edge, &ptgs, 5);
        assert_eq!(pts.len(), 5);
        assert_relative_eq!(pts[4].x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(pts[4].y, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_save_svg() {
        let mut ptgs = PtgSet::new(VehicleShape::Radius(0.3));
        ptgs.push(Box::new(CircularArcPtg::new(4.0, 31, 1.0, 0.3)));
        let input = PlannerInput::new(
            Pose2D::origin().into(),
            Pose2D::new(3.0, 1.0, 0.0).into(),
            Obstacles::from_xy(&[1.5], &[-1.0]),
            Pose2D::new(-1.0, -2.0, 0.0),
            Pose2D::new(4.0, 2.0, 0.0),
            ptgs,
        );
        let params = TpsRrtStarParams {
            max_iterations: 200,
            ..Default::default()
        };
        let output = TpsRrtStar::new(params).plan(&input).unwrap();

        let path = std::env::temp_dir().join(format!("tps_rrt_render_{}.svg", std::process::id()));
        save_svg(&input, &output, &RenderOptions::default(), &path).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        std::fs::remove_file(&path).unwrap();
    }
}
