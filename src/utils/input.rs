//! Loading planner inputs from files

use std::fs;
use std::path::Path;

use itertools::Itertools;
use ordered_float::OrderedFloat;
use tracing::debug;

use crate::common::{Obstacles, PlannerError, PlannerResult, Point2D, Pose2D};

/// Reads a point cloud with one `x y` pair per line.
///
/// Blank lines and lines starting with `#` or `%` are skipped; columns
/// after the second are ignored.
pub fn load_obstacles_from_text_file<P: AsRef<Path>>(path: P) -> PlannerResult<Obstacles> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let obstacles = parse_obstacles(&text)
        .map_err(|e| PlannerError::InvalidInput(format!("{}: {}", path.display(), e)))?;
    debug!(points = obstacles.len(), file = %path.display(), "obstacles loaded");
    Ok(obstacles)
}

fn parse_obstacles(text: &str) -> Result<Obstacles, String> {
    let mut obstacles = Obstacles::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('%') {
            continue;
        }
        let mut cols = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty());
        let (x, y) = match (cols.next(), cols.next()) {
            (Some(x), Some(y)) => (x, y),
            _ => return Err(format!("line {}: expected `x y`", lineno + 1)),
        };
        let parse = |s: &str| {
            s.parse::<f64>()
                .map_err(|_| format!("line {}: `{}` is not a number", lineno + 1, s))
        };
        obstacles.push(Point2D::new(parse(x)?, parse(y)?));
    }
    Ok(obstacles)
}

/// World bounding box: the obstacle bounds and the start and goal positions,
/// all grown by `margin`. Yaw spans (-PI, PI].
pub fn world_bbox_from(obstacles: &Obstacles, start: &Pose2D, goal: &Pose2D, margin: f64) -> (Pose2D, Pose2D) {
    let xs = obstacles.points.iter().map(|p| p.x).chain([start.x, goal.x]);
    let ys = obstacles.points.iter().map(|p| p.y).chain([start.y, goal.y]);
    let (x_min, x_max) = bounds(xs);
    let (y_min, y_max) = bounds(ys);
    (
        Pose2D {
            x: x_min - margin,
            y: y_min - margin,
            yaw: -std::f64::consts::PI,
        },
        Pose2D {
            x: x_max + margin,
            y: y_max + margin,
            yaw: std::f64::consts::PI,
        },
    )
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values
        .map(OrderedFloat)
        .minmax()
        .into_option()
        .map_or((0.0, 0.0), |(lo, hi)| (lo.0, hi.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    #[test]
    fn test_parse_obstacles() {
        let text = "# header\n1.0 2.0\n\n% matlab comment\n-3 4.5 ignored\n5,6\n";
        let obs = parse_obstacles(text).unwrap();
        assert_eq!(obs.len(), 3);
        assert_eq!(obs.points[1], Point2D::new(-3.0, 4.5));
        assert_eq!(obs.points[2], Point2D::new(5.0, 6.0));
    }

    #[test]
    fn test_parse_obstacles_errors() {
        assert!(parse_obstacles("1.0\n").is_err());
        assert!(parse_obstacles("1.0 abc\n").unwrap_err().contains("line 1"));
    }

    #[test]
    fn test_load_obstacles_from_file() {
        let path = std::env::temp_dir().join(format!("tps_rrt_obstacles_{}.txt", std::process::id()));
        {
            let mut f = fs::File::create(&path).unwrap();
            writeln!(f, "0 0\n1 1\n2 2").unwrap();
        }
        let obs = load_obstacles_from_text_file(&path).unwrap();
        assert_eq!(obs.len(), 3);
        fs::remove_file(&path).unwrap();

        assert!(matches!(
            load_obstacles_from_text_file("/nonexistent/obstacles.txt"),
            Err(PlannerError::Io(_))
        ));
    }

    #[test]
    fn test_world_bbox() {
        let obs = Obstacles::from_xy(&[1.0, 4.0], &[-2.0, 3.0]);
        let start = Pose2D::new(-1.0, 0.0, 0.0);
        let goal = Pose2D::new(6.0, 0.5, 0.0);
        let (lo, hi) = world_bbox_from(&obs, &start, &goal, 1.0);
        assert_relative_eq!(lo.x, -2.0);
        assert_relative_eq!(lo.y, -3.0);
        assert_relative_eq!(hi.x, 7.0);
        assert_relative_eq!(hi.y, 4.0);
        assert!(lo.yaw < hi.yaw);
    }

    #[test]
    fn test_world_bbox_without_obstacles() {
        let start = Pose2D::new(2.0, 2.0, 0.0);
        let (lo, hi) = world_bbox_from(&Obstacles::new(), &start, &start, 0.5);
        assert_relative_eq!(lo.x, 1.5);
        assert_relative_eq!(hi.y, 2.5);
    }
}
