//! Set of trajectory generators sharing one vehicle footprint

use std::f64::consts::PI;

use serde::Deserialize;

use crate::common::{PlannerError, PlannerResult, Point2D};

use super::{CircularArcPtg, TrajectoryGenerator};

/// Vehicle footprint, used for clearance and rendering
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleShape {
    /// Closed polygon in the vehicle frame
    Polygon(Vec<Point2D>),
    /// Circle centered on the vehicle reference point
    Radius(f64),
}

impl VehicleShape {
    /// Radius of the smallest origin-centered circle containing the shape
    pub fn max_radius(&self) -> f64 {
        match self {
            VehicleShape::Polygon(vertices) => {
                vertices.iter().map(Point2D::norm).fold(0.0, f64::max)
            }
            VehicleShape::Radius(r) => *r,
        }
    }

    /// Closed outline in the vehicle frame (first vertex repeated at the end)
    pub fn outline(&self, circle_segments: usize) -> Vec<Point2D> {
        match self {
            VehicleShape::Polygon(vertices) => {
                let mut pts = vertices.clone();
                if let Some(first) = vertices.first() {
                    pts.push(*first);
                }
                pts
            }
            VehicleShape::Radius(r) => {
                let n = circle_segments.max(3);
                (0..=n)
                    .map(|i| {
                        let ang = 2.0 * PI * i as f64 / n as f64;
                        Point2D::new(r * ang.cos(), r * ang.sin())
                    })
                    .collect()
            }
        }
    }

    fn validate(&self) -> PlannerResult<()> {
        match self {
            VehicleShape::Polygon(vertices) if vertices.len() < 3 => Err(PlannerError::Config(
                format!("vehicle polygon needs at least 3 vertices, got {}", vertices.len()),
            )),
            VehicleShape::Radius(r) if !(*r > 0.0) => Err(PlannerError::Config(format!(
                "vehicle radius must be positive, got {}",
                r
            ))),
            _ => Ok(()),
        }
    }
}

/// Description of one generator in a configuration file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PtgConfig {
    CircularArc {
        ref_distance: f64,
        num_paths: usize,
        min_turning_radius: f64,
    },
}

impl PtgConfig {
    fn build(&self, clearance: f64) -> PlannerResult<Box<dyn TrajectoryGenerator>> {
        match *self {
            PtgConfig::CircularArc {
                ref_distance,
                num_paths,
                min_turning_radius,
            } => {
                if !(ref_distance > 0.0) || num_paths == 0 || !(min_turning_radius > 0.0) {
                    return Err(PlannerError::Config(format!(
                        "invalid circular_arc PTG: ref_distance={}, num_paths={}, min_turning_radius={}",
                        ref_distance, num_paths, min_turning_radius
                    )));
                }
                Ok(Box::new(CircularArcPtg::new(
                    ref_distance,
                    num_paths,
                    min_turning_radius,
                    clearance,
                )))
            }
        }
    }
}

/// Vehicle footprint plus the list of generators
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PtgSetConfig {
    pub robot_shape: VehicleShape,
    #[serde(default)]
    pub ptgs: Vec<PtgConfig>,
}

/// The generators available to the planner
#[derive(Debug)]
pub struct PtgSet {
    pub ptgs: Vec<Box<dyn TrajectoryGenerator>>,
    pub robot_shape: VehicleShape,
}

impl PtgSet {
    pub fn new(robot_shape: VehicleShape) -> Self {
        Self {
            ptgs: Vec::new(),
            robot_shape,
        }
    }

    /// Builds every configured generator with the footprint's radius as
    /// clearance
    pub fn from_config(config: &PtgSetConfig) -> PlannerResult<Self> {
        config.robot_shape.validate()?;
        let clearance = config.robot_shape.max_radius();
        let ptgs = config
            .ptgs
            .iter()
            .map(|c| c.build(clearance))
            .collect::<PlannerResult<Vec<_>>>()?;
        Ok(Self {
            ptgs,
            robot_shape: config.robot_shape.clone(),
        })
    }

    pub fn push(&mut self, ptg: Box<dyn TrajectoryGenerator>) {
        self.ptgs.push(ptg);
    }

    pub fn len(&self) -> usize {
        self.ptgs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ptgs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn TrajectoryGenerator> {
        self.ptgs.iter().map(|p| &**p)
    }

    pub fn get(&self, index: usize) -> Option<&dyn TrajectoryGenerator> {
        self.ptgs.get(index).map(|p| &**p)
    }

    /// Largest reference distance among the generators (0 when empty)
    pub fn max_ref_distance(&self) -> f64 {
        self.iter().map(|p| p.ref_distance()).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_shape_max_radius() {
        assert_relative_eq!(VehicleShape::Radius(0.4).max_radius(), 0.4);
        let poly = VehicleShape::Polygon(vec![
            Point2D::new(0.3, 0.2),
            Point2D::new(-0.3, 0.2),
            Point2D::new(-0.3, -0.2),
            Point2D::new(0.6, -0.8),
        ]);
        assert_relative_eq!(poly.max_radius(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_shape_outline_is_closed() {
        let circle = VehicleShape::Radius(1.0).outline(12);
        assert_eq!(circle.len(), 13);
        assert_relative_eq!(circle[0].x, circle[12].x, epsilon = 1e-12);
        assert_relative_eq!(circle[0].y, circle[12].y, epsilon = 1e-12);

        let poly = VehicleShape::Polygon(vec![
            Point2D::new(1.0, 0.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(-1.0, 0.0),
        ])
        .outline(12);
        assert_eq!(poly.len(), 4);
        assert_eq!(poly[0], poly[3]);
    }

    #[test]
    fn test_ptg_set_from_toml() {
        let text = r#"
            [robot_shape]
            radius = 0.5

            [[ptgs]]
            type = "circular_arc"
            ref_distance = 6.0
            num_paths = 31
            min_turning_radius = 0.8

            [[ptgs]]
            type = "circular_arc"
            ref_distance = 2.0
            num_paths = 11
            min_turning_radius = 0.3
        "#;
        let config: PtgSetConfig = toml::from_str(text).unwrap();
        let set = PtgSet::from_config(&config).unwrap();
        assert_eq!(set.len(), 2);
        assert_relative_eq!(set.max_ref_distance(), 6.0);
        let first = set.get(0).unwrap();
        assert_eq!(first.direction_count(), 31);
        assert_relative_eq!(first.max_clearance(), 0.5);
    }

    #[test]
    fn test_polygon_shape_from_toml() {
        let text = r#"
            [robot_shape]
            polygon = [{ x = 0.5, y = 0.3 }, { x = -0.3, y = 0.3 }, { x = -0.3, y = -0.3 }, { x = 0.5, y = -0.3 }]
        "#;
        let config: PtgSetConfig = toml::from_str(text).unwrap();
        assert!(matches!(config.robot_shape, VehicleShape::Polygon(ref v) if v.len() == 4));
        let set = PtgSet::from_config(&config).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let bad_shape = PtgSetConfig {
            robot_shape: VehicleShape::Radius(-1.0),
            ptgs: vec![],
        };
        assert!(PtgSet::from_config(&bad_shape).is_err());

        let bad_ptg = PtgSetConfig {
            robot_shape: VehicleShape::Radius(0.5),
            ptgs: vec![PtgConfig::CircularArc {
                ref_distance: 5.0,
                num_paths: 0,
                min_turning_radius: 1.0,
            }],
        };
        assert!(matches!(
            PtgSet::from_config(&bad_ptg),
            Err(PlannerError::Config(_))
        ));
    }
}
