//! Common types used throughout tps_rrt

use std::f64::consts::PI;
use std::str::FromStr;

use nalgebra::{Isometry2, Vector2};
use serde::Deserialize;

use crate::common::error::PlannerError;

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

/// Normalize angle to (-PI, PI]
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a <= -PI {
        a += 2.0 * PI;
    } else if a > PI {
        a -= 2.0 * PI;
    }
    a
}

/// Shortest-arc difference `b - a`, in (-PI, PI]
pub fn angle_distance(a: f64, b: f64) -> f64 {
    normalize_angle(b - a)
}

/// 2D pose (position + orientation)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2D {
    /// Builds a pose, normalizing `yaw` to (-PI, PI]
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw: normalize_angle(yaw) }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, yaw: 0.0 }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    pub fn to_isometry(&self) -> Isometry2<f64> {
        Isometry2::new(Vector2::new(self.x, self.y), self.yaw)
    }

    /// `self ⊕ relative`: a pose given in this pose's frame, expressed in the
    /// frame this pose lives in.
    pub fn compose(&self, relative: &Pose2D) -> Pose2D {
        Pose2D::from(self.to_isometry() * relative.to_isometry())
    }

    /// `other ⊖ self`: `other` as seen from this pose.
    pub fn inverse_compose(&self, other: &Pose2D) -> Pose2D {
        Pose2D::from(self.to_isometry().inv_mul(&other.to_isometry()))
    }

    /// Maps a point from this pose's local frame into its parent frame.
    pub fn transform_point(&self, local: &Point2D) -> Point2D {
        let (s, c) = self.yaw.sin_cos();
        Point2D::new(
            self.x + c * local.x - s * local.y,
            self.y + s * local.x + c * local.y,
        )
    }

    /// Expresses a parent-frame point in this pose's local frame.
    pub fn inverse_transform_point(&self, global: &Point2D) -> Point2D {
        let (s, c) = self.yaw.sin_cos();
        let dx = global.x - self.x;
        let dy = global.y - self.y;
        Point2D::new(c * dx + s * dy, -s * dx + c * dy)
    }
}

impl From<Isometry2<f64>> for Pose2D {
    fn from(iso: Isometry2<f64>) -> Self {
        Self::new(iso.translation.x, iso.translation.y, iso.rotation.angle())
    }
}

/// Parses `"[x y yaw_deg]"`; brackets are optional and commas count as
/// separators.
impl FromStr for Pose2D {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('[').trim_end_matches(']');
        let values = trimmed
            .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .filter(|tok| !tok.is_empty())
            .map(|tok| {
                tok.parse::<f64>()
                    .map_err(|_| PlannerError::PoseParse(format!("`{}` in `{}`", tok, s)))
            })
            .collect::<Result<Vec<f64>, PlannerError>>()?;

        match values.as_slice() {
            [x, y, yaw_deg] => Ok(Pose2D::new(*x, *y, yaw_deg.to_radians())),
            _ => Err(PlannerError::PoseParse(format!(
                "expected `[x y yaw_deg]`, got `{}`",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Pose2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.3} {:.3} {:.2}]", self.x, self.y, self.yaw.to_degrees())
    }
}

/// Velocity of a planar body
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Twist2D {
    pub vx: f64,
    pub vy: f64,
    pub omega: f64,
}

impl Twist2D {
    pub fn new(vx: f64, vy: f64, omega: f64) -> Self {
        Self { vx, vy, omega }
    }
}

/// Pose plus (optionally) velocity of the vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicState {
    pub pose: Pose2D,
    pub twist: Option<Twist2D>,
}

impl KinematicState {
    pub fn new(pose: Pose2D) -> Self {
        Self { pose, twist: None }
    }
}

impl From<Pose2D> for KinematicState {
    fn from(pose: Pose2D) -> Self {
        Self::new(pose)
    }
}

/// Anything that can be located in SE(2)
pub trait HasPose {
    fn pose(&self) -> &Pose2D;
}

impl HasPose for Pose2D {
    fn pose(&self) -> &Pose2D {
        self
    }
}

impl HasPose for KinematicState {
    fn pose(&self) -> &Pose2D {
        &self.pose
    }
}

/// Path represented as a sequence of 2D points
#[derive(Debug, Clone)]
pub struct Path2D {
    pub points: Vec<Point2D>,
}

impl Path2D {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn from_points(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    pub fn push(&mut self, point: Point2D) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn x_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn y_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    pub fn total_length(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.points.windows(2)
            .map(|w| w[0].distance(&w[1]))
            .sum()
    }
}

impl Default for Path2D {
    fn default() -> Self {
        Self::new()
    }
}

/// Obstacle point cloud
#[derive(Debug, Clone)]
pub struct Obstacles {
    pub points: Vec<Point2D>,
}

impl Obstacles {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn from_points(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    /// Pairs up coordinate lists.
    ///
    /// # Panics
    ///
    /// Panics if `x` and `y` differ in length.
    pub fn from_xy(x: &[f64], y: &[f64]) -> Self {
        assert_eq!(x.len(), y.len());
        let points = x.iter().zip(y.iter())
            .map(|(&x, &y)| Point2D::new(x, y))
            .collect();
        Self { points }
    }

    pub fn push(&mut self, point: Point2D) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn x_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn y_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }
}

impl Default for Obstacles {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point2d_distance() {
        let p1 = Point2D::new(0.0, 0.0);
        let p2 = Point2D::new(3.0, 4.0);
        assert!((p1.distance(&p2) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_normalize_angle_range() {
        assert_relative_eq!(normalize_angle(PI), PI);
        assert_relative_eq!(normalize_angle(-PI), PI);
        assert_relative_eq!(normalize_angle(3.0 * PI), PI, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(0.5), 0.5);
        assert_relative_eq!(normalize_angle(-0.5 - 2.0 * PI), -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_angle_distance_shortest_arc() {
        let a = 170.0_f64.to_radians();
        let b = -170.0_f64.to_radians();
        assert_relative_eq!(angle_distance(a, b), 20.0_f64.to_radians(), epsilon = 1e-12);
        assert_relative_eq!(angle_distance(b, a), -20.0_f64.to_radians(), epsilon = 1e-12);
    }

    #[test]
    fn test_pose_compose_and_inverse() {
        let a = Pose2D::new(1.0, 2.0, PI / 2.0);
        let rel = Pose2D::new(1.0, 0.0, 0.0);
        let b = a.compose(&rel);
        assert_relative_eq!(b.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(b.y, 3.0, epsilon = 1e-12);
        assert_relative_eq!(b.yaw, PI / 2.0, epsilon = 1e-12);

        let back = a.inverse_compose(&b);
        assert_relative_eq!(back.x, rel.x, epsilon = 1e-12);
        assert_relative_eq!(back.y, rel.y, epsilon = 1e-12);
        assert_relative_eq!(back.yaw, rel.yaw, epsilon = 1e-12);
    }

    #[test]
    fn test_point_transforms_agree_with_compose() {
        let pose = Pose2D::new(-3.0, 0.5, 0.7);
        let local = Point2D::new(2.0, -1.0);
        let global = pose.transform_point(&local);
        let via_compose = pose.compose(&Pose2D::new(local.x, local.y, 0.0));
        assert_relative_eq!(global.x, via_compose.x, epsilon = 1e-12);
        assert_relative_eq!(global.y, via_compose.y, epsilon = 1e-12);

        let again = pose.inverse_transform_point(&global);
        assert_relative_eq!(again.x, local.x, epsilon = 1e-12);
        assert_relative_eq!(again.y, local.y, epsilon = 1e-12);
    }

    #[test]
    fn test_pose_from_str() {
        let p: Pose2D = "[1.5 -2 90]".parse().unwrap();
        assert_relative_eq!(p.x, 1.5);
        assert_relative_eq!(p.y, -2.0);
        assert_relative_eq!(p.yaw, PI / 2.0, epsilon = 1e-12);

        let q: Pose2D = "3, 4, 0".parse().unwrap();
        assert_relative_eq!(q.x, 3.0);
        assert_relative_eq!(q.y, 4.0);
    }

    #[test]
    fn test_pose_from_str_rejects_garbage() {
        assert!("[1 2]".parse::<Pose2D>().is_err());
        assert!("[1 two 3]".parse::<Pose2D>().is_err());
        assert!("".parse::<Pose2D>().is_err());
    }

    #[test]
    fn test_path2d_total_length() {
        let path = Path2D::from_points(vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(1.0, 1.0),
        ]);
        assert!((path.total_length() - 2.0).abs() < 1e-10);
    }
}
