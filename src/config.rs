//! TOML configuration: vehicle footprint, PTGs and planner parameters
//!
//! ```toml
//! [robot_shape]
//! radius = 0.5
//!
//! [[ptgs]]
//! type = "circular_arc"
//! ref_distance = 6.0
//! num_paths = 31
//! min_turning_radius = 0.8
//!
//! [planner]
//! max_iterations = 3000
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::common::PlannerResult;
use crate::path_planning::TpsRrtStarParams;
use crate::ptg::{PtgSet, PtgSetConfig};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlannerConfig {
    #[serde(flatten)]
    pub ptg_set: PtgSetConfig,
    #[serde(default)]
    pub planner: TpsRrtStarParams,
}

impl PlannerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> PlannerResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        debug!(file = %path.display(), ptgs = config.ptg_set.ptgs.len(), "configuration loaded");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> PlannerResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn build_ptgs(&self) -> PlannerResult<PtgSet> {
        PtgSet::from_config(&self.ptg_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PlannerError;
    use crate::ptg::VehicleShape;

    #[test]
    fn test_planner_section_is_optional() {
        let config = PlannerConfig::from_toml(
            r#"
            [robot_shape]
            radius = 0.4

            [[ptgs]]
            type = "circular_arc"
            ref_distance = 5.0
            num_paths = 21
            min_turning_radius = 1.0
            "#,
        )
        .unwrap();
        assert_eq!(config.planner, TpsRrtStarParams::default());
        assert_eq!(config.ptg_set.robot_shape, VehicleShape::Radius(0.4));
        assert_eq!(config.build_ptgs().unwrap().len(), 1);
    }

    #[test]
    fn test_planner_overrides() {
        let config = PlannerConfig::from_toml(
            r#"
            [robot_shape]
            radius = 0.4

            [planner]
            max_iterations = 123
            goal_bias = 0.2
            max_planning_time = 1.5
            "#,
        )
        .unwrap();
        assert_eq!(config.planner.max_iterations, 123);
        assert_eq!(config.planner.goal_bias, 0.2);
        assert_eq!(config.planner.max_planning_time, Some(1.5));
        assert_eq!(config.planner.min_step_length, 0.25);
    }

    #[test]
    fn test_bad_toml_is_a_config_error() {
        let err = PlannerConfig::from_toml("[robot_shape]\nradius = \"big\"\n").unwrap_err();
        assert!(matches!(err, PlannerError::Config(_)));
        assert!(matches!(
            PlannerConfig::load("/nonexistent/ptgs.toml"),
            Err(PlannerError::Io(_))
        ));
    }
}
