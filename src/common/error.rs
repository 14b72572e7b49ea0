//! Error types for tps_rrt

use thiserror::Error;

use crate::path_planning::motion_tree::NodeId;

/// Main error type for the planner and its input/output plumbing
#[derive(Error, Debug)]
pub enum PlannerError {
    /// Malformed planner input, detected before planning starts
    #[error("Invalid planner input: {0}")]
    InvalidInput(String),

    /// Start or goal pose lies outside the world bounding box
    #[error("{what} pose {pose} lies outside the world bounding box")]
    OutOfBounds { what: &'static str, pose: String },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Cannot parse pose: {0}")]
    PoseParse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Visualization error: {0}")]
    VisualizationError(String),

    /// Query on a tree without nodes
    #[error("Motion tree is empty")]
    EmptyTree,

    #[error("Motion tree already has a root")]
    TreeNotEmpty,

    #[error("Node {0} not found in motion tree")]
    NodeNotFound(NodeId),

    /// A supposedly present node is missing, or parent links loop
    #[error("Broken motion tree: {0}")]
    BrokenTree(String),

    #[error("Re-parenting node {child} under {new_parent} would create a cycle")]
    WouldCreateCycle { child: NodeId, new_parent: NodeId },
}

impl From<toml::de::Error> for PlannerError {
    fn from(e: toml::de::Error) -> Self {
        PlannerError::Config(e.to_string())
    }
}

impl PlannerError {
    /// True for errors that signal a broken tree invariant rather than bad input
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            PlannerError::EmptyTree
                | PlannerError::TreeNotEmpty
                | PlannerError::NodeNotFound(_)
                | PlannerError::BrokenTree(_)
                | PlannerError::WouldCreateCycle { .. }
        )
    }
}

/// Result type alias for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlannerError::InvalidInput("no PTGs".to_string());
        assert_eq!(format!("{}", err), "Invalid planner input: no PTGs");

        let err = PlannerError::NodeNotFound(7);
        assert_eq!(format!("{}", err), "Node 7 not found in motion tree");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PlannerError = io_err.into();
        assert!(matches!(err, PlannerError::Io(_)));
        assert!(!err.is_internal());
    }

    #[test]
    fn test_error_from_toml() {
        let err: PlannerError = toml::from_str::<toml::Table>("= broken").unwrap_err().into();
        assert!(matches!(err, PlannerError::Config(_)));
    }

    #[test]
    fn test_internal_errors() {
        assert!(PlannerError::BrokenTree("loop".into()).is_internal());
        assert!(PlannerError::EmptyTree.is_internal());
        assert!(!PlannerError::PoseParse("x".into()).is_internal());
    }
}
