//! Common traits defining the planner's collaborator interfaces

use std::sync::Arc;
use std::time::Duration;

use crate::common::types::Obstacles;

/// Provider of obstacle points in the world frame
pub trait ObstacleSource: Send + Sync {
    /// Snapshot of the obstacles at `timestamp` (seconds)
    fn obstacles(&self, timestamp: f64) -> Arc<Obstacles>;
}

/// Receives profiling and progress events from a running planner.
///
/// All methods default to no-ops, so implementors only override what they
/// care about.
pub trait PlannerObserver {
    /// A named section of the planning loop starts
    fn section_started(&mut self, _section: &'static str) {}

    /// A named section finished after `elapsed`
    fn section_finished(&mut self, _section: &'static str, _elapsed: Duration) {}

    /// Periodic progress report
    fn progress(&mut self, _iteration: usize, _tree_size: usize, _best_cost: Option<f64>) {}

    /// The planning run is over
    fn finished(&mut self) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl PlannerObserver for NullObserver {}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingObserver {
        started: usize,
        finished: usize,
    }

    impl PlannerObserver for CountingObserver {
        fn section_started(&mut self, _section: &'static str) {
            self.started += 1;
        }

        fn section_finished(&mut self, _section: &'static str, _elapsed: Duration) {
            self.finished += 1;
        }
    }

    #[test]
    fn test_observer_defaults_are_noops() {
        let mut obs = CountingObserver { started: 0, finished: 0 };
        obs.section_started("plan");
        obs.progress(1, 2, None);
        obs.section_finished("plan", Duration::from_millis(1));
        obs.finished();
        assert_eq!(obs.started, 1);
        assert_eq!(obs.finished, 1);

        let mut null = NullObserver;
        null.section_started("plan");
        null.finished();
    }
}
