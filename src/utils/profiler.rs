//! Section timing for planner runs

use std::collections::HashMap;
use std::time::Duration;

use tracing::info;

use crate::common::PlannerObserver;

/// Accumulated timings of one named section
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SectionStats {
    pub calls: usize,
    pub total: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl SectionStats {
    fn record(&mut self, elapsed: Duration) {
        if self.calls == 0 || elapsed < self.min {
            self.min = elapsed;
        }
        self.max = self.max.max(elapsed);
        self.total += elapsed;
        self.calls += 1;
    }

    pub fn mean(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total / self.calls as u32
        }
    }
}

/// Observer collecting per-section call counts and times, logging a
/// summary when the run finishes
#[derive(Debug, Default, Clone)]
pub struct TimeProfiler {
    sections: HashMap<&'static str, SectionStats>,
    last_progress: Option<(usize, usize, Option<f64>)>,
}

impl TimeProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self, name: &str) -> Option<&SectionStats> {
        self.sections.get(name)
    }

    /// Sections sorted by total time, longest first
    pub fn summary(&self) -> Vec<(&'static str, SectionStats)> {
        let mut rows: Vec<_> = self.sections.iter().map(|(k, v)| (*k, *v)).collect();
        rows.sort_by(|a, b| b.1.total.cmp(&a.1.total).then(a.0.cmp(b.0)));
        rows
    }

    /// Plain-text table of [`summary`](Self::summary)
    pub fn report(&self) -> String {
        let mut out = format!(
            "{:<10} {:>8} {:>12} {:>12} {:>12}\n",
            "section", "calls", "total [ms]", "mean [us]", "max [us]"
        );
        for (name, s) in self.summary() {
            out.push_str(&format!(
                "{:<10} {:>8} {:>12.3} {:>12.1} {:>12.1}\n",
                name,
                s.calls,
                s.total.as_secs_f64() * 1e3,
                s.mean().as_secs_f64() * 1e6,
                s.max.as_secs_f64() * 1e6,
            ));
        }
        out
    }
}

impl PlannerObserver for TimeProfiler {
    fn section_finished(&mut self, section: &'static str, elapsed: Duration) {
        self.sections.entry(section).or_default().record(elapsed);
    }

    fn progress(&mut self, iteration: usize, tree_size: usize, best_cost: Option<f64>) {
        self.last_progress = Some((iteration, tree_size, best_cost));
    }

    fn finished(&mut self) {
        if let Some((iteration, tree_size, best_cost)) = self.last_progress {
            info!(iteration, tree_size, ?best_cost, "last progress report");
        }
        for (name, s) in self.summary() {
            info!(
                section = name,
                calls = s.calls,
                total_ms = s.total.as_secs_f64() * 1e3,
                mean_us = s.mean().as_secs_f64() * 1e6,
                "profiler"
            );
        }
    }
}
