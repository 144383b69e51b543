use serde::{Deserialize, Serialize};

use crate::spec::result_model::{StepResult, StepStatus};

// ============================================================================
// Test suite report: aggregates StepResult instances
// ============================================================================

/// Aggregated report for one harness run.
///
/// Built from a `Vec<StepResult>` via `from_results()`. Consumed by
/// console, HTML, and JUnit reporters to produce human-readable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteReport {
    pub suite_name: String,

    pub total: usize,

    pub passed: usize,

    pub failed: usize,

    /// Known-unsupported combinations; neither passed nor failed
    pub skipped: usize,

    /// Total execution duration in milliseconds (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,

    pub step_results: Vec<StepResult>,
}

impl TestSuiteReport {
    /// Build a suite report from a list of step results.
    pub fn from_results(suite_name: &str, results: Vec<StepResult>) -> Self {
        let count = |status: StepStatus| results.iter().filter(|r| r.status == status).count();
        let passed = count(StepStatus::Passed);
        let failed = count(StepStatus::Failed);
        let skipped = count(StepStatus::Skipped);
        Self {
            suite_name: suite_name.to_string(),
            total: results.len(),
            passed,
            failed,
            skipped,
            duration_ms: None,
            step_results: results,
        }
    }

    pub fn with_duration(mut self, duration_ms: u128) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Skips do not count against the suite.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
