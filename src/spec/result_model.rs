use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::spec::spec_model::{FieldKey, TestName};

// ============================================================================
// Assertion results
// ============================================================================

/// Which verifier check produced an assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// Field value equals the expected string exactly
    Value,
    /// Inline-menu frame presence matches the descriptor
    InlineMenu,
    /// Notification surface visibility matches the descriptor
    Notification,
    /// Notification frame detached after its close control was clicked
    NotificationClosed,
}

impl CheckKind {
    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::Value => "Value",
            CheckKind::InlineMenu => "InlineMenu",
            CheckKind::Notification => "Notification",
            CheckKind::NotificationClosed => "NotificationClosed",
        }
    }
}

/// Result of evaluating a single check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionResult {
    pub check: CheckKind,

    /// Field the check was made against; `None` for page-level checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldKey>,

    pub passed: bool,

    pub expected: String,

    /// Actual value found (for debugging failed assertions)
    pub actual: String,

    /// Soft results are recorded but never stop the step
    #[serde(default)]
    pub soft: bool,
}

impl AssertionResult {
    pub fn message(&self) -> String {
        let target = self
            .field
            .map(|f| format!(" on {}", f))
            .unwrap_or_default();
        format!(
            "{}{}: expected '{}', actual '{}'",
            self.check.label(),
            target,
            self.expected,
            self.actual
        )
    }
}

// ============================================================================
// Step results
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed,
    Skipped,
}

/// Outcome of one test kind against one descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// Test kind description plus page URL
    pub label: String,
    pub kind: TestName,
    pub url: String,
    pub status: StepStatus,

    /// Attempts made; above 1 only for retried notification kinds
    pub attempts: u32,

    pub assertion_results: Vec<AssertionResult>,

    /// Failure or skip reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
}

impl StepResult {
    pub fn new(kind: TestName, url: &str) -> Self {
        Self {
            label: format!("{} ({})", kind.describe(), url),
            kind,
            url: url.to_string(),
            status: StepStatus::Passed,
            attempts: 0,
            assertion_results: Vec::new(),
            error: None,
            screenshots: Vec::new(),
            duration_ms: None,
        }
    }

    pub fn skipped(kind: TestName, url: &str, reason: impl Into<String>) -> Self {
        let mut result = Self::new(kind, url);
        result.status = StepStatus::Skipped;
        result.error = Some(reason.into());
        result
    }

    pub fn passed(&self) -> bool {
        self.status == StepStatus::Passed
    }

    pub fn failed_assertions(&self) -> impl Iterator<Item = &AssertionResult> {
        self.assertion_results.iter().filter(|a| !a.passed)
    }
}
