use std::collections::HashSet;
use std::path::PathBuf;

use crate::browser::locator::Locator;
use crate::error::{HarnessError, HarnessResult};
use crate::spec::result_model::AssertionResult;
use crate::spec::spec_model::FieldKey;

/// Execution state of one descriptor under one test kind.
///
/// Strict contexts (local fixture pages) turn the first failed check into
/// `HarnessError::AssertionFailed`; soft contexts (public pages) record it
/// and keep going.
#[derive(Debug, Clone)]
pub struct TestContext {
    pub url: String,

    pub strict: bool,

    /// Retry attempt, 1-based; used in screenshot names
    pub attempt: u32,

    /// Field currently being driven, for step labels
    pub current_field: Option<FieldKey>,

    /// Last element the harness focused; blurred when the step ends
    pub focused: Option<Locator>,

    /// Fields whose pre-fill hook already ran this attempt
    pub prepared: HashSet<FieldKey>,

    /// All assertion results collected during execution
    pub assertion_results: Vec<AssertionResult>,

    pub screenshots: Vec<PathBuf>,
}

impl TestContext {
    pub fn new(url: &str, strict: bool, attempt: u32) -> Self {
        TestContext {
            url: url.to_string(),
            strict,
            attempt,
            current_field: None,
            focused: None,
            prepared: HashSet::new(),
            assertion_results: Vec::new(),
            screenshots: Vec::new(),
        }
    }

    /// Record a check. Fails the step only in strict mode.
    pub fn check(&mut self, mut result: AssertionResult) -> HarnessResult<()> {
        result.soft = !self.strict;
        let failure = (!result.passed && self.strict).then(|| {
            format!("{} at {}", result.message(), self.url)
        });
        self.assertion_results.push(result);
        match failure {
            Some(message) => Err(HarnessError::AssertionFailed(message)),
            None => Ok(()),
        }
    }

    pub fn all_passed(&self) -> bool {
        self.assertion_results.iter().all(|r| r.passed)
    }

    pub fn fail_count(&self) -> usize {
        self.assertion_results.iter().filter(|r| !r.passed).count()
    }
}
