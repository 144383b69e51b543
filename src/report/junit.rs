use crate::report::report_model::TestSuiteReport;
use crate::spec::result_model::StepStatus;

// ============================================================================
// JUnit XML reporter: standard CI integration format
// ============================================================================

/// Generate a JUnit XML report for CI systems.
///
/// Test kinds become `classname`, step labels become `name`; skipped steps
/// carry a `<skipped/>` element with the reason.
pub fn generate_junit_xml(report: &TestSuiteReport) -> String {
    let time_attr = report
        .duration_ms
        .map(|ms| format!(" time=\"{:.3}\"", ms as f64 / 1000.0))
        .unwrap_or_default();

    let mut cases = String::new();
    for result in &report.step_results {
        let open = format!(
            "  <testcase name=\"{}\" classname=\"autofill-harness.{}\"",
            escape_xml(&result.label),
            result.kind.as_str()
        );

        match result.status {
            StepStatus::Passed => {
                cases.push_str(&open);
                cases.push_str(" />\n");
            }
            StepStatus::Skipped => {
                cases.push_str(&format!(
                    "{}>\n    <skipped message=\"{}\" />\n  </testcase>\n",
                    open,
                    escape_xml(result.error.as_deref().unwrap_or("skipped"))
                ));
            }
            StepStatus::Failed => {
                let mut body_parts: Vec<String> =
                    result.failed_assertions().map(|ar| ar.message()).collect();
                let failure_count = body_parts.len();
                if let Some(error) = &result.error {
                    body_parts.push(format!("Error: {}", error));
                }
                for shot in &result.screenshots {
                    body_parts.push(format!("Screenshot: {}", shot.display()));
                }

                let failure_message = if failure_count > 0 {
                    format!("{} check(s) failed", failure_count)
                } else {
                    "execution error".to_string()
                };

                cases.push_str(&format!(
                    "{open}>\n    <failure message=\"{message}\" type=\"AssertionFailure\">{body}</failure>\n  </testcase>\n",
                    open = open,
                    message = escape_xml(&failure_message),
                    body = escape_xml(&body_parts.join("\n")),
                ));
            }
        }
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuite name=\"{name}\" tests=\"{tests}\" failures=\"{failures}\" skipped=\"{skipped}\"{time}>\n{cases}</testsuite>\n",
        name = escape_xml(&report.suite_name),
        tests = report.total,
        failures = report.failed,
        skipped = report.skipped,
        time = time_attr,
        cases = cases,
    )
}

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
