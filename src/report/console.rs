use crate::report::report_model::TestSuiteReport;
use crate::spec::result_model::StepStatus;

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format a suite report for terminal output.
///
/// ```text
/// === Test Suite: autofill ===
///
/// ✓ PASS  fill the form via inline menu (https://127.0.0.1:8443/forms/login/simple) (2 checks)
/// ✗ FAIL  enter values into the form (https://127.0.0.1:8443/forms/login/hidden-login) (1 checks)
///     [FAIL] Value on username: expected 'bwplaywright', actual ''
/// - SKIP  fill the form via the autofill shortcut (https://127.0.0.1:8443/...): known unsupported
///
/// === Results: 1 passed, 1 failed, 1 skipped (3 total) ===
/// ```
pub fn format_console_report(report: &TestSuiteReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Test Suite: {} ===\n\n", report.suite_name));

    for result in &report.step_results {
        if result.status == StepStatus::Skipped {
            out.push_str(&format!(
                "- SKIP  {}: {}\n",
                result.label,
                result.error.as_deref().unwrap_or("skipped")
            ));
            continue;
        }

        let marker = if result.passed() {
            "\u{2713} PASS"
        } else {
            "\u{2717} FAIL"
        };
        let retries = if result.attempts > 1 {
            format!(", {} attempts", result.attempts)
        } else {
            String::new()
        };
        out.push_str(&format!(
            "{}  {} ({} checks{})\n",
            marker,
            result.label,
            result.assertion_results.len(),
            retries
        ));

        if let Some(ref error) = result.error {
            out.push_str(&format!("    [ERROR] {}\n", error));
        }

        for ar in result.failed_assertions() {
            let tag = if ar.soft { "SOFT" } else { "FAIL" };
            out.push_str(&format!("    [{}] {}\n", tag, ar.message()));
        }

        if !result.passed() {
            for shot in &result.screenshots {
                out.push_str(&format!("    screenshot: {}\n", shot.display()));
            }
        }
    }

    out.push_str(&format!(
        "\n=== Results: {} passed, {} failed, {} skipped ({} total)",
        report.passed, report.failed, report.skipped, report.total
    ));

    if let Some(ms) = report.duration_ms {
        let secs = ms as f64 / 1000.0;
        out.push_str(&format!(" in {:.1}s", secs));
    }

    out.push_str(" ===\n");

    out
}
