use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::browser::session::{BrowserSession, SessionOptions};
use crate::catalog::test_pages::builtin_pages;
use crate::config::HarnessConfig;
use crate::error::HarnessResult;
use crate::extension::setup::prepare_extension;
use crate::flags::sync_feature_flags;
use crate::report::console::format_console_report;
use crate::report::html::generate_html_report;
use crate::report::junit::generate_junit_xml;
use crate::report::report_model::TestSuiteReport;
use crate::spec::page_file;
use crate::spec::result_model::StepResult;
use crate::spec::runner::PageTestRunner;
use crate::spec::selection::select_descriptors;
use crate::spec::spec_model::{PageTest, TestName, validate_all};
use crate::vault::seeder::build_seed_plan;

/// Built-in catalog (unless excluded) followed by descriptor files, validated
/// as one table.
pub fn load_pages(
    config: &HarnessConfig,
    sources: &[PathBuf],
    include_builtin: bool,
) -> HarnessResult<Vec<PageTest>> {
    let mut pages = if include_builtin {
        builtin_pages(&config.test_site_host())
    } else {
        Vec::new()
    };
    for source in sources {
        let loaded = page_file::load_pages(source)?;
        debug!(source = %source.display(), count = loaded.len(), "loaded descriptors");
        pages.extend(loaded);
    }
    validate_all(&pages)?;
    Ok(pages)
}

// ============================================================================
// run subcommand
// ============================================================================

/// Run the selected kinds and return whether nothing failed.
pub fn cmd_run(
    config: &HarnessConfig,
    pages: &[PageTest],
    kinds: &[TestName],
    skip_setup: bool,
    format: &str,
    output: Option<&str>,
) -> HarnessResult<bool> {
    let selected = select_descriptors(pages, config);
    if selected.is_empty() {
        warn!("no pages selected, nothing to run");
        return Ok(true);
    }

    let kinds: Vec<TestName> = if kinds.is_empty() {
        TestName::ALL.to_vec()
    } else {
        kinds.to_vec()
    };
    info!(pages = selected.len(), kinds = kinds.len(), "starting run");

    let mut session = BrowserSession::launch(&SessionOptions {
        script: config.driver_script.clone(),
        extension_path: config.extension_path.clone(),
        headless: config.headless,
    })?;
    let start = std::time::Instant::now();

    let results = run_in_session(config, &kinds, &selected, skip_setup, &mut session);
    let quit = session.quit();
    let results = results?;
    quit?;

    let duration = start.elapsed().as_millis();
    let report = TestSuiteReport::from_results("autofill", results).with_duration(duration);
    let all_passed = report.all_passed();

    let output_content = render_report(&report, format);
    match output {
        Some(path) => std::fs::write(path, &output_content)?,
        None => print!("{}", output_content),
    }

    Ok(all_passed)
}

fn run_in_session(
    config: &HarnessConfig,
    kinds: &[TestName],
    selected: &[&PageTest],
    skip_setup: bool,
    session: &mut BrowserSession,
) -> HarnessResult<Vec<StepResult>> {
    if skip_setup {
        debug!("extension setup skipped");
    } else {
        prepare_extension(&mut *session, config)?;
    }
    PageTestRunner::new(config).run_suite(kinds, selected, &mut *session)
}

/// Render a report in the named format; unknown names fall back to console.
pub fn render_report(report: &TestSuiteReport, format: &str) -> String {
    match format {
        "html" => generate_html_report(report),
        "junit" => generate_junit_xml(report),
        _ => format_console_report(report),
    }
}

// ============================================================================
// list / check subcommands
// ============================================================================

/// One line per selected page: URL, then the kinds it skips.
pub fn cmd_list(config: &HarnessConfig, pages: &[PageTest]) -> String {
    let mut out = String::new();
    for page in select_descriptors(pages, config) {
        out.push_str(&page.url);
        if !page.skip_tests.is_empty() {
            let skipped: Vec<&str> = page.skip_tests.iter().map(|k| k.as_str()).collect();
            out.push_str(&format!("  (skips: {})", skipped.join(", ")));
        }
        out.push('\n');
    }
    out
}

/// Descriptors were validated on load; report what was found.
pub fn cmd_check(config: &HarnessConfig, pages: &[PageTest]) -> String {
    let selected = select_descriptors(pages, config).len();
    format!(
        "{} descriptors valid, {} selected for this configuration\n",
        pages.len(),
        selected
    )
}

// ============================================================================
// seed subcommand
// ============================================================================

pub fn cmd_seed(pages: &[PageTest], folder: &str, output: Option<&Path>) -> HarnessResult<usize> {
    let plan = build_seed_plan(pages, folder)?;
    let json = serde_json::to_string_pretty(&plan)?;
    match output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", json))?;
            info!(path = %path.display(), items = plan.items.len(), "wrote seed plan");
        }
        None => println!("{}", json),
    }
    Ok(plan.items.len())
}

// ============================================================================
// sync-flags subcommand
// ============================================================================

/// Returns the number of flags written, or `None` when no remote is configured.
pub fn cmd_sync_flags(config: &HarnessConfig, file: Option<&Path>) -> HarnessResult<Option<usize>> {
    let Some(url) = config.remote_vault_config_match.as_deref() else {
        warn!("REMOTE_VAULT_CONFIG_MATCH is not set, leaving flags untouched");
        return Ok(None);
    };
    let path = file.unwrap_or(&config.flags_file);
    Ok(Some(sync_feature_flags(url, path)?))
}
