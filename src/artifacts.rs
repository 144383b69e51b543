use std::path::{Path, PathBuf};

use tracing::warn;

use crate::browser::driver::PageDriver;
use crate::spec::spec_model::TestName;

/// Replace every character that is not ASCII alphanumeric with `-`.
pub fn format_url_to_filename(url: &str) -> String {
    url.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// `<dir>/<sanitized-url>-<target>-<kind-suffix>-attempt-<n>.png`
///
/// `target` is a field key for per-field captures and omitted for
/// page-level ones (notification captures).
pub fn screenshot_path(
    output_dir: &Path,
    url: &str,
    target: Option<&str>,
    kind: TestName,
    attempt: u32,
) -> PathBuf {
    let mut name = format_url_to_filename(url);
    if let Some(target) = target {
        name.push('-');
        name.push_str(target);
    }
    name.push_str(&format!("-{}-attempt-{}.png", kind.artifact_suffix(), attempt));
    output_dir.join(name)
}

/// Take a full-page screenshot. Failures are logged; a missing artifact
/// never fails a step.
pub fn capture(page: &mut dyn PageDriver, path: PathBuf) -> Option<PathBuf> {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!(path = %parent.display(), error = %e, "cannot create screenshot directory");
            return None;
        }
    }
    match page.screenshot(&path) {
        Ok(()) => Some(path),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "screenshot failed");
            None
        }
    }
}
