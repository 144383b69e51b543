use tracing::debug;

use crate::config::{HarnessConfig, TargetPages};
use crate::spec::spec_model::PageTest;
use crate::vault::templates::CipherType;

/// Narrow the descriptor table to the pages this run should exercise.
///
/// Filters apply in a fixed order (cipher type, host class, focus, resume)
/// and never reorder what they keep. Applying the function to its own output
/// returns the same list.
pub fn select_descriptors<'a>(all: &'a [PageTest], config: &HarnessConfig) -> Vec<&'a PageTest> {
    select_from(all.iter().collect(), config)
}

/// `select_descriptors` over an already-borrowed list.
pub fn select_from<'a>(pages: Vec<&'a PageTest>, config: &HarnessConfig) -> Vec<&'a PageTest> {
    let host = config.test_site_host();

    // Card and identity autofill are not driven end to end
    let mut selected: Vec<&PageTest> = pages
        .into_iter()
        .filter(|page| page.cipher_type == CipherType::Login)
        .filter(|page| match config.target_pages {
            TargetPages::All => true,
            TargetPages::Static => page.url.starts_with(&host),
            TargetPages::Public => !page.url.starts_with(&host),
        })
        .collect();

    if config.debug && selected.iter().any(|page| page.only_test) {
        selected.retain(|page| page.only_test);
        debug!(count = selected.len(), "focus filter applied");
        return selected;
    }

    if let Some(start) = config.start_from_url.as_deref() {
        match selected.iter().position(|page| page.url == start) {
            Some(index) if index > 0 => {
                debug!(start, skipped = index, "resuming run");
                selected.drain(..index);
            }
            _ => {}
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::spec_model::{FieldKey, FillProperties};

    fn page(url: &str) -> PageTest {
        PageTest::new(url).input(FieldKey::Username, FillProperties::new("#u", "x"))
    }

    #[test]
    fn drops_non_login_pages() {
        let pages = vec![
            page("https://127.0.0.1:8443/a"),
            page("https://127.0.0.1:8443/card").cipher(CipherType::Card),
        ];
        let selected = select_descriptors(&pages, &HarnessConfig::default());
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].url, "https://127.0.0.1:8443/a");
    }

    #[test]
    fn focus_ignored_without_debug() {
        let pages = vec![page("https://127.0.0.1:8443/a"), page("https://127.0.0.1:8443/b").only()];
        assert_eq!(select_descriptors(&pages, &HarnessConfig::default()).len(), 2);
    }
}
