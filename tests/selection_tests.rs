use autofill_harness::catalog::test_pages::builtin_pages;
use autofill_harness::config::{HarnessConfig, TargetPages};
use autofill_harness::spec::selection::{select_descriptors, select_from};
use autofill_harness::spec::spec_model::{FieldKey, FillProperties, PageTest};
use autofill_harness::vault::templates::CipherType;

const HOST: &str = "https://127.0.0.1:8443";

fn page(url: &str) -> PageTest {
    PageTest::new(url).input(FieldKey::Username, FillProperties::new("#username", "x"))
}

fn five_pages() -> Vec<PageTest> {
    (1..=5)
        .map(|n| page(&format!("{}/page/{}", HOST, n)))
        .collect()
}

fn urls(selected: &[&PageTest]) -> Vec<String> {
    selected.iter().map(|p| p.url.clone()).collect()
}

// ============================================================================
// Resume
// ============================================================================

#[test]
fn resume_from_third_page_drops_the_first_two() {
    let pages = five_pages();
    let config = HarnessConfig {
        start_from_url: Some(format!("{}/page/3", HOST)),
        ..HarnessConfig::default()
    };
    let selected = select_descriptors(&pages, &config);
    assert_eq!(
        urls(&selected),
        vec![
            format!("{}/page/3", HOST),
            format!("{}/page/4", HOST),
            format!("{}/page/5", HOST),
        ]
    );
}

#[test]
fn resume_from_first_page_keeps_everything() {
    let pages = five_pages();
    let config = HarnessConfig {
        start_from_url: Some(format!("{}/page/1", HOST)),
        ..HarnessConfig::default()
    };
    assert_eq!(select_descriptors(&pages, &config).len(), 5);
}

#[test]
fn resume_from_unknown_url_keeps_everything() {
    let pages = five_pages();
    let config = HarnessConfig {
        start_from_url: Some("https://elsewhere.example/".into()),
        ..HarnessConfig::default()
    };
    assert_eq!(select_descriptors(&pages, &config).len(), 5);
}

// ============================================================================
// Focus
// ============================================================================

#[test]
fn focus_keeps_only_marked_pages_and_ignores_resume() {
    let mut pages = five_pages();
    pages[1] = page(&format!("{}/page/2", HOST)).only();
    pages[4] = page(&format!("{}/page/5", HOST)).only();
    let config = HarnessConfig {
        debug: true,
        start_from_url: Some(format!("{}/page/5", HOST)),
        ..HarnessConfig::default()
    };
    let selected = select_descriptors(&pages, &config);
    assert_eq!(
        urls(&selected),
        vec![format!("{}/page/2", HOST), format!("{}/page/5", HOST)]
    );
}

#[test]
fn debug_without_marked_pages_runs_everything() {
    let pages = five_pages();
    let config = HarnessConfig {
        debug: true,
        ..HarnessConfig::default()
    };
    assert_eq!(select_descriptors(&pages, &config).len(), 5);
}

// ============================================================================
// Host class and cipher type
// ============================================================================

#[test]
fn target_pages_splits_on_test_site_host() {
    let pages = vec![
        page(&format!("{}/local", HOST)),
        page("https://www.example.com/login"),
        page("https://127.0.0.1:9999/other-port"),
    ];

    let only_static = HarnessConfig {
        target_pages: TargetPages::Static,
        ..HarnessConfig::default()
    };
    assert_eq!(
        urls(&select_descriptors(&pages, &only_static)),
        vec![format!("{}/local", HOST)]
    );

    let only_public = HarnessConfig {
        target_pages: TargetPages::Public,
        ..HarnessConfig::default()
    };
    assert_eq!(select_descriptors(&pages, &only_public).len(), 2);
}

#[test]
fn port_less_host_matches_bare_host_urls() {
    let pages = vec![page("https://fixtures.test/login"), page("https://other.test/")];
    let config = HarnessConfig {
        pages_host: "https://fixtures.test".into(),
        pages_port: None,
        target_pages: TargetPages::Static,
        ..HarnessConfig::default()
    };
    assert_eq!(select_descriptors(&pages, &config).len(), 1);
}

#[test]
fn card_and_identity_pages_are_never_selected() {
    let pages = builtin_pages(HOST);
    let selected = select_descriptors(&pages, &HarnessConfig::default());
    assert!(selected.iter().all(|p| p.cipher_type == CipherType::Login));
    assert!(selected.len() < pages.len());
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn selection_is_idempotent_and_order_preserving() {
    let pages = builtin_pages(HOST);
    let configs = [
        HarnessConfig::default(),
        HarnessConfig {
            target_pages: TargetPages::Static,
            start_from_url: Some(format!("{}/forms/login/iframe-login", HOST)),
            ..HarnessConfig::default()
        },
    ];

    for config in &configs {
        let once = select_descriptors(&pages, config);
        let twice = select_from(once.clone(), config);
        assert_eq!(urls(&once), urls(&twice));

        let positions: Vec<usize> = once
            .iter()
            .map(|p| pages.iter().position(|q| q.url == p.url).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
