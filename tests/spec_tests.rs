use autofill_harness::browser::locator::Locator;
use autofill_harness::catalog::test_pages::builtin_pages;
use autofill_harness::spec::page_file::{load_pages, parse_page_file};
use autofill_harness::spec::spec_model::{
    FieldKey, FillProperties, PageTest, TestName, validate_all,
};
use autofill_harness::vault::templates::{CipherType, UriMatchType};

mod common;
use crate::common::fake::{FakeCall, FakeField, FakePage};

const HOST: &str = "https://127.0.0.1:8443";

// ============================================================================
// Descriptor validation
// ============================================================================

#[test]
fn dangling_multi_step_key_is_rejected() {
    let page = PageTest::new(format!("{}/forms/multi-step", HOST)).input(
        FieldKey::Username,
        FillProperties::new("#username", "x").next(FieldKey::Password),
    );
    let err = page.validate().unwrap_err().to_string();
    assert!(err.contains("password"), "{}", err);
}

#[test]
fn multi_step_cycle_is_rejected() {
    let page = PageTest::new(format!("{}/forms/multi-step", HOST))
        .input(
            FieldKey::Username,
            FillProperties::new("#username", "x").next(FieldKey::Password),
        )
        .input(
            FieldKey::Password,
            FillProperties::new("#password", "y").next(FieldKey::Username),
        );
    assert!(page.validate().is_err());
}

#[test]
fn relative_url_and_empty_inputs_are_rejected() {
    let relative = PageTest::new("/forms/login/simple")
        .input(FieldKey::Username, FillProperties::new("#username", "x"));
    assert!(relative.validate().is_err());

    let empty = PageTest::new(format!("{}/empty", HOST));
    assert!(empty.validate().is_err());
}

#[test]
fn duplicate_urls_are_rejected_across_the_table() {
    let page = || {
        PageTest::new(format!("{}/forms/login/simple", HOST))
            .input(FieldKey::Username, FillProperties::new("#username", "x"))
    };
    let err = validate_all(&[page(), page()]).unwrap_err().to_string();
    assert!(err.contains("duplicate"), "{}", err);
}

#[test]
fn expected_value_defaults_to_value_to_use() {
    let plain = FillProperties::new("#username", "bwplaywright");
    assert_eq!(plain.expected_value(), "bwplaywright");
    assert_eq!(plain.autofill_expectation(), "bwplaywright");

    let masked = FillProperties::new("#phone", "5555555555").expect("(555) 555-5555");
    assert_eq!(masked.expected_value(), "(555) 555-5555");

    let search = FillProperties::new("#search", "bwplaywright").no_autofill();
    assert_eq!(search.expected_value(), "bwplaywright");
    assert_eq!(search.autofill_expectation(), "");
}

#[test]
fn test_names_round_trip_through_camel_case() {
    for kind in TestName::ALL {
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, format!("\"{}\"", kind.as_str()));
    }
    assert_eq!(TestName::InlineMenuAutofill.as_str(), "inlineMenuAutofill");
}

// ============================================================================
// Built-in catalog
// ============================================================================

#[test]
fn catalog_honeypots_are_never_entered_or_autofilled() {
    let pages = builtin_pages(HOST);
    let honeypot = pages
        .iter()
        .find(|p| p.url.ends_with("/forms/login/login-honeypot"))
        .unwrap();

    let skipped: Vec<FieldKey> = honeypot
        .inputs
        .iter()
        .filter(|(_, props)| props.skip_simulated_user_value_entry)
        .map(|(key, _)| *key)
        .collect();
    assert_eq!(
        skipped,
        vec![FieldKey::Code, FieldKey::NewPassword, FieldKey::Email]
    );
    assert!(
        honeypot
            .inputs
            .values()
            .filter(|p| p.skip_simulated_user_value_entry)
            .all(|p| p.should_not_autofill)
    );
}

#[test]
fn catalog_urls_use_the_given_host() {
    let pages = builtin_pages("https://fixtures.test");
    assert!(pages.iter().all(|p| p.url.starts_with("https://fixtures.test/")));
}

#[test]
fn catalog_pre_fill_hooks_drive_the_page() {
    let pages = builtin_pages(HOST);
    let hidden = pages
        .iter()
        .find(|p| p.url.ends_with("/forms/login/hidden-login"))
        .unwrap();
    let hook = hidden.inputs[&FieldKey::Username]
        .pre_fill_actions
        .clone()
        .unwrap();

    let mut fake = FakePage::new("extid");
    hook.run(&mut fake).unwrap();

    let show_login = Locator::role("button", "Show login").exact();
    assert_eq!(fake.calls, vec![FakeCall::Click(show_login.to_string())]);
}

// ============================================================================
// YAML descriptor files
// ============================================================================

const CARD_PAGE: &str = r##"
pages:
  - url: https://127.0.0.1:8443/forms/payment/card
    cipherType: 3
    uriMatchType: 1
    skipTests: [inlineMenuPasswordGen]
    inputs:
      cardholderName: { selector: "#name", value: John Smith }
      number: { selector: "#card", value: "4111111111111111" }
      expMonth: { selector: "#exp-month", value: "12" }
"##;

#[test]
fn page_file_keeps_input_order_and_cipher_metadata() {
    let pages = parse_page_file(CARD_PAGE).unwrap();
    let page = &pages[0];
    assert_eq!(page.cipher_type, CipherType::Card);
    assert_eq!(page.uri_match_type, Some(UriMatchType::Host));
    assert!(page.skips(TestName::InlineMenuPasswordGen));
    let keys: Vec<FieldKey> = page.inputs.keys().copied().collect();
    assert_eq!(
        keys,
        vec![FieldKey::CardholderName, FieldKey::Number, FieldKey::ExpMonth]
    );
}

#[test]
fn page_file_actions_run_against_the_page() {
    let yaml = r##"
pages:
  - url: https://127.0.0.1:8443/forms/login/delayed
    inputs:
      username:
        selector: "#username"
        value: bwplaywright
        preFillActions:
          - { action: accept_dialogs }
          - { action: click, locator: "#reveal" }
    actions:
      submit:
        - { action: press, locator: "#username", key: Enter }
"##;
    let pages = parse_page_file(yaml).unwrap();
    let page = &pages[0];

    let mut fake = FakePage::new("extid").with_field("#username", FakeField::new());
    page.inputs[&FieldKey::Username]
        .pre_fill_actions
        .as_ref()
        .unwrap()
        .run(&mut fake)
        .unwrap();
    page.actions.submit.as_ref().unwrap().run(&mut fake).unwrap();

    assert_eq!(
        fake.calls,
        vec![
            FakeCall::AcceptDialogs,
            FakeCall::Click("#reveal".into()),
            FakeCall::Press("#username".into(), "Enter".into()),
        ]
    );
}

#[test]
fn wait_for_action_fails_when_element_never_appears() {
    let yaml = r##"
pages:
  - url: https://127.0.0.1:8443/forms/login/slow
    inputs:
      username:
        selector: "#username"
        value: bwplaywright
        preFillActions:
          - { action: wait_for, locator: "#late", timeout_ms: 1 }
"##;
    let pages = parse_page_file(yaml).unwrap();
    let hook = pages[0].inputs[&FieldKey::Username]
        .pre_fill_actions
        .clone()
        .unwrap();
    let mut fake = FakePage::new("extid");
    assert!(hook.run(&mut fake).is_err());
}

#[test]
fn load_pages_reads_directories_in_file_name_order() {
    let dir = tempfile::tempdir().unwrap();
    let page = |path: &str| {
        format!(
            "pages:\n  - url: {}{}\n    inputs:\n      username: {{ selector: \"#u\", value: x }}\n",
            HOST, path
        )
    };
    std::fs::write(dir.path().join("b.yaml"), page("/b")).unwrap();
    std::fs::write(dir.path().join("a.yml"), page("/a")).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let pages = load_pages(dir.path()).unwrap();
    let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(urls, vec![format!("{}/a", HOST), format!("{}/b", HOST)]);
}

#[test]
fn load_pages_names_the_broken_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.yaml"), "pages: [ { url: 1 ").unwrap();
    let err = load_pages(dir.path()).unwrap_err().to_string();
    assert!(err.contains("broken.yaml"), "{}", err);
}
