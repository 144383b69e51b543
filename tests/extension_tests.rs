use autofill_harness::browser::locator::Locator;
use autofill_harness::config::{HarnessConfig, Timeouts, VaultCredentials};
use autofill_harness::error::HarnessError;
use autofill_harness::extension::setup::{prepare_extension, set_vault_timeout_never};
use autofill_harness::extension::surfaces::{ExtensionSurfaces, NotificationKind, NotificationSurface};

mod common;
use crate::common::fake::{FakeCall, FakeField, FakePage};

fn fast_config() -> HarnessConfig {
    HarnessConfig {
        timeouts: Timeouts {
            navigation_ms: 5,
            locator_ms: 5,
            inline_menu_ms: 0,
            notification_ms: 0,
            poll_interval_ms: 1,
        },
        vault: VaultCredentials {
            host_url: "https://vault.test".into(),
            email: "bwplaywright@example.com".into(),
            password: "master".into(),
        },
        ..HarnessConfig::default()
    }
}

fn popup_fake() -> FakePage {
    FakePage::new("extid")
        .with_field("input#baseUrl", FakeField::new())
        .with_field(&Locator::label("Email address").to_string(), FakeField::new())
        .with_field("input#masterPassword", FakeField::new())
        .with_field(
            &Locator::role("button", "Log in with master password").to_string(),
            FakeField::new(),
        )
}

// ============================================================================
// Popup setup
// ============================================================================

#[test]
fn setup_fills_environment_and_credentials_then_waits_for_vault() {
    let config = fast_config();
    let mut fake = popup_fake();

    let err = prepare_extension(&mut fake, &config).unwrap_err();

    // The fake popup never routes to the vault tab
    match err {
        HarnessError::Navigation { url, .. } => {
            assert_eq!(url, "chrome-extension://extid/popup/index.html?uilocation=popout#/tabs/vault")
        }
        other => panic!("expected navigation error, got {}", other),
    }
    assert!(
        fake.calls
            .contains(&FakeCall::Fill("input#baseUrl".into(), "https://vault.test".into()))
    );
    assert_eq!(fake.value_of("input#masterPassword"), Some("master"));
    assert_eq!(
        fake.calls[0],
        FakeCall::Goto("chrome-extension://extid/popup/index.html?uilocation=popout#/environment".into())
    );
}

#[test]
fn setup_skips_environment_without_host_url() {
    let mut config = fast_config();
    config.vault.host_url.clear();
    let mut fake = popup_fake();

    let _ = prepare_extension(&mut fake, &config);

    assert_eq!(fake.fills_for("input#baseUrl"), 0);
    assert!(matches!(&fake.calls[0], FakeCall::Goto(url) if url.ends_with("#/login")));
}

#[test]
fn missing_popup_control_is_reported() {
    let config = fast_config();
    let mut fake = FakePage::new("extid");
    let err = prepare_extension(&mut fake, &config).unwrap_err().to_string();
    assert!(err.contains("input#baseUrl"), "{}", err);
}

#[test]
fn vault_timeout_is_set_to_never() {
    let config = fast_config();
    let timeout = Locator::label("Timeout").exact();
    let mut fake = FakePage::new("extid").with_field(&timeout.to_string(), FakeField::new());
    let surfaces = ExtensionSurfaces::new("extid", NotificationSurface::ExtensionFrame);

    set_vault_timeout_never(&mut fake, &surfaces, &config).unwrap();

    assert_eq!(fake.value_of(&timeout.to_string()), Some("Never"));
    assert!(
        fake.calls
            .contains(&FakeCall::Click(Locator::role("button", "Yes").to_string()))
    );
}

// ============================================================================
// Surfaces
// ============================================================================

#[test]
fn embedded_notification_is_scoped_to_its_iframe() {
    let surfaces = ExtensionSurfaces::new("extid", NotificationSurface::EmbeddedIframe);
    let bar = surfaces.notification_bar(NotificationKind::Update);
    assert_eq!(
        bar.to_string(),
        "frame[#bit-notification-bar-iframe] >> test-id=update-notification-bar"
    );
    assert_eq!(bar.frame_url_prefix(), None);

    let framed = ExtensionSurfaces::new("extid", NotificationSurface::ExtensionFrame);
    assert_eq!(
        framed.notification_bar(NotificationKind::Save).frame_url_prefix(),
        Some("chrome-extension://extid/notification/bar.html")
    );
}
