use std::time::Duration;

use tracing::{debug, info};

use crate::browser::driver::{PageDriver, poll_until};
use crate::browser::locator::{Locator, WaitState};
use crate::config::{HarnessConfig, VaultCredentials};
use crate::error::{HarnessError, HarnessResult};
use crate::extension::surfaces::ExtensionSurfaces;

/// Point the extension at `host_url` through the popup's environment page.
pub fn configure_environment(
    page: &mut dyn PageDriver,
    surfaces: &ExtensionSurfaces,
    host_url: &str,
    config: &HarnessConfig,
) -> HarnessResult<()> {
    let url = surfaces.popup_url("environment");
    page.goto(&url, config.timeouts.navigation_ms)?;

    let base_url = Locator::css("input#baseUrl");
    require(page, &base_url, WaitState::Visible, &url, config)?;
    page.fill(&base_url, host_url)?;

    page.click(&Locator::css("button[type='submit']"))?;
    // The server help text goes away once the new environment is saved
    require(page, &Locator::css("#baseUrlHelp"), WaitState::Detached, &url, config)?;

    info!(host = host_url, "environment configured");
    Ok(())
}

/// Log in with email and master password and wait for the vault tab.
pub fn log_in(
    page: &mut dyn PageDriver,
    surfaces: &ExtensionSurfaces,
    credentials: &VaultCredentials,
    config: &HarnessConfig,
) -> HarnessResult<()> {
    let login_url = surfaces.popup_url("login");
    page.goto(&login_url, config.timeouts.navigation_ms)?;

    let email = Locator::label("Email address");
    require(page, &email, WaitState::Visible, &login_url, config)?;
    page.fill(&email, &credentials.email)?;
    page.click(&Locator::role("button", "Continue"))?;

    let master_password = Locator::css("input#masterPassword");
    require(page, &master_password, WaitState::Visible, &login_url, config)?;
    page.fill(&master_password, &credentials.password)?;

    let log_in_button = Locator::role("button", "Log in with master password");
    require(page, &log_in_button, WaitState::Visible, &login_url, config)?;
    page.click(&log_in_button)?;

    let vault_url = surfaces.popup_url("tabs/vault");
    let reached = poll_until(
        Duration::from_millis(config.timeouts.navigation_ms),
        config.timeouts.poll_interval(),
        || Ok(page.current_url()? == vault_url),
    )?;
    if !reached {
        return Err(HarnessError::Navigation {
            url: vault_url,
            reason: "vault did not open after login".into(),
        });
    }

    info!(email = %credentials.email, "logged in to vault");
    Ok(())
}

/// Set the vault timeout to "Never" so the session survives the whole run.
pub fn set_vault_timeout_never(
    page: &mut dyn PageDriver,
    surfaces: &ExtensionSurfaces,
    config: &HarnessConfig,
) -> HarnessResult<()> {
    let url = surfaces.popup_url("account-security");
    page.goto(&url, config.timeouts.navigation_ms)?;

    let timeout = Locator::label("Timeout").exact();
    require(page, &timeout, WaitState::Visible, &url, config)?;
    page.click(&timeout)?;
    page.fill(&timeout, "Never")?;
    page.press(&timeout, "Enter")?;
    page.click(&Locator::role("button", "Yes"))?;

    debug!("vault timeout set to never");
    Ok(())
}

/// Environment, login and timeout in the order a fresh profile needs them.
pub fn prepare_extension(page: &mut dyn PageDriver, config: &HarnessConfig) -> HarnessResult<()> {
    let surfaces = ExtensionSurfaces::new(page.extension_id(), config.notification_surface);
    if !config.vault.host_url.is_empty() {
        configure_environment(page, &surfaces, &config.vault.host_url, config)?;
    }
    log_in(page, &surfaces, &config.vault, config)?;
    set_vault_timeout_never(page, &surfaces, config)
}

fn require(
    page: &mut dyn PageDriver,
    locator: &Locator,
    state: WaitState,
    url: &str,
    config: &HarnessConfig,
) -> HarnessResult<()> {
    if page.wait_for(locator, state, config.timeouts.locator_ms)? {
        Ok(())
    } else {
        Err(HarnessError::Navigation {
            url: url.to_string(),
            reason: format!("{} never became {:?}", locator, state),
        })
    }
}
