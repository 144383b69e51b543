use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::extension::surfaces::NotificationSurface;

/// Which page hosts a run targets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TargetPages {
    #[default]
    All,
    /// Only pages served by the local test-site host
    Static,
    /// Only pages outside the local test-site host
    Public,
}

/// Bounded waits, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub navigation_ms: u64,
    pub locator_ms: u64,
    pub inline_menu_ms: u64,
    pub notification_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation_ms: 60_000,
            locator_ms: 15_000,
            inline_menu_ms: 2_000,
            notification_ms: 10_000,
            poll_interval_ms: 100,
        }
    }
}

impl Timeouts {
    pub fn inline_menu(&self) -> Duration {
        Duration::from_millis(self.inline_menu_ms)
    }

    pub fn notification(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultCredentials {
    pub host_url: String,
    pub email: String,
    pub password: String,
}

/// Everything a run needs, built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub target_pages: TargetPages,
    pub start_from_url: Option<String>,
    pub debug: bool,

    /// Scheme and host of the local fixture server, e.g. `https://127.0.0.1`
    pub pages_host: String,
    pub pages_port: Option<u16>,

    pub vault: VaultCredentials,
    /// Pattern selecting the remote config used for feature flags
    pub remote_vault_config_match: Option<String>,

    pub extension_path: PathBuf,
    pub driver_script: PathBuf,
    pub headless: bool,

    pub timeouts: Timeouts,
    /// Extra attempts for notification kinds
    pub notification_retries: u32,
    pub autofill_shortcut: String,
    pub notification_surface: NotificationSurface,

    pub output_dir: PathBuf,
    pub flags_file: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            target_pages: TargetPages::All,
            start_from_url: None,
            debug: false,
            pages_host: "https://127.0.0.1".to_string(),
            pages_port: Some(8443),
            vault: VaultCredentials::default(),
            remote_vault_config_match: None,
            extension_path: PathBuf::from("build"),
            driver_script: PathBuf::from("node/browser_server.js"),
            headless: false,
            timeouts: Timeouts::default(),
            notification_retries: 0,
            autofill_shortcut: "ControlOrMeta+Shift+L".to_string(),
            notification_surface: NotificationSurface::ExtensionFrame,
            output_dir: PathBuf::from("test-screenshots"),
            flags_file: PathBuf::from("flags.json"),
        }
    }
}

impl HarnessConfig {
    /// `pages_host[:pages_port]`, the prefix every local page URL starts with.
    pub fn test_site_host(&self) -> String {
        match self.pages_port {
            Some(port) => format!("{}:{}", self.pages_host, port),
            None => self.pages_host.clone(),
        }
    }

    pub fn is_local(&self, url: &str) -> bool {
        url.starts_with(&self.test_site_host())
    }
}

/// Notification retries: two on CI unless retries are disabled.
pub fn notification_retries(ci: bool, disable_retry: bool) -> u32 {
    if ci && !disable_retry { 2 } else { 0 }
}
