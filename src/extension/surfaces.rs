use serde::{Deserialize, Serialize};

use crate::browser::driver::PageDriver;
use crate::browser::locator::Locator;
use crate::error::HarnessResult;

/// Where the extension renders its save/update prompt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationSurface {
    /// Top-level extension frame at `notification/bar.html`
    #[default]
    ExtensionFrame,
    /// Legacy iframe injected into the page with a fixed element id
    EmbeddedIframe,
}

/// Legacy notification iframe id.
pub const EMBEDDED_NOTIFICATION_IFRAME: &str = "#bit-notification-bar-iframe";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Save,
    Update,
}

impl NotificationKind {
    pub fn test_id(&self) -> &'static str {
        match self {
            NotificationKind::Save => "save-notification-bar",
            NotificationKind::Update => "update-notification-bar",
        }
    }
}

/// Extension-owned URLs and element addresses for one loaded extension id.
#[derive(Debug, Clone)]
pub struct ExtensionSurfaces {
    base_url: String,
    notification_surface: NotificationSurface,
}

impl ExtensionSurfaces {
    pub fn new(extension_id: &str, notification_surface: NotificationSurface) -> Self {
        Self {
            base_url: format!("chrome-extension://{}/", extension_id),
            notification_surface,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Popup deep link, e.g. `popup_url("environment")`.
    pub fn popup_url(&self, route: &str) -> String {
        format!("{}popup/index.html?uilocation=popout#/{}", self.base_url, route)
    }

    /// Inline-menu frame URLs. The second variant is used when the
    /// inline-menu positioning flag is on.
    pub fn inline_menu_urls(&self) -> [String; 2] {
        [
            format!("{}overlay/button.html", self.base_url),
            format!("{}overlay/menu.html", self.base_url),
        ]
    }

    pub fn notification_url(&self) -> String {
        format!("{}notification/bar.html", self.base_url)
    }

    fn notification_scope(&self) -> Locator {
        match self.notification_surface {
            NotificationSurface::ExtensionFrame => Locator::frame_url(self.notification_url()),
            NotificationSurface::EmbeddedIframe => Locator::frame(EMBEDDED_NOTIFICATION_IFRAME),
        }
    }

    pub fn notification_bar(&self, kind: NotificationKind) -> Locator {
        self.notification_scope().then_test_id(kind.test_id())
    }

    pub fn notification_close(&self) -> Locator {
        self.notification_scope().then_role("button", "Close")
    }

    pub fn has_inline_menu(&self, page: &mut dyn PageDriver) -> HarnessResult<bool> {
        let prefixes = self.inline_menu_urls();
        Ok(page
            .frame_urls()?
            .iter()
            .any(|url| prefixes.iter().any(|p| url.starts_with(p.as_str()))))
    }

    pub fn has_notification_frame(&self, page: &mut dyn PageDriver) -> HarnessResult<bool> {
        let prefix = self.notification_url();
        Ok(page
            .frame_urls()?
            .iter()
            .any(|url| url.starts_with(&prefix)))
    }
}
