use tracing::debug;

use crate::browser::driver::{PageDriver, poll_until};
use crate::browser::locator::Locator;
use crate::config::Timeouts;
use crate::error::HarnessResult;
use crate::extension::surfaces::{ExtensionSurfaces, NotificationKind};
use crate::spec::context::TestContext;
use crate::spec::result_model::{AssertionResult, CheckKind};
use crate::spec::spec_model::FieldKey;

/// Checks page and extension state against a descriptor's expectations.
///
/// Every check records an `AssertionResult` in the context; whether a
/// mismatch stops the step is up to the context's strictness.
pub struct Verifier<'a> {
    pub surfaces: &'a ExtensionSurfaces,
    pub timeouts: &'a Timeouts,
}

impl<'a> Verifier<'a> {
    pub fn new(surfaces: &'a ExtensionSurfaces, timeouts: &'a Timeouts) -> Self {
        Self { surfaces, timeouts }
    }

    /// Exact string equality; no trimming or normalization.
    pub fn check_value(
        &self,
        page: &mut dyn PageDriver,
        ctx: &mut TestContext,
        field: FieldKey,
        locator: &Locator,
        expected: &str,
    ) -> HarnessResult<()> {
        let actual = page.input_value(locator)?;
        ctx.check(AssertionResult {
            check: CheckKind::Value,
            field: Some(field),
            passed: actual == expected,
            expected: expected.to_string(),
            actual,
            soft: false,
        })
    }

    /// The password generator wrote something into `locator`.
    pub fn check_generated(
        &self,
        page: &mut dyn PageDriver,
        ctx: &mut TestContext,
        field: FieldKey,
        locator: &Locator,
    ) -> HarnessResult<()> {
        let mut actual = String::new();
        let generated = poll_until(self.timeouts.inline_menu(), self.timeouts.poll_interval(), || {
            actual = page.input_value(locator)?;
            Ok(!actual.is_empty())
        })?;
        ctx.check(AssertionResult {
            check: CheckKind::Value,
            field: Some(field),
            passed: generated,
            expected: "<generated password>".into(),
            actual,
            soft: false,
        })
    }

    /// Poll for either inline-menu frame. `false` when none shows up
    /// within the inline-menu timeout.
    pub fn wait_for_inline_menu(&self, page: &mut dyn PageDriver) -> HarnessResult<bool> {
        poll_until(self.timeouts.inline_menu(), self.timeouts.poll_interval(), || {
            self.surfaces.has_inline_menu(page)
        })
    }

    /// Inline-menu presence must equal `expected`. Returns whether it is present.
    pub fn check_inline_menu(
        &self,
        page: &mut dyn PageDriver,
        ctx: &mut TestContext,
        field: FieldKey,
        expected: bool,
    ) -> HarnessResult<bool> {
        let present = self.wait_for_inline_menu(page)?;
        ctx.check(AssertionResult {
            check: CheckKind::InlineMenu,
            field: Some(field),
            passed: present == expected,
            expected: presence(expected).to_string(),
            actual: presence(present).to_string(),
            soft: false,
        })?;
        Ok(present)
    }

    /// After submission, the notification of `kind` must be visible and
    /// detach when closed, or must not be visible at all.
    pub fn check_notification(
        &self,
        page: &mut dyn PageDriver,
        ctx: &mut TestContext,
        kind: NotificationKind,
        expected: bool,
    ) -> HarnessResult<()> {
        let bar = self.surfaces.notification_bar(kind);

        if !expected {
            // Give a late prompt the same grace an inline menu gets, including
            // a bar that renders after its frame attached
            let mut framed = false;
            let visible = poll_until(self.timeouts.inline_menu(), self.timeouts.poll_interval(), || {
                framed = self.surfaces.has_notification_frame(page)?;
                Ok(framed && page.is_visible(&bar)?)
            })?;
            debug!(test_id = kind.test_id(), framed, visible, "checked absent notification");
            return ctx.check(AssertionResult {
                check: CheckKind::Notification,
                field: None,
                passed: !visible,
                expected: format!("{} hidden", kind.test_id()),
                actual: visibility(kind, visible),
                soft: false,
            });
        }

        let visible = poll_until(self.timeouts.notification(), self.timeouts.poll_interval(), || {
            page.is_visible(&bar)
        })?;
        ctx.check(AssertionResult {
            check: CheckKind::Notification,
            field: None,
            passed: visible,
            expected: format!("{} visible", kind.test_id()),
            actual: visibility(kind, visible),
            soft: false,
        })?;
        if !visible {
            return Ok(());
        }

        let detached = page.click_and_wait_frame_detached(
            &self.surfaces.notification_close(),
            &self.surfaces.notification_url(),
            self.timeouts.notification_ms,
        )?;
        ctx.check(AssertionResult {
            check: CheckKind::NotificationClosed,
            field: None,
            passed: detached,
            expected: "frame detached".into(),
            actual: if detached { "frame detached" } else { "frame attached" }.into(),
            soft: false,
        })
    }
}

fn presence(present: bool) -> &'static str {
    if present { "present" } else { "absent" }
}

fn visibility(kind: NotificationKind, visible: bool) -> String {
    format!("{} {}", kind.test_id(), if visible { "visible" } else { "hidden" })
}
