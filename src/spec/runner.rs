use std::time::Instant;

use tracing::{debug, info, warn};

use crate::artifacts::{capture, screenshot_path};
use crate::browser::driver::PageDriver;
use crate::browser::locator::{Locator, WaitState};
use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::extension::surfaces::{ExtensionSurfaces, NotificationKind};
use crate::spec::context::TestContext;
use crate::spec::result_model::{StepResult, StepStatus};
use crate::spec::spec_model::{FieldKey, FillProperties, PageTest, TestName};
use crate::spec::verifier::Verifier;

/// How the extension is asked to fill a focused field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AutofillTrigger {
    /// First inline-menu entry (ArrowDown, Space)
    InlineMenu,
    /// Contextless autofill keyboard shortcut
    Shortcut,
}

/// Drives descriptors through each test kind against a `PageDriver`.
pub struct PageTestRunner<'a> {
    config: &'a HarnessConfig,
}

impl<'a> PageTestRunner<'a> {
    pub fn new(config: &'a HarnessConfig) -> Self {
        Self { config }
    }

    /// Run every kind against every page, kind-major like the suites it replaces.
    ///
    /// Step failures are recorded and the run moves on; only fatal errors
    /// (driver crash, I/O) end it.
    pub fn run_suite(
        &self,
        kinds: &[TestName],
        pages: &[&PageTest],
        driver: &mut dyn PageDriver,
    ) -> HarnessResult<Vec<StepResult>> {
        let mut results = Vec::with_capacity(kinds.len() * pages.len());
        for kind in kinds {
            for page in pages {
                let result = self.run(*kind, page, driver)?;
                match result.status {
                    StepStatus::Passed => info!(step = %result.label, "passed"),
                    StepStatus::Skipped => {}
                    StepStatus::Failed => warn!(
                        step = %result.label,
                        error = result.error.as_deref().unwrap_or("soft assertion failures"),
                        "failed"
                    ),
                }
                results.push(result);
            }
        }
        Ok(results)
    }

    /// Run one test kind against one descriptor.
    pub fn run(
        &self,
        kind: TestName,
        page: &PageTest,
        driver: &mut dyn PageDriver,
    ) -> HarnessResult<StepResult> {
        let started = Instant::now();

        if page.skips(kind) {
            info!(url = %page.url, kind = %kind, "skipping known failure");
            return Ok(StepResult::skipped(kind, &page.url, "known unsupported"));
        }

        let local = self.config.is_local(&page.url);
        if kind.submits_form() && !local {
            info!(url = %page.url, kind = %kind, "skipping submission on public page");
            return Ok(StepResult::skipped(
                kind,
                &page.url,
                "public pages are never submitted",
            ));
        }

        let attempts = if kind.submits_form() {
            1 + self.config.notification_retries
        } else {
            1
        };

        let mut result = StepResult::new(kind, &page.url);
        for attempt in 1..=attempts {
            let mut ctx = TestContext::new(&page.url, local, attempt);
            let outcome = self.run_descriptor(kind, page, driver, &mut ctx);

            if matches!(&outcome, Err(e) if e.is_step_failure()) {
                let target = ctx.current_field.map(|f| f.as_str()).unwrap_or("page");
                let path = screenshot_path(
                    &self.config.output_dir,
                    &page.url,
                    Some(target),
                    kind,
                    attempt,
                );
                if let Some(path) = capture(driver, path) {
                    ctx.screenshots.push(path);
                }
            }
            self.reset_page(driver, &ctx);

            result.attempts = attempt;
            let all_passed = ctx.all_passed();
            result.assertion_results = ctx.assertion_results;
            result.screenshots.extend(ctx.screenshots);

            match outcome {
                Ok(()) => {
                    result.status = if all_passed {
                        StepStatus::Passed
                    } else {
                        StepStatus::Failed
                    };
                    result.error = None;
                    break;
                }
                Err(e) if e.is_step_failure() => {
                    result.status = StepStatus::Failed;
                    result.error = Some(e.to_string());
                    if attempt < attempts {
                        warn!(url = %page.url, kind = %kind, attempt, error = %e, "retrying");
                    }
                }
                Err(e) => return Err(e),
            }
        }

        result.duration_ms = Some(started.elapsed().as_millis());
        Ok(result)
    }

    /// One attempt. Returns at the first hard failure.
    pub fn run_descriptor(
        &self,
        kind: TestName,
        page: &PageTest,
        driver: &mut dyn PageDriver,
        ctx: &mut TestContext,
    ) -> HarnessResult<()> {
        debug!(url = %page.url, kind = %kind, attempt = ctx.attempt, "starting");
        driver.goto(&page.url, self.config.timeouts.navigation_ms)?;
        driver.wait_for_load_state()?;

        let surfaces = ExtensionSurfaces::new(driver.extension_id(), self.config.notification_surface);
        let verifier = Verifier::new(&surfaces, &self.config.timeouts);

        match kind {
            TestName::FormEntry => {
                self.scripted_entry(page, driver, ctx, &verifier, |_, props| {
                    props.value_to_use.clone()
                })
            }
            TestName::InlineMenuAutofill => {
                self.extension_autofill(page, driver, ctx, &verifier, AutofillTrigger::InlineMenu)
            }
            TestName::MessageAutofill => {
                self.extension_autofill(page, driver, ctx, &verifier, AutofillTrigger::Shortcut)
            }
            TestName::InlineMenuPasswordGen => self.password_generation(page, driver, ctx, &verifier),
            TestName::NewCredentialsNotification | TestName::PasswordUpdateNotification => {
                self.scripted_entry(page, driver, ctx, &verifier, |key, props| {
                    notification_value(kind, page, key, props)
                })?;
                self.submit_and_verify(kind, page, driver, ctx, &verifier)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Test kinds
    // ------------------------------------------------------------------------

    /// Fill every field the way a user would and verify each fill.
    fn scripted_entry<F>(
        &self,
        page: &PageTest,
        driver: &mut dyn PageDriver,
        ctx: &mut TestContext,
        verifier: &Verifier<'_>,
        value_for: F,
    ) -> HarnessResult<()>
    where
        F: Fn(FieldKey, &FillProperties) -> String,
    {
        for (key, props) in &page.inputs {
            ctx.current_field = Some(*key);
            self.run_pre_fill(page, *key, props, driver, ctx);

            if props.skip_simulated_user_value_entry {
                debug!(field = %key, "skipping simulated entry");
                continue;
            }

            let locator = self.resolve_visible(page, *key, props, driver)?;
            let value = value_for(*key, props);
            driver.fill(&locator, &value)?;
            ctx.focused = Some(locator.clone());
            verifier.check_value(driver, ctx, *key, &locator, &value)?;

            if let Some((next_key, next)) = page.next_input(*key) {
                driver.press(&locator, "Enter")?;
                self.run_pre_fill(page, next_key, next, driver, ctx);
                if !next.skip_simulated_user_value_entry {
                    self.resolve_visible(page, next_key, next, driver)?;
                }
            }
        }
        Ok(())
    }

    /// Let the extension fill the form, then verify every field.
    fn extension_autofill(
        &self,
        page: &PageTest,
        driver: &mut dyn PageDriver,
        ctx: &mut TestContext,
        verifier: &Verifier<'_>,
        trigger: AutofillTrigger,
    ) -> HarnessResult<()> {
        let Some((first_key, first)) = page.inputs.first() else {
            return Ok(());
        };

        ctx.current_field = Some(*first_key);
        self.run_pre_fill(page, *first_key, first, driver, ctx);
        let first_locator = self.resolve_visible(page, *first_key, first, driver)?;
        self.trigger_autofill(driver, ctx, verifier, &first_locator, trigger)?;

        for (key, props) in &page.inputs {
            ctx.current_field = Some(*key);
            let locator = props.selector.resolve(driver)?;
            verifier.check_value(driver, ctx, *key, &locator, props.autofill_expectation())?;

            if trigger == AutofillTrigger::InlineMenu {
                let path = screenshot_path(
                    &self.config.output_dir,
                    &page.url,
                    Some(key.as_str()),
                    TestName::InlineMenuAutofill,
                    ctx.attempt,
                );
                if let Some(path) = capture(driver, path) {
                    ctx.screenshots.push(path);
                }
            }

            if let Some((next_key, next)) = page.next_input(*key) {
                driver.press(&locator, "Enter")?;
                ctx.current_field = Some(next_key);
                self.run_pre_fill(page, next_key, next, driver, ctx);
                let next_locator = self.resolve_visible(page, next_key, next, driver)?;
                self.trigger_autofill(driver, ctx, verifier, &next_locator, trigger)?;
            }
        }
        Ok(())
    }

    /// Per field: menu presence, empty start, and a generated value on
    /// password fields.
    fn password_generation(
        &self,
        page: &PageTest,
        driver: &mut dyn PageDriver,
        ctx: &mut TestContext,
        verifier: &Verifier<'_>,
    ) -> HarnessResult<()> {
        for (key, props) in &page.inputs {
            ctx.current_field = Some(*key);
            self.run_pre_fill(page, *key, props, driver, ctx);

            // Focusing a honeypot is itself a scripted interaction
            if props.skip_simulated_user_value_entry {
                continue;
            }

            let locator = self.resolve_visible(page, *key, props, driver)?;
            driver.click(&locator)?;
            ctx.focused = Some(locator.clone());

            let expect_menu = !props.should_not_have_inline_menu;
            let present = verifier.check_inline_menu(driver, ctx, *key, expect_menu)?;

            if expect_menu && present {
                verifier.check_value(driver, ctx, *key, &locator, "")?;
                if key.is_password() {
                    driver.keyboard_press("ArrowDown")?;
                    driver.keyboard_press("Space")?;
                    verifier.check_generated(driver, ctx, *key, &locator)?;
                }

                let path = screenshot_path(
                    &self.config.output_dir,
                    &page.url,
                    Some(key.as_str()),
                    TestName::InlineMenuPasswordGen,
                    ctx.attempt,
                );
                if let Some(path) = capture(driver, path) {
                    ctx.screenshots.push(path);
                }
            }

            // Unfocus so the next click reaches inputs the menu may cover
            driver.blur(&locator)?;
            driver.click_away()?;
            ctx.focused = None;
        }
        Ok(())
    }

    fn submit_and_verify(
        &self,
        kind: TestName,
        page: &PageTest,
        driver: &mut dyn PageDriver,
        ctx: &mut TestContext,
        verifier: &Verifier<'_>,
    ) -> HarnessResult<()> {
        ctx.current_field = None;
        match &page.actions.submit {
            Some(submit) => submit.run(driver)?,
            None => driver.keyboard_press("Enter")?,
        }
        driver.wait_for_load_state()?;

        let path = screenshot_path(&self.config.output_dir, &page.url, None, kind, ctx.attempt);
        if let Some(path) = capture(driver, path) {
            ctx.screenshots.push(path);
        }

        let (notification, expected) = match kind {
            TestName::PasswordUpdateNotification => (
                NotificationKind::Update,
                !page.should_not_trigger_update_notification,
            ),
            _ => (
                NotificationKind::Save,
                !page.should_not_trigger_new_notification,
            ),
        };
        verifier.check_notification(driver, ctx, notification, expected)
    }

    // ------------------------------------------------------------------------
    // Shared steps
    // ------------------------------------------------------------------------

    /// Pre-fill hooks are best-effort and run at most once per field.
    fn run_pre_fill(
        &self,
        page: &PageTest,
        key: FieldKey,
        props: &FillProperties,
        driver: &mut dyn PageDriver,
        ctx: &mut TestContext,
    ) {
        let Some(hook) = &props.pre_fill_actions else {
            return;
        };
        if !ctx.prepared.insert(key) {
            return;
        }
        match hook.run(driver) {
            Ok(()) => debug!(url = %page.url, field = %key, "pre-fill action ran"),
            Err(e) => {
                warn!(url = %page.url, field = %key, error = %e, "pre-fill action failed, continuing")
            }
        }
    }

    fn resolve_visible(
        &self,
        page: &PageTest,
        key: FieldKey,
        props: &FillProperties,
        driver: &mut dyn PageDriver,
    ) -> HarnessResult<Locator> {
        let locator = props.selector.resolve(driver)?;
        let timeout_ms = self.config.timeouts.locator_ms;
        if driver.wait_for(&locator, WaitState::Visible, timeout_ms)? {
            Ok(locator)
        } else {
            Err(HarnessError::ResolutionTimeout {
                url: page.url.clone(),
                field: key,
                locator: locator.to_string(),
                timeout_ms,
            })
        }
    }

    fn trigger_autofill(
        &self,
        driver: &mut dyn PageDriver,
        ctx: &mut TestContext,
        verifier: &Verifier<'_>,
        locator: &Locator,
        trigger: AutofillTrigger,
    ) -> HarnessResult<()> {
        driver.click(locator)?;
        ctx.focused = Some(locator.clone());
        match trigger {
            AutofillTrigger::InlineMenu => {
                if !verifier.wait_for_inline_menu(driver)? {
                    debug!(locator = %locator, "no inline menu appeared");
                }
                driver.keyboard_press("ArrowDown")?;
                driver.keyboard_press("Space")
            }
            AutofillTrigger::Shortcut => driver.keyboard_press(&self.config.autofill_shortcut),
        }
    }

    /// Dismiss menus and prompts so they do not leak into the next descriptor.
    fn reset_page(&self, driver: &mut dyn PageDriver, ctx: &TestContext) {
        if let Some(locator) = &ctx.focused {
            if let Err(e) = driver.blur(locator) {
                debug!(error = %e, "blur during reset failed");
            }
        }
        if let Err(e) = driver.click_away() {
            debug!(error = %e, "click-away during reset failed");
        }
    }
}

/// Value entered by the notification kinds.
///
/// Save prompts need credentials the vault does not hold: `password` is
/// reversed so length rules still pass and every other field, new-password
/// fields included, gets a `new+` prefix. Update prompts keep the stored username and change only the
/// password, unless the page has its own new-password field.
pub fn notification_value(
    kind: TestName,
    page: &PageTest,
    key: FieldKey,
    props: &FillProperties,
) -> String {
    let reversed = || props.value_to_use.chars().rev().collect::<String>();
    match kind {
        TestName::NewCredentialsNotification if key == FieldKey::Password => reversed(),
        TestName::NewCredentialsNotification => format!("new+{}", props.value_to_use),
        TestName::PasswordUpdateNotification => {
            let has_new_password = page.inputs.get(&FieldKey::NewPassword).is_some_and(|p| {
                !p.value_to_use.is_empty() && !p.skip_simulated_user_value_entry
            });
            if key == FieldKey::Password && !has_new_password {
                reversed()
            } else {
                props.value_to_use.clone()
            }
        }
        _ => props.value_to_use.clone(),
    }
}
