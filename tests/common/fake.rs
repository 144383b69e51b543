use std::collections::HashMap;
use std::path::{Path, PathBuf};

use autofill_harness::browser::driver::PageDriver;
use autofill_harness::browser::locator::{Locator, LocatorStep, WaitState};
use autofill_harness::error::{HarnessError, HarnessResult};

/// Every driver call a `FakePage` received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum FakeCall {
    Goto(String),
    Click(String),
    Fill(String, String),
    Press(String, String),
    Keyboard(String),
    Blur(String),
    ClickAway,
    AcceptDialogs,
    Screenshot(PathBuf),
}

/// One input on the fake page, keyed by its locator's display string.
#[derive(Debug, Clone, Default)]
pub struct FakeField {
    pub value: String,
    pub visible: bool,
    /// Value the simulated extension writes on inline-menu or shortcut autofill.
    pub autofill_value: Option<String>,
    /// Value the simulated password generator writes when its menu entry is chosen.
    pub generated_value: Option<String>,
    pub has_inline_menu: bool,
    /// Field shown when Enter is pressed in this one (multi-step forms).
    pub reveals: Option<String>,
}

impl FakeField {
    pub fn new() -> Self {
        Self {
            visible: true,
            ..Self::default()
        }
    }

    pub fn autofills(mut self, value: impl Into<String>) -> Self {
        self.autofill_value = Some(value.into());
        self
    }

    pub fn generates(mut self, value: impl Into<String>) -> Self {
        self.generated_value = Some(value.into());
        self
    }

    pub fn with_inline_menu(mut self) -> Self {
        self.has_inline_menu = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn reveals(mut self, locator: impl Into<String>) -> Self {
        self.reveals = Some(locator.into());
        self
    }
}

/// In-memory `PageDriver` that mimics the extension's observable behavior.
///
/// Focusing a field with `has_inline_menu` attaches the inline-menu frame;
/// ArrowDown then Space selects the first entry (generator on fields with a
/// `generated_value`, otherwise autofill of every visible field). The
/// autofill shortcut does the same. Pressing Enter in a field that
/// `reveals` another shows the next step. Pressing Enter on the keyboard,
/// or clicking a locator registered with `submit_button`, submits the form
/// and shows the configured notification.
#[derive(Debug, Default)]
pub struct FakePage {
    pub extension_id: String,
    pub fields: HashMap<String, FakeField>,
    /// Test id of the notification shown after submission, if any.
    pub notification: Option<String>,
    /// Visibility checks the bar answers hidden before it renders.
    pub notification_render_delay: u32,
    pub autofill_shortcut: String,
    pub calls: Vec<FakeCall>,
    pub fail_navigation: bool,
    /// Locators whose click raises an error (flaky pre-fill hooks).
    pub failing_clicks: Vec<String>,
    submit_buttons: Vec<String>,
    url: Option<String>,
    focused: Option<String>,
    frames: Vec<String>,
    menu_armed: bool,
    notification_open: bool,
}

impl FakePage {
    pub fn new(extension_id: impl Into<String>) -> Self {
        Self {
            extension_id: extension_id.into(),
            autofill_shortcut: "ControlOrMeta+Shift+L".to_string(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, locator: impl Into<String>, field: FakeField) -> Self {
        self.fields.insert(locator.into(), field);
        self
    }

    pub fn with_notification(mut self, test_id: impl Into<String>) -> Self {
        self.notification = Some(test_id.into());
        self
    }

    /// Attach the notification frame on submit but keep the bar hidden for
    /// the first `checks` visibility checks.
    pub fn with_late_notification(mut self, test_id: impl Into<String>, checks: u32) -> Self {
        self.notification = Some(test_id.into());
        self.notification_render_delay = checks;
        self
    }

    pub fn submit_button(mut self, locator: &Locator) -> Self {
        self.submit_buttons.push(locator.to_string());
        self
    }

    pub fn value_of(&self, locator: &str) -> Option<&str> {
        self.fields.get(locator).map(|f| f.value.as_str())
    }

    /// Fill calls issued against `locator`.
    pub fn fills_for(&self, locator: &str) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, FakeCall::Fill(target, _) if target == locator))
            .count()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                FakeCall::Screenshot(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    fn base(&self) -> String {
        format!("chrome-extension://{}/", self.extension_id)
    }

    fn menu_url(&self) -> String {
        format!("{}overlay/menu.html", self.base())
    }

    fn notification_url(&self) -> String {
        format!("{}notification/bar.html", self.base())
    }

    fn close_menu(&mut self) {
        let menu = self.menu_url();
        self.frames.retain(|f| *f != menu);
        self.menu_armed = false;
    }

    fn autofill_all(&mut self) {
        for field in self.fields.values_mut().filter(|f| f.visible) {
            if let Some(value) = &field.autofill_value {
                field.value = value.clone();
            }
        }
    }

    fn submit(&mut self) {
        if self.notification.is_some() {
            let url = self.notification_url();
            if !self.frames.contains(&url) {
                self.frames.push(url);
            }
            self.notification_open = true;
        }
    }

    fn field_mut(&mut self, key: &str) -> HarnessResult<&mut FakeField> {
        self.fields
            .get_mut(key)
            .ok_or_else(|| HarnessError::DriverProtocol {
                command: "locate".into(),
                error: format!("no element matches {}", key),
            })
    }
}

impl PageDriver for FakePage {
    fn extension_id(&self) -> &str {
        &self.extension_id
    }

    fn goto(&mut self, url: &str, _timeout_ms: u64) -> HarnessResult<()> {
        self.calls.push(FakeCall::Goto(url.to_string()));
        if self.fail_navigation {
            return Err(HarnessError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_REFUSED".into(),
            });
        }
        self.url = Some(url.to_string());
        self.focused = None;
        self.frames.clear();
        self.menu_armed = false;
        self.notification_open = false;
        let later_steps: Vec<String> = self
            .fields
            .values()
            .filter_map(|f| f.reveals.clone())
            .collect();
        for (key, field) in self.fields.iter_mut() {
            field.value.clear();
            if later_steps.contains(key) {
                field.visible = false;
            }
        }
        Ok(())
    }

    fn current_url(&mut self) -> HarnessResult<String> {
        Ok(self.url.clone().unwrap_or_else(|| "about:blank".into()))
    }

    fn wait_for_load_state(&mut self) -> HarnessResult<()> {
        Ok(())
    }

    fn wait_for(
        &mut self,
        locator: &Locator,
        state: WaitState,
        _timeout_ms: u64,
    ) -> HarnessResult<bool> {
        let field = self.fields.get(&locator.to_string());
        Ok(match state {
            WaitState::Visible => field.is_some_and(|f| f.visible),
            WaitState::Attached => field.is_some(),
            WaitState::Detached => field.is_none(),
            WaitState::Hidden => field.is_none_or(|f| !f.visible),
        })
    }

    fn click(&mut self, locator: &Locator) -> HarnessResult<()> {
        let key = locator.to_string();
        self.calls.push(FakeCall::Click(key.clone()));
        if self.failing_clicks.contains(&key) {
            return Err(HarnessError::DriverProtocol {
                command: "click".into(),
                error: format!("{} is not clickable", key),
            });
        }
        if self.submit_buttons.contains(&key) {
            self.submit();
            return Ok(());
        }
        if let Some(field) = self.fields.get(&key) {
            let has_menu = field.has_inline_menu;
            self.close_menu();
            self.focused = Some(key);
            if has_menu {
                let menu = self.menu_url();
                self.frames.push(menu);
            }
        }
        Ok(())
    }

    fn fill(&mut self, locator: &Locator, value: &str) -> HarnessResult<()> {
        let key = locator.to_string();
        self.calls.push(FakeCall::Fill(key.clone(), value.to_string()));
        self.field_mut(&key)?.value = value.to_string();
        Ok(())
    }

    fn press(&mut self, locator: &Locator, key: &str) -> HarnessResult<()> {
        let target = locator.to_string();
        self.calls.push(FakeCall::Press(target.clone(), key.to_string()));
        let reveals = self.field_mut(&target)?.reveals.clone();
        if key == "Enter" {
            if let Some(next) = reveals {
                self.close_menu();
                self.field_mut(&next)?.visible = true;
            }
        }
        self.focused = Some(target);
        Ok(())
    }

    fn keyboard_press(&mut self, key: &str) -> HarnessResult<()> {
        self.calls.push(FakeCall::Keyboard(key.to_string()));
        let menu_open = self.frames.contains(&self.menu_url());
        match key {
            "ArrowDown" if menu_open => self.menu_armed = true,
            "Space" if self.menu_armed => {
                let generated = self
                    .focused
                    .as_ref()
                    .and_then(|f| self.fields.get(f))
                    .and_then(|f| f.generated_value.clone());
                match (generated, self.focused.clone()) {
                    (Some(value), Some(focused)) => self.field_mut(&focused)?.value = value,
                    _ => self.autofill_all(),
                }
                self.close_menu();
            }
            "Enter" => self.submit(),
            _ if key == self.autofill_shortcut && self.focused.is_some() => self.autofill_all(),
            _ => {}
        }
        Ok(())
    }

    fn input_value(&mut self, locator: &Locator) -> HarnessResult<String> {
        let key = locator.to_string();
        Ok(self.field_mut(&key)?.value.clone())
    }

    fn is_visible(&mut self, locator: &Locator) -> HarnessResult<bool> {
        if let Some(prefix) = locator.frame_url_prefix() {
            if !self.frames.iter().any(|f| f.starts_with(prefix)) {
                return Ok(false);
            }
            if self.notification_open && self.notification_render_delay > 0 {
                self.notification_render_delay -= 1;
                return Ok(false);
            }
            return Ok(match locator.steps.last() {
                Some(LocatorStep::TestId { id }) => {
                    self.notification_open && self.notification.as_deref() == Some(id.as_str())
                }
                _ => self.notification_open,
            });
        }
        Ok(self
            .fields
            .get(&locator.to_string())
            .is_some_and(|f| f.visible))
    }

    fn blur(&mut self, locator: &Locator) -> HarnessResult<()> {
        self.calls.push(FakeCall::Blur(locator.to_string()));
        self.focused = None;
        self.close_menu();
        Ok(())
    }

    fn click_away(&mut self) -> HarnessResult<()> {
        self.calls.push(FakeCall::ClickAway);
        self.focused = None;
        self.close_menu();
        Ok(())
    }

    fn frame_urls(&mut self) -> HarnessResult<Vec<String>> {
        Ok(self.frames.clone())
    }

    fn click_and_wait_frame_detached(
        &mut self,
        close: &Locator,
        frame_url_prefix: &str,
        _timeout_ms: u64,
    ) -> HarnessResult<bool> {
        self.calls.push(FakeCall::Click(close.to_string()));
        let before = self.frames.len();
        self.frames.retain(|f| !f.starts_with(frame_url_prefix));
        let detached = self.frames.len() < before;
        if detached {
            self.notification_open = false;
        }
        Ok(detached)
    }

    fn accept_dialogs(&mut self) -> HarnessResult<()> {
        self.calls.push(FakeCall::AcceptDialogs);
        Ok(())
    }

    fn screenshot(&mut self, path: &Path) -> HarnessResult<()> {
        self.calls.push(FakeCall::Screenshot(path.to_path_buf()));
        Ok(())
    }
}
