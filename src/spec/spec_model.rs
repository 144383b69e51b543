use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::browser::driver::{PageAction, PageDriver, PageHook};
use crate::browser::locator::{FieldSelector, Locator};
use crate::error::{HarnessError, HarnessResult};
use crate::vault::templates::{CipherType, UriMatchType};

// ============================================================================
// Field keys
// ============================================================================

/// Semantic role of a page input. Login, card and identity keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    Username,
    Password,
    NewPassword,
    NewPasswordRetype,
    Totp,

    CardholderName,
    Brand,
    Number,
    ExpMonth,
    ExpYear,
    Code,

    Title,
    FirstName,
    MiddleName,
    LastName,
    Address1,
    Address2,
    Address3,
    City,
    State,
    PostalCode,
    Country,
    Company,
    Email,
    Phone,
    Ssn,
    PassportNumber,
    LicenseNumber,
}

impl FieldKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Username => "username",
            FieldKey::Password => "password",
            FieldKey::NewPassword => "newPassword",
            FieldKey::NewPasswordRetype => "newPasswordRetype",
            FieldKey::Totp => "totp",
            FieldKey::CardholderName => "cardholderName",
            FieldKey::Brand => "brand",
            FieldKey::Number => "number",
            FieldKey::ExpMonth => "expMonth",
            FieldKey::ExpYear => "expYear",
            FieldKey::Code => "code",
            FieldKey::Title => "title",
            FieldKey::FirstName => "firstName",
            FieldKey::MiddleName => "middleName",
            FieldKey::LastName => "lastName",
            FieldKey::Address1 => "address1",
            FieldKey::Address2 => "address2",
            FieldKey::Address3 => "address3",
            FieldKey::City => "city",
            FieldKey::State => "state",
            FieldKey::PostalCode => "postalCode",
            FieldKey::Country => "country",
            FieldKey::Company => "company",
            FieldKey::Email => "email",
            FieldKey::Phone => "phone",
            FieldKey::Ssn => "ssn",
            FieldKey::PassportNumber => "passportNumber",
            FieldKey::LicenseNumber => "licenseNumber",
        }
    }

    /// Password inputs get generator entries and reversed values in
    /// notification tests.
    pub fn is_password(&self) -> bool {
        matches!(
            self,
            FieldKey::Password | FieldKey::NewPassword | FieldKey::NewPasswordRetype
        )
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Test kinds
// ============================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "camelCase")]
#[value(rename_all = "camelCase")]
pub enum TestName {
    /// Scripted user entry of every field, verified, never submitted.
    FormEntry,
    /// Autofill through the inline menu's first entry.
    InlineMenuAutofill,
    /// Password generation through the inline menu.
    InlineMenuPasswordGen,
    /// Contextless autofill; the extension picks the cipher.
    MessageAutofill,
    /// Save prompt after submitting non-stored credentials.
    NewCredentialsNotification,
    /// Update prompt after submitting a stored username with a new password.
    PasswordUpdateNotification,
}

impl TestName {
    pub const ALL: [TestName; 6] = [
        TestName::FormEntry,
        TestName::InlineMenuAutofill,
        TestName::InlineMenuPasswordGen,
        TestName::MessageAutofill,
        TestName::NewCredentialsNotification,
        TestName::PasswordUpdateNotification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TestName::FormEntry => "formEntry",
            TestName::InlineMenuAutofill => "inlineMenuAutofill",
            TestName::InlineMenuPasswordGen => "inlineMenuPasswordGen",
            TestName::MessageAutofill => "messageAutofill",
            TestName::NewCredentialsNotification => "newCredentialsNotification",
            TestName::PasswordUpdateNotification => "passwordUpdateNotification",
        }
    }

    /// Step label prefix; the page URL is appended.
    pub fn describe(&self) -> &'static str {
        match self {
            TestName::FormEntry => "enter values into the form",
            TestName::InlineMenuAutofill => "fill the form via inline menu",
            TestName::InlineMenuPasswordGen => "generate and fill a new password",
            TestName::MessageAutofill => "fill the form via the autofill shortcut",
            TestName::NewCredentialsNotification => "fill the form with non-stored credentials",
            TestName::PasswordUpdateNotification => {
                "fill the form with a stored username/email and a non-stored password"
            }
        }
    }

    /// Screenshot name segment.
    pub fn artifact_suffix(&self) -> &'static str {
        match self {
            TestName::FormEntry => "form_entry",
            TestName::InlineMenuAutofill => "inline_menu",
            TestName::InlineMenuPasswordGen => "inline_menu_password_gen",
            TestName::MessageAutofill => "message_autofill",
            TestName::NewCredentialsNotification => "notification-new-cipher",
            TestName::PasswordUpdateNotification => "notification-update-cipher",
        }
    }

    /// Kinds that submit the form. Never run against public pages.
    pub fn submits_form(&self) -> bool {
        matches!(
            self,
            TestName::NewCredentialsNotification | TestName::PasswordUpdateNotification
        )
    }
}

impl fmt::Display for TestName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Fill specification
// ============================================================================

/// How one input is located, prepared, filled and judged.
#[derive(Debug, Clone)]
pub struct FillProperties {
    pub selector: FieldSelector,
    pub multi_step_next_input_key: Option<FieldKey>,
    pub pre_fill_actions: Option<PageHook>,
    /// The inline menu must not appear when this input is focused
    pub should_not_have_inline_menu: bool,
    /// The input must stay empty after autofill
    pub should_not_autofill: bool,
    /// Never fill this input from a script (honeypots)
    pub skip_simulated_user_value_entry: bool,
    pub value_to_use: String,
    pub expected_value: Option<String>,
}

impl FillProperties {
    pub fn new(selector: impl Into<FieldSelector>, value: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            multi_step_next_input_key: None,
            pre_fill_actions: None,
            should_not_have_inline_menu: false,
            should_not_autofill: false,
            skip_simulated_user_value_entry: false,
            value_to_use: value.into(),
            expected_value: None,
        }
    }

    /// Field located by a resolver closure.
    pub fn resolved<F>(resolver: F, value: impl Into<String>) -> Self
    where
        F: Fn(&mut dyn PageDriver) -> HarnessResult<Locator> + Send + Sync + 'static,
    {
        Self::new(FieldSelector::from_fn(resolver), value)
    }

    pub fn next(mut self, key: FieldKey) -> Self {
        self.multi_step_next_input_key = Some(key);
        self
    }

    pub fn pre_fill(mut self, action: impl PageAction + 'static) -> Self {
        self.pre_fill_actions = Some(PageHook::new(action));
        self
    }

    pub fn pre_fill_fn<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut dyn PageDriver) -> HarnessResult<()> + Send + Sync + 'static,
    {
        self.pre_fill_actions = Some(PageHook::from_fn(action));
        self
    }

    pub fn no_inline_menu(mut self) -> Self {
        self.should_not_have_inline_menu = true;
        self
    }

    pub fn no_autofill(mut self) -> Self {
        self.should_not_autofill = true;
        self
    }

    pub fn skip_entry(mut self) -> Self {
        self.skip_simulated_user_value_entry = true;
        self
    }

    pub fn expect(mut self, value: impl Into<String>) -> Self {
        self.expected_value = Some(value.into());
        self
    }

    /// Expected value after a fill; falls back to `value_to_use`.
    pub fn expected_value(&self) -> &str {
        self.expected_value.as_deref().unwrap_or(&self.value_to_use)
    }

    /// Expected value after an extension autofill.
    pub fn autofill_expectation(&self) -> &str {
        if self.should_not_autofill {
            ""
        } else {
            self.expected_value()
        }
    }
}

// ============================================================================
// Page-test descriptor
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct PageActions {
    pub submit: Option<PageHook>,
}

/// One page and everything the harness needs to exercise it.
#[derive(Debug, Clone)]
pub struct PageTest {
    pub url: String,
    pub cipher_type: CipherType,
    pub uri_match_type: Option<UriMatchType>,
    /// Insertion order is the traversal order
    pub inputs: IndexMap<FieldKey, FillProperties>,
    pub only_test: bool,
    pub skip_tests: Vec<TestName>,
    pub actions: PageActions,
    pub should_not_trigger_new_notification: bool,
    pub should_not_trigger_update_notification: bool,
}

impl PageTest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cipher_type: CipherType::Login,
            uri_match_type: None,
            inputs: IndexMap::new(),
            only_test: false,
            skip_tests: Vec::new(),
            actions: PageActions::default(),
            should_not_trigger_new_notification: false,
            should_not_trigger_update_notification: false,
        }
    }

    pub fn input(mut self, key: FieldKey, properties: FillProperties) -> Self {
        self.inputs.insert(key, properties);
        self
    }

    pub fn cipher(mut self, cipher_type: CipherType) -> Self {
        self.cipher_type = cipher_type;
        self
    }

    pub fn uri_match(mut self, match_type: UriMatchType) -> Self {
        self.uri_match_type = Some(match_type);
        self
    }

    pub fn only(mut self) -> Self {
        self.only_test = true;
        self
    }

    pub fn skip(mut self, kinds: &[TestName]) -> Self {
        self.skip_tests.extend_from_slice(kinds);
        self
    }

    pub fn submit_with(mut self, action: impl PageAction + 'static) -> Self {
        self.actions.submit = Some(PageHook::new(action));
        self
    }

    pub fn submit_fn<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut dyn PageDriver) -> HarnessResult<()> + Send + Sync + 'static,
    {
        self.actions.submit = Some(PageHook::from_fn(action));
        self
    }

    pub fn no_new_notification(mut self) -> Self {
        self.should_not_trigger_new_notification = true;
        self
    }

    pub fn no_update_notification(mut self) -> Self {
        self.should_not_trigger_update_notification = true;
        self
    }

    pub fn skips(&self, kind: TestName) -> bool {
        self.skip_tests.contains(&kind)
    }

    /// The multi-step successor of `key`, if it declares one that exists.
    pub fn next_input(&self, key: FieldKey) -> Option<(FieldKey, &FillProperties)> {
        let next = self.inputs.get(&key)?.multi_step_next_input_key?;
        self.inputs.get(&next).map(|props| (next, props))
    }

    /// Load-time consistency check.
    pub fn validate(&self) -> HarnessResult<()> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(HarnessError::Configuration(format!(
                "page url '{}' is not an absolute http(s) address",
                self.url
            )));
        }

        if self.inputs.is_empty() {
            return Err(HarnessError::Configuration(format!(
                "{} declares no inputs",
                self.url
            )));
        }

        for (key, props) in &self.inputs {
            if let Some(next) = props.multi_step_next_input_key {
                if !self.inputs.contains_key(&next) {
                    return Err(HarnessError::Configuration(format!(
                        "{}: {} points to missing multi-step input {}",
                        self.url, key, next
                    )));
                }
            }
        }

        // Every chain must terminate
        for start in self.inputs.keys() {
            let mut seen = HashSet::from([*start]);
            let mut current = *start;
            while let Some(next) = self.inputs[&current].multi_step_next_input_key {
                if !seen.insert(next) {
                    return Err(HarnessError::Configuration(format!(
                        "{}: multi-step chain starting at {} loops back to {}",
                        self.url, start, next
                    )));
                }
                current = next;
            }
        }

        Ok(())
    }
}

/// Validate a whole descriptor table. Also rejects duplicate URLs, which
/// would make the resume filter ambiguous.
pub fn validate_all(pages: &[PageTest]) -> HarnessResult<()> {
    let mut problems = Vec::new();
    let mut urls = HashSet::new();

    for page in pages {
        if let Err(e) = page.validate() {
            problems.push(e.to_string());
        }
        if !urls.insert(page.url.as_str()) {
            problems.push(format!("duplicate page url {}", page.url));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(HarnessError::Configuration(problems.join("; ")))
    }
}
