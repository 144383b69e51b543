use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::browser::driver::{PageAction, PageDriver};
use crate::browser::locator::{FieldSelector, Locator, WaitState};
use crate::error::{HarnessError, HarnessResult};
use crate::spec::spec_model::{FieldKey, FillProperties, PageTest, TestName};
use crate::vault::templates::{CipherType, UriMatchType};

// ============================================================================
// YAML descriptor files
// ============================================================================
//
// Data-only form of `PageTest`: selectors are CSS strings or locator step
// lists, and hooks are lists of declarative actions.
//
// ```yaml
// pages:
//   - url: https://127.0.0.1:8443/forms/login/hidden-login
//     skipTests: [messageAutofill]
//     inputs:
//       username:
//         selector: "#username"
//         value: bwplaywright
//         multiStepNextInputKey: password
//         preFillActions:
//           - action: click
//             locator: [{by: role, role: button, name: Show login, exact: true}]
//       password:
//         selector: [{by: frame, selector: "#test-iframe"}, {by: css, selector: "#password"}]
//         value: fakeHiddenFormPassword
// ```

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorSpec {
    Css(String),
    Chain(Locator),
}

impl SelectorSpec {
    pub fn to_locator(&self) -> Locator {
        match self {
            SelectorSpec::Css(selector) => Locator::css(selector.as_str()),
            SelectorSpec::Chain(locator) => locator.clone(),
        }
    }
}

impl From<SelectorSpec> for FieldSelector {
    fn from(spec: SelectorSpec) -> Self {
        match spec {
            SelectorSpec::Css(selector) => FieldSelector::Css(selector),
            SelectorSpec::Chain(locator) => FieldSelector::from(locator),
        }
    }
}

/// One declarative page action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionSpec {
    Click {
        locator: SelectorSpec,
    },
    Fill {
        locator: SelectorSpec,
        value: String,
    },
    Press {
        locator: SelectorSpec,
        key: String,
    },
    Keyboard {
        key: String,
    },
    AcceptDialogs,
    WaitFor {
        locator: SelectorSpec,
        #[serde(default = "default_wait_state")]
        state: WaitState,
        #[serde(default = "default_wait_ms")]
        timeout_ms: u64,
    },
}

fn default_wait_state() -> WaitState {
    WaitState::Visible
}

fn default_wait_ms() -> u64 {
    15_000
}

/// Actions run in order; the first error stops the sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSequence(pub Vec<ActionSpec>);

impl PageAction for ActionSequence {
    fn run(&self, page: &mut dyn PageDriver) -> HarnessResult<()> {
        for action in &self.0 {
            match action {
                ActionSpec::Click { locator } => page.click(&locator.to_locator())?,
                ActionSpec::Fill { locator, value } => page.fill(&locator.to_locator(), value)?,
                ActionSpec::Press { locator, key } => page.press(&locator.to_locator(), key)?,
                ActionSpec::Keyboard { key } => page.keyboard_press(key)?,
                ActionSpec::AcceptDialogs => page.accept_dialogs()?,
                ActionSpec::WaitFor {
                    locator,
                    state,
                    timeout_ms,
                } => {
                    let locator = locator.to_locator();
                    if !page.wait_for(&locator, *state, *timeout_ms)? {
                        return Err(HarnessError::DriverProtocol {
                            command: "wait_for".into(),
                            error: format!("{} never became {:?}", locator, state),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FillSpecFile {
    pub selector: SelectorSpec,
    #[serde(default)]
    pub multi_step_next_input_key: Option<FieldKey>,
    #[serde(default)]
    pub pre_fill_actions: Option<ActionSequence>,
    #[serde(default)]
    pub should_not_have_inline_menu: bool,
    #[serde(default)]
    pub should_not_autofill: bool,
    #[serde(default)]
    pub skip_simulated_user_value_entry: bool,
    #[serde(alias = "value")]
    pub value_to_use: String,
    #[serde(default)]
    pub expected_value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionsFile {
    #[serde(default)]
    pub submit: Option<ActionSequence>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PageSpecFile {
    pub url: String,
    #[serde(default)]
    pub cipher_type: CipherType,
    #[serde(default)]
    pub uri_match_type: Option<UriMatchType>,
    pub inputs: IndexMap<FieldKey, FillSpecFile>,
    #[serde(default)]
    pub only_test: bool,
    #[serde(default)]
    pub skip_tests: Vec<TestName>,
    #[serde(default)]
    pub actions: ActionsFile,
    #[serde(default)]
    pub should_not_trigger_new_notification: bool,
    #[serde(default)]
    pub should_not_trigger_update_notification: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageFile {
    pub pages: Vec<PageSpecFile>,
}

impl From<FillSpecFile> for FillProperties {
    fn from(spec: FillSpecFile) -> Self {
        let mut props = FillProperties::new(spec.selector, spec.value_to_use);
        props.multi_step_next_input_key = spec.multi_step_next_input_key;
        if let Some(actions) = spec.pre_fill_actions {
            props = props.pre_fill(actions);
        }
        props.should_not_have_inline_menu = spec.should_not_have_inline_menu;
        props.should_not_autofill = spec.should_not_autofill;
        props.skip_simulated_user_value_entry = spec.skip_simulated_user_value_entry;
        props.expected_value = spec.expected_value;
        props
    }
}

impl From<PageSpecFile> for PageTest {
    fn from(spec: PageSpecFile) -> Self {
        let mut page = PageTest::new(spec.url).cipher(spec.cipher_type);
        page.uri_match_type = spec.uri_match_type;
        for (key, input) in spec.inputs {
            page.inputs.insert(key, input.into());
        }
        page.only_test = spec.only_test;
        page.skip_tests = spec.skip_tests;
        if let Some(submit) = spec.actions.submit {
            page = page.submit_with(submit);
        }
        page.should_not_trigger_new_notification = spec.should_not_trigger_new_notification;
        page.should_not_trigger_update_notification = spec.should_not_trigger_update_notification;
        page
    }
}

/// Parse a YAML descriptor document. Validation is left to the caller.
pub fn parse_page_file(content: &str) -> HarnessResult<Vec<PageTest>> {
    let file: PageFile = serde_yaml::from_str(content)?;
    Ok(file.pages.into_iter().map(PageTest::from).collect())
}

/// Load descriptors from one YAML file or every `.yaml`/`.yml` file in a
/// directory (file-name order).
pub fn load_pages(path: &Path) -> HarnessResult<Vec<PageTest>> {
    if !path.is_dir() {
        let content = std::fs::read_to_string(path)?;
        return parse_page_file(&content);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let p = entry?.path();
        if p.extension().is_some_and(|e| e == "yaml" || e == "yml") {
            files.push(p);
        }
    }
    files.sort();

    let mut pages = Vec::new();
    for file in files {
        let content = std::fs::read_to_string(&file)?;
        pages.extend(parse_page_file(&content).map_err(|e| {
            HarnessError::Configuration(format!("{}: {}", file.display(), e))
        })?);
    }
    Ok(pages)
}
