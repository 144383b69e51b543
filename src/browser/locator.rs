use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::browser::driver::PageDriver;
use crate::error::HarnessResult;

/// One hop in a locator chain, interpreted by browser_server.js.
///
/// Chains are evaluated left to right; frame steps switch the search root
/// into a child frame so later steps can reach inputs a plain CSS selector
/// cannot (iframes, open shadow roots via label/role lookups).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum LocatorStep {
    Css {
        selector: String,
    },
    /// Enter the iframe matched by a CSS selector
    Frame {
        selector: String,
    },
    /// Enter the first frame whose URL starts with `prefix`
    FrameUrl {
        prefix: String,
    },
    Label {
        text: String,
        #[serde(default)]
        exact: bool,
    },
    Role {
        role: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default)]
        exact: bool,
    },
    TestId {
        id: String,
    },
    Text {
        text: String,
        #[serde(default)]
        exact: bool,
    },
}

impl fmt::Display for LocatorStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocatorStep::Css { selector } => write!(f, "{}", selector),
            LocatorStep::Frame { selector } => write!(f, "frame[{}]", selector),
            LocatorStep::FrameUrl { prefix } => write!(f, "frame-url[{}]", prefix),
            LocatorStep::Label { text, .. } => write!(f, "label={}", text),
            LocatorStep::Role { role, name, .. } => match name {
                Some(name) => write!(f, "role={}[name=\"{}\"]", role, name),
                None => write!(f, "role={}", role),
            },
            LocatorStep::TestId { id } => write!(f, "test-id={}", id),
            LocatorStep::Text { text, .. } => write!(f, "text={}", text),
        }
    }
}

/// A serializable element address. Always resolves to the first match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator {
    pub steps: Vec<LocatorStep>,
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            steps: vec![LocatorStep::Css {
                selector: selector.into(),
            }],
        }
    }

    pub fn frame(selector: impl Into<String>) -> Self {
        Self {
            steps: vec![LocatorStep::Frame {
                selector: selector.into(),
            }],
        }
    }

    pub fn frame_url(prefix: impl Into<String>) -> Self {
        Self {
            steps: vec![LocatorStep::FrameUrl {
                prefix: prefix.into(),
            }],
        }
    }

    pub fn label(text: impl Into<String>) -> Self {
        Self::default().then_label(text)
    }

    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::default().then_role(role, name)
    }

    pub fn then_css(mut self, selector: impl Into<String>) -> Self {
        self.steps.push(LocatorStep::Css {
            selector: selector.into(),
        });
        self
    }

    pub fn then_label(mut self, text: impl Into<String>) -> Self {
        self.steps.push(LocatorStep::Label {
            text: text.into(),
            exact: false,
        });
        self
    }

    pub fn then_role(mut self, role: impl Into<String>, name: impl Into<String>) -> Self {
        self.steps.push(LocatorStep::Role {
            role: role.into(),
            name: Some(name.into()),
            exact: false,
        });
        self
    }

    pub fn then_test_id(mut self, id: impl Into<String>) -> Self {
        self.steps.push(LocatorStep::TestId { id: id.into() });
        self
    }

    pub fn then_text(mut self, text: impl Into<String>) -> Self {
        self.steps.push(LocatorStep::Text {
            text: text.into(),
            exact: false,
        });
        self
    }

    /// Require exact name/text matching on the last step.
    pub fn exact(mut self) -> Self {
        if let Some(
            LocatorStep::Label { exact, .. }
            | LocatorStep::Role { exact, .. }
            | LocatorStep::Text { exact, .. },
        ) = self.steps.last_mut()
        {
            *exact = true;
        }
        self
    }

    /// URL prefix of the frame this locator is scoped to, if any.
    pub fn frame_url_prefix(&self) -> Option<&str> {
        self.steps.iter().find_map(|step| match step {
            LocatorStep::FrameUrl { prefix } => Some(prefix.as_str()),
            _ => None,
        })
    }
}

impl Default for Locator {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.steps.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", parts.join(" >> "))
    }
}

/// Wait condition for `PageDriver::wait_for`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitState {
    Visible,
    Attached,
    Detached,
    Hidden,
}

// ============================================================================
// Field locator capability
// ============================================================================

/// Produces the locator for a field, given access to the live page.
pub trait ResolveLocator: Send + Sync {
    fn resolve(&self, page: &mut dyn PageDriver) -> HarnessResult<Locator>;
}

impl ResolveLocator for Locator {
    fn resolve(&self, _page: &mut dyn PageDriver) -> HarnessResult<Locator> {
        Ok(self.clone())
    }
}

impl<F> ResolveLocator for F
where
    F: Fn(&mut dyn PageDriver) -> HarnessResult<Locator> + Send + Sync,
{
    fn resolve(&self, page: &mut dyn PageDriver) -> HarnessResult<Locator> {
        self(page)
    }
}

/// How a descriptor field finds its element: a static CSS selector, or a
/// resolver that can cross frame and shadow boundaries.
#[derive(Clone)]
pub enum FieldSelector {
    Css(String),
    Resolver(Arc<dyn ResolveLocator>),
}

impl FieldSelector {
    pub fn resolver(resolver: impl ResolveLocator + 'static) -> Self {
        FieldSelector::Resolver(Arc::new(resolver))
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut dyn PageDriver) -> HarnessResult<Locator> + Send + Sync + 'static,
    {
        FieldSelector::Resolver(Arc::new(f))
    }

    pub fn resolve(&self, page: &mut dyn PageDriver) -> HarnessResult<Locator> {
        match self {
            FieldSelector::Css(selector) => Ok(Locator::css(selector.as_str())),
            FieldSelector::Resolver(resolver) => resolver.resolve(page),
        }
    }
}

impl fmt::Debug for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSelector::Css(selector) => f.debug_tuple("Css").field(selector).finish(),
            FieldSelector::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

impl From<&str> for FieldSelector {
    fn from(selector: &str) -> Self {
        FieldSelector::Css(selector.to_string())
    }
}

impl From<String> for FieldSelector {
    fn from(selector: String) -> Self {
        FieldSelector::Css(selector)
    }
}

impl From<Locator> for FieldSelector {
    fn from(locator: Locator) -> Self {
        FieldSelector::resolver(locator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_steps() {
        let locator = Locator::frame("#test-iframe").then_css("#username");
        assert_eq!(locator.to_string(), "frame[#test-iframe] >> #username");
    }

    #[test]
    fn exact_applies_to_last_step() {
        let locator = Locator::role("button", "Login").exact();
        assert_eq!(
            locator.steps[0],
            LocatorStep::Role {
                role: "button".into(),
                name: Some("Login".into()),
                exact: true,
            }
        );
    }

    #[test]
    fn serializes_as_step_list() {
        let locator = Locator::frame("#f").then_css("#u");
        let json = serde_json::to_value(&locator).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"by": "frame", "selector": "#f"},
                {"by": "css", "selector": "#u"}
            ])
        );
    }
}
