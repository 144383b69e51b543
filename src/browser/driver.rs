use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::browser::locator::{Locator, WaitState};
use crate::error::HarnessResult;

// ============================================================================
// PageDriver trait: everything the harness asks of a browser tab
// ============================================================================

/// A single browser tab with the extension loaded.
///
/// `BrowserSession` implements this over the Node.js driver process.
/// The integration tests implement it in memory (`tests/common/fake.rs`).
pub trait PageDriver {
    /// Extension id the browser assigned to the unpacked extension.
    fn extension_id(&self) -> &str;

    fn goto(&mut self, url: &str, timeout_ms: u64) -> HarnessResult<()>;

    fn current_url(&mut self) -> HarnessResult<String>;

    fn wait_for_load_state(&mut self) -> HarnessResult<()>;

    /// Returns `false` when the timeout elapses before `state` is reached.
    fn wait_for(&mut self, locator: &Locator, state: WaitState, timeout_ms: u64)
        -> HarnessResult<bool>;

    fn click(&mut self, locator: &Locator) -> HarnessResult<()>;

    fn fill(&mut self, locator: &Locator, value: &str) -> HarnessResult<()>;

    /// Press a key with `locator` focused.
    fn press(&mut self, locator: &Locator, key: &str) -> HarnessResult<()>;

    /// Press a key on whatever currently has focus.
    fn keyboard_press(&mut self, key: &str) -> HarnessResult<()>;

    fn input_value(&mut self, locator: &Locator) -> HarnessResult<String>;

    fn is_visible(&mut self, locator: &Locator) -> HarnessResult<bool>;

    fn blur(&mut self, locator: &Locator) -> HarnessResult<()>;

    /// Click the top-left corner of the page body to dismiss overlays.
    fn click_away(&mut self) -> HarnessResult<()>;

    /// URLs of every frame currently attached to the page.
    fn frame_urls(&mut self) -> HarnessResult<Vec<String>>;

    /// Click `close` and wait for the frame starting with `frame_url_prefix`
    /// to detach. Returns `false` if it is still attached at the timeout.
    fn click_and_wait_frame_detached(
        &mut self,
        close: &Locator,
        frame_url_prefix: &str,
        timeout_ms: u64,
    ) -> HarnessResult<bool>;

    /// Auto-accept any JS dialog the page raises from now on.
    fn accept_dialogs(&mut self) -> HarnessResult<()>;

    fn screenshot(&mut self, path: &Path) -> HarnessResult<()>;
}

// ============================================================================
// Page actions (pre-fill hooks, custom submit)
// ============================================================================

/// A procedure run against the page: pre-fill nudges or custom submission.
pub trait PageAction: Send + Sync {
    fn run(&self, page: &mut dyn PageDriver) -> HarnessResult<()>;
}

impl<F> PageAction for F
where
    F: Fn(&mut dyn PageDriver) -> HarnessResult<()> + Send + Sync,
{
    fn run(&self, page: &mut dyn PageDriver) -> HarnessResult<()> {
        self(page)
    }
}

/// Shared handle to a `PageAction`, cheap to clone with its descriptor.
#[derive(Clone)]
pub struct PageHook(Arc<dyn PageAction>);

impl PageHook {
    pub fn new(action: impl PageAction + 'static) -> Self {
        PageHook(Arc::new(action))
    }

    /// Wrap a closure; the explicit bound lets the closure infer its argument type.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut dyn PageDriver) -> HarnessResult<()> + Send + Sync + 'static,
    {
        PageHook(Arc::new(f))
    }

    pub fn run(&self, page: &mut dyn PageDriver) -> HarnessResult<()> {
        self.0.run(page)
    }
}

impl fmt::Debug for PageHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PageHook(..)")
    }
}

// ============================================================================
// Bounded polling
// ============================================================================

/// Poll `check` every `interval` until it returns true or `timeout` elapses.
///
/// The check runs at least once, so a zero timeout is a single probe.
pub fn poll_until<F>(timeout: Duration, interval: Duration, mut check: F) -> HarnessResult<bool>
where
    F: FnMut() -> HarnessResult<bool>,
{
    let start = Instant::now();
    loop {
        if check()? {
            return Ok(true);
        }
        if start.elapsed() >= timeout {
            return Ok(false);
        }
        std::thread::sleep(interval.min(timeout.saturating_sub(start.elapsed())));
    }
}
