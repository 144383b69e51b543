use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::browser::driver::PageDriver;
use crate::browser::locator::{Locator, WaitState};
use crate::error::{HarnessError, HarnessResult};

/// Request sent to browser_server.js over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BrowserRequest {
    Goto {
        url: String,
        timeout_ms: u64,
    },
    CurrentUrl,
    WaitForLoadState,
    WaitFor {
        locator: Locator,
        state: WaitState,
        timeout_ms: u64,
    },
    Click {
        locator: Locator,
    },
    Fill {
        locator: Locator,
        value: String,
    },
    Press {
        locator: Locator,
        key: String,
    },
    Keyboard {
        key: String,
    },
    InputValue {
        locator: Locator,
    },
    IsVisible {
        locator: Locator,
    },
    Blur {
        locator: Locator,
    },
    ClickAway,
    Frames,
    CloseFrame {
        close: Locator,
        frame_url_prefix: String,
        timeout_ms: u64,
    },
    AcceptDialogs,
    Screenshot {
        path: String,
    },
    Quit,
}

impl BrowserRequest {
    /// Command name as it appears on the wire, for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            BrowserRequest::Goto { .. } => "goto",
            BrowserRequest::CurrentUrl => "current_url",
            BrowserRequest::WaitForLoadState => "wait_for_load_state",
            BrowserRequest::WaitFor { .. } => "wait_for",
            BrowserRequest::Click { .. } => "click",
            BrowserRequest::Fill { .. } => "fill",
            BrowserRequest::Press { .. } => "press",
            BrowserRequest::Keyboard { .. } => "keyboard",
            BrowserRequest::InputValue { .. } => "input_value",
            BrowserRequest::IsVisible { .. } => "is_visible",
            BrowserRequest::Blur { .. } => "blur",
            BrowserRequest::ClickAway => "click_away",
            BrowserRequest::Frames => "frames",
            BrowserRequest::CloseFrame { .. } => "close_frame",
            BrowserRequest::AcceptDialogs => "accept_dialogs",
            BrowserRequest::Screenshot { .. } => "screenshot",
            BrowserRequest::Quit => "quit",
        }
    }
}

/// Response received from browser_server.js over stdout (one JSON line).
#[derive(Debug, Default, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default, rename = "extensionId")]
    pub extension_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub found: Option<bool>,
    #[serde(default)]
    pub frames: Option<Vec<String>>,
    #[serde(default)]
    pub detached: Option<bool>,
}

/// How to launch the driver process.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Path to browser_server.js
    pub script: PathBuf,
    /// Unpacked extension build directory
    pub extension_path: PathBuf,
    pub headless: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            script: PathBuf::from("node/browser_server.js"),
            extension_path: PathBuf::from("build"),
            headless: false,
        }
    }
}

/// A persistent browser session backed by browser_server.js.
///
/// Launches a long-lived Node.js process that keeps a Chromium persistent
/// context open with the extension loaded. Commands are sent as NDJSON over
/// stdin, responses read from stdout. The driver's own logging goes to the
/// inherited stderr.
pub struct BrowserSession {
    child: Child,
    stdin: std::process::ChildStdin,
    reader: BufReader<std::process::ChildStdout>,
    extension_id: String,
    closed: bool,
}

impl BrowserSession {
    /// Spawn browser_server.js and wait for its ready line.
    pub fn launch(options: &SessionOptions) -> HarnessResult<Self> {
        let script = options.script.display().to_string();
        let mut command = Command::new("node");
        command
            .arg(&options.script)
            .arg("--extension")
            .arg(&options.extension_path);
        if options.headless {
            command.arg("--headless");
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| HarnessError::DriverSpawn {
                script: script.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            HarnessError::DriverIo(format!("Failed to capture stdin of {}", script))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            HarnessError::DriverIo(format!("Failed to capture stdout of {}", script))
        })?;

        let mut reader = BufReader::new(stdout);

        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| HarnessError::DriverIo(format!("Failed to read ready signal: {}", e)))?;

        let response: BrowserResponse = serde_json::from_str(line.trim())?;
        if !response.ok || response.ready != Some(true) {
            return Err(HarnessError::DriverProtocol {
                command: "launch".into(),
                error: response
                    .error
                    .unwrap_or_else(|| format!("Did not receive ready signal from {}", script)),
            });
        }

        let extension_id = response.extension_id.ok_or_else(|| HarnessError::DriverProtocol {
            command: "launch".into(),
            error: "Ready signal carried no extensionId".into(),
        })?;
        debug!(%extension_id, "browser session ready");

        Ok(BrowserSession {
            child,
            stdin,
            reader,
            extension_id,
            closed: false,
        })
    }

    /// Send a request and read the response.
    fn send(&mut self, request: &BrowserRequest) -> HarnessResult<BrowserResponse> {
        let json = serde_json::to_string(request)?;

        writeln!(self.stdin, "{}", json).map_err(|e| {
            HarnessError::DriverIo(format!("Failed to write to driver stdin: {}", e))
        })?;
        self.stdin
            .flush()
            .map_err(|e| HarnessError::DriverIo(format!("Failed to flush driver stdin: {}", e)))?;

        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .map_err(|e| HarnessError::DriverIo(format!("Failed to read driver stdout: {}", e)))?;

        if line.trim().is_empty() {
            return Err(HarnessError::DriverIo(
                "Empty response from driver (process may have died)".into(),
            ));
        }

        Ok(serde_json::from_str(line.trim())?)
    }

    /// Send a request and verify it succeeded.
    fn send_ok(&mut self, request: BrowserRequest) -> HarnessResult<BrowserResponse> {
        let response = self.send(&request)?;
        if !response.ok {
            return Err(HarnessError::DriverProtocol {
                command: request.name().into(),
                error: response.error.unwrap_or_else(|| "Unknown error".into()),
            });
        }
        Ok(response)
    }

    fn missing(command: &str, field: &str) -> HarnessError {
        HarnessError::DriverProtocol {
            command: command.into(),
            error: format!("No {} in response", field),
        }
    }

    /// Quit the browser session.
    pub fn quit(&mut self) -> HarnessResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        // Best-effort quit; the process may already be gone
        if let Err(e) = self.send(&BrowserRequest::Quit) {
            debug!(error = %e, "driver did not acknowledge quit");
        }
        if let Err(e) = self.child.wait() {
            warn!(error = %e, "failed to reap driver process");
        }
        Ok(())
    }
}

impl PageDriver for BrowserSession {
    fn extension_id(&self) -> &str {
        &self.extension_id
    }

    fn goto(&mut self, url: &str, timeout_ms: u64) -> HarnessResult<()> {
        let response = self.send(&BrowserRequest::Goto {
            url: url.to_string(),
            timeout_ms,
        })?;
        if !response.ok {
            return Err(HarnessError::Navigation {
                url: url.to_string(),
                reason: response.error.unwrap_or_else(|| "Unknown error".into()),
            });
        }
        Ok(())
    }

    fn current_url(&mut self) -> HarnessResult<String> {
        let response = self.send_ok(BrowserRequest::CurrentUrl)?;
        response.url.ok_or_else(|| Self::missing("current_url", "url"))
    }

    fn wait_for_load_state(&mut self) -> HarnessResult<()> {
        self.send_ok(BrowserRequest::WaitForLoadState)?;
        Ok(())
    }

    fn wait_for(
        &mut self,
        locator: &Locator,
        state: WaitState,
        timeout_ms: u64,
    ) -> HarnessResult<bool> {
        let response = self.send_ok(BrowserRequest::WaitFor {
            locator: locator.clone(),
            state,
            timeout_ms,
        })?;
        Ok(response.found.unwrap_or(false))
    }

    fn click(&mut self, locator: &Locator) -> HarnessResult<()> {
        self.send_ok(BrowserRequest::Click {
            locator: locator.clone(),
        })?;
        Ok(())
    }

    fn fill(&mut self, locator: &Locator, value: &str) -> HarnessResult<()> {
        self.send_ok(BrowserRequest::Fill {
            locator: locator.clone(),
            value: value.to_string(),
        })?;
        Ok(())
    }

    fn press(&mut self, locator: &Locator, key: &str) -> HarnessResult<()> {
        self.send_ok(BrowserRequest::Press {
            locator: locator.clone(),
            key: key.to_string(),
        })?;
        Ok(())
    }

    fn keyboard_press(&mut self, key: &str) -> HarnessResult<()> {
        self.send_ok(BrowserRequest::Keyboard {
            key: key.to_string(),
        })?;
        Ok(())
    }

    fn input_value(&mut self, locator: &Locator) -> HarnessResult<String> {
        let response = self.send_ok(BrowserRequest::InputValue {
            locator: locator.clone(),
        })?;
        response.value.ok_or_else(|| Self::missing("input_value", "value"))
    }

    fn is_visible(&mut self, locator: &Locator) -> HarnessResult<bool> {
        let response = self.send_ok(BrowserRequest::IsVisible {
            locator: locator.clone(),
        })?;
        Ok(response.visible.unwrap_or(false))
    }

    fn blur(&mut self, locator: &Locator) -> HarnessResult<()> {
        self.send_ok(BrowserRequest::Blur {
            locator: locator.clone(),
        })?;
        Ok(())
    }

    fn click_away(&mut self) -> HarnessResult<()> {
        self.send_ok(BrowserRequest::ClickAway)?;
        Ok(())
    }

    fn frame_urls(&mut self) -> HarnessResult<Vec<String>> {
        let response = self.send_ok(BrowserRequest::Frames)?;
        Ok(response.frames.unwrap_or_default())
    }

    fn click_and_wait_frame_detached(
        &mut self,
        close: &Locator,
        frame_url_prefix: &str,
        timeout_ms: u64,
    ) -> HarnessResult<bool> {
        let response = self.send_ok(BrowserRequest::CloseFrame {
            close: close.clone(),
            frame_url_prefix: frame_url_prefix.to_string(),
            timeout_ms,
        })?;
        Ok(response.detached.unwrap_or(false))
    }

    fn accept_dialogs(&mut self) -> HarnessResult<()> {
        self.send_ok(BrowserRequest::AcceptDialogs)?;
        Ok(())
    }

    fn screenshot(&mut self, path: &Path) -> HarnessResult<()> {
        self.send_ok(BrowserRequest::Screenshot {
            path: path.display().to_string(),
        })?;
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}
