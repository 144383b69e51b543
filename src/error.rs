use thiserror::Error;

use crate::spec::spec_model::FieldKey;

#[derive(Error, Debug)]
pub enum HarnessError {
    /// Descriptor table or config file is inconsistent. Caught at load time.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A field's element never reached the awaited state.
    #[error("Timed out after {timeout_ms}ms waiting for {field} ({locator}) at {url}")]
    ResolutionTimeout {
        url: String,
        field: FieldKey,
        locator: String,
        timeout_ms: u64,
    },

    /// Hard assertion failure (local fixture pages).
    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// Node.js driver process failed to spawn
    #[error("Failed to spawn {script} (is Node.js installed?): {source}")]
    DriverSpawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    /// Pipe to the driver process broke or returned nothing
    #[error("Browser session I/O: {0}")]
    DriverIo(String),

    /// Driver answered with ok=false or an unexpected payload
    #[error("Browser command '{command}' failed: {error}")]
    DriverProtocol { command: String, error: String },

    /// Page can't be driven by the requested kind (e.g. submitting a public site)
    #[error("Unsupported page {url}: {reason}")]
    UnsupportedPage { url: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl HarnessError {
    /// Timeouts and assertion mismatches end the current step but never the suite.
    pub fn is_step_failure(&self) -> bool {
        matches!(
            self,
            HarnessError::ResolutionTimeout { .. }
                | HarnessError::AssertionFailed(_)
                | HarnessError::Navigation { .. }
                | HarnessError::DriverProtocol { .. }
        )
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
