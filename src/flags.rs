use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::{HarnessError, HarnessResult};

// ============================================================================
// Remote feature-flag sync
// ============================================================================

// The flag service varies its answer by client, so requests identify as a
// desktop Chrome build of the extension.
const CLIENT_VERSION: &str = "2025.8.2";
const DEVICE_TYPE: &str = "2";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36";

/// The part of the server config response the harness reads.
#[derive(Debug, Deserialize)]
struct VaultConfigurationResponse {
    #[serde(default, rename = "featureStates")]
    feature_states: Map<String, Value>,
}

/// GET the remote config and return its `featureStates`.
pub fn fetch_feature_states(url: &str) -> HarnessResult<Map<String, Value>> {
    let client = reqwest::blocking::Client::new();
    let response = client
        .get(url)
        .header("bitwarden-client-version", CLIENT_VERSION)
        .header("device-type", DEVICE_TYPE)
        .header("user-agent", USER_AGENT)
        .send()?
        .error_for_status()?;

    let config: VaultConfigurationResponse = response.json()?;
    Ok(config.feature_states)
}

/// `{ ...existing, flagValues: states }`. Unrelated keys survive.
pub fn merge_flag_values(existing: Value, states: Map<String, Value>) -> HarnessResult<Value> {
    let mut object = match existing {
        Value::Object(object) => object,
        Value::Null => Map::new(),
        other => {
            return Err(HarnessError::Configuration(format!(
                "flags file must hold a JSON object, found {}",
                other
            )));
        }
    };
    object.insert("flagValues".to_string(), Value::Object(states));
    Ok(Value::Object(object))
}

/// Missing or empty file reads as `{}`.
pub fn read_flags_file(path: &Path) -> HarnessResult<Value> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "flags file missing, starting from an empty object");
            return Ok(Value::Object(Map::new()));
        }
        Err(e) => return Err(e.into()),
    };
    if content.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    Ok(serde_json::from_str(&content)?)
}

/// Merge `states` into the flags file on disk. Returns the flag count.
pub fn write_flag_values(path: &Path, states: Map<String, Value>) -> HarnessResult<usize> {
    let count = states.len();
    let merged = merge_flag_values(read_flags_file(path)?, states)?;
    std::fs::write(path, serde_json::to_string(&merged)?)?;
    Ok(count)
}

/// Fetch flags from `url` and persist them to `path`.
pub fn sync_feature_flags(url: &str, path: &Path) -> HarnessResult<usize> {
    let states = fetch_feature_states(url)?;
    let count = write_flag_values(path, states)?;
    info!(url, path = %path.display(), count, "feature flag values written");
    Ok(count)
}
