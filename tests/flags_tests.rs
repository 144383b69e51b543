use autofill_harness::cli::commands::cmd_sync_flags;
use autofill_harness::config::HarnessConfig;
use autofill_harness::flags::{read_flags_file, sync_feature_flags, write_flag_values};
use httpmock::prelude::*;
use serde_json::{Map, Value, json};

const CHROME_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36";

fn states(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// ============================================================================
// Flags file
// ============================================================================

#[test]
fn missing_flags_file_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flags.json");

    let count = write_flag_values(&path, states(&[("a", json!(true)), ("b", json!(3))])).unwrap();

    assert_eq!(count, 2);
    let written = read_flags_file(&path).unwrap();
    assert_eq!(written, json!({"flagValues": {"a": true, "b": 3}}));
}

#[test]
fn existing_keys_survive_and_flag_values_are_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flags.json");
    std::fs::write(&path, r#"{"flagValues": {"stale": true}, "keep": "me"}"#).unwrap();

    write_flag_values(&path, states(&[("fresh", json!(false))])).unwrap();

    let written = read_flags_file(&path).unwrap();
    assert_eq!(written["keep"], "me");
    assert_eq!(written["flagValues"], json!({"fresh": false}));
}

#[test]
fn empty_flags_file_reads_as_object() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flags.json");
    std::fs::write(&path, "  \n").unwrap();
    assert_eq!(read_flags_file(&path).unwrap(), json!({}));
}

#[test]
fn malformed_flags_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flags.json");
    std::fs::write(&path, "{not json").unwrap();
    assert!(write_flag_values(&path, Map::new()).is_err());
}

// ============================================================================
// Remote sync
// ============================================================================

#[test]
fn sync_fetches_feature_states_with_client_headers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flags.json");
    let server = MockServer::start();
    let config_call = server.mock(|when, then| {
        when.method(GET)
            .path("/api/config")
            .header("bitwarden-client-version", "2025.8.2")
            .header("device-type", "2")
            .header("user-agent", CHROME_UA);
        then.status(200).header("content-type", "application/json").body(
            r#"{"version":"2025.8.0","featureStates":{"inline-menu-totp":true}}"#,
        );
    });

    let count = sync_feature_flags(&server.url("/api/config"), &path).unwrap();

    config_call.assert();
    assert_eq!(count, 1);
    assert_eq!(
        read_flags_file(&path).unwrap()["flagValues"],
        json!({"inline-menu-totp": true})
    );
}

#[test]
fn sync_error_status_leaves_flags_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flags.json");
    std::fs::write(&path, r#"{"flagValues": {"kept": true}}"#).unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/config");
        then.status(503);
    });

    assert!(sync_feature_flags(&server.url("/api/config"), &path).is_err());
    assert_eq!(read_flags_file(&path).unwrap()["flagValues"], json!({"kept": true}));
}

#[test]
fn sync_without_remote_leaves_flags_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flags.json");
    let config = HarnessConfig {
        remote_vault_config_match: None,
        flags_file: path.clone(),
        ..HarnessConfig::default()
    };

    assert_eq!(cmd_sync_flags(&config, None).unwrap(), None);
    assert!(!path.exists());
}
