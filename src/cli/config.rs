use std::path::{Path, PathBuf};

use clap::builder::FalseyValueParser;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::{
    HarnessConfig, TargetPages, Timeouts, VaultCredentials, notification_retries,
};
use crate::error::{HarnessError, HarnessResult};
use crate::extension::surfaces::NotificationSurface;
use crate::spec::spec_model::TestName;

pub const DEFAULT_CONFIG_FILE: &str = "autofill-harness.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "autofill-harness",
    version,
    about = "End-to-end autofill tests for a password-manager browser extension"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: autofill-harness.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Descriptor YAML file or directory, loaded after the built-in pages
    #[arg(long, global = true)]
    pub pages: Vec<PathBuf>,

    /// Leave the built-in fixture pages out
    #[arg(long, global = true)]
    pub no_builtin: bool,

    /// Which page hosts to target
    #[arg(long, env = "TARGET_TEST_PAGES", value_enum, global = true)]
    pub target: Option<TargetPages>,

    /// Resume the run at this page URL
    #[arg(long, env = "START_FROM_TEST_URL", global = true)]
    pub start_from: Option<String>,

    /// Focus mode: run only `onlyTest` pages when any exist
    #[arg(long, env = "DEBUG", value_parser = FalseyValueParser::new(), global = true)]
    pub debug: bool,

    /// Scheme and host of the local fixture site
    #[arg(long, env = "PAGES_HOST", global = true)]
    pub pages_host: Option<String>,

    #[arg(long, env = "PAGES_HOST_PORT", global = true)]
    pub pages_host_port: Option<u16>,

    #[arg(long, env = "VAULT_HOST_URL", global = true)]
    pub vault_host_url: Option<String>,

    #[arg(long, env = "VAULT_EMAIL", global = true)]
    pub vault_email: Option<String>,

    #[arg(long, env = "VAULT_PASSWORD", hide_env_values = true, global = true)]
    pub vault_password: Option<String>,

    /// Remote server config URL to copy feature flags from
    #[arg(long, env = "REMOTE_VAULT_CONFIG_MATCH", global = true)]
    pub remote_vault_config_match: Option<String>,

    /// Unpacked extension build directory
    #[arg(long, env = "EXTENSION_PATH", global = true)]
    pub extension_path: Option<PathBuf>,

    /// Running under CI; enables notification retries
    #[arg(long, env = "CI", value_parser = FalseyValueParser::new(), global = true)]
    pub ci: bool,

    #[arg(long, env = "DISABLE_RETRY", value_parser = FalseyValueParser::new(), global = true)]
    pub disable_retry: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the browser, prepare the extension and run the selected tests
    Run {
        /// Test kinds to run (default: all)
        #[arg(long = "kind", value_enum)]
        kinds: Vec<TestName>,

        /// Output format: console, html, junit
        #[arg(long)]
        format: Option<String>,

        /// Report file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        #[arg(long)]
        headless: bool,

        /// Assume the extension is already configured and logged in
        #[arg(long)]
        skip_setup: bool,
    },

    /// Print the pages a run would exercise, in order
    List,

    /// Validate every descriptor and exit
    Check,

    /// Write the vault seed plan (folder + items) as JSON
    Seed {
        #[arg(long, default_value = "autofill-harness")]
        folder: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Copy remote feature-flag values into the flags file
    SyncFlags {
        /// Flags file to merge into (default from config, else flags.json)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `autofill-harness.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub pages: PagesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_console")]
    pub format: String,

    pub output: Option<String>,

    pub screenshots_dir: Option<PathBuf>,

    pub flags_file: Option<PathBuf>,

    pub autofill_shortcut: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            format: "console".to_string(),
            output: None,
            screenshots_dir: None,
            flags_file: None,
            autofill_shortcut: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub driver_script: Option<PathBuf>,
    pub extension_path: Option<PathBuf>,
    #[serde(default)]
    pub headless: bool,
    pub notification_surface: Option<NotificationSurface>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PagesConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Descriptor files loaded in addition to `--pages`
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

fn default_console() -> String {
    "console".to_string()
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load the YAML config. Without an explicit path a missing default file
/// means defaults; an explicit path must exist. Malformed files are errors.
pub fn load_config(path: Option<&Path>) -> HarnessResult<AppConfig> {
    let (config_path, explicit) = match path {
        Some(p) => (p, true),
        None => (Path::new(DEFAULT_CONFIG_FILE), false),
    };
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).map_err(|e| {
            HarnessError::Configuration(format!("{}: {}", config_path.display(), e))
        }),
        Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Fold CLI flags, environment (through clap) and the config file into one
/// `HarnessConfig`. CLI and env win over the file; the file wins over defaults.
pub fn build_harness_config(cli: &Cli, file: &AppConfig) -> HarnessConfig {
    let defaults = HarnessConfig::default();

    let headless = match &cli.command {
        Commands::Run { headless, .. } => *headless || file.browser.headless,
        _ => file.browser.headless,
    };

    HarnessConfig {
        target_pages: cli.target.unwrap_or_default(),
        start_from_url: cli.start_from.clone().filter(|url| !url.is_empty()),
        debug: cli.debug,
        pages_host: cli
            .pages_host
            .clone()
            .or_else(|| file.pages.host.clone())
            .unwrap_or(defaults.pages_host),
        pages_port: cli.pages_host_port.or(file.pages.port).or(defaults.pages_port),
        vault: VaultCredentials {
            host_url: cli.vault_host_url.clone().unwrap_or_default(),
            email: cli.vault_email.clone().unwrap_or_default(),
            password: cli.vault_password.clone().unwrap_or_default(),
        },
        remote_vault_config_match: cli.remote_vault_config_match.clone(),
        extension_path: cli
            .extension_path
            .clone()
            .or_else(|| file.browser.extension_path.clone())
            .unwrap_or(defaults.extension_path),
        driver_script: file
            .browser
            .driver_script
            .clone()
            .unwrap_or(defaults.driver_script),
        headless,
        timeouts: file.timeouts.clone(),
        notification_retries: notification_retries(cli.ci, cli.disable_retry),
        autofill_shortcut: file
            .run
            .autofill_shortcut
            .clone()
            .unwrap_or(defaults.autofill_shortcut),
        notification_surface: file
            .browser
            .notification_surface
            .unwrap_or(defaults.notification_surface),
        output_dir: file
            .run
            .screenshots_dir
            .clone()
            .unwrap_or(defaults.output_dir),
        flags_file: file.run.flags_file.clone().unwrap_or(defaults.flags_file),
    }
}

/// Descriptor sources: `--pages` first, then the config file's list.
pub fn page_sources(cli: &Cli, file: &AppConfig) -> Vec<PathBuf> {
    cli.pages
        .iter()
        .chain(file.pages.files.iter())
        .cloned()
        .collect()
}
