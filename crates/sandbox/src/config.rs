//! Sandbox configuration loaded from environment variables.

use std::path::PathBuf;

use policy::RuleSettings;
use saga::WorkflowConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Sandbox configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `PRESET_CATALOG`: path to a JSON preset catalog overriding the built-ins (default: unset)
///
/// Workflow and rule tunables come from [`WorkflowConfig::from_env`] and
/// [`RuleSettings::from_env`].
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub log_format: LogFormat,
    pub preset_catalog: Option<PathBuf>,
    pub workflow: WorkflowConfig,
    pub rules: RuleSettings,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_format: std::env::var("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
            preset_catalog: std::env::var_os("PRESET_CATALOG").map(PathBuf::from),
            workflow: WorkflowConfig::from_env(),
            rules: RuleSettings::from_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            preset_catalog: None,
            workflow: WorkflowConfig::default(),
            rules: RuleSettings::default(),
        }
    }
}
