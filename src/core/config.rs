//! Configuration management for the MCP server.
//!
//! Every setting is resolved from four layers; the first non-empty value
//! wins:
//!
//! 1. Command-line flag
//! 2. Environment variable
//! 3. Persisted `.env` file (`MCP_ENV_FILE`, or `.env` in the working
//!    directory or one of its parents)
//! 4. Hard-coded default
//!
//! Environment variables are prefixed with `MCP_`. For example:
//! `MCP_API_KEY`, `MCP_DEBUG`, `MCP_LOG_LEVEL`.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::context::BaseUrls;
use super::transport::TransportConfig;

/// Default outbound request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default base URL of the wrapped API.
const DEFAULT_API_BASE_URL: &str = "https://api.example.com/v1";

// ============================================================================
// Command line
// ============================================================================

/// Startup flags. They take precedence over every other source.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "api-gateway-mcp", version, about = "MCP gateway for an external HTTP API")]
pub struct CliArgs {
    /// API key for the wrapped API (also MCP_API_KEY)
    #[arg(long = "api-key", alias = "API_KEY", value_name = "KEY")]
    pub api_key: Option<String>,

    /// Enable debug logging (also MCP_DEBUG=true)
    #[arg(long)]
    pub debug: bool,
}

// ============================================================================
// Sources
// ============================================================================

/// The layered sources settings are read from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    cli: CliArgs,
    env: HashMap<String, String>,
    file: HashMap<String, String>,
    /// Problems met while reading the sources, reported once logging is up.
    issues: Vec<String>,
}

impl ConfigSources {
    pub fn new(
        cli: CliArgs,
        env: HashMap<String, String>,
        file: HashMap<String, String>,
    ) -> Self {
        Self {
            cli,
            env,
            file,
            issues: Vec::new(),
        }
    }

    /// Collect the process environment and the persisted `.env` file.
    ///
    /// Nothing is logged here; call [`ConfigSources::report_issues`] once a
    /// subscriber is installed.
    pub fn gather(cli: CliArgs) -> Self {
        let env: HashMap<String, String> = std::env::vars().collect();
        let file_path = env.get("MCP_ENV_FILE").map(PathBuf::from);
        let (file, issues) = read_env_file(file_path);
        Self {
            issues,
            ..Self::new(cli, env, file)
        }
    }

    /// Problems met while reading the `.env` file.
    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    /// Log the problems met while gathering.
    pub fn report_issues(&self) {
        for issue in &self.issues {
            warn!("{}", issue);
        }
    }

    pub fn cli(&self) -> &CliArgs {
        &self.cli
    }

    /// First non-empty value among `flag`, environment and file for `key`.
    pub fn lookup(&self, flag: Option<&str>, key: &str) -> Option<String> {
        [
            flag,
            self.env.get(key).map(String::as_str),
            self.file.get(key).map(String::as_str),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
    }

    /// Environment/file lookup for settings without a flag.
    pub fn var(&self, key: &str) -> Option<String> {
        self.lookup(None, key)
    }

    /// Boolean setting. Unparseable values are ignored with a warning.
    pub fn flag(&self, cli: bool, key: &str) -> Option<bool> {
        if cli {
            return Some(true);
        }
        let raw = self.var(key)?;
        match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => {
                warn!("Ignoring {}={:?}: expected true or false", key, raw);
                None
            }
        }
    }

    /// Parsed setting. Unparseable values are ignored with a warning.
    pub fn parsed<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        let raw = self.var(key)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring {}={:?}: not a valid value", key, raw);
                None
            }
        }
    }
}

fn read_env_file(path: Option<PathBuf>) -> (HashMap<String, String>, Vec<String>) {
    let iter = match &path {
        Some(path) => dotenvy::from_path_iter(path),
        None => dotenvy::dotenv_iter(),
    };

    let mut issues = Vec::new();
    let entries = match iter {
        Ok(entries) => entries
            .filter_map(|entry| match entry {
                Ok(pair) => Some(pair),
                Err(e) => {
                    issues.push(format!("Skipping malformed .env entry: {e}"));
                    None
                }
            })
            .collect(),
        Err(e) => {
            // A missing default `.env` is normal.
            if let Some(path) = &path {
                issues.push(format!("Could not read env file {}: {e}", path.display()));
            }
            HashMap::new()
        }
    };

    (entries, issues)
}

// ============================================================================
// Configuration
// ============================================================================

/// Main configuration structure for the MCP server.
///
/// This struct contains all configurable aspects of the server, organized
/// by domain for clarity and maintainability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// External API configuration.
    pub api: ApiConfig,

    /// Transport configuration.
    pub transport: TransportConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Set by `--debug` / `MCP_DEBUG`; forces the `debug` level.
    pub debug: bool,
}

/// Configuration of the wrapped API.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Static credential sent as a bearer token.
    pub credential: Option<String>,

    /// Per-tool base URLs, with a `"default"` fallback.
    pub base_urls: BaseUrls,

    /// Outbound request timeout in seconds.
    pub timeout_secs: u64,

    /// User agent for outbound requests.
    pub user_agent: String,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("credential", &self.credential.as_ref().map(|_| "[REDACTED]"))
            .field("base_urls", &self.base_urls)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ApiConfig {
    /// Static table of base URLs per tool.
    ///
    /// Add an entry keyed by tool name when a tool talks to a different host
    /// than the default one.
    pub fn default_base_urls() -> BaseUrls {
        BaseUrls::new().with(BaseUrls::DEFAULT_KEY, DEFAULT_API_BASE_URL)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "api-gateway-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl LoggingConfig {
    /// Resolve the logging section alone, so a subscriber can be installed
    /// before the rest of the configuration is read.
    pub fn from_sources(sources: &ConfigSources) -> Self {
        let debug = sources
            .flag(sources.cli().debug, "MCP_DEBUG")
            .unwrap_or(false);
        let level = if debug {
            "debug".to_string()
        } else {
            sources
                .var("MCP_LOG_LEVEL")
                .unwrap_or_else(|| Self::default().level)
        };
        Self { level, debug }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            debug: false,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            credential: None,
            base_urls: Self::default_base_urls(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("api-gateway-mcp/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Load configuration from the command line, environment and `.env` file.
    pub fn load(cli: CliArgs) -> Self {
        Self::from_sources(&ConfigSources::gather(cli))
    }

    /// Resolve configuration from explicit sources.
    ///
    /// Unusable values are logged and skipped, so call this after logging is
    /// initialized.
    pub fn from_sources(sources: &ConfigSources) -> Self {
        sources.report_issues();

        let mut config = Self::default();

        if let Some(name) = sources.var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        config.logging = LoggingConfig::from_sources(sources);

        config.api.credential = sources.lookup(sources.cli().api_key.as_deref(), "MCP_API_KEY");

        if let Some(url) = sources.var("MCP_API_BASE_URL") {
            config.api.base_urls.insert(BaseUrls::DEFAULT_KEY, url);
        }

        if let Some(timeout) = sources.parsed::<u64>("MCP_API_TIMEOUT_SECS") {
            config.api.timeout_secs = timeout.max(1);
        }

        config.transport = TransportConfig::from_sources(sources);

        config
    }
}
