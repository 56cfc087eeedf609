use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tvguide_core::endpoints::{DEFAULT_BASE_URL, GUIDE_FILE_NAME};
use tvguide_core::model::{DEFAULT_INFO_NAME, DEFAULT_INFO_URL};

/// Which upstream listing source a harvest uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// The erw.cc JSON listing API.
    #[default]
    Erw,
    /// TVMao schedule pages.
    Tvmao,
}

impl SourceKind {
    pub const ALL: [Self; 2] = [Self::Erw, Self::Tvmao];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Erw => "erw",
            Self::Tvmao => "tvmao",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "erw" => Ok(Self::Erw),
            "tvmao" => Ok(Self::Tvmao),
            other => anyhow::bail!("Unknown source: {other} (expected one of: erw, tvmao)"),
        }
    }
}

/// Configuration for tvguide.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (TVG_* prefix)
/// 3. Config file (~/.config/tvguide/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listing source used by `fetch`.
    ///
    /// Can be set via:
    /// - CLI: --source tvmao
    /// - ENV: TVG_SOURCE
    /// - Config: source = "tvmao"
    #[serde(default)]
    pub source: SourceKind,

    /// Where the XMLTV document is written.
    ///
    /// Can be set via:
    /// - CLI: --output /srv/www/e.xml
    /// - ENV: TVG_OUTPUT_PATH
    /// - Config: output_path = "/srv/www/e.xml"
    /// - Default: ./e.xml
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Value of the `info-name` attribute on the `<tv>` root.
    #[serde(default = "default_info_name")]
    pub info_name: String,

    /// Value of the `info-url` attribute on the `<tv>` root.
    #[serde(default = "default_info_url")]
    pub info_url: String,

    /// Base URL the guide and logos are published under.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Base URL of the erw.cc listing API.
    #[serde(default = "default_erw_base_url")]
    pub erw_base_url: String,

    /// Base URL of the TVMao website.
    #[serde(default = "default_tvmao_base_url")]
    pub tvmao_base_url: String,

    /// User-Agent override. Each source sends a desktop browser UA when unset.
    pub user_agent: Option<String>,

    /// Per-request timeout for the erw.cc API, in seconds.
    #[serde(default = "default_erw_timeout_secs")]
    pub erw_timeout_secs: u64,

    /// Per-request timeout for TVMao pages, in seconds.
    #[serde(default = "default_tvmao_timeout_secs")]
    pub tvmao_timeout_secs: u64,

    /// Upper bound on requests per second sent to a source.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Retries per channel after a transient failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

/// Keys accepted by `config get` / `config set`.
pub const KEYS: &[&str] = &[
    "source",
    "output_path",
    "info_name",
    "info_url",
    "public_base_url",
    "erw_base_url",
    "tvmao_base_url",
    "user_agent",
    "erw_timeout_secs",
    "tvmao_timeout_secs",
    "requests_per_second",
    "max_retries",
];

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            output_path: default_output_path(),
            info_name: default_info_name(),
            info_url: default_info_url(),
            public_base_url: default_public_base_url(),
            erw_base_url: default_erw_base_url(),
            tvmao_base_url: default_tvmao_base_url(),
            user_agent: None,
            erw_timeout_secs: default_erw_timeout_secs(),
            tvmao_timeout_secs: default_tvmao_timeout_secs(),
            requests_per_second: default_requests_per_second(),
            max_retries: default_max_retries(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/tvguide/config.toml
    /// Reads environment variables with TVG_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("tvg");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration, then override the output path.
    ///
    /// This is used when the --output CLI flag is provided.
    pub fn load_with_output_path(output_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.output_path = output_path;
        Ok(config)
    }

    /// Reject settings that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        if self.requests_per_second == 0 {
            anyhow::bail!("requests_per_second must be at least 1");
        }
        if self.erw_timeout_secs == 0 || self.tvmao_timeout_secs == 0 {
            anyhow::bail!("request timeouts must be at least 1 second");
        }
        Ok(())
    }

    /// Look up a setting by its config-file key, rendered as text.
    pub fn value_of(&self, key: &str) -> Option<String> {
        let value = match key {
            "source" => self.source.to_string(),
            "output_path" => self.output_path.display().to_string(),
            "info_name" => self.info_name.clone(),
            "info_url" => self.info_url.clone(),
            "public_base_url" => self.public_base_url.clone(),
            "erw_base_url" => self.erw_base_url.clone(),
            "tvmao_base_url" => self.tvmao_base_url.clone(),
            "user_agent" => self
                .user_agent
                .clone()
                .unwrap_or_else(|| String::from("<not set>")),
            "erw_timeout_secs" => self.erw_timeout_secs.to_string(),
            "tvmao_timeout_secs" => self.tvmao_timeout_secs.to_string(),
            "requests_per_second" => self.requests_per_second.to_string(),
            "max_retries" => self.max_retries.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from(GUIDE_FILE_NAME)
}

fn default_info_name() -> String {
    DEFAULT_INFO_NAME.to_string()
}

fn default_info_url() -> String {
    DEFAULT_INFO_URL.to_string()
}

fn default_public_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_erw_base_url() -> String {
    crate::source::erw::DEFAULT_BASE_URL.to_string()
}

fn default_tvmao_base_url() -> String {
    crate::source::tvmao::DEFAULT_BASE_URL.to_string()
}

const fn default_erw_timeout_secs() -> u64 {
    3
}

const fn default_tvmao_timeout_secs() -> u64 {
    60
}

const fn default_requests_per_second() -> u32 {
    4
}

const fn default_max_retries() -> usize {
    2
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/tvguide/config.toml
/// - macOS: ~/Library/Application Support/tvguide/config.toml
/// - Windows: %APPDATA%\tvguide\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tvguide")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# tvguide configuration file
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (TVG_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Listing source: "erw" (JSON API) or "tvmao" (schedule pages)
#
# Can also be set via:
# - CLI: tvguide fetch --source tvmao
# - Environment: TVG_SOURCE=tvmao
source = "erw"

# Where the XMLTV document is written
#
# Can also be set via:
# - CLI: tvguide fetch --output /srv/www/e.xml
# - Environment: TVG_OUTPUT_PATH=/srv/www/e.xml
#output_path = "e.xml"

# Attributes stamped on the <tv> root element
#info_name = "by oaixnah"
#info_url = "https://tv.oaix.tech/e.xml"

# Base URL the guide and channel logos are published under
#public_base_url = "https://tv.oaix.tech"

# Upstream endpoints
#erw_base_url = "https://api.erw.cc/"
#tvmao_base_url = "https://www.tvmao.com"

# User-Agent sent upstream (defaults to a desktop browser string)
#user_agent = "Mozilla/5.0 ..."

# Request tuning
#erw_timeout_secs = 3
#tvmao_timeout_secs = 60
#requests_per_second = 4
#max_retries = 2
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
