use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// =============================================================================
// Time-related constants
// =============================================================================

/// Timeout for feed fetch operations in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Timeout for a single liveness probe in milliseconds (10 seconds)
pub const PROBE_TIMEOUT_MS: u64 = 10_000;

/// Language tag kept by the aggregator when no other is configured
pub const DEFAULT_TARGET_LANGUAGE: &str = "vi";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Catalog configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogConfig {
    /// Feeds in priority order; earlier feeds win version ties
    pub feeds: Vec<FeedConfig>,
    /// Only records with this language tag enter the catalog
    pub target_language: String,
    pub fetch: FetchConfig,
    pub probe: ProbeConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            feeds: default_feeds(),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            fetch: FetchConfig::default(),
            probe: ProbeConfig::default(),
        }
    }
}

/// One configured feed
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedConfig {
    /// Origin label shown next to each extension (e.g., "Official")
    pub name: String,
    /// HTTP(S) URL or local path of the JSON index
    pub url: String,
    /// Repository the feed is built from
    #[serde(default)]
    pub github_url: String,
}

impl FeedConfig {
    pub fn new(name: &str, url: &str, github_url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            github_url: github_url.to_string(),
        }
    }
}

/// Feed fetch configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FetchConfig {
    pub timeout_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: FETCH_TIMEOUT_MS,
        }
    }
}

/// Liveness probe configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProbeConfig {
    /// Base URL of a `/proxy-check` service; probes go direct when unset
    pub proxy_url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            proxy_url: None,
            timeout_ms: PROBE_TIMEOUT_MS,
        }
    }
}

fn default_feeds() -> Vec<FeedConfig> {
    vec![
        FeedConfig::new(
            "Official",
            "https://raw.githubusercontent.com/keiyoushi/extensions/repo/index.min.json",
            "https://github.com/keiyoushi/extensions",
        ),
        FeedConfig::new(
            "Unofficial",
            "https://beer-psi.github.io/tachiyomi-unofficial-extensions/index.min.json",
            "https://github.com/beer-psi/tachiyomi-unofficial-extensions",
        ),
        FeedConfig::new(
            "Suwayomi",
            "https://raw.githubusercontent.com/suwayomi/tachiyomi-extension/repo/index.min.json",
            "https://github.com/suwayomi/tachiyomi-extension",
        ),
        FeedConfig::new(
            "Anime",
            "https://raw.githubusercontent.com/yuzono/anime-repo/repo/index.min.json",
            "https://github.com/yuzono/anime-repo",
        ),
    ]
}

impl CatalogConfig {
    /// Load configuration from a JSON file.
    ///
    /// A missing file yields the defaults; unreadable or malformed files are errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Returns the path to the config directory for extension-catalog.
/// Uses $XDG_CONFIG_HOME/extension-catalog if XDG_CONFIG_HOME is set,
/// otherwise falls back to ~/.config/extension-catalog,
/// or ./extension-catalog if neither is available.
pub fn config_dir() -> PathBuf {
    dir_with_env(
        std::env::var("XDG_CONFIG_HOME").ok(),
        dirs::home_dir(),
        ".config",
    )
}

/// Returns the path to the data directory for extension-catalog.
/// Uses $XDG_DATA_HOME/extension-catalog if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/extension-catalog.
pub fn data_dir() -> PathBuf {
    dir_with_env(
        std::env::var("XDG_DATA_HOME").ok(),
        dirs::home_dir(),
        ".local/share",
    )
}

/// Returns the path to the default config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("extension-catalog.log")
}

fn dir_with_env(xdg_home: Option<String>, home_dir: Option<PathBuf>, fallback: &str) -> PathBuf {
    let base = xdg_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(fallback)))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join("extension-catalog")
}
