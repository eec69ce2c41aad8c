//! Configuration file parser for ~/.config/cragfeed/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::feed::{
    ExtractOptions, FeedQuery, FetchSettings, DEFAULT_ENDPOINT, DEFAULT_REGION_DEPTH,
    DEFAULT_SITE_HOST, DEFAULT_USER_AGENT,
};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// A selectable climbing area.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AreaEntry {
    pub id: u64,
    pub name: String,
}

pub const DEFAULT_AREA_ID: u64 = 111742350;
pub const DEFAULT_AREA_NAME: &str = "Breaks Interstate Park";

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upstream RSS endpoint; query parameters are appended per request.
    pub endpoint: String,

    /// `User-Agent` sent with every request.
    pub user_agent: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Host whose area/route links form location trails.
    pub site_host: String,

    /// Leading region crumbs before the climbing area (e.g. state, sub-region).
    pub region_depth: usize,

    /// Areas offered by the area switcher, in order.
    pub areas: Vec<AreaEntry>,

    /// Area shown at startup. Falls back to the first configured area.
    pub default_area: Option<u64>,

    pub include_routes: bool,
    pub include_areas: bool,
    pub include_comments: bool,
    pub include_photos: bool,

    /// Parsed feeds kept in memory, one per area.
    pub cache_size: usize,

    /// Wrapped description lines shown before "show more".
    pub collapsed_lines: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            site_host: DEFAULT_SITE_HOST.to_string(),
            region_depth: DEFAULT_REGION_DEPTH,
            areas: vec![AreaEntry {
                id: DEFAULT_AREA_ID,
                name: DEFAULT_AREA_NAME.to_string(),
            }],
            default_area: None,
            include_routes: true,
            include_areas: true,
            include_comments: true,
            include_photos: true,
            cache_size: 8,
            collapsed_lines: 3,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 13] = [
        "endpoint",
        "user_agent",
        "timeout_secs",
        "site_host",
        "region_depth",
        "areas",
        "default_area",
        "include_routes",
        "include_areas",
        "include_comments",
        "include_photos",
        "cache_size",
        "collapsed_lines",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let mut config: Config = toml::from_str(&content)?;
        config.normalize();
        tracing::info!(
            path = %path.display(),
            areas = config.areas.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Restores invariants the rest of the app relies on.
    fn normalize(&mut self) {
        if self.areas.is_empty() {
            tracing::warn!("No areas configured, using the default area");
            self.areas = Config::default().areas;
        }
        if self.cache_size == 0 {
            self.cache_size = 1;
        }
        if self.collapsed_lines == 0 {
            self.collapsed_lines = 1;
        }
    }

    /// Area to show at startup.
    pub fn initial_area(&self) -> u64 {
        self.default_area
            .or_else(|| self.areas.first().map(|a| a.id))
            .unwrap_or(DEFAULT_AREA_ID)
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            site_host: self.site_host.clone(),
            region_depth: self.region_depth,
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            endpoint: self.endpoint.clone(),
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            ..FetchSettings::default()
        }
    }

    /// Upstream query for `area_id` with the configured kind toggles.
    pub fn query_for(&self, area_id: u64) -> FeedQuery {
        FeedQuery {
            area_id,
            routes: self.include_routes,
            areas: self.include_areas,
            comments: self.include_comments,
            photos: self.include_photos,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("cragfeed_config_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.user_agent, "MountainProjectFeedViewer/1.0");
        assert_eq!(config.region_depth, 2);
        assert_eq!(config.initial_area(), DEFAULT_AREA_ID);
        assert!(config.include_routes && config.include_photos);
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/cragfeed_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.site_host, DEFAULT_SITE_HOST);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let path = write_config("whitespace", "   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.cache_size, 8);
        cleanup(&path);
    }

    #[test]
    fn test_full_config() {
        let path = write_config(
            "full",
            r#"
endpoint = "https://example.com/rss"
user_agent = "Test/2.0"
region_depth = 1
default_area = 2
include_photos = false
collapsed_lines = 5

[[areas]]
id = 1
name = "Red River Gorge"

[[areas]]
id = 2
name = "New River Gorge"
"#,
        );
        let config = Config::load(&path).unwrap();
        assert_eq!(config.endpoint, "https://example.com/rss");
        assert_eq!(config.region_depth, 1);
        assert_eq!(config.areas.len(), 2);
        assert_eq!(config.initial_area(), 2);
        assert_eq!(config.collapsed_lines, 5);

        let query = config.query_for(2);
        assert!(!query.photos);
        assert!(query.comments);
        assert_eq!(config.fetch_settings().user_agent, "Test/2.0");
        assert_eq!(config.extract_options().region_depth, 1);
        cleanup(&path);
    }

    #[test]
    fn test_empty_areas_restored() {
        let path = write_config("empty_areas", "areas = []\ncache_size = 0\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.areas.len(), 1);
        assert_eq!(config.areas[0].id, DEFAULT_AREA_ID);
        assert_eq!(config.cache_size, 1);
        cleanup(&path);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let path = write_config("invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        cleanup(&path);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let path = write_config("wrongtype", "region_depth = \"two\"\n");
        assert!(Config::load(&path).is_err());
        cleanup(&path);
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let path = write_config("unknown", "totally_fake_key = 1\nregion_depth = 3\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.region_depth, 3);
        cleanup(&path);
    }

    #[test]
    fn test_too_large_file_rejected() {
        let path = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        cleanup(&path);
    }
}
