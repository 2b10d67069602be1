//! Configuration management for pirsa-dl.
//!
//! Values are layered: built-in defaults, then a config file (explicit
//! `--config` path or one discovered by `prefer`), then environment
//! variables and command-line flags applied by the CLI.

mod settings;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use settings::Settings;

/// Base URL of the seminar archive.
pub const DEFAULT_SITE_URL: &str = "http://pirsa.org";

/// Base URL media files are streamed from.
pub const DEFAULT_MEDIA_URL: &str = "http://streamer2.perimeterinstitute.ca/mp4-med";

/// Upper bound on listing pages walked for one collection.
pub const DEFAULT_MAX_PAGES: u32 = 500;

/// Name used for config file discovery (`pirsa-dl.toml`, `pirsa-dl.yaml`, ...).
const CONFIG_NAME: &str = "pirsa-dl";

/// Page locators (CSS selectors) used to read the archive's HTML.
///
/// These mirror the remote page structure and are the first thing to update
/// when the archive changes its markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Heading holding a collection's display name.
    #[serde(default = "default_collection_name_locator")]
    pub collection_name: String,
    /// Elements holding the video IDs of one listing page.
    #[serde(default = "default_listing_ids_locator")]
    pub listing_ids: String,
    /// Block holding a lecture's title on its detail page.
    #[serde(default = "default_lecture_title_locator")]
    pub lecture_title: String,
}

fn default_collection_name_locator() -> String {
    "h3".to_string()
}

fn default_listing_ids_locator() -> String {
    r#"div[class="search_results"] > div:first-of-type > b:first-of-type"#.to_string()
}

fn default_lecture_title_locator() -> String {
    r#"div[class="lecture_title"]"#.to_string()
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            collection_name: default_collection_name_locator(),
            listing_ids: default_listing_ids_locator(),
            lecture_title: default_lecture_title_locator(),
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the archive's HTML pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,
    /// Base URL of the media server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    /// User agent: unset for the default, "impersonate" for a browser UA.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Connect timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<u64>,
    /// Read timeout in seconds (per read, not per transfer).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_timeout: Option<u64>,
    /// Delay between page requests in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_delay_ms: Option<u64>,
    /// Retries for network failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    /// Delay between retries in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,
    /// Maximum listing pages walked per collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
    /// Concurrent downloads within a collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    /// Skip failed videos instead of aborting the collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_going: Option<bool>,
    /// Directory downloads are written to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    /// Page locators.
    #[serde(default)]
    pub locators: LocatorConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover a config file via prefer, falling back to defaults.
    pub async fn load() -> Self {
        match prefer::load(CONFIG_NAME).await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("Ignoring config file: {}", e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// The format is picked from the extension: TOML, YAML, otherwise JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e)),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Directory relative paths in this config are resolved against.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// `~` is expanded; absolute paths are returned unchanged.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply file values on top of `settings`.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref site_url) = self.site_url {
            settings.site_url = site_url.trim_end_matches('/').to_string();
        }
        if let Some(ref media_url) = self.media_url {
            settings.media_url = media_url.trim_end_matches('/').to_string();
        }
        if self.user_agent.is_some() {
            settings.user_agent = self.user_agent.clone();
        }
        if let Some(secs) = self.connect_timeout {
            settings.connect_timeout = std::time::Duration::from_secs(secs);
        }
        if let Some(secs) = self.read_timeout {
            settings.read_timeout = std::time::Duration::from_secs(secs);
        }
        if let Some(ms) = self.request_delay_ms {
            settings.request_delay = std::time::Duration::from_millis(ms);
        }
        if let Some(retries) = self.retries {
            settings.retries = retries;
        }
        if let Some(ms) = self.retry_delay_ms {
            settings.retry_delay = std::time::Duration::from_millis(ms);
        }
        if let Some(max_pages) = self.max_pages {
            settings.max_pages = max_pages;
        }
        if let Some(jobs) = self.jobs {
            settings.jobs = jobs.max(1);
        }
        if let Some(keep_going) = self.keep_going {
            settings.keep_going = keep_going;
        }
        if let Some(ref output_dir) = self.output_dir {
            settings.output_dir = self.resolve_path(output_dir, base_dir);
        }
        settings.locators = self.locators.clone();
    }
}

/// Load settings from an explicit config file, or a discovered one.
pub async fn load_settings(config_path: Option<&Path>) -> Result<Settings, String> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = config.base_dir().unwrap_or(cwd);

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);
    validate_base_urls(&settings)?;
    Ok(settings)
}

/// Reject base URLs that would only fail later, on the first request.
fn validate_base_urls(settings: &Settings) -> Result<(), String> {
    for (name, value) in [
        ("site_url", &settings.site_url),
        ("media_url", &settings.media_url),
    ] {
        let parsed = url::Url::parse(value)
            .map_err(|e| format!("Invalid {} '{}': {}", name, value, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!("Invalid {} '{}': not an HTTP URL", name, value));
        }
    }
    Ok(())
}
