use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub render: RenderBackendConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
}

/// Settings for the premium rendering backend (executes page scripts and
/// returns fully rendered HTML). When `api_key` is absent every fetch goes
/// straight to the plain-GET fallback.
#[derive(Debug, Deserialize, Clone)]
pub struct RenderBackendConfig {
    #[serde(default = "default_render_endpoint")]
    pub endpoint: String,

    /// Bearer token for the rendering service; None disables it
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CrawlConfig {
    /// Delay between catalog items in milliseconds
    #[serde(default = "default_pace_delay")]
    pub pace_delay_ms: u64,

    /// Backoff before the single retry of a failed item
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

fn default_render_endpoint() -> String {
    "https://api.firecrawl.dev/v1/scrape".to_string()
}
fn default_pace_delay() -> u64 {
    500
}
fn default_retry_backoff() -> u64 {
    2000
}

impl Default for RenderBackendConfig {
    fn default() -> Self {
        Self {
            endpoint: default_render_endpoint(),
            api_key: None,
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            pace_delay_ms: default_pace_delay(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let path = Path::new("config.toml");
        if path.exists() {
            if let Ok(content) = fs::read_to_string(path) {
                if let Ok(cfg) = toml::from_str::<Config>(&content) {
                    return cfg;
                }
            }
        }
        Self::default()
    }
}
