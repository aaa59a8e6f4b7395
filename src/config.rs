use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::browser::BrowserConfig;
use crate::models::ImageFormat;

/// Crate configuration, loaded from `config.toml` when present.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Root directory downloaded images and archives are written under.
    #[serde(default = "default_output_directory")]
    pub output_directory: String,

    #[serde(default)]
    pub image_format: ImageFormat,

    /// Worker bound for fast-mode chapter fan-out.
    #[serde(default = "default_fast_workers")]
    pub fast_workers: usize,

    #[serde(default)]
    pub flags: Flags,

    #[serde(default)]
    pub navigation: NavigationConfig,

    #[serde(default)]
    pub browser: BrowserConfig,
}

/// Behavior switches for the download pipelines.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Flags {
    /// Abort non-essential page resources while downloading. Lossy by
    /// contract: at most one content image is admitted per page.
    #[serde(default)]
    pub fast: bool,

    /// Run the browser with a visible window.
    #[serde(default)]
    pub visible: bool,

    /// Skip the actual image fetches. Pipelines still walk the full tree and
    /// emit every event.
    #[serde(default)]
    pub mock: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            fast: false,
            visible: false,
            mock: false,
        }
    }
}

/// Bounded-retry policy for page navigation.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct NavigationConfig {
    /// Maximum number of retry attempts after a failed navigation.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial retry delay in milliseconds.
    #[serde(default = "default_initial_retry_delay")]
    pub initial_retry_delay_ms: u64,

    /// Maximum retry delay in milliseconds.
    #[serde(default = "default_max_retry_delay")]
    pub max_retry_delay_ms: u64,
}

fn default_output_directory() -> String {
    "manga".to_string()
}

fn default_fast_workers() -> usize {
    3
}

fn default_max_retries() -> usize {
    4
}

fn default_initial_retry_delay() -> u64 {
    500
}

fn default_max_retry_delay() -> u64 {
    8000
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_retry_delay_ms: default_initial_retry_delay(),
            max_retry_delay_ms: default_max_retry_delay(),
        }
    }
}

impl NavigationConfig {
    /// Exponential backoff delay for the given attempt, capped at the
    /// configured maximum.
    pub fn retry_delay(&self, attempt: usize) -> Duration {
        let delay_ms = self
            .initial_retry_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt as u32))
            .min(self.max_retry_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_directory: default_output_directory(),
            image_format: ImageFormat::default(),
            fast_workers: default_fast_workers(),
            flags: Flags::default(),
            navigation: NavigationConfig::default(),
            browser: BrowserConfig::default(),
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to
    /// defaults when the file is absent or malformed.
    pub fn load() -> Self {
        let path = Path::new("config.toml");
        if path.exists() {
            if let Ok(content) = fs::read_to_string(path) {
                match toml::from_str::<Config>(&content) {
                    Ok(cfg) => return cfg,
                    Err(e) => log::warn!("ignoring malformed config.toml: {}", e),
                }
            }
        }
        Self::default()
    }
}
