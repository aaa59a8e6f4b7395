use std::time::Duration;

use serde::Deserialize;

/// Configuration for browser instances.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Run browser in headless mode.
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Browser window size.
    #[serde(default = "default_window_size")]
    pub window_size: (u32, u32),

    /// Custom user agent.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Navigation timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Additional Chrome flags.
    #[serde(default)]
    pub chrome_flags: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_window_size() -> (u32, u32) {
    (1920, 1080)
}

fn default_timeout() -> u64 {
    60
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: default_window_size(),
            user_agent: None,
            timeout_seconds: default_timeout(),
            chrome_flags: vec![],
        }
    }
}

impl BrowserConfig {
    /// Create a configuration with a visible browser window, for debugging
    /// parsing problems against the live site.
    pub fn visible() -> Self {
        Self {
            headless: false,
            ..Self::default()
        }
    }

    /// Get timeout as Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert_eq!(config.window_size, (1920, 1080));
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_visible_config() {
        let config = BrowserConfig::visible();
        assert!(!config.headless);
    }
}
