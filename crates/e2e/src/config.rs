//! Target device descriptor
//!
//! The harness runs against one physical appliance described by a small
//! YAML file; the acceptance binary can override individual fields from
//! the command line.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::browser::{Browser, BrowserConfig};
use crate::error::UiResult;

/// Description of the device under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Address of the device web server, e.g. `http://192.168.1.100`.
    pub base_url: String,

    /// Hardware model of the unit, e.g. `KRONOS-3R-HVLV-TCXO-A2F`.
    /// Optional - unknown units run with the default capability profile.
    #[serde(default)]
    pub hardware_model: Option<String>,

    /// Status-monitoring login password.
    #[serde(default = "default_password")]
    pub password: String,

    #[serde(default)]
    pub browser: Browser,

    #[serde(default = "default_headless")]
    pub headless: bool,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Navigation timeout in seconds (scaled waits come from the
    /// capability profile, not from here).
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,
}

fn default_password() -> String {
    // Factory default on every unit in the test pool.
    "novatech".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    720
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "http://192.168.1.100".to_string(),
            hardware_model: None,
            password: default_password(),
            browser: Browser::Chromium,
            headless: true,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
        }
    }
}

impl TargetConfig {
    pub fn from_yaml(yaml: &str) -> UiResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: &Path) -> UiResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn browser_config(&self) -> BrowserConfig {
        BrowserConfig {
            base_url: self.base_url.clone(),
            browser: self.browser,
            headless: self.headless,
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            navigation_timeout: Duration::from_secs(self.navigation_timeout_secs),
            ..BrowserConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_target() {
        let yaml = "base_url: http://10.1.2.3\n";
        let target = TargetConfig::from_yaml(yaml).unwrap();
        assert_eq!(target.base_url, "http://10.1.2.3");
        assert_eq!(target.password, "novatech");
        assert!(target.headless);
        assert_eq!(target.browser, Browser::Chromium);
        assert!(target.hardware_model.is_none());
    }

    #[test]
    fn parse_full_target() {
        let yaml = r#"
base_url: https://172.16.0.9
hardware_model: KRONOS-3R-HVLV-TCXO-A2F
password: secret
browser: firefox
headless: false
viewport_width: 1920
viewport_height: 1080
navigation_timeout_secs: 60
"#;
        let target = TargetConfig::from_yaml(yaml).unwrap();
        assert_eq!(target.hardware_model.as_deref(), Some("KRONOS-3R-HVLV-TCXO-A2F"));
        assert_eq!(target.browser, Browser::Firefox);
        assert!(!target.headless);

        let bc = target.browser_config();
        assert_eq!(bc.base_url, "https://172.16.0.9");
        assert_eq!(bc.navigation_timeout, Duration::from_secs(60));
        assert_eq!(bc.viewport_width, 1920);
    }
}
