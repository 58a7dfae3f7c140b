//! Shared page-object plumbing

use std::time::Duration;

use tracing::{debug, info};

use kronos_common::{CapabilityRegistry, ConfigSection, DeviceProfile};

use crate::browser::BrowserSession;
use crate::error::UiResult;

/// Selector for a named form input.
pub fn field_selector(name: &str) -> String {
    format!("input[name='{}']", name)
}

/// Selector for a section heading.
pub fn heading_selector(title: &str) -> String {
    format!("h3:has-text('{}')", title)
}

/// Borrowed browser plus the resolved capability slice for the unit under
/// test. Page objects embed one of these; the session outlives the page.
pub struct PageContext<'a> {
    pub browser: &'a BrowserSession,
    pub profile: DeviceProfile,
}

impl<'a> PageContext<'a> {
    pub fn new(
        browser: &'a BrowserSession,
        registry: &CapabilityRegistry,
        model: Option<&str>,
    ) -> Self {
        let profile = registry.profile(model);
        debug!(
            model = profile.model.as_deref().unwrap_or("unknown"),
            series = %profile.series,
            multiplier = profile.timeout_multiplier,
            "page context resolved"
        );
        Self { browser, profile }
    }

    /// Default wait for this device (series base scaled by multiplier).
    pub fn timeout(&self) -> Duration {
        self.profile.default_timeout()
    }

    /// Navigate to a section route and wait for its heading.
    pub async fn open_section(&self, section: ConfigSection, heading: &str) -> UiResult<()> {
        self.browser.goto(section.route()).await?;
        self.browser
            .wait_visible(&heading_selector(heading), self.timeout())
            .await?;
        info!(section = %section, "section opened");
        Ok(())
    }

    /// Fill a named input and fire the `change` event the device's
    /// save-button enablement listens for.
    pub async fn fill_field(&self, name: &str, value: &str) -> UiResult<()> {
        let selector = field_selector(name);
        self.browser.wait_visible(&selector, self.timeout()).await?;
        self.browser.fill(&selector, value, self.timeout()).await?;
        self.browser
            .dispatch_event(&selector, "change", self.timeout())
            .await?;
        debug!(field = name, "field filled");
        Ok(())
    }

    pub async fn read_field(&self, name: &str) -> UiResult<String> {
        let selector = field_selector(name);
        self.browser.input_value(&selector, self.timeout()).await
    }

    pub async fn field_present(&self, name: &str) -> UiResult<bool> {
        Ok(self.browser.count(&field_selector(name), self.timeout()).await? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors() {
        assert_eq!(field_selector("identifier"), "input[name='identifier']");
        assert_eq!(heading_selector("General"), "h3:has-text('General')");
    }
}
