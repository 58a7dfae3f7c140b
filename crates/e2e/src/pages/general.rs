//! General configuration page
//!
//! Identity fields (identifier, location, contact, description) plus the
//! shared save/cancel lifecycle. Values written here must survive a save
//! and a page reload; the page therefore also snapshots and restores its
//! field values so scenarios can leave the device as they found it.

use std::collections::HashMap;

use tracing::{info, warn};

use kronos_common::{CapabilityRegistry, ConfigSection, SaveButton, CANCEL_BUTTON_SELECTOR};

use crate::browser::BrowserSession;
use crate::error::{UiError, UiResult};
use crate::form::{self, FormState};
use crate::pages::base::PageContext;

/// Input names rendered on the General page across both series.
pub const FIELDS: [&str; 4] = ["identifier", "location", "contact", "description"];

pub struct GeneralConfigPage<'a> {
    ctx: PageContext<'a>,
    save_button: SaveButton,
}

impl<'a> GeneralConfigPage<'a> {
    pub fn new(
        browser: &'a BrowserSession,
        registry: &CapabilityRegistry,
        model: Option<&str>,
    ) -> Self {
        let save_button = match model {
            Some(model) => registry.save_button(model, ConfigSection::General, None),
            None => SaveButton::generic(),
        };
        Self {
            ctx: PageContext::new(browser, registry, model),
            save_button,
        }
    }

    pub async fn open(&self) -> UiResult<()> {
        self.ctx.open_section(ConfigSection::General, "General").await
    }

    /// Maximum accepted length for text fields on this unit.
    pub fn text_field_limit(&self) -> usize {
        self.ctx.profile.text_field_limit()
    }

    pub async fn configure_identifier(&self, value: &str) -> UiResult<()> {
        info!(value, "setting identifier");
        self.ctx.fill_field("identifier", value).await
    }

    pub async fn configure_location(&self, value: &str) -> UiResult<()> {
        info!(value, "setting location");
        self.ctx.fill_field("location", value).await
    }

    pub async fn configure_contact(&self, value: &str) -> UiResult<()> {
        info!(value, "setting contact");
        self.ctx.fill_field("contact", value).await
    }

    pub async fn configure_description(&self, value: &str) -> UiResult<()> {
        info!(value, "setting description");
        self.ctx.fill_field("description", value).await
    }

    /// Whether this unit's firmware renders the named field at all.
    pub async fn field_present(&self, name: &str) -> UiResult<bool> {
        self.ctx.field_present(name).await
    }

    pub async fn identifier(&self) -> UiResult<String> {
        self.ctx.read_field("identifier").await
    }

    pub async fn location(&self) -> UiResult<String> {
        self.ctx.read_field("location").await
    }

    /// Snapshot the current value of every field present on this unit's
    /// firmware. Older firmware omits some of them.
    pub async fn page_data(&self) -> UiResult<HashMap<String, String>> {
        let mut data = HashMap::new();
        for field in FIELDS {
            if self.ctx.field_present(field).await? {
                let value = self.ctx.read_field(field).await?;
                data.insert(field.to_string(), value);
            }
        }
        Ok(data)
    }

    /// Write a snapshot back and save, so a scenario can undo its edits.
    pub async fn restore_page_data(&self, data: &HashMap<String, String>) -> UiResult<()> {
        for field in FIELDS {
            if let Some(value) = data.get(field) {
                self.ctx.fill_field(field, value).await?;
            }
        }
        match self.form_state().await? {
            FormState::Dirty => self.save_configuration().await,
            _ => Ok(()),
        }
    }

    pub async fn save_button_enabled(&self) -> UiResult<bool> {
        self.ctx
            .browser
            .is_enabled(&self.save_button.selector, self.ctx.timeout())
            .await
    }

    pub async fn form_state(&self) -> UiResult<FormState> {
        form::observe(self.ctx.browser, &self.save_button, self.ctx.timeout()).await
    }

    /// Click Save and wait for the device to accept the edit. The button
    /// disabling again is the device's acknowledgement; a save the device
    /// rejects leaves the form dirty and surfaces here as a timeout.
    pub async fn save_configuration(&self) -> UiResult<()> {
        if self.save_button.panel_expansion_required {
            warn!(button = %self.save_button.description, "save button lives in a collapsed panel");
        }
        info!(button = %self.save_button.description, "saving general configuration");
        self.ctx
            .browser
            .click(&self.save_button.selector, self.ctx.timeout())
            .await?;
        form::wait_for_state(
            self.ctx.browser,
            &self.save_button,
            FormState::Pristine,
            self.ctx.timeout(),
        )
        .await?;
        Ok(())
    }

    /// Discard pending edits. Some firmware revisions reload the page on
    /// cancel, which removes the button before the poll can observe it;
    /// that counts as settled.
    pub async fn cancel_configuration(&self) -> UiResult<()> {
        info!("cancelling general configuration edits");
        self.ctx
            .browser
            .click(CANCEL_BUTTON_SELECTOR, self.ctx.timeout())
            .await?;
        match form::wait_for_state(
            self.ctx.browser,
            &self.save_button,
            FormState::Pristine,
            self.ctx.timeout(),
        )
        .await
        {
            Ok(_) => Ok(()),
            Err(UiError::ElementNotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kronos_common::DeviceSeries;

    #[test]
    fn field_roster_matches_firmware() {
        assert_eq!(FIELDS, ["identifier", "location", "contact", "description"]);
    }

    #[test]
    fn text_limit_follows_series() {
        assert_eq!(DeviceSeries::Series2.text_field_limit(), 50);
        assert_eq!(DeviceSeries::Series3.text_field_limit(), 29);
    }
}
