//! GNSS configuration page
//!
//! The two series render constellation selection differently. Series 2
//! exposes a single select element; Series 3 renders one checkbox per
//! constellation and only reacts once a `change` event fires on it. GPS
//! is mandatory on every unit: the firmware keeps it enabled and the
//! control non-interactive, and this page enforces the same rule before
//! touching the DOM.

use std::collections::HashMap;

use tracing::{debug, info};

use kronos_common::{
    CapabilityRegistry, ConfigSection, Constellation, DeviceSeries, SaveButton,
    CANCEL_BUTTON_SELECTOR,
};

use crate::browser::BrowserSession;
use crate::error::{UiError, UiResult};
use crate::form::{self, FormState};
use crate::pages::base::PageContext;

/// Series 2 constellation select; the name drifted across firmware lines.
const CONSTELLATION_SELECT: &str =
    "select[name='constellation'], select[name='gnss_constellation']";

/// Series 3 per-constellation checkbox.
pub fn constellation_checkbox_selector(constellation: Constellation) -> String {
    format!("input[name='{}']", constellation.checkbox_name())
}

/// Series 2 mandatory-GPS policy: GPS must be the active selection and the
/// select must be locked or offer no alternative. Any other active value
/// means GPS is disabled, which is never acceptable.
fn series2_gps_mandatory(active_value: &str, locked: bool, single_option: bool) -> bool {
    active_value.eq_ignore_ascii_case(Constellation::Gps.select_value())
        && (locked || single_option)
}

pub struct GnssConfigPage<'a> {
    ctx: PageContext<'a>,
    save_button: SaveButton,
}

impl<'a> GnssConfigPage<'a> {
    pub fn new(
        browser: &'a BrowserSession,
        registry: &CapabilityRegistry,
        model: Option<&str>,
    ) -> Self {
        let save_button = match model {
            Some(model) => registry.save_button(model, ConfigSection::Gnss, None),
            None => SaveButton::generic(),
        };
        Self {
            ctx: PageContext::new(browser, registry, model),
            save_button,
        }
    }

    pub async fn open(&self) -> UiResult<()> {
        self.ctx.open_section(ConfigSection::Gnss, "GNSS").await
    }

    /// Constellations this unit advertises.
    pub fn supported_constellations(&self) -> &[Constellation] {
        &self.ctx.profile.constellations
    }

    pub async fn is_constellation_enabled(&self, constellation: Constellation) -> UiResult<bool> {
        match self.ctx.profile.series {
            DeviceSeries::Series3 => {
                let selector = constellation_checkbox_selector(constellation);
                if self.ctx.browser.count(&selector, self.ctx.timeout()).await? == 0 {
                    return Ok(false);
                }
                self.ctx.browser.is_checked(&selector, self.ctx.timeout()).await
            }
            DeviceSeries::Series2 => {
                // A single-select unit tracks exactly one active
                // constellation; GPS counts as enabled even when the
                // firmware omits the select entirely.
                if self
                    .ctx
                    .browser
                    .count(CONSTELLATION_SELECT, self.ctx.timeout())
                    .await?
                    == 0
                {
                    return Ok(constellation == Constellation::Gps);
                }
                let value = self
                    .ctx
                    .browser
                    .input_value(CONSTELLATION_SELECT, self.ctx.timeout())
                    .await?;
                Ok(value.eq_ignore_ascii_case(constellation.select_value()))
            }
        }
    }

    /// Enable or disable a constellation. Disabling GPS is rejected before
    /// reaching the device; so is disabling anything on a single-select
    /// Series 2 unit, where "disable" has no representation.
    pub async fn set_constellation(
        &self,
        constellation: Constellation,
        enabled: bool,
    ) -> UiResult<()> {
        if constellation == Constellation::Gps && !enabled {
            return Err(UiError::Rejected {
                selector: constellation_checkbox_selector(constellation),
                detail: "GPS is mandatory and cannot be disabled".to_string(),
            });
        }

        match self.ctx.profile.series {
            DeviceSeries::Series2 => {
                if !enabled {
                    return Err(UiError::Rejected {
                        selector: CONSTELLATION_SELECT.to_string(),
                        detail: "single-constellation units cannot disable, only switch"
                            .to_string(),
                    });
                }
                self.ctx
                    .browser
                    .select_option(
                        CONSTELLATION_SELECT,
                        constellation.select_value(),
                        self.ctx.timeout(),
                    )
                    .await?;
                self.ctx
                    .browser
                    .dispatch_event(CONSTELLATION_SELECT, "change", self.ctx.timeout())
                    .await?;
            }
            DeviceSeries::Series3 => {
                let selector = constellation_checkbox_selector(constellation);
                if self.ctx.browser.is_checked(&selector, self.ctx.timeout()).await? != enabled {
                    self.ctx.browser.click(&selector, self.ctx.timeout()).await?;
                    // The firmware arms the save button from the change
                    // event, not the click.
                    self.ctx
                        .browser
                        .dispatch_event(&selector, "change", self.ctx.timeout())
                        .await?;
                }
            }
        }
        info!(constellation = %constellation, enabled, "constellation updated");
        Ok(())
    }

    /// Check that GPS is enabled and cannot be turned off through the UI.
    /// A select currently showing a non-GPS constellation means GPS is
    /// disabled, which fails the check outright.
    pub async fn verify_gps_mandatory(&self) -> UiResult<bool> {
        let timeout = self.ctx.timeout();
        match self.ctx.profile.series {
            DeviceSeries::Series3 => {
                let selector = constellation_checkbox_selector(Constellation::Gps);
                let checked = self.ctx.browser.is_checked(&selector, timeout).await?;
                let interactive = self.ctx.browser.is_enabled(&selector, timeout).await?;
                debug!(checked, interactive, "gps checkbox inspected");
                Ok(checked && !interactive)
            }
            DeviceSeries::Series2 => {
                if self.ctx.browser.count(CONSTELLATION_SELECT, timeout).await? == 0 {
                    // No select at all means the unit is fixed to GPS.
                    return Ok(true);
                }
                let value = self
                    .ctx
                    .browser
                    .input_value(CONSTELLATION_SELECT, timeout)
                    .await?;
                let locked = !self
                    .ctx
                    .browser
                    .is_enabled(CONSTELLATION_SELECT, timeout)
                    .await?;
                let options = self
                    .ctx
                    .browser
                    .evaluate(
                        "document.querySelector(\"select[name='constellation'], \
                         select[name='gnss_constellation']\").options.length",
                    )
                    .await?;
                let single_option = options.as_u64() == Some(1);
                Ok(series2_gps_mandatory(&value, locked, single_option))
            }
        }
    }

    /// Current enablement of every constellation the unit supports.
    pub async fn constellation_states(&self) -> UiResult<HashMap<Constellation, bool>> {
        let mut states = HashMap::new();
        for &constellation in self.supported_constellations() {
            let enabled = self.is_constellation_enabled(constellation).await?;
            states.insert(constellation, enabled);
        }
        Ok(states)
    }

    pub async fn form_state(&self) -> UiResult<FormState> {
        form::observe(self.ctx.browser, &self.save_button, self.ctx.timeout()).await
    }

    pub async fn save_changes(&self) -> UiResult<()> {
        info!(button = %self.save_button.description, "saving gnss configuration");
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

    pub async fn cancel_changes(&self) -> UiResult<()> {
        info!("cancelling gnss configuration edits");
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

    #[test]
    fn checkbox_selectors_use_firmware_names() {
        assert_eq!(
            constellation_checkbox_selector(Constellation::Gps),
            "input[name='gps_enabled']"
        );
        assert_eq!(
            constellation_checkbox_selector(Constellation::BeiDou),
            "input[name='beidou_enabled']"
        );
    }

    #[test]
    fn select_covers_both_firmware_names() {
        assert!(CONSTELLATION_SELECT.contains("name='constellation'"));
        assert!(CONSTELLATION_SELECT.contains("name='gnss_constellation'"));
    }

    #[test]
    fn gps_inactive_select_is_never_mandatory() {
        // An active non-GPS value means GPS is disabled, whatever the
        // select's interactivity says.
        assert!(!series2_gps_mandatory("GLONASS", true, true));
        assert!(!series2_gps_mandatory("Galileo", false, false));
    }

    #[test]
    fn gps_active_needs_a_locked_or_single_option_select() {
        assert!(series2_gps_mandatory("GPS", true, false));
        assert!(series2_gps_mandatory("gps", false, true));
        assert!(!series2_gps_mandatory("GPS", false, false));
    }
}
