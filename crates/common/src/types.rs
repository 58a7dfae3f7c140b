//! Core domain types for Kronos devices

use serde::{Deserialize, Serialize};

/// Hardware generation of a Kronos device.
///
/// Series 2 and Series 3 expose materially different web UIs: field sets,
/// GNSS constellation controls and save-button ids all differ, so the
/// harness dispatches on this everywhere instead of sniffing the DOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceSeries {
    Series2,
    Series3,
}

impl DeviceSeries {
    /// Numeric series as reported by device exploration data.
    pub fn number(&self) -> u8 {
        match self {
            DeviceSeries::Series2 => 2,
            DeviceSeries::Series3 => 3,
        }
    }

    /// Base wait applied to UI operations before the per-model multiplier.
    /// Series 3 appliances are markedly slower to settle than Series 2.
    pub fn base_timeout_ms(&self) -> u64 {
        match self {
            DeviceSeries::Series2 => 30_000,
            DeviceSeries::Series3 => 90_000,
        }
    }

    /// Maximum accepted length for free-text identification fields
    /// (identifier, location, contact, description). Series 3 firmware
    /// enforces a 29-character maxlength attribute; Series 2 accepts the
    /// 50-character bound exercised by the suite.
    pub fn text_field_limit(&self) -> usize {
        match self {
            DeviceSeries::Series2 => 50,
            DeviceSeries::Series3 => 29,
        }
    }
}

impl std::fmt::Display for DeviceSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceSeries::Series2 => write!(f, "Series 2"),
            DeviceSeries::Series3 => write!(f, "Series 3"),
        }
    }
}

/// GNSS satellite constellations a device may track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constellation {
    Gps,
    Glonass,
    Galileo,
    BeiDou,
}

impl Constellation {
    pub const ALL: [Constellation; 4] = [
        Constellation::Gps,
        Constellation::Glonass,
        Constellation::Galileo,
        Constellation::BeiDou,
    ];

    /// Name attribute of the enable checkbox on Series 3 GNSS pages.
    pub fn checkbox_name(&self) -> &'static str {
        match self {
            Constellation::Gps => "gps_enabled",
            Constellation::Glonass => "glonass_enabled",
            Constellation::Galileo => "galileo_enabled",
            Constellation::BeiDou => "beidou_enabled",
        }
    }

    /// Option value used by the Series 2 single-select constellation control.
    pub fn select_value(&self) -> &'static str {
        match self {
            Constellation::Gps => "GPS",
            Constellation::Glonass => "GLONASS",
            Constellation::Galileo => "Galileo",
            Constellation::BeiDou => "BeiDou",
        }
    }
}

impl std::fmt::Display for Constellation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constellation::Gps => write!(f, "GPS"),
            Constellation::Glonass => write!(f, "GLONASS"),
            Constellation::Galileo => write!(f, "Galileo"),
            Constellation::BeiDou => write!(f, "BeiDou"),
        }
    }
}

impl std::str::FromStr for Constellation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GPS" => Ok(Constellation::Gps),
            "GLONASS" => Ok(Constellation::Glonass),
            "GALILEO" => Ok(Constellation::Galileo),
            "BEIDOU" => Ok(Constellation::BeiDou),
            other => Err(format!("unknown constellation: {}", other)),
        }
    }
}

/// Configuration sections of the device web UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSection {
    General,
    Network,
    Time,
    Gnss,
    Outputs,
    Display,
    Snmp,
    Syslog,
    Access,
    Upload,
    Ptp,
}

impl ConfigSection {
    /// URL route of this section on the device web server.
    pub fn route(&self) -> &'static str {
        match self {
            ConfigSection::General => "/general",
            ConfigSection::Network => "/network",
            ConfigSection::Time => "/time",
            ConfigSection::Gnss => "/gnss",
            ConfigSection::Outputs => "/outputs",
            ConfigSection::Display => "/display",
            ConfigSection::Snmp => "/snmp",
            ConfigSection::Syslog => "/syslog",
            ConfigSection::Access => "/access",
            ConfigSection::Upload => "/upload",
            ConfigSection::Ptp => "/ptp",
        }
    }

    /// Sections present on every Series 2 device.
    pub fn series2_set() -> Vec<ConfigSection> {
        vec![
            ConfigSection::General,
            ConfigSection::Network,
            ConfigSection::Time,
            ConfigSection::Gnss,
            ConfigSection::Outputs,
            ConfigSection::Display,
            ConfigSection::Access,
            ConfigSection::Snmp,
            ConfigSection::Syslog,
        ]
    }

    /// Series 3 adds firmware upload and PTP on top of the Series 2 set.
    pub fn series3_set() -> Vec<ConfigSection> {
        let mut sections = Self::series2_set();
        sections.push(ConfigSection::Upload);
        sections.push(ConfigSection::Ptp);
        sections
    }
}

impl std::fmt::Display for ConfigSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Route without the leading slash doubles as the section name.
        write!(f, "{}", &self.route()[1..])
    }
}

/// Documented per-model quirks from device exploration data.
///
/// Used only to adjust timeouts and soften assertions, never to drive
/// configuration behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnownIssue {
    /// HTTP requests are redirected to HTTPS, which breaks plain-HTTP
    /// browser compatibility checks on this unit.
    HttpsRedirect,
    /// PTP interface panels render collapsed and must be expanded before
    /// their save buttons become reachable.
    PtpPanelsCollapsed,
    /// Multiple visually identical forms per page; locators must use the
    /// interface-specific button ids.
    MultiInterfaceAmbiguity,
    /// Configuration unlock intermittently exceeds default timeouts.
    ConfigUnlockTimeouts,
    /// Section navigation intermittently exceeds default timeouts.
    NavigationTimeouts,
}

impl KnownIssue {
    /// Whether this issue warrants extended waits.
    pub fn is_timing_related(&self) -> bool {
        matches!(
            self,
            KnownIssue::ConfigUnlockTimeouts | KnownIssue::NavigationTimeouts
        )
    }

    /// Whether this issue stems from multi-interface UI complexity.
    pub fn is_interface_complexity(&self) -> bool {
        matches!(
            self,
            KnownIssue::PtpPanelsCollapsed | KnownIssue::MultiInterfaceAmbiguity
        )
    }
}

/// Resolved save-button descriptor for one form on one device.
///
/// Several device pages contain multiple forms whose save buttons are
/// visually identical and disambiguated only by DOM id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveButton {
    /// CSS selector of the button.
    pub selector: String,
    /// Human-readable description for logs and reports.
    pub description: String,
    /// Whether a collapsible panel must be expanded before the button is
    /// reachable (Series 3 PTP panels).
    pub panel_expansion_required: bool,
}

impl SaveButton {
    pub fn generic() -> Self {
        SaveButton {
            selector: "button#button_save".to_string(),
            description: "Generic save button".to_string(),
            panel_expansion_required: false,
        }
    }

    pub fn for_port(interface: &str, panel_expansion_required: bool) -> Self {
        SaveButton {
            selector: format!("button#button_save_port_{}", interface),
            description: format!("Save button for {}", interface),
            panel_expansion_required,
        }
    }
}

/// Selector of the cancel button shared by all configuration forms.
pub const CANCEL_BUTTON_SELECTOR: &str = "button#button_cancel";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_numbers_and_timeouts() {
        assert_eq!(DeviceSeries::Series2.number(), 2);
        assert_eq!(DeviceSeries::Series3.number(), 3);
        assert!(DeviceSeries::Series3.base_timeout_ms() > DeviceSeries::Series2.base_timeout_ms());
    }

    #[test]
    fn text_field_limits_match_firmware() {
        assert_eq!(DeviceSeries::Series3.text_field_limit(), 29);
        assert_eq!(DeviceSeries::Series2.text_field_limit(), 50);
    }

    #[test]
    fn constellation_checkbox_names() {
        assert_eq!(Constellation::Gps.checkbox_name(), "gps_enabled");
        assert_eq!(Constellation::Galileo.checkbox_name(), "galileo_enabled");
        assert_eq!(Constellation::Glonass.checkbox_name(), "glonass_enabled");
        assert_eq!(Constellation::BeiDou.checkbox_name(), "beidou_enabled");
    }

    #[test]
    fn constellation_parses_case_insensitively() {
        assert_eq!("galileo".parse::<Constellation>(), Ok(Constellation::Galileo));
        assert_eq!("GPS".parse::<Constellation>(), Ok(Constellation::Gps));
        assert!("IRNSS".parse::<Constellation>().is_err());
    }

    #[test]
    fn section_sets_are_nested() {
        let s2 = ConfigSection::series2_set();
        let s3 = ConfigSection::series3_set();
        assert!(s2.iter().all(|s| s3.contains(s)));
        assert!(s3.contains(&ConfigSection::Ptp));
        assert!(s3.contains(&ConfigSection::Upload));
        assert!(!s2.contains(&ConfigSection::Ptp));
    }

    #[test]
    fn interface_save_button_selector() {
        let button = SaveButton::for_port("eth1", true);
        assert_eq!(button.selector, "button#button_save_port_eth1");
        assert!(button.panel_expansion_required);
        assert_eq!(SaveButton::generic().selector, "button#button_save");
    }
}
