//! Device capability registry
//!
//! A static knowledge base distilled from device exploration data: one
//! record per hardware model, covering everything the harness must branch
//! on. Lookups never fail - an unrecognized model degrades to a documented
//! Series 2 default so the suite stays usable against new hardware.

use std::collections::HashMap;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::types::{ConfigSection, Constellation, DeviceSeries, KnownIssue, SaveButton};

/// Behavioral profile of one hardware model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCapabilityRecord {
    pub model_id: String,
    pub series: DeviceSeries,
    pub serial_number: String,
    pub firmware_version: String,
    pub ptp_supported: bool,
    pub network_interfaces: Vec<String>,
    pub ptp_interfaces: Vec<String>,
    pub max_outputs: u8,
    pub gnss_constellations: Vec<Constellation>,
    pub session_timeout_minutes: u32,
    pub known_issues: Vec<KnownIssue>,
}

impl DeviceCapabilityRecord {
    /// Wait multiplier derived from documented quirks. Timeout-class issues
    /// dominate interface-complexity issues.
    pub fn timeout_multiplier(&self) -> f64 {
        if self.known_issues.iter().any(KnownIssue::is_timing_related) {
            2.0
        } else if self
            .known_issues
            .iter()
            .any(KnownIssue::is_interface_complexity)
        {
            1.5
        } else {
            1.0
        }
    }
}

/// Discrete capabilities a caller may query without caring about series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCapability {
    Ptp,
    FirmwareUpload,
    MultiConstellationGnss,
    MultipleNetworkInterfaces,
}

/// The per-test slice of a capability record that page objects carry.
///
/// Resolvable for any model string; unknown models get Series 2 defaults
/// with the neutral 1.0 multiplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub model: Option<String>,
    pub series: DeviceSeries,
    /// False when the model was absent from the registry and `series` is
    /// the documented fallback rather than tabulated fact.
    pub series_known: bool,
    pub timeout_multiplier: f64,
    pub available_sections: Vec<ConfigSection>,
    pub constellations: Vec<Constellation>,
    pub session_timeout_minutes: u32,
}

impl DeviceProfile {
    /// Scale a base wait by the per-model multiplier.
    pub fn scaled(&self, base: Duration) -> Duration {
        base.mul_f64(self.timeout_multiplier)
    }

    /// Default UI wait for this device (series base scaled by multiplier).
    pub fn default_timeout(&self) -> Duration {
        self.scaled(Duration::from_millis(self.series.base_timeout_ms()))
    }

    pub fn has_section(&self, section: ConfigSection) -> bool {
        self.available_sections.contains(&section)
    }

    pub fn text_field_limit(&self) -> usize {
        self.series.text_field_limit()
    }
}

impl Default for DeviceProfile {
    /// The documented unknown-model fallback: Series 2 shape, neutral
    /// timing, all four constellations.
    fn default() -> Self {
        DeviceProfile {
            model: None,
            series: DeviceSeries::Series2,
            series_known: false,
            timeout_multiplier: 1.0,
            available_sections: ConfigSection::series2_set(),
            constellations: Constellation::ALL.to_vec(),
            session_timeout_minutes: 30,
        }
    }
}

static BUILTIN_RECORDS: Lazy<Vec<DeviceCapabilityRecord>> = Lazy::new(|| {
    let eth = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    vec![
        DeviceCapabilityRecord {
            model_id: "KRONOS-2R-HVXX-A2F".to_string(),
            series: DeviceSeries::Series2,
            serial_number: "20245".to_string(),
            firmware_version: "04.04.00".to_string(),
            ptp_supported: false,
            network_interfaces: eth(&["eth0"]),
            ptp_interfaces: vec![],
            max_outputs: 4,
            gnss_constellations: Constellation::ALL.to_vec(),
            session_timeout_minutes: 30,
            known_issues: vec![],
        },
        DeviceCapabilityRecord {
            model_id: "KRONOS-2P-HV-2".to_string(),
            series: DeviceSeries::Series2,
            serial_number: "20216".to_string(),
            firmware_version: "04.04.00".to_string(),
            ptp_supported: false,
            network_interfaces: eth(&["eth0"]),
            ptp_interfaces: vec![],
            max_outputs: 4,
            gnss_constellations: Constellation::ALL.to_vec(),
            session_timeout_minutes: 30,
            known_issues: vec![KnownIssue::HttpsRedirect],
        },
        DeviceCapabilityRecord {
            model_id: "KRONOS-3R-HVLV-TCXO-A2F".to_string(),
            series: DeviceSeries::Series3,
            serial_number: "30165".to_string(),
            firmware_version: "02.06.04".to_string(),
            ptp_supported: true,
            network_interfaces: eth(&["eth0", "eth1", "eth2", "eth3"]),
            ptp_interfaces: eth(&["eth1", "eth2", "eth3"]),
            max_outputs: 6,
            gnss_constellations: Constellation::ALL.to_vec(),
            session_timeout_minutes: 30,
            known_issues: vec![
                KnownIssue::PtpPanelsCollapsed,
                KnownIssue::MultiInterfaceAmbiguity,
            ],
        },
        DeviceCapabilityRecord {
            model_id: "KRONOS-3R-HVXX-TCXO-44A".to_string(),
            series: DeviceSeries::Series3,
            serial_number: "30134".to_string(),
            firmware_version: "02.06.04".to_string(),
            ptp_supported: true,
            network_interfaces: eth(&["eth0", "eth1", "eth3"]),
            ptp_interfaces: eth(&["eth1", "eth3"]),
            max_outputs: 6,
            gnss_constellations: Constellation::ALL.to_vec(),
            session_timeout_minutes: 30,
            known_issues: vec![
                KnownIssue::PtpPanelsCollapsed,
                KnownIssue::MultiInterfaceAmbiguity,
                KnownIssue::ConfigUnlockTimeouts,
                KnownIssue::NavigationTimeouts,
            ],
        },
        DeviceCapabilityRecord {
            model_id: "KRONOS-3R-HVXX-TCXO-A2X".to_string(),
            series: DeviceSeries::Series3,
            serial_number: "30134".to_string(),
            firmware_version: "02.06.04".to_string(),
            ptp_supported: true,
            network_interfaces: eth(&["eth0", "eth1", "eth2", "eth3", "eth4"]),
            ptp_interfaces: eth(&["eth1", "eth3"]),
            max_outputs: 6,
            gnss_constellations: Constellation::ALL.to_vec(),
            session_timeout_minutes: 30,
            known_issues: vec![
                KnownIssue::PtpPanelsCollapsed,
                KnownIssue::MultiInterfaceAmbiguity,
                KnownIssue::ConfigUnlockTimeouts,
                KnownIssue::NavigationTimeouts,
            ],
        },
    ]
});

/// Model-to-capability lookup table.
///
/// Constructed once and passed explicitly into page objects. No lookup
/// raises; absence of a model or capability degrades to the most common
/// behavior rather than erroring, because the suite must remain usable
/// against untested hardware revisions.
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    records: HashMap<String, DeviceCapabilityRecord>,
}

impl CapabilityRegistry {
    /// Registry seeded with all models covered by exploration data.
    pub fn builtin() -> Self {
        let records = BUILTIN_RECORDS
            .iter()
            .map(|r| (r.model_id.clone(), r.clone()))
            .collect();
        CapabilityRegistry { records }
    }

    /// Registry from an explicit record set (tests, future model drops).
    pub fn from_records(records: Vec<DeviceCapabilityRecord>) -> Self {
        CapabilityRegistry {
            records: records.into_iter().map(|r| (r.model_id.clone(), r)).collect(),
        }
    }

    pub fn all_models(&self) -> Vec<&str> {
        let mut models: Vec<&str> = self.records.keys().map(String::as_str).collect();
        models.sort_unstable();
        models
    }

    /// Full record, or `None` for unknown models. Callers that need a
    /// never-fails view should use [`CapabilityRegistry::profile`].
    pub fn record(&self, model: &str) -> Option<&DeviceCapabilityRecord> {
        self.records.get(model)
    }

    /// Hardware series; `None` for unrecognized models so that callers can
    /// detect the fallback, while every other accessor silently assumes the
    /// Series 2 default.
    pub fn series(&self, model: &str) -> Option<DeviceSeries> {
        self.record(model).map(|r| r.series)
    }

    /// Always > 0; 1.0 for unknown models.
    pub fn timeout_multiplier(&self, model: &str) -> f64 {
        self.record(model)
            .map(DeviceCapabilityRecord::timeout_multiplier)
            .unwrap_or(1.0)
    }

    /// Tabulated constellation list, or all four when the model is unknown.
    /// GPS is always present.
    pub fn gnss_constellations(&self, model: &str) -> Vec<Constellation> {
        self.record(model)
            .map(|r| r.gnss_constellations.clone())
            .unwrap_or_else(|| Constellation::ALL.to_vec())
    }

    pub fn available_sections(&self, model: &str) -> Vec<ConfigSection> {
        match self.series(model) {
            Some(DeviceSeries::Series3) => ConfigSection::series3_set(),
            _ => ConfigSection::series2_set(),
        }
    }

    pub fn session_timeout_minutes(&self, model: &str) -> u32 {
        self.record(model).map(|r| r.session_timeout_minutes).unwrap_or(30)
    }

    pub fn known_issues(&self, model: &str) -> Vec<KnownIssue> {
        self.record(model).map(|r| r.known_issues.clone()).unwrap_or_default()
    }

    pub fn network_interfaces(&self, model: &str) -> Vec<String> {
        self.record(model).map(|r| r.network_interfaces.clone()).unwrap_or_default()
    }

    pub fn ptp_interfaces(&self, model: &str) -> Vec<String> {
        self.record(model).map(|r| r.ptp_interfaces.clone()).unwrap_or_default()
    }

    pub fn max_outputs(&self, model: &str) -> u8 {
        self.record(model).map(|r| r.max_outputs).unwrap_or(4)
    }

    pub fn has_capability(&self, model: &str, capability: DeviceCapability) -> bool {
        let Some(record) = self.record(model) else {
            return false;
        };
        match capability {
            DeviceCapability::Ptp => record.ptp_supported,
            DeviceCapability::FirmwareUpload => record.series == DeviceSeries::Series3,
            DeviceCapability::MultiConstellationGnss => record.series == DeviceSeries::Series3,
            DeviceCapability::MultipleNetworkInterfaces => record.network_interfaces.len() > 1,
        }
    }

    /// Resolve which save button serves a given form.
    ///
    /// Series 2 pages share one generic button. Series 3 network and PTP
    /// pages carry one form per interface, disambiguated by DOM id; PTP
    /// panels additionally start collapsed. Anything unresolved falls back
    /// to the generic button.
    pub fn save_button(
        &self,
        model: &str,
        section: ConfigSection,
        interface: Option<&str>,
    ) -> SaveButton {
        let Some(record) = self.record(model) else {
            return SaveButton::generic();
        };
        if record.series == DeviceSeries::Series2 {
            return SaveButton::generic();
        }

        match section {
            ConfigSection::Network => {
                let known = |i: &str| record.network_interfaces.iter().any(|n| n == i);
                match interface {
                    Some(iface) if known(iface) => SaveButton::for_port(iface, false),
                    _ => record
                        .network_interfaces
                        .first()
                        .map(|iface| SaveButton::for_port(iface, false))
                        .unwrap_or_else(SaveButton::generic),
                }
            }
            ConfigSection::Ptp => {
                let known = |i: &str| record.ptp_interfaces.iter().any(|n| n == i);
                match interface {
                    Some(iface) if known(iface) => SaveButton::for_port(iface, true),
                    _ => record
                        .ptp_interfaces
                        .first()
                        .map(|iface| SaveButton::for_port(iface, true))
                        .unwrap_or_else(SaveButton::generic),
                }
            }
            _ => SaveButton::generic(),
        }
    }

    /// Never-fails view used by page objects. Unknown models degrade to the
    /// documented Series 2 default profile.
    pub fn profile(&self, model: Option<&str>) -> DeviceProfile {
        let Some(model) = model else {
            return DeviceProfile::default();
        };
        match self.record(model) {
            Some(record) => DeviceProfile {
                model: Some(record.model_id.clone()),
                series: record.series,
                series_known: true,
                timeout_multiplier: record.timeout_multiplier(),
                available_sections: self.available_sections(model),
                constellations: record.gnss_constellations.clone(),
                session_timeout_minutes: record.session_timeout_minutes,
            },
            None => DeviceProfile {
                model: Some(model.to_string()),
                ..DeviceProfile::default()
            },
        }
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("KRONOS-2R-HVXX-A2F", DeviceSeries::Series2; "series 2 rack")]
    #[test_case("KRONOS-2P-HV-2", DeviceSeries::Series2; "series 2 panel")]
    #[test_case("KRONOS-3R-HVLV-TCXO-A2F", DeviceSeries::Series3; "series 3 four port")]
    #[test_case("KRONOS-3R-HVXX-TCXO-44A", DeviceSeries::Series3; "series 3 three port")]
    #[test_case("KRONOS-3R-HVXX-TCXO-A2X", DeviceSeries::Series3; "series 3 five port")]
    fn builtin_models_resolve_series(model: &str, expected: DeviceSeries) {
        let registry = CapabilityRegistry::builtin();
        assert_eq!(registry.series(model), Some(expected));
    }

    #[test]
    fn every_model_has_positive_multiplier_and_gps() {
        let registry = CapabilityRegistry::builtin();
        for model in registry.all_models() {
            assert!(registry.timeout_multiplier(model) > 0.0, "{}", model);
            assert!(
                registry.gnss_constellations(model).contains(&Constellation::Gps),
                "{} must track GPS",
                model
            );
        }
    }

    #[test_case("KRONOS-2R-HVXX-A2F", 1.0; "clean record stays neutral")]
    #[test_case("KRONOS-2P-HV-2", 1.0; "https redirect is not timing related")]
    #[test_case("KRONOS-3R-HVLV-TCXO-A2F", 1.5; "interface complexity")]
    #[test_case("KRONOS-3R-HVXX-TCXO-44A", 2.0; "timeout issues dominate")]
    fn multiplier_derivation(model: &str, expected: f64) {
        let registry = CapabilityRegistry::builtin();
        assert_eq!(registry.timeout_multiplier(model), expected);
    }

    #[test]
    fn unknown_model_degrades_to_defaults() {
        let registry = CapabilityRegistry::builtin();
        assert_eq!(registry.series("KRONOS-9X-FUTURE"), None);
        assert_eq!(registry.timeout_multiplier("KRONOS-9X-FUTURE"), 1.0);
        assert_eq!(
            registry.gnss_constellations("KRONOS-9X-FUTURE"),
            Constellation::ALL.to_vec()
        );
        assert_eq!(
            registry.save_button("KRONOS-9X-FUTURE", ConfigSection::Network, Some("eth1")),
            SaveButton::generic()
        );

        let profile = registry.profile(Some("KRONOS-9X-FUTURE"));
        assert_eq!(profile.series, DeviceSeries::Series2);
        assert!(!profile.series_known);
        assert_eq!(profile.timeout_multiplier, 1.0);
    }

    #[test]
    fn no_model_at_all_yields_neutral_profile() {
        let registry = CapabilityRegistry::builtin();
        let profile = registry.profile(None);
        assert!(profile.model.is_none());
        assert!(!profile.series_known);
        assert!(profile.has_section(ConfigSection::General));
        assert!(!profile.has_section(ConfigSection::Ptp));
    }

    #[test]
    fn save_button_resolution_matrix() {
        let registry = CapabilityRegistry::builtin();
        let s2 = "KRONOS-2R-HVXX-A2F";
        let s3 = "KRONOS-3R-HVLV-TCXO-A2F";

        // Series 2: always the generic button, whatever the section.
        assert_eq!(
            registry.save_button(s2, ConfigSection::Network, Some("eth0")),
            SaveButton::generic()
        );
        assert_eq!(registry.save_button(s2, ConfigSection::Gnss, None), SaveButton::generic());

        // Series 3 network forms are per interface, no panel expansion.
        let eth1 = registry.save_button(s3, ConfigSection::Network, Some("eth1"));
        assert_eq!(eth1.selector, "button#button_save_port_eth1");
        assert!(!eth1.panel_expansion_required);

        // Series 3 PTP forms start collapsed.
        let ptp = registry.save_button(s3, ConfigSection::Ptp, Some("eth2"));
        assert_eq!(ptp.selector, "button#button_save_port_eth2");
        assert!(ptp.panel_expansion_required);

        // Unknown interface falls back to the first tabulated one.
        let fallback = registry.save_button(s3, ConfigSection::Network, Some("eth9"));
        assert_eq!(fallback.selector, "button#button_save_port_eth0");

        // Non-interface sections keep the generic button even on Series 3.
        assert_eq!(registry.save_button(s3, ConfigSection::General, None), SaveButton::generic());
    }

    #[test]
    fn series3_capabilities() {
        let registry = CapabilityRegistry::builtin();
        let s3 = "KRONOS-3R-HVXX-TCXO-A2X";
        assert!(registry.has_capability(s3, DeviceCapability::Ptp));
        assert!(registry.has_capability(s3, DeviceCapability::FirmwareUpload));
        assert!(registry.has_capability(s3, DeviceCapability::MultipleNetworkInterfaces));
        assert_eq!(registry.network_interfaces(s3).len(), 5);
        assert_eq!(registry.ptp_interfaces(s3), vec!["eth1", "eth3"]);
        assert_eq!(registry.max_outputs(s3), 6);

        let s2 = "KRONOS-2P-HV-2";
        assert!(!registry.has_capability(s2, DeviceCapability::Ptp));
        assert!(!registry.has_capability(s2, DeviceCapability::MultipleNetworkInterfaces));
        assert_eq!(registry.known_issues(s2), vec![KnownIssue::HttpsRedirect]);
    }

    #[test]
    fn profile_timeouts_scale_with_multiplier() {
        let registry = CapabilityRegistry::builtin();
        let slow = registry.profile(Some("KRONOS-3R-HVXX-TCXO-44A"));
        // 90s Series 3 base at the 2.0 multiplier.
        assert_eq!(slow.default_timeout(), Duration::from_secs(180));
        let clean = registry.profile(Some("KRONOS-2R-HVXX-A2F"));
        assert_eq!(clean.default_timeout(), Duration::from_secs(30));
    }
}
