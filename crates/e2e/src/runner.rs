//! Scenario runner
//!
//! Orchestrates one browser session against one physical appliance and
//! walks it through the acceptance scenarios. Scenarios that do not apply
//! to the unit under test (missing section, wrong series) are skipped, not
//! failed; an interaction error inside a scenario fails that scenario and
//! the run moves on. Harness-level faults (node missing, driver crash,
//! login refused) abort the whole run.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use kronos_common::{CapabilityRegistry, ConfigSection, Constellation, DeviceSeries};

use crate::api::{EndpointProbe, EndpointStatus, PROTECTED_ROUTES};
use crate::browser::BrowserSession;
use crate::config::TargetConfig;
use crate::error::{UiError, UiResult};
use crate::form::FormState;
use crate::pages::{GeneralConfigPage, GnssConfigPage, LoginOutcome, LoginPage};

/// Every scenario the suite knows, in execution order.
pub const SCENARIOS: [&str; 7] = [
    "identifier-round-trip",
    "location-field-limit",
    "save-cancel-lifecycle",
    "gps-mandatory",
    "galileo-toggle",
    "endpoint-availability",
    "session-expiry-infrastructure",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    Skipped,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub status: ScenarioStatus,
    pub duration_ms: u64,
    /// Failure or skip reason; absent on a pass.
    pub detail: Option<String>,
}

/// Result of running the whole suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub started_at: DateTime<Utc>,
    pub target: String,
    pub hardware_model: Option<String>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    fn tally(
        started_at: DateTime<Utc>,
        target: &TargetConfig,
        duration_ms: u64,
        results: Vec<ScenarioResult>,
    ) -> Self {
        let count = |status| results.iter().filter(|r| r.status == status).count();
        Self {
            started_at,
            target: target.base_url.clone(),
            hardware_model: target.hardware_model.clone(),
            total: results.len(),
            passed: count(ScenarioStatus::Passed),
            failed: count(ScenarioStatus::Failed),
            skipped: count(ScenarioStatus::Skipped),
            duration_ms,
            results,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Characters written into the location field by the limit scenario.
const LOCATION_FILL_LEN: usize = 50;

/// The device must keep exactly the first `limit` characters of an
/// overlong fill. Truncating short of the limit, or dropping the value
/// entirely, is a defect rather than a pass.
fn truncated_exactly(accepted: &str, filled: &str, limit: usize) -> bool {
    accepted.len() == limit.min(filled.len()) && filled.starts_with(accepted)
}

/// How a scenario ended, before interaction errors are folded in.
enum Outcome {
    Passed,
    Failed(String),
    Skipped(String),
}

/// Runs acceptance scenarios against one device.
pub struct ScenarioRunner {
    target: TargetConfig,
    registry: CapabilityRegistry,
    output_dir: PathBuf,
}

impl ScenarioRunner {
    pub fn new(target: TargetConfig, output_dir: PathBuf) -> Self {
        Self {
            target,
            registry: CapabilityRegistry::builtin(),
            output_dir,
        }
    }

    fn model(&self) -> Option<&str> {
        self.target.hardware_model.as_deref()
    }

    /// Run every scenario.
    pub async fn run_all(&self) -> UiResult<SuiteResult> {
        let names: Vec<String> = SCENARIOS.iter().map(|s| s.to_string()).collect();
        self.run_named(&names).await
    }

    /// Run the named scenarios in catalogue order. Unknown names fail the
    /// run before any browser is launched.
    pub async fn run_named(&self, names: &[String]) -> UiResult<SuiteResult> {
        for name in names {
            if !SCENARIOS.contains(&name.as_str()) {
                return Err(UiError::Driver(format!("unknown scenario: {}", name)));
            }
        }
        let selected: Vec<&str> = SCENARIOS
            .iter()
            .copied()
            .filter(|s| names.iter().any(|n| n == s))
            .collect();

        let started_at = Utc::now();
        let start = Instant::now();

        let session = BrowserSession::launch(self.target.browser_config()).await?;
        let run = self.run_selected(&session, &selected).await;
        session.close().await?;
        let results = run?;

        let duration_ms = start.elapsed().as_millis() as u64;
        let suite = SuiteResult::tally(started_at, &self.target, duration_ms, results);
        info!(
            passed = suite.passed,
            failed = suite.failed,
            skipped = suite.skipped,
            duration_ms = suite.duration_ms,
            "suite complete"
        );
        Ok(suite)
    }

    async fn run_selected(
        &self,
        session: &BrowserSession,
        selected: &[&str],
    ) -> UiResult<Vec<ScenarioResult>> {
        // One authenticated session carries the whole run.
        let login = LoginPage::new(session, &self.registry, self.model());
        login.open().await?;
        match login.login(&self.target.password).await? {
            LoginOutcome::LoggedIn => {}
            LoginOutcome::Rejected { message } => {
                return Err(UiError::LoginFailed(message));
            }
        }

        let mut results = Vec::with_capacity(selected.len());
        for name in selected {
            let start = Instant::now();
            let outcome = match self.run_scenario(session, name).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_interaction() => Outcome::Failed(e.to_string()),
                Err(e) => return Err(e),
            };
            let duration_ms = start.elapsed().as_millis() as u64;

            let (status, detail) = match outcome {
                Outcome::Passed => {
                    info!("✓ {} ({} ms)", name, duration_ms);
                    (ScenarioStatus::Passed, None)
                }
                Outcome::Failed(detail) => {
                    error!("✗ {} - {}", name, detail);
                    (ScenarioStatus::Failed, Some(detail))
                }
                Outcome::Skipped(reason) => {
                    warn!("- {} skipped: {}", name, reason);
                    (ScenarioStatus::Skipped, Some(reason))
                }
            };
            results.push(ScenarioResult {
                name: name.to_string(),
                status,
                duration_ms,
                detail,
            });
        }
        Ok(results)
    }

    async fn run_scenario(&self, session: &BrowserSession, name: &str) -> UiResult<Outcome> {
        info!(scenario = name, "running");
        match name {
            "identifier-round-trip" => self.identifier_round_trip(session).await,
            "location-field-limit" => self.location_field_limit(session).await,
            "save-cancel-lifecycle" => self.save_cancel_lifecycle(session).await,
            "gps-mandatory" => self.gps_mandatory(session).await,
            "galileo-toggle" => self.galileo_toggle(session).await,
            "endpoint-availability" => self.endpoint_availability().await,
            "session-expiry-infrastructure" => {
                self.session_expiry_infrastructure(session).await
            }
            other => Err(UiError::Driver(format!("unknown scenario: {}", other))),
        }
    }

    /// Skip scenarios that only make sense on Series 3 hardware; running
    /// them against a Series 2 single-select would switch the active
    /// constellation away from GPS.
    fn series3_precondition(&self) -> Option<Outcome> {
        let profile = self.registry.profile(self.model());
        if profile.series_known && profile.series == DeviceSeries::Series3 {
            None
        } else {
            Some(Outcome::Skipped(
                "constellation toggling applies to Series 3 units only".to_string(),
            ))
        }
    }

    fn has_section(&self, section: ConfigSection) -> Option<Outcome> {
        let profile = self.registry.profile(self.model());
        if profile.has_section(section) {
            None
        } else {
            Some(Outcome::Skipped(format!(
                "section {} not available on this model",
                section
            )))
        }
    }

    /// Write an identifier, save, reload, and expect the value back.
    async fn identifier_round_trip(&self, session: &BrowserSession) -> UiResult<Outcome> {
        if let Some(skip) = self.has_section(ConfigSection::General) {
            return Ok(skip);
        }
        let page = GeneralConfigPage::new(session, &self.registry, self.model());
        page.open().await?;
        let original = page.page_data().await?;

        let value = format!("qa-{}", Utc::now().format("%Y%m%d%H%M%S"));
        page.configure_identifier(&value).await?;
        page.save_configuration().await?;

        page.open().await?;
        let readback = page.identifier().await?;

        let outcome = if readback == value {
            Outcome::Passed
        } else {
            Outcome::Failed(format!(
                "identifier did not survive reload: wrote '{}', read '{}'",
                value, readback
            ))
        };

        page.restore_page_data(&original).await?;
        Ok(outcome)
    }

    /// Overlong location input must be truncated at the series limit.
    async fn location_field_limit(&self, session: &BrowserSession) -> UiResult<Outcome> {
        if let Some(skip) = self.has_section(ConfigSection::General) {
            return Ok(skip);
        }
        let page = GeneralConfigPage::new(session, &self.registry, self.model());
        page.open().await?;

        let limit = page.text_field_limit();
        let fill = "B".repeat(LOCATION_FILL_LEN);
        page.configure_location(&fill).await?;
        let accepted = page.location().await?;

        let outcome = if truncated_exactly(&accepted, &fill, limit) {
            Outcome::Passed
        } else {
            Outcome::Failed(format!(
                "field holds {} chars after a {}-char fill, expected exactly {}",
                accepted.len(),
                fill.len(),
                limit.min(fill.len())
            ))
        };

        page.cancel_configuration().await?;
        Ok(outcome)
    }

    /// Editing arms the Save button; both save and cancel disarm it.
    async fn save_cancel_lifecycle(&self, session: &BrowserSession) -> UiResult<Outcome> {
        if let Some(skip) = self.has_section(ConfigSection::General) {
            return Ok(skip);
        }
        let page = GeneralConfigPage::new(session, &self.registry, self.model());
        page.open().await?;
        let original = page.page_data().await?;

        if page.form_state().await? != FormState::Pristine {
            return Ok(Outcome::Failed(
                "form not pristine after navigation".to_string(),
            ));
        }

        page.configure_contact("qa contact probe").await?;
        if page.form_state().await? != FormState::Dirty {
            return Ok(Outcome::Failed(
                "edit did not enable the save button".to_string(),
            ));
        }

        page.cancel_configuration().await?;
        if page.form_state().await? != FormState::Pristine {
            return Ok(Outcome::Failed(
                "cancel did not disable the save button".to_string(),
            ));
        }
        // Firmware either restores the pre-edit value or blanks the field;
        // both count as a discarded edit.
        let contact = page.page_data().await?.get("contact").cloned();
        let pre_edit = original.get("contact").cloned();
        if let Some(contact) = contact {
            if !contact.is_empty() && Some(&contact) != pre_edit.as_ref() {
                return Ok(Outcome::Failed(format!(
                    "cancel left the edited value in place: '{}'",
                    contact
                )));
            }
        }

        page.configure_contact("qa contact probe").await?;
        page.save_configuration().await?;
        if page.form_state().await? != FormState::Pristine {
            return Ok(Outcome::Failed(
                "save did not disable the save button".to_string(),
            ));
        }

        page.restore_page_data(&original).await?;
        Ok(Outcome::Passed)
    }

    /// GPS stays enabled and non-interactive, and the page refuses to try.
    async fn gps_mandatory(&self, session: &BrowserSession) -> UiResult<Outcome> {
        if let Some(skip) = self.has_section(ConfigSection::Gnss) {
            return Ok(skip);
        }
        let page = GnssConfigPage::new(session, &self.registry, self.model());
        page.open().await?;

        if !page.verify_gps_mandatory().await? {
            return Ok(Outcome::Failed(
                "GPS control is interactive or not enabled".to_string(),
            ));
        }
        match page.set_constellation(Constellation::Gps, false).await {
            Err(UiError::Rejected { .. }) => Ok(Outcome::Passed),
            Ok(()) => Ok(Outcome::Failed(
                "disabling GPS was not refused".to_string(),
            )),
            Err(e) => Err(e),
        }
    }

    /// Toggle Galileo and confirm the form arms; put it back afterwards.
    /// Units whose firmware rejects the change device-side are skipped.
    async fn galileo_toggle(&self, session: &BrowserSession) -> UiResult<Outcome> {
        if let Some(skip) = self.has_section(ConfigSection::Gnss) {
            return Ok(skip);
        }
        if let Some(skip) = self.series3_precondition() {
            return Ok(skip);
        }
        let page = GnssConfigPage::new(session, &self.registry, self.model());
        if !page
            .supported_constellations()
            .contains(&Constellation::Galileo)
        {
            return Ok(Outcome::Skipped(
                "model does not support Galileo".to_string(),
            ));
        }
        page.open().await?;

        let before = page.is_constellation_enabled(Constellation::Galileo).await?;
        match page.set_constellation(Constellation::Galileo, !before).await {
            Ok(()) => {}
            Err(UiError::Rejected { detail, .. }) => {
                return Ok(Outcome::Skipped(format!(
                    "constellation change refused: {}",
                    detail
                )));
            }
            Err(e) => return Err(e),
        }

        if page.is_constellation_enabled(Constellation::Galileo).await? == before {
            let _ = page.cancel_changes().await;
            return Ok(Outcome::Failed(
                "toggling Galileo did not change its reported state".to_string(),
            ));
        }
        if page.form_state().await? != FormState::Dirty {
            let _ = page.cancel_changes().await;
            return Ok(Outcome::Failed(
                "toggling Galileo did not enable the save button".to_string(),
            ));
        }

        // Leave the device as found.
        page.cancel_changes().await?;
        let after = page.is_constellation_enabled(Constellation::Galileo).await?;
        if after != before {
            return Ok(Outcome::Failed(
                "cancel did not restore the Galileo setting".to_string(),
            ));
        }
        Ok(Outcome::Passed)
    }

    /// Every catalogued route answers, and the protected subset demands
    /// authentication. Runs over plain HTTP without a session cookie.
    async fn endpoint_availability(&self) -> UiResult<Outcome> {
        let probe = EndpointProbe::new(&self.target.base_url)?;
        let survey = probe.survey().await;

        let mut faults = Vec::new();
        for (path, status) in &survey {
            if matches!(status, EndpointStatus::Unreachable { .. }) {
                faults.push(format!("{} unreachable ({:?})", path, status));
            }
            if PROTECTED_ROUTES.contains(&path.as_str())
                && *status != EndpointStatus::AuthRequired
            {
                faults.push(format!("{} served without authentication", path));
            }
        }

        if faults.is_empty() {
            Ok(Outcome::Passed)
        } else {
            Ok(Outcome::Failed(faults.join("; ")))
        }
    }

    /// The DOM must carry the modal scaffolding the expiry warning uses.
    /// Waiting out a real session timeout is out of reach for a suite run.
    async fn session_expiry_infrastructure(
        &self,
        session: &BrowserSession,
    ) -> UiResult<Outcome> {
        let login = LoginPage::new(session, &self.registry, self.model());
        session.goto("/").await?;
        info!(
            session_timeout_minutes = login.session_timeout_minutes(),
            "checking session expiry infrastructure"
        );
        if login.session_expiry_infrastructure_present().await? {
            Ok(Outcome::Passed)
        } else {
            Ok(Outcome::Failed(
                "no modal infrastructure found in the DOM".to_string(),
            ))
        }
    }

    /// Write the suite result to a JSON file in the output directory.
    pub fn write_report(&self, suite: &SuiteResult) -> UiResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join("acceptance-results.json");
        let json = serde_json::to_string_pretty(suite)?;
        std::fs::write(&path, json)?;
        info!("results written to {}", path.display());
        Ok(path)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, status: ScenarioStatus) -> ScenarioResult {
        ScenarioResult {
            name: name.to_string(),
            status,
            duration_ms: 1,
            detail: None,
        }
    }

    #[test]
    fn tally_accounts_for_every_status() {
        let target = TargetConfig::default();
        let results = vec![
            result("a", ScenarioStatus::Passed),
            result("b", ScenarioStatus::Failed),
            result("c", ScenarioStatus::Skipped),
            result("d", ScenarioStatus::Passed),
        ];
        let suite = SuiteResult::tally(Utc::now(), &target, 42, results);
        assert_eq!(suite.total, 4);
        assert_eq!(suite.passed, 2);
        assert_eq!(suite.failed, 1);
        assert_eq!(suite.skipped, 1);
        assert!(!suite.all_passed());
    }

    #[test]
    fn empty_suite_passes() {
        let suite = SuiteResult::tally(Utc::now(), &TargetConfig::default(), 0, vec![]);
        assert!(suite.all_passed());
    }

    #[test]
    fn location_limit_requires_exact_truncation() {
        let fill = "B".repeat(LOCATION_FILL_LEN);
        assert!(truncated_exactly(&"B".repeat(29), &fill, 29));
        assert!(truncated_exactly(&fill, &fill, 50));
        // An empty or short read-back is a lost value, not a pass.
        assert!(!truncated_exactly("", &fill, 29));
        assert!(!truncated_exactly(&"B".repeat(20), &fill, 29));
        assert!(!truncated_exactly(&"B".repeat(30), &fill, 29));
        assert!(!truncated_exactly("XXXXXXXXXXXXXXXXXXXXXXXXXXXXX", &fill, 29));
    }

    #[test]
    fn galileo_toggle_only_runs_on_series3() {
        let runner_for = |model: Option<&str>| {
            let target = TargetConfig {
                hardware_model: model.map(str::to_string),
                ..TargetConfig::default()
            };
            ScenarioRunner::new(target, PathBuf::from("test-results"))
        };

        // Series 2 single-select units and unknown models must be skipped.
        assert!(matches!(
            runner_for(Some("KRONOS-2R-HVXX-A2F")).series3_precondition(),
            Some(Outcome::Skipped(_))
        ));
        assert!(matches!(
            runner_for(Some("KRONOS-9X-FUTURE")).series3_precondition(),
            Some(Outcome::Skipped(_))
        ));
        assert!(matches!(
            runner_for(None).series3_precondition(),
            Some(Outcome::Skipped(_))
        ));
        assert!(runner_for(Some("KRONOS-3R-HVLV-TCXO-A2F"))
            .series3_precondition()
            .is_none());
    }

    #[test]
    fn scenario_catalogue_has_no_duplicates() {
        let mut names: Vec<&str> = SCENARIOS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SCENARIOS.len());
    }

    #[test]
    fn unknown_scenario_is_rejected() {
        let runner = ScenarioRunner::new(TargetConfig::default(), PathBuf::from("/tmp/out"));
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let err = rt
            .block_on(runner.run_named(&["no-such-scenario".to_string()]))
            .unwrap_err();
        assert!(err.to_string().contains("unknown scenario"));
    }

    #[test]
    fn suite_result_round_trips_through_json() {
        let suite = SuiteResult::tally(
            Utc::now(),
            &TargetConfig::default(),
            7,
            vec![result("identifier-round-trip", ScenarioStatus::Passed)],
        );
        let json = serde_json::to_string(&suite).unwrap();
        let back: SuiteResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.total, 1);
        assert_eq!(back.results[0].status, ScenarioStatus::Passed);
    }
}
