//! Save/cancel form lifecycle
//!
//! Every configuration form on the device follows the same lifecycle: the
//! Save button is disabled until a field changes, saving or cancelling
//! returns the form to its pristine state, and a failed save leaves it
//! dirty. The authoritative state lives in the device's own UI logic, so
//! [`observe`] reads it back from the Save button's DOM attribute instead
//! of trusting an in-memory model.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use kronos_common::SaveButton;

use crate::browser::BrowserSession;
use crate::error::{UiError, UiResult};

/// Lifecycle state of a configuration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormState {
    /// No unsaved edits; Save disabled.
    Pristine,
    /// At least one field edited since load or last save/cancel; Save enabled.
    Dirty,
    /// Save request in flight.
    Saving,
    /// Cancel request in flight.
    Cancelling,
}

/// Events driving the form lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEvent {
    Edit,
    SaveStarted,
    SaveSucceeded,
    SaveFailed,
    CancelStarted,
    CancelSettled,
}

impl FormState {
    /// Pure transition function. Events that make no sense in the current
    /// state leave it unchanged; the form is reused indefinitely across
    /// navigations, so there is no terminal state.
    pub fn apply(self, event: FormEvent) -> FormState {
        use FormEvent::*;
        use FormState::*;
        match (self, event) {
            (Pristine, Edit) => Dirty,
            (Dirty, Edit) => Dirty,
            (Dirty, SaveStarted) => Saving,
            (Saving, SaveSucceeded) => Pristine,
            (Saving, SaveFailed) => Dirty,
            (Dirty, CancelStarted) => Cancelling,
            (Cancelling, CancelSettled) => Pristine,
            (state, _) => state,
        }
    }
}

impl std::fmt::Display for FormState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormState::Pristine => write!(f, "pristine"),
            FormState::Dirty => write!(f, "dirty"),
            FormState::Saving => write!(f, "saving"),
            FormState::Cancelling => write!(f, "cancelling"),
        }
    }
}

/// Read the form state off the device: enabled Save button means dirty.
/// The transient states are not observable from the DOM. `timeout` is the
/// caller's profile-scaled wait so slow models keep their headroom.
pub async fn observe(
    browser: &BrowserSession,
    save_button: &SaveButton,
    timeout: Duration,
) -> UiResult<FormState> {
    if browser.count(&save_button.selector, timeout).await? == 0 {
        return Err(UiError::ElementNotFound {
            selector: save_button.selector.clone(),
        });
    }
    let enabled = browser.is_enabled(&save_button.selector, timeout).await?;
    let state = if enabled { FormState::Dirty } else { FormState::Pristine };
    debug!(selector = %save_button.selector, %state, "observed form state");
    Ok(state)
}

/// Poll until the form reaches `expected`, device-side.
pub async fn wait_for_state(
    browser: &BrowserSession,
    save_button: &SaveButton,
    expected: FormState,
    timeout: Duration,
) -> UiResult<FormState> {
    let start = std::time::Instant::now();
    loop {
        let state = observe(browser, save_button, timeout).await?;
        if state == expected {
            return Ok(state);
        }
        if start.elapsed() >= timeout {
            return Err(UiError::Timeout {
                selector: save_button.selector.clone(),
                waited_ms: timeout.as_millis() as u64,
            });
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::FormEvent::*;
    use super::FormState::*;
    use super::*;

    #[test]
    fn edit_dirties_a_pristine_form() {
        assert_eq!(Pristine.apply(Edit), Dirty);
        assert_eq!(Dirty.apply(Edit), Dirty);
    }

    #[test]
    fn successful_save_returns_to_pristine() {
        assert_eq!(Dirty.apply(SaveStarted), Saving);
        assert_eq!(Saving.apply(SaveSucceeded), Pristine);
    }

    #[test]
    fn failed_save_stays_dirty() {
        assert_eq!(Dirty.apply(SaveStarted).apply(SaveFailed), Dirty);
    }

    #[test]
    fn cancel_returns_to_pristine() {
        assert_eq!(Dirty.apply(CancelStarted), Cancelling);
        assert_eq!(Cancelling.apply(CancelSettled), Pristine);
    }

    #[test]
    fn nonsense_events_leave_state_unchanged() {
        assert_eq!(Pristine.apply(SaveStarted), Pristine);
        assert_eq!(Pristine.apply(CancelStarted), Pristine);
        assert_eq!(Saving.apply(Edit), Saving);
        assert_eq!(Cancelling.apply(SaveFailed), Cancelling);
    }
}
