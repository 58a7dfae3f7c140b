//! Error types for device UI interaction
//!
//! The taxonomy mirrors what actually goes wrong against embedded devices:
//! an element is missing, an element never reached the expected state, or
//! the device's own logic reverted the interaction. Capability lookups are
//! deliberately absent - unknown models degrade to defaults and never error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UiError {
    /// Selector matched zero elements.
    #[error("no element matches selector: {selector}")]
    ElementNotFound { selector: String },

    /// Element existed but did not reach the expected state in time.
    #[error("timed out after {waited_ms} ms waiting on {selector}")]
    Timeout { selector: String, waited_ms: u64 },

    /// Action performed but device-side logic rejected or reverted it.
    #[error("device rejected interaction on {selector}: {detail}")]
    Rejected { selector: String, detail: String },

    #[error("node not found. Install Node.js and run: npx playwright install")]
    NodeNotFound,

    #[error("browser driver error: {0}")]
    Driver(String),

    #[error("driver protocol error: {0}")]
    Protocol(String),

    #[error("login failed: {0}")]
    LoginFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl UiError {
    /// Map a driver-reported error kind back onto the taxonomy.
    pub fn from_driver_reply(kind: Option<&str>, selector: &str, message: String, waited_ms: u64) -> Self {
        match kind {
            Some("timeout") => UiError::Timeout {
                selector: selector.to_string(),
                waited_ms,
            },
            Some("not_found") => UiError::ElementNotFound {
                selector: selector.to_string(),
            },
            Some("rejected") => UiError::Rejected {
                selector: selector.to_string(),
                detail: message,
            },
            _ => UiError::Driver(message),
        }
    }

    /// Whether this is a device-interaction failure (as opposed to harness
    /// plumbing). The runner treats these as test observations; everything
    /// else aborts the run.
    pub fn is_interaction(&self) -> bool {
        matches!(
            self,
            UiError::ElementNotFound { .. } | UiError::Timeout { .. } | UiError::Rejected { .. }
        )
    }
}

pub type UiResult<T> = Result<T, UiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_kind_mapping() {
        let err = UiError::from_driver_reply(Some("timeout"), "button#button_save", "t".into(), 5000);
        assert!(matches!(err, UiError::Timeout { waited_ms: 5000, .. }));

        let err = UiError::from_driver_reply(Some("not_found"), "input[name='x']", "n".into(), 0);
        assert!(matches!(err, UiError::ElementNotFound { .. }));

        let err = UiError::from_driver_reply(None, "a", "boom".into(), 0);
        assert!(matches!(err, UiError::Driver(_)));
    }

    #[test]
    fn interaction_classification() {
        assert!(UiError::ElementNotFound { selector: "x".into() }.is_interaction());
        assert!(UiError::Timeout { selector: "x".into(), waited_ms: 1 }.is_interaction());
        assert!(!UiError::Driver("x".into()).is_interaction());
        assert!(!UiError::NodeNotFound.is_interaction());
    }
}
