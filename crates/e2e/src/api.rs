//! Endpoint availability probing
//!
//! Plain HTTP checks against the device's route catalogue, independent of
//! the browser. The catalogue and its protected subset come from device
//! exploration data; unauthenticated requests to protected routes bounce
//! to the login page.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::UiResult;

/// Every route exposed by the device web server.
pub const WEB_ROUTES: [&str; 16] = [
    "/", "/general", "/time", "/display", "/outputs", "/network", "/snmp", "/gnss",
    "/syslog", "/upload", "/access", "/log", "/legal", "/contact", "/login", "/logout",
];

/// Routes that require an authenticated session.
pub const PROTECTED_ROUTES: [&str; 5] = ["/general", "/time", "/network", "/snmp", "/upload"];

/// Outcome of probing one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum EndpointStatus {
    /// Served a successful response.
    Reachable,
    /// Redirected to the login page or answered 401/403.
    AuthRequired,
    /// Connection failed or the device answered with an error status.
    Unreachable { http_status: Option<u16> },
}

/// Classify a probe response. Split out of the I/O path so the policy is
/// testable without a device.
pub fn classify(http_status: u16, final_path: &str, requested_path: &str) -> EndpointStatus {
    if http_status == 401 || http_status == 403 {
        return EndpointStatus::AuthRequired;
    }
    let bounced_to_login = final_path.starts_with("/login") && !requested_path.starts_with("/login");
    if bounced_to_login {
        return EndpointStatus::AuthRequired;
    }
    if (200..300).contains(&http_status) {
        EndpointStatus::Reachable
    } else {
        EndpointStatus::Unreachable {
            http_status: Some(http_status),
        }
    }
}

pub struct EndpointProbe {
    client: reqwest::Client,
    base_url: String,
}

impl EndpointProbe {
    pub fn new(base_url: &str) -> UiResult<Self> {
        // Device certificates are self-signed.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Probe a single route without authentication.
    pub async fn check(&self, path: &str) -> EndpointStatus {
        let url = format!("{}{}", self.base_url, path);
        match self.client.get(&url).send().await {
            Ok(resp) => {
                let status = resp.status().as_u16();
                let final_path = resp.url().path().to_string();
                let outcome = classify(status, &final_path, path);
                debug!(path, status, ?outcome, "endpoint probed");
                outcome
            }
            Err(e) => {
                debug!(path, error = %e, "endpoint unreachable");
                EndpointStatus::Unreachable { http_status: None }
            }
        }
    }

    /// Probe the whole catalogue.
    pub async fn survey(&self) -> Vec<(String, EndpointStatus)> {
        let mut results = Vec::with_capacity(WEB_ROUTES.len());
        for path in WEB_ROUTES {
            let outcome = self.check(path).await;
            results.push((path.to_string(), outcome));
        }
        let reachable = results
            .iter()
            .filter(|(_, s)| *s == EndpointStatus::Reachable)
            .count();
        info!(
            reachable,
            total = results.len(),
            "endpoint survey complete"
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_sanity() {
        assert!(WEB_ROUTES.contains(&"/login"));
        assert!(WEB_ROUTES.contains(&"/gnss"));
        for route in PROTECTED_ROUTES {
            assert!(WEB_ROUTES.contains(&route), "{} missing from catalogue", route);
        }
    }

    #[test]
    fn classify_success() {
        assert_eq!(classify(200, "/general", "/general"), EndpointStatus::Reachable);
        assert_eq!(classify(200, "/login", "/login"), EndpointStatus::Reachable);
    }

    #[test]
    fn classify_auth_required() {
        assert_eq!(classify(401, "/general", "/general"), EndpointStatus::AuthRequired);
        assert_eq!(classify(403, "/snmp", "/snmp"), EndpointStatus::AuthRequired);
        // Redirect chains land on the login page for protected routes.
        assert_eq!(classify(200, "/login", "/general"), EndpointStatus::AuthRequired);
    }

    #[test]
    fn classify_errors() {
        assert_eq!(
            classify(500, "/general", "/general"),
            EndpointStatus::Unreachable { http_status: Some(500) }
        );
        assert_eq!(
            classify(404, "/legal", "/legal"),
            EndpointStatus::Unreachable { http_status: Some(404) }
        );
    }
}
