//! Login page
//!
//! The device uses a single password for status-monitoring access. The
//! password field is located by placeholder with a name-attribute fallback
//! (`sts_password`), matching what the firmware actually renders.

use std::time::Duration;

use tracing::{info, warn};

use kronos_common::CapabilityRegistry;

use crate::browser::BrowserSession;
use crate::error::{UiError, UiResult};
use crate::pages::base::PageContext;

const PASSWORD_PRIMARY: &str = "input[placeholder='Password']";
const PASSWORD_FALLBACK: &str = "input[name='sts_password']";
const SUBMIT_BUTTON: &str = "button:has-text('Submit')";

/// Error banners the firmware shows on failed authentication.
const AUTH_ERROR_PATTERNS: [&str; 4] = [
    "Login failed",
    "Authentication error",
    "Invalid credentials",
    "Session expired",
];

/// Selector matching the device's modal scaffolding, used by the session
/// expiry warning.
const MODAL_INFRASTRUCTURE: &str = "[class*='modal'], [id*='modal'], .modal-dialog";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    LoggedIn,
    /// The device showed an authentication error banner.
    Rejected { message: String },
}

pub struct LoginPage<'a> {
    ctx: PageContext<'a>,
}

impl<'a> LoginPage<'a> {
    pub fn new(
        browser: &'a BrowserSession,
        registry: &CapabilityRegistry,
        model: Option<&str>,
    ) -> Self {
        Self {
            ctx: PageContext::new(browser, registry, model),
        }
    }

    /// Navigate to `/login` and wait for the password field.
    pub async fn open(&self) -> UiResult<()> {
        self.ctx.browser.goto("/login").await?;
        let selector = self.password_selector().await?;
        self.ctx.browser.wait_visible(&selector, self.ctx.timeout()).await?;
        Ok(())
    }

    async fn password_selector(&self) -> UiResult<String> {
        let timeout = self.ctx.timeout();
        if self.ctx.browser.count(PASSWORD_PRIMARY, timeout).await? > 0 {
            Ok(PASSWORD_PRIMARY.to_string())
        } else if self.ctx.browser.count(PASSWORD_FALLBACK, timeout).await? > 0 {
            Ok(PASSWORD_FALLBACK.to_string())
        } else {
            Err(UiError::ElementNotFound {
                selector: PASSWORD_PRIMARY.to_string(),
            })
        }
    }

    /// Authenticate. A rejected password is a normal outcome, not an error;
    /// errors mean the page itself misbehaved.
    pub async fn login(&self, password: &str) -> UiResult<LoginOutcome> {
        let selector = self.password_selector().await?;
        let timeout = self.ctx.timeout();

        self.ctx.browser.fill(&selector, password, timeout).await?;
        self.ctx.browser.click(SUBMIT_BUTTON, timeout).await?;

        // Give the device a moment to render either an error banner or the
        // dashboard before deciding.
        tokio::time::sleep(Duration::from_secs(1)).await;

        if let Some(message) = self.auth_error().await? {
            warn!(%message, "authentication rejected");
            return Ok(LoginOutcome::Rejected { message });
        }

        // Successful login leaves the login form behind.
        match self.ctx.browser.wait_hidden(&selector, timeout).await {
            Ok(()) => {
                info!("logged in");
                Ok(LoginOutcome::LoggedIn)
            }
            Err(UiError::Timeout { .. }) => match self.auth_error().await? {
                Some(message) => Ok(LoginOutcome::Rejected { message }),
                None => Err(UiError::LoginFailed(
                    "login form never left the page".to_string(),
                )),
            },
            Err(e) => Err(e),
        }
    }

    /// First matching authentication error banner, if any.
    pub async fn auth_error(&self) -> UiResult<Option<String>> {
        let timeout = self.ctx.timeout();
        for pattern in AUTH_ERROR_PATTERNS {
            let selector = format!("text={}", pattern);
            if self.ctx.browser.count(&selector, timeout).await? > 0
                && self.ctx.browser.is_visible(&selector, timeout).await?
            {
                return Ok(Some(pattern.to_string()));
            }
        }
        Ok(None)
    }

    pub async fn logout(&self) -> UiResult<()> {
        self.ctx.browser.goto("/logout").await?;
        info!("logged out");
        Ok(())
    }

    /// Whether the DOM carries the modal scaffolding that hosts the session
    /// expiry warning. Triggering a real expiry takes the full session
    /// timeout, so the suite verifies the infrastructure instead.
    pub async fn session_expiry_infrastructure_present(&self) -> UiResult<bool> {
        Ok(self
            .ctx
            .browser
            .count(MODAL_INFRASTRUCTURE, self.ctx.timeout())
            .await?
            > 0)
    }

    pub async fn is_session_expired(&self) -> UiResult<bool> {
        let selector = "text=Session expired";
        let timeout = self.ctx.timeout();
        Ok(self.ctx.browser.count(selector, timeout).await? > 0
            && self.ctx.browser.is_visible(selector, timeout).await?)
    }

    pub fn session_timeout_minutes(&self) -> u32 {
        self.ctx.profile.session_timeout_minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_patterns_cover_firmware_banners() {
        assert!(AUTH_ERROR_PATTERNS.contains(&"Login failed"));
        assert!(AUTH_ERROR_PATTERNS.contains(&"Session expired"));
    }

    #[test]
    fn password_fallback_uses_firmware_name() {
        assert_eq!(PASSWORD_FALLBACK, "input[name='sts_password']");
    }
}
