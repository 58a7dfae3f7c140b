//! Kronos acceptance test harness
//!
//! Drives the embedded web UI of a physical Kronos timing appliance through
//! a real browser and asserts UI behavior: field persistence, validation,
//! the save/cancel button lifecycle, GNSS constellation configuration and
//! endpoint availability.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  Acceptance Harness (Rust)                   │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ScenarioRunner                                              │
//! │    ├── BrowserSession (node + Playwright, JSON over stdio)   │
//! │    ├── page objects: LoginPage / GeneralConfigPage / Gnss…   │
//! │    ├── EndpointProbe (plain HTTP availability checks)        │
//! │    └── SuiteResult report (JSON)                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  kronos-common                                               │
//! │    └── CapabilityRegistry → DeviceProfile per hardware model │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Control flow: scenario → page object → browser driver → network
//! round-trip to the device → DOM state → assertion. The device is the
//! authoritative holder of all state under test; the harness only observes.

pub mod api;
pub mod browser;
pub mod config;
pub mod error;
pub mod form;
pub mod pages;
pub mod runner;

pub use browser::{Browser, BrowserConfig, BrowserSession};
pub use config::TargetConfig;
pub use error::{UiError, UiResult};
pub use form::{FormEvent, FormState};
pub use runner::{ScenarioRunner, ScenarioStatus, SuiteResult};
