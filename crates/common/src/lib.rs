//! Shared types for the Kronos acceptance harness
//!
//! The harness drives the embedded web UI of Kronos timing appliances
//! (Series 2 and Series 3 hardware). Everything that varies between hardware
//! models - timeouts, available configuration sections, GNSS constellation
//! handling, save-button DOM ids - lives here as data, resolved once through
//! [`CapabilityRegistry`] and passed into page objects as a [`DeviceProfile`].

pub mod capabilities;
pub mod types;

pub use capabilities::{CapabilityRegistry, DeviceCapabilityRecord, DeviceProfile};
pub use types::{
    ConfigSection, Constellation, DeviceSeries, KnownIssue, SaveButton, CANCEL_BUTTON_SELECTOR,
};
