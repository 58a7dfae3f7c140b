//! Page objects over the device web UI
//!
//! One type per configuration screen. Each binds a borrowed
//! [`BrowserSession`](crate::browser::BrowserSession) to a resolved
//! [`DeviceProfile`](kronos_common::DeviceProfile) and exposes semantic
//! operations instead of raw DOM queries. All waits are scaled by the
//! profile's timeout multiplier.

pub mod base;
pub mod general;
pub mod gnss;
pub mod login;

pub use base::PageContext;
pub use general::GeneralConfigPage;
pub use gnss::GnssConfigPage;
pub use login::{LoginOutcome, LoginPage};
