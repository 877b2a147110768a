//! systemd unit rules.

pub mod missing_description;
pub mod missing_restart;
