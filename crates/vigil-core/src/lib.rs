//! vigil-core — configuration model for the Vigil health monitor.
//!
//! Settings are layered (TOML file, then environment) into a [`RawConfig`]
//! and validated once into an immutable [`MonitorConfig`]. The only fatal
//! errors in Vigil are the [`ConfigError`]s produced here.

pub mod config;
pub mod duration;
pub mod error;

pub use config::{DurationSetting, MonitorConfig, RawConfig};
pub use duration::parse_duration;
pub use error::{ConfigError, ConfigResult};
