//! Monitor configuration.
//!
//! Settings are read into a [`RawConfig`] from an optional TOML file and
//! from environment variables, layered with [`RawConfig::overlay`], and
//! validated once with [`RawConfig::validate`]. The resulting
//! [`MonitorConfig`] is immutable for the life of the process.

use std::path::Path;
use std::time::Duration;

use http::Uri;
use serde::{Deserialize, Serialize};

use crate::duration::parse_duration;
use crate::error::{ConfigError, ConfigResult};

pub const ENV_INTERVAL: &str = "INTERVAL_SECONDS";
pub const ENV_ENDPOINT: &str = "HEALTH_ENDPOINT";
pub const ENV_RETRIES: &str = "RETRY_COUNT";
pub const ENV_COMMAND: &str = "PM2_COMMAND";
pub const ENV_WEBHOOK: &str = "WEBHOOK_URL";
pub const ENV_PROBE_TIMEOUT: &str = "PROBE_TIMEOUT";
pub const ENV_WEBHOOK_TIMEOUT: &str = "WEBHOOK_TIMEOUT";

pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest accepted check interval (one year).
pub const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// A duration as written in a config source.
///
/// TOML may use a bare integer (`interval = 60`) or a string
/// (`interval = "500ms"`); environment values always arrive as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationSetting {
    Seconds(u64),
    Text(String),
}

impl DurationSetting {
    fn resolve(&self, key: &'static str) -> ConfigResult<Duration> {
        match self {
            DurationSetting::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationSetting::Text(text) if text.trim().is_empty() => Ok(Duration::ZERO),
            DurationSetting::Text(text) => {
                parse_duration(text).ok_or_else(|| ConfigError::InvalidValue {
                    key,
                    value: text.clone(),
                    reason: "expected seconds or a duration like \"30s\"".to_string(),
                })
            }
        }
    }
}

impl std::fmt::Display for DurationSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DurationSetting::Seconds(secs) => write!(f, "{secs}"),
            DurationSetting::Text(text) => f.write_str(text),
        }
    }
}

/// Unvalidated settings from a single source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    pub interval: Option<DurationSetting>,
    pub endpoint: Option<String>,
    pub retries: Option<u32>,
    pub command: Option<String>,
    pub webhook: Option<String>,
    pub probe_timeout: Option<DurationSetting>,
    pub webhook_timeout: Option<DurationSetting>,
}

impl RawConfig {
    /// Read settings from a TOML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read settings from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let retries = match get(ENV_RETRIES) {
            Some(value) => Some(value.trim().parse::<u32>().map_err(|e| {
                ConfigError::InvalidValue {
                    key: ENV_RETRIES,
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?),
            None => None,
        };

        Ok(Self {
            interval: get(ENV_INTERVAL).map(DurationSetting::Text),
            endpoint: get(ENV_ENDPOINT),
            retries,
            command: get(ENV_COMMAND),
            webhook: get(ENV_WEBHOOK),
            probe_timeout: get(ENV_PROBE_TIMEOUT).map(DurationSetting::Text),
            webhook_timeout: get(ENV_WEBHOOK_TIMEOUT).map(DurationSetting::Text),
        })
    }

    /// Layer `other` on top of `self`; values set in `other` win.
    pub fn overlay(self, other: RawConfig) -> RawConfig {
        RawConfig {
            interval: other.interval.or(self.interval),
            endpoint: other.endpoint.or(self.endpoint),
            retries: other.retries.or(self.retries),
            command: other.command.or(self.command),
            webhook: other.webhook.or(self.webhook),
            probe_timeout: other.probe_timeout.or(self.probe_timeout),
            webhook_timeout: other.webhook_timeout.or(self.webhook_timeout),
        }
    }

    /// Validate into a [`MonitorConfig`], applying defaults.
    pub fn validate(self) -> ConfigResult<MonitorConfig> {
        let endpoint = non_empty(self.endpoint).ok_or(ConfigError::MissingEndpoint)?;
        let endpoint = parse_url(ENV_ENDPOINT, &endpoint)?;

        let interval = match &self.interval {
            Some(setting) => setting.resolve(ENV_INTERVAL)?,
            None => Duration::ZERO,
        };
        if interval > MAX_INTERVAL {
            return Err(ConfigError::InvalidValue {
                key: ENV_INTERVAL,
                value: self.interval.as_ref().map(ToString::to_string).unwrap_or_default(),
                reason: format!("interval must not exceed {}s", MAX_INTERVAL.as_secs()),
            });
        }

        let retries = self.retries.unwrap_or(DEFAULT_RETRIES);
        if retries == 0 {
            return Err(ConfigError::InvalidValue {
                key: ENV_RETRIES,
                value: "0".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }

        let webhook = match non_empty(self.webhook) {
            Some(url) => Some(parse_url(ENV_WEBHOOK, &url)?),
            None => None,
        };

        let probe_timeout = resolve_timeout(
            self.probe_timeout.as_ref(),
            ENV_PROBE_TIMEOUT,
            DEFAULT_PROBE_TIMEOUT,
        )?;
        let webhook_timeout = resolve_timeout(
            self.webhook_timeout.as_ref(),
            ENV_WEBHOOK_TIMEOUT,
            DEFAULT_WEBHOOK_TIMEOUT,
        )?;

        Ok(MonitorConfig {
            interval: (!interval.is_zero()).then_some(interval),
            endpoint,
            retries,
            command: non_empty(self.command),
            webhook,
            probe_timeout,
            webhook_timeout,
        })
    }
}

/// Validated, immutable monitor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Check interval. `None` disables periodic checking.
    pub interval: Option<Duration>,
    /// Health endpoint probed every cycle.
    pub endpoint: Uri,
    /// Maximum probe attempts per cycle (at least 1).
    pub retries: u32,
    /// Shell command run when a cycle exhausts its attempts.
    pub command: Option<String>,
    /// Alert destination.
    pub webhook: Option<Uri>,
    /// Deadline for a single probe.
    pub probe_timeout: Duration,
    /// Deadline for a single webhook delivery.
    pub webhook_timeout: Duration,
}

impl MonitorConfig {
    /// Load configuration: the optional TOML file first, then the process
    /// environment on top.
    pub fn load(file: Option<&Path>) -> ConfigResult<Self> {
        let base = match file {
            Some(path) => RawConfig::from_file(path)?,
            None => RawConfig::default(),
        };
        base.overlay(RawConfig::from_env()?).validate()
    }

    /// A config that probes `endpoint` with every other setting at its default.
    pub fn for_endpoint(endpoint: Uri) -> Self {
        Self {
            interval: None,
            endpoint,
            retries: DEFAULT_RETRIES,
            command: None,
            webhook: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            webhook_timeout: DEFAULT_WEBHOOK_TIMEOUT,
        }
    }

    /// Whether periodic checking is enabled.
    pub fn is_enabled(&self) -> bool {
        self.interval.is_some()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn resolve_timeout(
    setting: Option<&DurationSetting>,
    key: &'static str,
    default: Duration,
) -> ConfigResult<Duration> {
    let Some(setting) = setting else {
        return Ok(default);
    };
    let timeout = setting.resolve(key)?;
    if timeout.is_zero() {
        return Err(ConfigError::InvalidValue {
            key,
            value: setting.to_string(),
            reason: "timeout must be greater than zero".to_string(),
        });
    }
    Ok(timeout)
}

fn parse_url(key: &'static str, value: &str) -> ConfigResult<Uri> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        key,
        value: value.to_string(),
        reason,
    };

    let uri: Uri = value
        .trim()
        .parse()
        .map_err(|e: http::uri::InvalidUri| invalid(e.to_string()))?;
    match uri.scheme_str() {
        Some("http") | Some("https") => {}
        Some(other) => return Err(invalid(format!("unsupported scheme {other:?}"))),
        None => return Err(invalid("missing scheme".to_string())),
    }
    if uri.host().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(uri)
}
