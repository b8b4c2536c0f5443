//! vigil-health — periodic health checking with self-healing.
//!
//! Polls a single HTTP endpoint on a fixed interval. Each cycle makes up
//! to `retries` immediate attempts; when every attempt fails the monitor
//! runs a recovery command and posts a webhook alert, both detached from
//! the timer so a slow restart never delays the next tick.
//!
//! # Architecture
//!
//! ```text
//! HealthMonitor (SchedulerState: Disabled | Active(period))
//!   └── every tick, a spawned cycle
//!       ├── probe_with_retries() → ProbeResult
//!       │   └── Probe::probe()  (HttpProbe → http_probe() → ProbeOutcome)
//!       └── on failure
//!           ├── RecoveryCommand::spawn()      (sh -c <command>)
//!           └── WebhookNotifier::spawn_notify (POST AlertPayload)
//! ```
//!
//! Only configuration errors are fatal. Every runtime failure (probe,
//! recovery, alert) is absorbed and logged so the monitor keeps running.

pub mod alert;
pub mod client;
pub mod monitor;
pub mod probe;
pub mod recovery;
pub mod retry;

pub use alert::{AlertError, AlertPayload, WebhookNotifier};
pub use client::{HttpClient, build_client};
pub use monitor::{CycleReport, HealthMonitor, SchedulerState};
pub use probe::{HttpProbe, Probe, ProbeOutcome, http_probe};
pub use recovery::{RecoveryCommand, RecoveryError};
pub use retry::{ProbeResult, probe_with_retries};
