//! Health monitor — the timer loop that drives polling cycles.
//!
//! Each tick spawns a cycle: a bounded retry loop, then on failure the
//! recovery command and the webhook alert. The timer never waits for a
//! cycle or its side effects, so cycles may overlap when one takes
//! longer than the interval.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info};

use vigil_core::MonitorConfig;

use crate::alert::{AlertPayload, WebhookNotifier};
use crate::client::build_client;
use crate::probe::{HttpProbe, Probe};
use crate::recovery::RecoveryCommand;
use crate::retry::{ProbeResult, probe_with_retries};

/// Whether the timer runs at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No interval configured; no periodic work.
    Disabled,
    /// A cycle starts every period.
    Active(Duration),
}

impl SchedulerState {
    pub fn from_interval(interval: Option<Duration>) -> Self {
        match interval {
            Some(period) if !period.is_zero() => SchedulerState::Active(period),
            _ => SchedulerState::Disabled,
        }
    }
}

/// What one cycle observed and started.
///
/// The handles belong to detached tasks; dropping them leaves the tasks
/// running.
#[derive(Debug)]
pub struct CycleReport {
    pub result: ProbeResult,
    pub recovery: Option<JoinHandle<()>>,
    pub alert: Option<JoinHandle<()>>,
}

/// Polls one endpoint and reacts to persistent failure.
pub struct HealthMonitor<P = HttpProbe> {
    probe: P,
    max_attempts: u32,
    state: SchedulerState,
    recovery: Option<RecoveryCommand>,
    notifier: Option<WebhookNotifier>,
}

impl HealthMonitor<HttpProbe> {
    /// Build an HTTP monitor from validated configuration.
    ///
    /// The probe and the notifier share one client.
    pub fn from_config(config: &MonitorConfig) -> Self {
        let client = build_client();
        let probe = HttpProbe::new(client.clone(), config.endpoint.clone(), config.probe_timeout);

        let mut monitor = Self::new(probe, config.retries).with_interval(config.interval);
        if let Some(command) = &config.command {
            monitor = monitor.with_recovery(RecoveryCommand::new(command.clone()));
        }
        if let Some(url) = &config.webhook {
            monitor = monitor.with_notifier(WebhookNotifier::new(
                client,
                url.clone(),
                config.webhook_timeout,
            ));
        }
        monitor
    }
}

impl<P: Probe + 'static> HealthMonitor<P> {
    /// Create a disabled monitor with no side effects configured.
    pub fn new(probe: P, max_attempts: u32) -> Self {
        Self {
            probe,
            max_attempts: max_attempts.max(1),
            state: SchedulerState::Disabled,
            recovery: None,
            notifier: None,
        }
    }

    pub fn with_interval(mut self, interval: Option<Duration>) -> Self {
        self.state = SchedulerState::from_interval(interval);
        self
    }

    pub fn with_recovery(mut self, recovery: RecoveryCommand) -> Self {
        self.recovery = Some(recovery);
        self
    }

    pub fn with_notifier(mut self, notifier: WebhookNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run one polling cycle.
    ///
    /// Returns as soon as the probes are done; the recovery command and
    /// the alert, if started, keep running on their own tasks.
    pub async fn run_cycle(&self) -> CycleReport {
        let result = probe_with_retries(&self.probe, self.max_attempts).await;

        if !result.failed {
            info!(
                attempt = result.attempts_used,
                max_attempts = self.max_attempts,
                "health check passed on attempt {} of {}",
                result.attempts_used,
                self.max_attempts
            );
            return CycleReport {
                result,
                recovery: None,
                alert: None,
            };
        }

        let command = self.recovery.as_ref().map(RecoveryCommand::command);
        error!(
            attempts = result.attempts_used,
            command = command.unwrap_or_default(),
            "bad health detected"
        );

        let recovery = self.recovery.as_ref().map(RecoveryCommand::spawn);
        let alert = self
            .notifier
            .as_ref()
            .map(|n| n.spawn_notify(AlertPayload::bad_health(command, Utc::now())));

        CycleReport {
            result,
            recovery,
            alert,
        }
    }

    /// Run the timer loop until `shutdown` fires.
    ///
    /// Returns immediately when the monitor is disabled, or when the period
    /// cannot be represented as a deadline. Otherwise the first cycle starts
    /// one full period after the call.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let period = match self.state {
            SchedulerState::Disabled => {
                info!("no check interval configured, health monitor disabled");
                return;
            }
            SchedulerState::Active(period) => period,
        };

        info!(
            interval_ms = period.as_millis() as u64,
            max_attempts = self.max_attempts,
            recovery = self.recovery.is_some(),
            alerts = self.notifier.is_some(),
            "health monitor started"
        );

        let Some(start) = Instant::now().checked_add(period) else {
            error!(
                interval_ms = period.as_millis() as u64,
                "check interval out of range, health monitor stopped"
            );
            return;
        };
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let monitor = Arc::clone(&self);
                    tokio::spawn(async move {
                        monitor.run_cycle().await;
                    });
                }
                _ = shutdown.changed() => {
                    info!("health monitor shutting down");
                    break;
                }
            }
        }
    }
}
