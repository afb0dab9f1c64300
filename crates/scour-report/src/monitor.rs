//! Run timing and anomaly alerting.

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Destination for anomaly alerts.
///
/// Injected into the monitor so alerting has no global side channel; the
/// default routes through `tracing`.
pub trait AlertSink: Send + Sync {
    fn alert(&self, message: &str);
}

/// Routes alerts to `tracing::warn!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlerts;

impl AlertSink for TracingAlerts {
    fn alert(&self, message: &str) {
        tracing::warn!(alert = message, "resource anomaly");
    }
}

/// Wall-clock monitor for pipeline runs.
pub struct ResourceMonitor {
    started_at: Option<Instant>,
    duration: Option<Duration>,
    long_run_threshold: Duration,
    alerts: Arc<dyn AlertSink>,
}

impl Default for ResourceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceMonitor {
    pub fn new() -> Self {
        Self {
            started_at: None,
            duration: None,
            long_run_threshold: Duration::from_secs(3600),
            alerts: Arc::new(TracingAlerts),
        }
    }

    #[must_use]
    pub fn with_alert_sink(mut self, alerts: Arc<dyn AlertSink>) -> Self {
        self.alerts = alerts;
        self
    }

    #[must_use]
    pub fn with_long_run_threshold(mut self, threshold: Duration) -> Self {
        self.long_run_threshold = threshold;
        self
    }

    /// Begin timing. Restarts the clock when called again.
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
        self.duration = None;
    }

    /// Stop timing and record the elapsed duration.
    pub fn stop(&mut self) -> Duration {
        let elapsed = self
            .started_at
            .take()
            .map_or(Duration::ZERO, |start| start.elapsed());
        self.duration = Some(elapsed);
        elapsed
    }

    /// Elapsed time of the last completed interval.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Check recorded metrics and alert on anomalies.
    pub fn alert_on_anomalies(&self) {
        if let Some(duration) = self.duration
            && duration > self.long_run_threshold
        {
            self.alerts.alert(&format!(
                "long running process detected: {}s elapsed",
                duration.as_secs()
            ));
        }
    }
}
