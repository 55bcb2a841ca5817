use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{interval, Duration};
use vigil_alert::{AlertManager, AlertOutput, MetricSource};

/// Outcome of one evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub samples: usize,
    pub fired: usize,
    pub refreshed: usize,
    pub resolved: usize,
}

/// Feeds the metric source snapshot to the alert manager on a fixed tick.
pub struct EvaluationScheduler {
    manager: Arc<AlertManager>,
    source: Arc<dyn MetricSource>,
    tick_secs: u64,
}

impl EvaluationScheduler {
    pub fn new(manager: Arc<AlertManager>, source: Arc<dyn MetricSource>, tick_secs: u64) -> Self {
        Self {
            manager,
            source,
            tick_secs: tick_secs.max(1),
        }
    }

    /// Tick until a shutdown signal arrives. A pass that has started always
    /// runs to completion.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(tick_secs = self.tick_secs, "Alert evaluation scheduler started");

        let mut tick = interval(Duration::from_secs(self.tick_secs));
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.evaluate_once(Utc::now());
                }
                _ = shutdown.recv() => {
                    break;
                }
            }
        }

        tracing::info!("Alert evaluation scheduler stopped");
    }

    /// Evaluate every sample the source reports at `now`.
    pub fn evaluate_once(&self, now: DateTime<Utc>) -> TickSummary {
        let samples = self.source.snapshot(now);
        let mut summary = TickSummary {
            samples: samples.len(),
            ..Default::default()
        };

        for sample in &samples {
            for output in self.manager.evaluate_sample(sample) {
                match output {
                    AlertOutput::Fired(_) => summary.fired += 1,
                    AlertOutput::Refreshed(_) => summary.refreshed += 1,
                    AlertOutput::Resolved(_) => summary.resolved += 1,
                }
            }
        }

        tracing::debug!(
            samples = summary.samples,
            fired = summary.fired,
            resolved = summary.resolved,
            "Alert evaluation pass completed"
        );
        summary
    }
}
