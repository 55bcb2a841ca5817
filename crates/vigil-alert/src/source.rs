use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use vigil_common::types::{AlertType, MetricSample};

/// Supplies the samples evaluated on each tick of a periodic evaluation loop.
pub trait MetricSource: Send + Sync {
    /// Current samples, stamped with `now`.
    fn snapshot(&self, now: DateTime<Utc>) -> Vec<MetricSample>;
}

/// Last reported value per alert type.
///
/// Collectors call [`LatestValues::record`] whenever they measure something;
/// the evaluation loop reads the latest values on every tick. Re-stamping
/// with the tick time lets a breach that is still being reported keep
/// accumulating duration between reports.
#[derive(Debug, Default)]
pub struct LatestValues {
    values: RwLock<BTreeMap<AlertType, f64>>,
}

impl LatestValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, alert_type: impl Into<AlertType>, value: f64) {
        self.values.write().insert(alert_type.into(), value);
    }

    /// Stop reporting a type, e.g. when its collector goes away.
    pub fn forget(&self, alert_type: &AlertType) -> bool {
        self.values.write().remove(alert_type).is_some()
    }

    pub fn latest(&self, alert_type: &AlertType) -> Option<f64> {
        self.values.read().get(alert_type).copied()
    }
}

impl MetricSource for LatestValues {
    fn snapshot(&self, now: DateTime<Utc>) -> Vec<MetricSample> {
        self.values
            .read()
            .iter()
            .map(|(alert_type, value)| MetricSample {
                alert_type: alert_type.clone(),
                value: *value,
                timestamp: now,
            })
            .collect()
    }
}
