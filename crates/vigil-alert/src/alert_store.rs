use crate::error::{AlertError, Result};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use vigil_common::types::{Alert, AlertRule, AlertType, Resolution, Severity};

/// Default upper bound on retained alerts.
pub const DEFAULT_MAX_ALERTS: usize = 1000;

/// Result of [`AlertStore::open`].
#[derive(Debug, Clone, PartialEq)]
pub enum Opened {
    /// No alert was open for the rule; a new one was created.
    New(Alert),
    /// The rule's open alert was refreshed in place.
    Existing(Alert),
}

impl Opened {
    pub fn alert(&self) -> &Alert {
        match self {
            Opened::New(a) | Opened::Existing(a) => a,
        }
    }
}

/// Active and historical alerts.
///
/// Keeps at most one unresolved alert per rule. Alerts are keyed by an
/// insertion sequence so listings come back oldest first, and the store is
/// bounded by `max_alerts`: once over the bound the oldest resolved alerts
/// are dropped. Open alerts are never dropped.
#[derive(Debug)]
pub struct AlertStore {
    alerts: BTreeMap<u64, Alert>,
    by_id: HashMap<String, u64>,
    /// rule id -> sequence of its unresolved alert
    open_by_rule: HashMap<String, u64>,
    next_seq: u64,
    max_alerts: usize,
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ALERTS)
    }
}

impl AlertStore {
    pub fn new(max_alerts: usize) -> Self {
        Self {
            alerts: BTreeMap::new(),
            by_id: HashMap::new(),
            open_by_rule: HashMap::new(),
            next_seq: 0,
            max_alerts: max_alerts.max(1),
        }
    }

    /// Open an alert for `rule`, or refresh the one already open.
    ///
    /// Refreshing updates `value`, `message` and `last_triggered_at`; level
    /// and threshold stay as they were when the alert first fired.
    pub fn open(&mut self, rule: &AlertRule, message: String, value: f64, now: DateTime<Utc>) -> Opened {
        if let Some(existing) = self
            .open_by_rule
            .get(&rule.id)
            .and_then(|seq| self.alerts.get_mut(seq))
        {
            existing.value = value;
            existing.message = message;
            existing.last_triggered_at = now;
            return Opened::Existing(existing.clone());
        }

        let alert = Alert {
            id: vigil_common::id::next_id(),
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            alert_type: rule.alert_type.clone(),
            level: rule.level,
            message,
            value,
            threshold: rule.threshold,
            first_triggered_at: now,
            last_triggered_at: now,
            is_resolved: false,
            resolved_at: None,
            resolution: None,
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_id.insert(alert.id.clone(), seq);
        self.open_by_rule.insert(rule.id.clone(), seq);
        self.alerts.insert(seq, alert.clone());
        self.prune();

        Opened::New(alert)
    }

    /// Mark an alert resolved. Resolving an already-resolved alert succeeds
    /// and returns it unchanged.
    pub fn resolve(&mut self, alert_id: &str, resolution: Resolution, now: DateTime<Utc>) -> Result<Alert> {
        let alert = self
            .by_id
            .get(alert_id)
            .and_then(|seq| self.alerts.get_mut(seq))
            .ok_or_else(|| AlertError::alert_not_found(alert_id))?;

        if !alert.is_resolved {
            alert.is_resolved = true;
            alert.resolved_at = Some(now);
            alert.resolution = Some(resolution);
            self.open_by_rule.remove(&alert.rule_id);
        }
        Ok(alert.clone())
    }

    pub fn get_alert(&self, alert_id: &str) -> Option<&Alert> {
        self.by_id.get(alert_id).and_then(|seq| self.alerts.get(seq))
    }

    pub fn open_alert_for_rule(&self, rule_id: &str) -> Option<&Alert> {
        self.open_by_rule
            .get(rule_id)
            .and_then(|seq| self.alerts.get(seq))
    }

    pub fn all_alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.values()
    }

    pub fn active_alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.values().filter(|a| !a.is_resolved)
    }

    /// Alerts of one type, resolved or not.
    pub fn alerts_by_type<'a>(&'a self, alert_type: &'a AlertType) -> impl Iterator<Item = &'a Alert> + 'a {
        self.alerts
            .values()
            .filter(move |a| &a.alert_type == alert_type)
    }

    /// Unresolved alerts at one level.
    pub fn active_alerts_by_level(&self, level: Severity) -> impl Iterator<Item = &Alert> {
        self.active_alerts().filter(move |a| a.level == level)
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    fn prune(&mut self) {
        let excess = self.alerts.len().saturating_sub(self.max_alerts);
        if excess == 0 {
            return;
        }

        let victims: Vec<u64> = self
            .alerts
            .iter()
            .filter(|(_, a)| a.is_resolved)
            .map(|(seq, _)| *seq)
            .take(excess)
            .collect();

        for seq in &victims {
            if let Some(alert) = self.alerts.remove(seq) {
                self.by_id.remove(&alert.id);
            }
        }

        if victims.len() < excess {
            tracing::debug!(
                retained = self.alerts.len(),
                max_alerts = self.max_alerts,
                "Alert store over capacity with only open alerts left to drop"
            );
        }
    }
}
